//! Metadata harvest: esearch -> batched efetch -> dataset file

use std::time::Instant;

use anyhow::{Context, Result, bail};
use bibharvest_core::{Fetch, json};
use indicatif::ProgressBar;

use crate::config::Config;
use crate::eutils::EUtils;
use crate::parser::parse_pubmed_xml;
use crate::record::{MetadataDataset, PublicationRecord};

const DB: &str = "pubmed";

/// Harvest execution summary
#[derive(Debug)]
pub struct Summary {
    pub ids_found: usize,
    pub batches: usize,
    pub records: usize,
    /// Articles left out for missing PMID or `<Article>`
    pub skipped: usize,
    pub elapsed: std::time::Duration,
}

/// Query and fetch, without touching the filesystem.
pub fn harvest(
    config: &Config,
    fetch: &dyn Fetch,
    pb: &ProgressBar,
) -> Result<(MetadataDataset, Summary)> {
    let start = Instant::now();
    if config.query.trim().is_empty() {
        bail!("query must not be empty");
    }

    let eutils = EUtils::new(config.eutils_url.clone(), config.identification.clone());

    pb.set_message("searching...");
    log::info!("Searching PubMed: {}", config.query);
    let ids = eutils.search(fetch, DB, &config.query, config.retmax)?;
    log::info!("Found {} id(s)", ids.len());

    pb.set_length(ids.len() as u64);
    let mut items = Vec::with_capacity(ids.len());
    let mut skipped = 0;
    let mut batches = 0;

    eutils.fetch_batches(fetch, DB, &ids, config.batch_size, |index, batch, document| {
        pb.set_message(format!("batch {}", index + 1));
        let parsed = parse_pubmed_xml(&document)
            .with_context(|| format!("Failed to parse efetch batch {}", index + 1))?;
        log::debug!(
            "Batch {}: {} requested, {} parsed, {} skipped",
            index + 1,
            batch.len(),
            parsed.articles.len(),
            parsed.skipped
        );
        skipped += parsed.skipped;
        batches += 1;
        items.extend(
            parsed
                .articles
                .into_iter()
                .map(|article| PublicationRecord::from_article(article, &config.urls)),
        );
        pb.inc(batch.len() as u64);
        Ok(())
    })?;

    let dataset = MetadataDataset::new(config.query.clone(), items);
    let summary = Summary {
        ids_found: ids.len(),
        batches,
        records: dataset.count,
        skipped,
        elapsed: start.elapsed(),
    };
    Ok((dataset, summary))
}

/// Run the metadata harvest and overwrite the dataset file.
///
/// Nothing is written unless every batch succeeded, so a failed run
/// leaves the previous dataset in place.
pub fn run(config: &Config, fetch: &dyn Fetch, pb: &ProgressBar) -> Result<Summary> {
    let (dataset, summary) = harvest(config, fetch, pb)?;

    json::write_pretty(&config.output, &dataset)?;
    pb.finish_and_clear();

    log::info!("=== PubMed Harvest Summary ===");
    log::info!(
        "Records: {} of {} id(s) ({} skipped)",
        summary.records,
        summary.ids_found,
        summary.skipped
    );
    log::info!("Batches: {}", summary.batches);
    log::info!("Time: {:.1}s", summary.elapsed.as_secs_f64());

    Ok(summary)
}
