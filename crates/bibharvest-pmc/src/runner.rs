//! Figure harvest: metadata dataset -> full text -> first figure -> gallery

use std::time::Instant;

use anyhow::{Context, Result};
use bibharvest_core::{Element, Fetch, json};
use bibharvest_pubmed::{EUtils, MetadataDataset, PublicationRecord};
use indicatif::ProgressBar;

use crate::config::Config;
use crate::download::{describe, download_figure, figure_file_name};
use crate::figure::find_first_figure;
use crate::gallery::FiguresDataset;
use crate::license::find_license;

const DB: &str = "pmc";

/// Figure harvest execution summary
#[derive(Debug, Default)]
pub struct Summary {
    pub items: usize,
    pub added: usize,
    /// Records without PMID or PMC id
    pub unlinked: usize,
    pub not_licensed: usize,
    pub no_figure: usize,
    /// Figure already in the gallery
    pub duplicates: usize,
    /// Image already on disk, not fetched again
    pub reused_files: usize,
    pub elapsed: std::time::Duration,
}

enum Outcome {
    Added,
    Unlinked,
    NotLicensed,
    NoFigure,
    Duplicate,
}

struct Harvest<'a> {
    config: &'a Config,
    fetch: &'a dyn Fetch,
    eutils: EUtils,
    dataset: FiguresDataset,
    summary: Summary,
}

impl Harvest<'_> {
    fn process(&mut self, item: &PublicationRecord) -> Result<Outcome> {
        let Some(pmc) = item.pmc.as_deref().filter(|p| !p.is_empty()) else {
            return Ok(Outcome::Unlinked);
        };
        if item.pmid.is_empty() {
            return Ok(Outcome::Unlinked);
        }

        let xml = self.eutils.fetch_batch(self.fetch, DB, &[pmc.to_string()])?;
        let root = Element::parse(&xml)
            .with_context(|| format!("Failed to parse full text of {pmc}"))?;

        let license = find_license(&root);
        if self.config.only_cc && !license.is_creative_commons() {
            log::debug!("{pmc}: no Creative Commons license");
            return Ok(Outcome::NotLicensed);
        }

        let figure = find_first_figure(&root);
        let Some(href) = figure.href else {
            log::debug!("{pmc}: no figure");
            return Ok(Outcome::NoFigure);
        };

        let file_name = figure_file_name(&item.pmid, &href);
        let src = format!("{}{file_name}", self.config.src_prefix);
        if self.dataset.contains(&src) {
            log::debug!("{pmc}: {src} already in gallery");
            return Ok(Outcome::Duplicate);
        }

        let path = self.config.out_dir.join(&file_name);
        if path.exists() {
            log::debug!("{pmc}: {} already on disk", path.display());
            self.summary.reused_files += 1;
        } else {
            let article_url = self.config.urls.pmc_url(pmc);
            download_figure(self.fetch, &article_url, &href, &path)?;
        }

        let record = describe(item, src, figure.caption, &license);
        let (dataset, added) = std::mem::take(&mut self.dataset).merge(record);
        self.dataset = dataset;
        Ok(if added { Outcome::Added } else { Outcome::Duplicate })
    }
}

/// Run the figure harvest and rewrite the gallery dataset.
///
/// The gallery is written once, after every record was handled, even
/// when nothing new was found.
pub fn run(config: &Config, fetch: &dyn Fetch, pb: &ProgressBar) -> Result<Summary> {
    let start = Instant::now();

    let metadata: MetadataDataset = json::read(&config.pubmed)?;
    let dataset = FiguresDataset::load(&config.figures)?;
    log::info!(
        "Loaded {} publication(s), {} existing figure(s)",
        metadata.items.len(),
        dataset.len()
    );

    std::fs::create_dir_all(&config.out_dir)
        .with_context(|| format!("Failed to create {}", config.out_dir.display()))?;

    let mut harvest = Harvest {
        config,
        fetch,
        eutils: EUtils::new(config.eutils_url.clone(), config.identification.clone()),
        dataset,
        summary: Summary {
            items: metadata.items.len(),
            ..Default::default()
        },
    };

    pb.set_length(metadata.items.len() as u64);
    for item in &metadata.items {
        pb.set_message(item.pmid.clone());
        match harvest.process(item)? {
            Outcome::Added => harvest.summary.added += 1,
            Outcome::Unlinked => harvest.summary.unlinked += 1,
            Outcome::NotLicensed => harvest.summary.not_licensed += 1,
            Outcome::NoFigure => harvest.summary.no_figure += 1,
            Outcome::Duplicate => harvest.summary.duplicates += 1,
        }
        pb.inc(1);
    }

    harvest.dataset.write(&config.figures)?;
    pb.finish_and_clear();

    let mut summary = harvest.summary;
    summary.elapsed = start.elapsed();

    log::info!("=== Figure Harvest Summary ===");
    log::info!("Added: {} of {} publication(s)", summary.added, summary.items);
    log::info!(
        "Skipped: {} unlinked, {} unlicensed, {} without figure, {} duplicate",
        summary.unlinked,
        summary.not_licensed,
        summary.no_figure,
        summary.duplicates
    );
    log::info!("Time: {:.1}s", summary.elapsed.as_secs_f64());

    Ok(summary)
}
