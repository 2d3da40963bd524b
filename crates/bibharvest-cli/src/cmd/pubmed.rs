//! Pubmed subcommand - harvest publication metadata

use std::path::PathBuf;

use anyhow::Result;
use bibharvest_core::{Fetch, SharedProgress};
use clap::Args;

use super::print_summary;
use crate::config::Config;

#[derive(Args, Debug)]
pub struct PubmedArgs {
    /// PubMed search query, e.g. "Doe J[Author]"
    #[arg(short, long)]
    pub query: String,

    /// Maximum number of results
    #[arg(long)]
    pub retmax: Option<usize>,

    /// Metadata dataset path
    #[arg(short, long)]
    pub out: Option<PathBuf>,

    /// Contact email sent to NCBI
    #[arg(long)]
    pub email: Option<String>,

    /// Tool name sent to NCBI
    #[arg(long)]
    pub tool: Option<String>,
}

pub fn run(
    args: PubmedArgs,
    config: &Config,
    fetch: &dyn Fetch,
    progress: &SharedProgress,
) -> Result<()> {
    let pm_config = bibharvest_pubmed::Config {
        query: args.query,
        retmax: args.retmax.unwrap_or(config.pubmed.retmax),
        output: args.out.unwrap_or_else(|| config.pubmed.out.clone()),
        eutils_url: config.eutils.base_url.clone(),
        identification: config.eutils.identification(args.email, args.tool),
        ..Default::default()
    };

    log::info!("Harvesting PubMed metadata");
    log::info!("  Query: {}", pm_config.query);
    log::info!("  Output: {}", pm_config.output.display());

    let pb = progress.stage_line("pubmed");
    let summary = bibharvest_pubmed::run(&pm_config, fetch, &pb)?;

    print_summary(
        "PubMed",
        &[
            ("Ids found", summary.ids_found.to_string()),
            (
                "Records",
                format!("{} ({} skipped)", summary.records, summary.skipped),
            ),
            ("Batches", summary.batches.to_string()),
            ("Time", format!("{:.1}s", summary.elapsed.as_secs_f64())),
        ],
    );
    println!(
        "Wrote {} with {} items",
        pm_config.output.display(),
        summary.records
    );

    Ok(())
}
