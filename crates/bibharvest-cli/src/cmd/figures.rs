//! Figures subcommand - harvest the figure gallery

use std::path::PathBuf;

use anyhow::Result;
use bibharvest_core::{Fetch, SharedProgress};
use clap::Args;

use super::print_summary;
use crate::config::Config;

#[derive(Args, Debug)]
pub struct FiguresArgs {
    /// Metadata dataset to read
    #[arg(long)]
    pub pubmed: Option<PathBuf>,

    /// Gallery dataset to update
    #[arg(long)]
    pub figures: Option<PathBuf>,

    /// Image directory
    #[arg(long)]
    pub out_dir: Option<PathBuf>,

    /// Only take figures from Creative Commons licensed articles
    #[arg(long, overrides_with = "no_only_cc")]
    pub only_cc: bool,

    /// Take figures regardless of license
    #[arg(long, overrides_with = "only_cc")]
    pub no_only_cc: bool,

    /// Contact email sent to NCBI
    #[arg(long)]
    pub email: Option<String>,

    /// Tool name sent to NCBI
    #[arg(long)]
    pub tool: Option<String>,
}

impl FiguresArgs {
    /// License filter from flags, `None` when neither was given.
    fn only_cc(&self) -> Option<bool> {
        match (self.only_cc, self.no_only_cc) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        }
    }
}

pub fn run(
    args: FiguresArgs,
    config: &Config,
    fetch: &dyn Fetch,
    progress: &SharedProgress,
) -> Result<()> {
    let only_cc = args.only_cc().unwrap_or(config.figures.only_cc);
    let fig_config = bibharvest_pmc::Config {
        pubmed: args.pubmed.unwrap_or_else(|| config.figures.pubmed.clone()),
        figures: args.figures.unwrap_or_else(|| config.figures.figures.clone()),
        out_dir: args.out_dir.unwrap_or_else(|| config.figures.out_dir.clone()),
        src_prefix: config.figures.src_prefix.clone(),
        only_cc,
        eutils_url: config.eutils.base_url.clone(),
        identification: config.eutils.identification(args.email, args.tool),
        ..Default::default()
    };

    log::info!("Harvesting figures");
    log::info!("  Metadata: {}", fig_config.pubmed.display());
    log::info!("  Gallery: {}", fig_config.figures.display());
    log::info!("  Only CC: {only_cc}");

    let pb = progress.stage_line("figures");
    let summary = bibharvest_pmc::run(&fig_config, fetch, &pb)?;

    print_summary(
        "Figures",
        &[
            (
                "Added",
                format!("{} of {} publication(s)", summary.added, summary.items),
            ),
            (
                "Skipped",
                format!(
                    "{} unlinked, {} unlicensed, {} without figure, {} duplicate",
                    summary.unlinked, summary.not_licensed, summary.no_figure, summary.duplicates
                ),
            ),
            ("Files reused", summary.reused_files.to_string()),
            ("Time", format!("{:.1}s", summary.elapsed.as_secs_f64())),
        ],
    );
    println!(
        "Added {} figure(s) to {}",
        summary.added,
        fig_config.figures.display()
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[derive(Parser)]
    struct Wrapper {
        #[command(flatten)]
        args: FiguresArgs,
    }

    fn parse(flags: &[&str]) -> Option<bool> {
        let argv = std::iter::once("figures").chain(flags.iter().copied());
        Wrapper::parse_from(argv).args.only_cc()
    }

    #[test]
    fn only_cc_flags() {
        assert_eq!(parse(&[]), None);
        assert_eq!(parse(&["--only-cc"]), Some(true));
        assert_eq!(parse(&["--no-only-cc"]), Some(false));
        assert_eq!(parse(&["--only-cc", "--no-only-cc"]), Some(false));
        assert_eq!(parse(&["--no-only-cc", "--only-cc"]), Some(true));
    }
}
