//! bibharvest - publication metadata and figure gallery harvester
//!
//! Builds the JSON datasets a static site renders: publication metadata
//! from PubMed and one representative figure per open-access article
//! from PubMed Central.

use std::sync::Arc;

use anyhow::Result;
use bibharvest_core::{HttpClient, RetryPolicy};
use clap::{Parser, Subcommand};

mod cmd;
mod config;

use config::Config;

#[derive(Parser)]
#[command(name = "bibharvest")]
#[command(about = "Harvest publication metadata and figures for a static site")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    /// Config file path (default: ./bibharvest.toml or ~/.config/bibharvest/config.toml)
    #[arg(short, long, global = true)]
    config: Option<std::path::PathBuf>,

    /// Attempts per request when rate limited (HTTP 429)
    #[arg(long, global = true)]
    max_attempts: Option<u32>,
}

#[derive(Subcommand)]
enum Command {
    /// Search PubMed and write the metadata dataset
    Pubmed(cmd::pubmed::PubmedArgs),
    /// Download first figures of PMC articles into the gallery
    Figures(cmd::figures::FiguresArgs),
    /// Show current configuration
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Progress context (TTY auto-detect)
    let progress = Arc::new(bibharvest_core::ProgressContext::new());

    // Logging:
    //   TTY:     quiet (warn) unless --debug, the status line shows activity
    //   non-TTY: info unless --debug
    let is_tty = progress.is_tty();
    let multi = if is_tty { Some(progress.multi()) } else { None };
    let quiet = if is_tty { !cli.debug } else { false };
    if let Err(e) = bibharvest_core::init_logging(quiet, cli.debug, multi) {
        eprintln!("Logger already initialised: {e}");
    }

    // Load configuration
    let config = if let Some(path) = cli.config {
        Config::from_file(&path)?
    } else {
        Config::load()?
    };

    // HTTP settings: config file defaults, CLI overrides
    let max_attempts = cli.max_attempts.unwrap_or(config.http.max_attempts);
    let mut client = HttpClient::new(RetryPolicy::with_max_attempts(max_attempts));
    if let Some(user_agent) = &config.http.user_agent {
        client = client.with_user_agent(user_agent.clone());
    }

    match cli.command {
        Command::Pubmed(args) => cmd::pubmed::run(args, &config, &client, &progress),
        Command::Figures(args) => cmd::figures::run(args, &config, &client, &progress),
        Command::Config => {
            use comfy_table::{
                Cell, Color, Table, modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL,
            };

            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .apply_modifier(UTF8_ROUND_CORNERS)
                .set_header(vec![
                    Cell::new("Setting").fg(Color::Cyan),
                    Cell::new("Value").fg(Color::Cyan),
                ]);

            table.add_row(vec!["E-utilities URL", &config.eutils.base_url]);
            table.add_row(vec![
                "Contact email",
                config.eutils.email.as_deref().unwrap_or("not set"),
            ]);
            table.add_row(vec![
                "Tool name",
                config.eutils.tool.as_deref().unwrap_or("not set"),
            ]);
            table.add_row(vec!["Max attempts", &max_attempts.to_string()]);
            table.add_row(vec![
                "User agent",
                config
                    .http
                    .user_agent
                    .as_deref()
                    .unwrap_or(bibharvest_core::DEFAULT_USER_AGENT),
            ]);
            table.add_row(vec!["PubMed retmax", &config.pubmed.retmax.to_string()]);
            table.add_row(vec![
                "Metadata dataset",
                &config.pubmed.out.display().to_string(),
            ]);
            table.add_row(vec![
                "Figures input",
                &config.figures.pubmed.display().to_string(),
            ]);
            table.add_row(vec![
                "Gallery dataset",
                &config.figures.figures.display().to_string(),
            ]);
            table.add_row(vec![
                "Image directory",
                &config.figures.out_dir.display().to_string(),
            ]);
            table.add_row(vec!["Image src prefix", &config.figures.src_prefix]);
            table.add_row(vec![
                "Only CC figures",
                if config.figures.only_cc { "yes" } else { "no" },
            ]);

            eprintln!("\n{table}");
            Ok(())
        }
    }
}
