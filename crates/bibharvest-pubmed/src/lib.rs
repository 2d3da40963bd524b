//! Bibharvest PubMed - publication metadata harvest
//!
//! Runs an E-utilities search, fetches full records in batches of 150,
//! and writes the metadata dataset the site renders.
//!
//! # Example
//!
//! ```ignore
//! use bibharvest_core::{HttpClient, RetryPolicy};
//! use bibharvest_pubmed::{Config, run};
//!
//! let config = Config {
//!     query: "Doe J[Author]".into(),
//!     ..Default::default()
//! };
//! let client = HttpClient::new(RetryPolicy::default());
//! let summary = run(&config, &client, &indicatif::ProgressBar::hidden())?;
//! println!("Wrote {} records", summary.records);
//! ```

pub mod config;
pub mod eutils;
pub mod parser;
pub mod record;
pub mod runner;

// Re-exports
pub use config::Config;
pub use eutils::{EUTILS_BASE_URL, EUtils, FETCH_BATCH_SIZE, Identification, chunk_ids};
pub use record::{ArchiveUrls, MetadataDataset, PublicationRecord};
pub use runner::{Summary, harvest, run};
