//! Bibharvest PMC - figure gallery harvest
//!
//! For every publication in the metadata dataset that has a PMC id,
//! fetches the full-text XML, checks its license, takes the first
//! figure, downloads the image and records it in the gallery dataset.
//! Entries already in the gallery are never fetched again.

pub mod config;
pub mod download;
pub mod figure;
pub mod gallery;
pub mod license;
pub mod runner;

// Re-exports
pub use config::Config;
pub use figure::{FigureRef, find_first_figure};
pub use gallery::{FigureRecord, FiguresDataset};
pub use license::{LicenseInfo, find_license};
pub use runner::{Summary, run};
