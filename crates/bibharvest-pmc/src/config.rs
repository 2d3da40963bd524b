//! Figure harvest configuration

use std::path::PathBuf;

use bibharvest_pubmed::{ArchiveUrls, EUTILS_BASE_URL, Identification};

/// Runtime configuration for the figure harvest
#[derive(Debug, Clone)]
pub struct Config {
    /// Metadata dataset to read
    pub pubmed: PathBuf,
    /// Gallery dataset to update
    pub figures: PathBuf,
    /// Image directory
    pub out_dir: PathBuf,
    /// Prefix of each entry's `src`, relative to the site root
    pub src_prefix: String,
    /// Skip articles without a Creative Commons license
    pub only_cc: bool,
    pub eutils_url: String,
    pub identification: Identification,
    pub urls: ArchiveUrls,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            pubmed: PathBuf::from("assets/pubmed.json"),
            figures: PathBuf::from("assets/figures/figures.json"),
            out_dir: PathBuf::from("assets/figures"),
            src_prefix: "assets/figures/".to_string(),
            only_cc: true,
            eutils_url: EUTILS_BASE_URL.to_string(),
            identification: Identification::default(),
            urls: ArchiveUrls::default(),
        }
    }
}
