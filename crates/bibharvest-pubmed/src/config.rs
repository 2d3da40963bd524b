//! Metadata harvest configuration

use std::path::PathBuf;

use crate::eutils::{EUTILS_BASE_URL, FETCH_BATCH_SIZE, Identification};
use crate::record::ArchiveUrls;

/// Runtime configuration for the metadata harvest
#[derive(Debug, Clone)]
pub struct Config {
    /// Search query, e.g. `Doe J[Author]`
    pub query: String,
    /// Maximum number of ids requested from esearch
    pub retmax: usize,
    /// Metadata dataset path
    pub output: PathBuf,
    /// Ids per efetch request
    pub batch_size: usize,
    /// E-utilities base URL
    pub eutils_url: String,
    pub identification: Identification,
    pub urls: ArchiveUrls,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            query: String::new(),
            retmax: 200,
            output: PathBuf::from("assets/pubmed.json"),
            batch_size: FETCH_BATCH_SIZE,
            eutils_url: EUTILS_BASE_URL.to_string(),
            identification: Identification {
                email: None,
                tool: Some("bibharvest".to_string()),
            },
            urls: ArchiveUrls::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert_eq!(config.retmax, 200);
        assert_eq!(config.batch_size, 150);
        assert_eq!(config.output, PathBuf::from("assets/pubmed.json"));
        assert!(config.eutils_url.starts_with("https://"));
        assert_eq!(config.identification.tool.as_deref(), Some("bibharvest"));
    }
}
