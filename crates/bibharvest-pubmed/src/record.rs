//! Publication records and the metadata dataset written for the site

use serde::{Deserialize, Serialize};

use crate::parser::PubmedArticle;

pub const PUBMED_BASE_URL: &str = "https://pubmed.ncbi.nlm.nih.gov/";
pub const PMC_BASE_URL: &str = "https://pmc.ncbi.nlm.nih.gov/articles/";

/// Public article page locations in the primary and secondary archive.
#[derive(Debug, Clone)]
pub struct ArchiveUrls {
    pub pubmed_base: String,
    pub pmc_base: String,
}

impl Default for ArchiveUrls {
    fn default() -> Self {
        Self {
            pubmed_base: PUBMED_BASE_URL.to_string(),
            pmc_base: PMC_BASE_URL.to_string(),
        }
    }
}

impl ArchiveUrls {
    pub fn pubmed_url(&self, pmid: &str) -> String {
        format!("{}/{pmid}/", self.pubmed_base.trim_end_matches('/'))
    }

    pub fn pmc_url(&self, pmc_id: &str) -> String {
        format!("{}/{pmc_id}/", self.pmc_base.trim_end_matches('/'))
    }
}

/// One publication as published in the metadata dataset.
///
/// Field order is the JSON key order the site reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublicationRecord {
    #[serde(default)]
    pub pmid: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub journal: Option<String>,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub authors: Vec<String>,
    #[serde(default)]
    pub doi: Option<String>,
    #[serde(default)]
    pub pubmed_url: Option<String>,
    #[serde(default)]
    pub pmc: Option<String>,
    #[serde(default)]
    pub pmc_url: Option<String>,
}

impl PublicationRecord {
    pub fn from_article(article: PubmedArticle, urls: &ArchiveUrls) -> Self {
        let authors = article
            .authors
            .iter()
            .filter_map(|author| author.display_name())
            .collect();
        let pubmed_url = (!article.pmid.is_empty()).then(|| urls.pubmed_url(&article.pmid));
        let pmc_url = article.pmc_id.as_deref().map(|pmc| urls.pmc_url(pmc));

        Self {
            pmid: article.pmid,
            title: article.title,
            journal: article.journal,
            year: article.year,
            authors,
            doi: article.doi,
            pubmed_url,
            pmc: article.pmc_id,
            pmc_url,
        }
    }

    /// Secondary-archive page if there is one, else the primary one.
    pub fn best_link(&self) -> Option<&str> {
        self.pmc_url.as_deref().or(self.pubmed_url.as_deref())
    }
}

/// Whole output of a metadata harvest; rewritten on every run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataDataset {
    #[serde(default)]
    pub generated_at: String,
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub count: usize,
    #[serde(default)]
    pub items: Vec<PublicationRecord>,
}

impl MetadataDataset {
    /// Stamp `items` with the current UTC time.
    pub fn new(query: impl Into<String>, items: Vec<PublicationRecord>) -> Self {
        let generated_at = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Micros, false);
        Self {
            generated_at,
            query: query.into(),
            count: items.len(),
            items,
        }
    }
}
