//! NCBI E-utilities: esearch for ids, efetch for full records
//!
//! Both endpoints are plain GETs through the shared [`Fetch`] client, so
//! rate limiting is handled there and nowhere else.

use anyhow::{Context, Result};
use bibharvest_core::Fetch;
use serde::Deserialize;

pub const EUTILS_BASE_URL: &str = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils/";

/// Maximum ids per efetch request
pub const FETCH_BATCH_SIZE: usize = 150;

/// Encodes to `sort=pub+date` in the query string
const SORT_BY_PUB_DATE: &str = "pub date";

/// Optional `email`/`tool` parameters NCBI asks clients to send.
#[derive(Debug, Clone, Default)]
pub struct Identification {
    pub email: Option<String>,
    pub tool: Option<String>,
}

impl Identification {
    fn params(&self) -> impl Iterator<Item = (&'static str, &str)> {
        let email = self.email.as_deref().filter(|s| !s.is_empty());
        let tool = self.tool.as_deref().filter(|s| !s.is_empty());
        email
            .map(|v| ("email", v))
            .into_iter()
            .chain(tool.map(|v| ("tool", v)))
    }
}

#[derive(Debug, Deserialize)]
struct ESearchResponse {
    #[serde(default)]
    esearchresult: ESearchResult,
}

#[derive(Debug, Default, Deserialize)]
struct ESearchResult {
    #[serde(default)]
    idlist: Vec<String>,
}

/// E-utilities endpoint with the caller's identification attached.
#[derive(Debug, Clone)]
pub struct EUtils {
    base_url: String,
    identification: Identification,
}

impl Default for EUtils {
    fn default() -> Self {
        Self::new(EUTILS_BASE_URL, Identification::default())
    }
}

impl EUtils {
    pub fn new(base_url: impl Into<String>, identification: Identification) -> Self {
        Self {
            base_url: base_url.into(),
            identification,
        }
    }

    fn endpoint(&self, name: &str) -> String {
        format!("{}/{name}", self.base_url.trim_end_matches('/'))
    }

    /// esearch URL: JSON, newest first, at most `retmax` ids
    pub fn esearch_url(&self, db: &str, term: &str, retmax: usize) -> Result<String> {
        let retmax = retmax.to_string();
        let mut params = vec![
            ("db", db),
            ("term", term),
            ("retmode", "json"),
            ("retmax", retmax.as_str()),
            ("sort", SORT_BY_PUB_DATE),
        ];
        params.extend(self.identification.params());
        let url = reqwest::Url::parse_with_params(&self.endpoint("esearch.fcgi"), &params)
            .context("invalid E-utilities base URL")?;
        Ok(url.into())
    }

    /// efetch URL for a comma-joined id batch, XML
    pub fn efetch_url(&self, db: &str, ids: &[String]) -> Result<String> {
        let joined = ids.join(",");
        let mut params = vec![("db", db), ("id", joined.as_str()), ("retmode", "xml")];
        params.extend(self.identification.params());
        let url = reqwest::Url::parse_with_params(&self.endpoint("efetch.fcgi"), &params)
            .context("invalid E-utilities base URL")?;
        Ok(url.into())
    }

    /// Run a search and return ids in the order the service gave them.
    ///
    /// An empty id list is a valid answer, not an error.
    pub fn search(
        &self,
        fetch: &dyn Fetch,
        db: &str,
        term: &str,
        retmax: usize,
    ) -> Result<Vec<String>> {
        let url = self.esearch_url(db, term, retmax)?;
        log::debug!("esearch: {url}");
        let body = fetch
            .get(&url)
            .with_context(|| format!("esearch failed for query {term:?}"))?;
        let response: ESearchResponse =
            serde_json::from_slice(&body).context("invalid esearch JSON")?;
        Ok(response.esearchresult.idlist)
    }

    /// Fetch one XML document covering all of `ids`.
    pub fn fetch_batch(&self, fetch: &dyn Fetch, db: &str, ids: &[String]) -> Result<Vec<u8>> {
        let url = self.efetch_url(db, ids)?;
        log::debug!("efetch: {} id(s) from {db}", ids.len());
        fetch
            .get(&url)
            .with_context(|| format!("efetch failed for {} id(s) from {db}", ids.len()))
    }

    /// Fetch `ids` in consecutive batches of at most `batch_size`,
    /// handing each response document to `on_batch` as it arrives.
    ///
    /// The first error (network or from `on_batch`) stops the run.
    pub fn fetch_batches<F>(
        &self,
        fetch: &dyn Fetch,
        db: &str,
        ids: &[String],
        batch_size: usize,
        mut on_batch: F,
    ) -> Result<()>
    where
        F: FnMut(usize, &[String], Vec<u8>) -> Result<()>,
    {
        for (index, batch) in chunk_ids(ids, batch_size).into_iter().enumerate() {
            let document = self.fetch_batch(fetch, db, batch)?;
            on_batch(index, batch, document)?;
        }
        Ok(())
    }
}

/// Positional chunks: chunk `i` is `ids[i*size .. (i+1)*size]`.
/// Empty input gives no chunks.
pub fn chunk_ids(ids: &[String], size: usize) -> Vec<&[String]> {
    ids.chunks(size.max(1)).collect()
}
