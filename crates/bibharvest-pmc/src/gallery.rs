//! Figure gallery dataset with dedup by storage path

use std::collections::HashSet;
use std::path::Path;

use anyhow::Result;
use bibharvest_core::json;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One gallery entry. `src` is the dedup key.
///
/// Keys this tool does not know about are carried through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FigureRecord {
    pub src: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(default)]
    pub credit: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Deserialize)]
struct RawDataset {
    #[serde(default)]
    figures: Vec<FigureRecord>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

#[derive(Serialize)]
struct RawDatasetRef<'a> {
    figures: &'a [FigureRecord],
    #[serde(flatten)]
    extra: &'a Map<String, Value>,
}

/// Existing entries first, new ones appended in insertion order.
#[derive(Debug, Clone, Default)]
pub struct FiguresDataset {
    figures: Vec<FigureRecord>,
    extra: Map<String, Value>,
    seen: HashSet<String>,
}

impl FiguresDataset {
    pub fn from_figures(figures: Vec<FigureRecord>) -> Self {
        Self::from_parts(figures, Map::new())
    }

    fn from_parts(figures: Vec<FigureRecord>, extra: Map<String, Value>) -> Self {
        let seen = figures.iter().map(|f| f.src.clone()).collect();
        Self {
            figures,
            extra,
            seen,
        }
    }

    /// Load from `path`; a missing file is an empty dataset.
    pub fn load(path: &Path) -> Result<Self> {
        let raw: Option<RawDataset> = json::read_if_exists(path)?;
        Ok(match raw {
            Some(raw) => Self::from_parts(raw.figures, raw.extra),
            None => Self::default(),
        })
    }

    pub fn contains(&self, src: &str) -> bool {
        self.seen.contains(src)
    }

    /// Append `candidate` unless its `src` is already present.
    ///
    /// Returns the updated dataset and whether anything was added.
    pub fn merge(mut self, candidate: FigureRecord) -> (Self, bool) {
        if !self.seen.insert(candidate.src.clone()) {
            return (self, false);
        }
        self.figures.push(candidate);
        (self, true)
    }

    pub fn figures(&self) -> &[FigureRecord] {
        &self.figures
    }

    pub fn len(&self) -> usize {
        self.figures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.figures.is_empty()
    }

    /// Write the full dataset as pretty JSON with a trailing newline.
    pub fn write(&self, path: &Path) -> Result<()> {
        json::write_pretty(
            path,
            &RawDatasetRef {
                figures: &self.figures,
                extra: &self.extra,
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    fn figure(src: &str) -> FigureRecord {
        FigureRecord {
            src: src.to_string(),
            alt: Some("Figure from: T".to_string()),
            caption: Some("T (2020)".to_string()),
            link: Some("https://pmc.ncbi.nlm.nih.gov/articles/PMC1/".to_string()),
            credit: None,
            extra: Map::new(),
        }
    }

    #[test]
    fn merge_appends_new() {
        let (dataset, added) = FiguresDataset::default().merge(figure("a.jpg"));
        assert!(added);
        let (dataset, added) = dataset.merge(figure("b.jpg"));
        assert!(added);
        let srcs: Vec<_> = dataset.figures().iter().map(|f| f.src.as_str()).collect();
        assert_eq!(srcs, vec!["a.jpg", "b.jpg"]);
    }

    #[test]
    fn merge_skips_duplicate_src() {
        let existing = FiguresDataset::from_figures(vec![figure("a.jpg")]);
        let mut changed = figure("a.jpg");
        changed.caption = Some("different".to_string());
        let (dataset, added) = existing.merge(changed);
        assert!(!added);
        assert_eq!(dataset.len(), 1);
        assert_eq!(dataset.figures()[0].caption.as_deref(), Some("T (2020)"));
    }

    #[test]
    fn load_missing_is_empty() {
        let dir = TempDir::new().unwrap();
        let dataset = FiguresDataset::load(&dir.path().join("figures.json")).unwrap();
        assert!(dataset.is_empty());
    }

    #[test]
    fn credit_written_as_null() {
        let json = serde_json::to_value(figure("a.jpg")).unwrap();
        assert_eq!(json["credit"], Value::Null);
        let keys: Vec<_> = json.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["src", "alt", "caption", "link", "credit"]);
    }

    #[test]
    fn unknown_keys_survive_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("figures.json");
        std::fs::write(
            &path,
            r#"{"figures":[{"src":"old.jpg","alt":"x","featured":true}],"note":"curated"}"#,
        )
        .unwrap();

        let dataset = FiguresDataset::load(&path).unwrap();
        assert!(dataset.contains("old.jpg"));
        let (dataset, _) = dataset.merge(figure("new.jpg"));
        dataset.write(&path).unwrap();

        let value: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["note"], "curated");
        assert_eq!(value["figures"][0]["featured"], true);
        assert_eq!(value["figures"][0]["src"], "old.jpg");
        assert_eq!(value["figures"][1]["src"], "new.jpg");
    }

    #[test]
    fn entry_without_src_is_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("figures.json");
        std::fs::write(&path, r#"{"figures":[{"alt":"x"}]}"#).unwrap();
        assert!(FiguresDataset::load(&path).is_err());
    }
}
