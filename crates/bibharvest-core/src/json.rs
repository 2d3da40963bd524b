//! JSON dataset files consumed by the static site

use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Render as UTF-8 JSON with 2-space indent and a trailing newline.
///
/// Non-ASCII characters are written as-is, never `\u` escaped.
pub fn to_pretty_string<T: Serialize>(value: &T) -> Result<String> {
    let mut json = serde_json::to_string_pretty(value).context("failed to serialize JSON")?;
    json.push('\n');
    Ok(json)
}

/// Write `value` to `path` (see [`to_pretty_string`]), creating parent dirs.
pub fn write_pretty<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = to_pretty_string(value)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    std::fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

/// Read and deserialize a JSON file.
pub fn read<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("invalid JSON in {}", path.display()))
}

/// Like [`read`], but `None` when the file does not exist.
pub fn read_if_exists<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    if !path.exists() {
        return Ok(None);
    }
    read(path).map(Some)
}
