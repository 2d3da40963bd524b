//! Figure file naming, image URL resolution and gallery entry text

use std::path::Path;
use std::sync::LazyLock;

use anyhow::{Context, Result};
use bibharvest_core::Fetch;
use bibharvest_pubmed::PublicationRecord;
use regex::Regex;

use crate::gallery::FigureRecord;
use crate::license::LicenseInfo;

/// Stand-in title for records without one
pub const UNTITLED: &str = "Publication figure";

const DEFAULT_EXTENSION: &str = ".jpg";

static UNSAFE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9._-]+").expect("valid regex"));

static SRC_ATTR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"src="([^"]*)""#).expect("valid regex"));

/// Replace each run of characters outside `[A-Za-z0-9._-]` with one
/// hyphen and trim hyphens from both ends. Empty results become `figure`.
pub fn safe_filename(value: &str) -> String {
    let replaced = UNSAFE_RUN.replace_all(value, "-");
    let trimmed = replaced.trim_matches('-');
    if trimmed.is_empty() {
        "figure".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Local file name for a record's figure: `<pmid>-<last href component>`,
/// sanitised, with `.jpg` added when there is no extension.
pub fn figure_file_name(pmid: &str, href: &str) -> String {
    let last = href.trim_end_matches('/').rsplit('/').next().unwrap_or(href);
    let mut name = safe_filename(&format!("{pmid}-{last}"));
    if !name.contains('.') {
        name.push_str(DEFAULT_EXTENSION);
    }
    name
}

/// Find the rendered image URL for `href` on the article page.
///
/// The first `src="..."` whose value contains `href` wins. Without one,
/// falls back to `<article_url>bin/<href>`.
pub fn resolve_image_url(html: &str, href: &str, article_url: &str) -> String {
    SRC_ATTR
        .captures_iter(html)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str())
        .find(|src| !href.is_empty() && src.contains(href))
        .map(unescape_src)
        .unwrap_or_else(|| format!("{article_url}bin/{href}"))
}

fn unescape_src(src: &str) -> String {
    match quick_xml::escape::unescape(src) {
        Ok(s) => s.into_owned(),
        Err(_) => src.replace("&amp;", "&"),
    }
}

/// Fetch the article page, resolve the image URL and save the bytes.
pub fn download_figure(
    fetch: &dyn Fetch,
    article_url: &str,
    href: &str,
    path: &Path,
) -> Result<()> {
    let html = fetch
        .get_text(article_url)
        .with_context(|| format!("Failed to fetch article page {article_url}"))?;
    let image_url = resolve_image_url(&html, href, article_url);
    log::debug!("Downloading {image_url}");
    let bytes = fetch
        .get(&image_url)
        .with_context(|| format!("Failed to download figure {image_url}"))?;
    std::fs::write(path, bytes).with_context(|| format!("Failed to write {}", path.display()))
}

/// Caption fallback: located caption, then `title (year)`, then title.
pub fn caption_text(located: Option<String>, title: &str, year: Option<i32>) -> String {
    located.unwrap_or_else(|| match year {
        Some(year) => format!("{title} ({year})"),
        None => title.to_string(),
    })
}

/// Gallery entry for a publication's figure stored at `src`.
pub fn describe(
    item: &PublicationRecord,
    src: String,
    caption: Option<String>,
    license: &LicenseInfo,
) -> FigureRecord {
    let title = item.title.as_deref().unwrap_or(UNTITLED);
    FigureRecord {
        src,
        alt: Some(format!("Figure from: {title}")),
        caption: Some(caption_text(caption, title, item.year)),
        link: item.best_link().map(str::to_string),
        credit: license.credit(),
        extra: Default::default(),
    }
}
