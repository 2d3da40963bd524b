//! License detection on full-text archive XML

use bibharvest_core::Element;

const CC_URL_MARKER: &str = "creativecommons.org/licenses/";
const CC_TEXT_MARKER: &str = "Creative Commons";

/// License statement of an article: the first `<license>` element only.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LicenseInfo {
    /// First `href`-like attribute on the element, kept only when the
    /// statement is Creative Commons
    pub url: Option<String>,
    /// Flattened element text
    pub text: Option<String>,
}

impl LicenseInfo {
    pub fn is_creative_commons(&self) -> bool {
        self.url.as_deref().is_some_and(|url| url.contains(CC_URL_MARKER))
            || self.text.as_deref().is_some_and(|text| text.contains(CC_TEXT_MARKER))
    }

    /// Credit line for the figure gallery.
    pub fn credit(&self) -> Option<String> {
        match (&self.url, &self.text) {
            (Some(url), _) => Some(format!("License: {url}")),
            (None, Some(_)) => Some("License: see article".to_string()),
            (None, None) => None,
        }
    }
}

/// First element named `license` (any namespace), document order.
pub fn find_license(root: &Element) -> LicenseInfo {
    let Some(license) = root.find("license") else {
        return LicenseInfo::default();
    };
    let mut info = LicenseInfo {
        url: license.attr("href").map(str::to_string),
        text: license.text(),
    };
    if !info.is_creative_commons() {
        info.url = None;
    }
    info
}
