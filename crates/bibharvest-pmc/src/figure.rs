//! Locate the first figure of an article

use bibharvest_core::Element;

/// Image reference and caption of an article's first `<fig>`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FigureRef {
    /// `href` of the first `<graphic>` inside the figure
    pub href: Option<String>,
    pub caption: Option<String>,
}

/// Only the first `<fig>` in document order is considered. A figure
/// without a graphic reference, or with a blank one, leaves `href` empty
/// and the article has no usable figure.
pub fn find_first_figure(root: &Element) -> FigureRef {
    let Some(fig) = root.find("fig") else {
        return FigureRef::default();
    };
    let caption = fig.find("caption").and_then(Element::text);
    let href = fig
        .find("graphic")
        .and_then(|graphic| graphic.attr("href"))
        .map(str::trim)
        .filter(|href| !href.is_empty())
        .map(str::to_string);
    FigureRef { href, caption }
}
