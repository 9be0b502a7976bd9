//! HTML scraping: harvest `<img src>` candidates, filter, select.
//!
//! Product pages carry many images — logos, thumbnails, sprites, the actual
//! product photo. This stage narrows them down with two predicates applied
//! to every candidate independently and joined by logical AND:
//!
//! ```text
//! src.starts_with("https://")  &&  src.ends_with(suffix)
//! ```
//!
//! The secure-scheme half is fixed; the suffix half defaults to `.jpg` and
//! comes from [`crate::config::CollageConfig::image_format`]. Selection from
//! the surviving list is a [`crate::config::CandidateSelection`] policy —
//! index 1 by default, see the config docs for why.

use scraper::{Html, Selector};

/// Scheme prefix every candidate must carry. Plain-HTTP image URLs are
/// rejected even when the suffix matches.
pub const SECURE_SCHEME: &str = "https://";

/// Collect the `src` attribute of every `<img>` element, in document order.
///
/// Elements without a `src` attribute are skipped. No filtering happens
/// here; this is the raw candidate list.
pub fn image_sources(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    // "img" is a valid selector; parse cannot fail on it.
    let selector = Selector::parse("img").expect("static selector");

    document
        .select(&selector)
        .filter_map(|element| element.value().attr("src"))
        .map(str::to_string)
        .collect()
}

/// Keep only candidates satisfying both predicates, preserving order.
pub fn filter_candidates(sources: &[String], suffix: &str) -> Vec<String> {
    sources
        .iter()
        .filter(|src| src.starts_with(SECURE_SCHEME) && src.ends_with(suffix))
        .cloned()
        .collect()
}
