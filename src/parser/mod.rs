//! HTML extraction for the directory's state, council, subcategory and profile pages.

pub mod detail;
pub mod directory;
pub mod listing;
pub mod location;

pub use detail::parse_details;
pub use directory::{parse_council_categories, parse_state_councils, CategoryLinks, CouncilLink};
pub use listing::{parse_category_info, parse_result_count, parse_service_listings};
pub use location::{extract_lat_long, extract_main_state, extract_outlet, parse_location};

use crate::common::constants::NOT_AVAILABLE;
use reqwest::Url;
use scraper::{ElementRef, Selector};

/// Parse a selector that is a compile-time constant.
pub(crate) fn selector(css: &str) -> Selector {
    Selector::parse(css).unwrap_or_else(|e| panic!("invalid selector {css:?}: {e:?}"))
}

/// Visible text of an element with runs of whitespace collapsed.
pub(crate) fn element_text(el: &ElementRef) -> String {
    el.text()
        .flat_map(|t| t.split_whitespace())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Text of the first match of `sel` under `el`, if it is non-empty.
pub(crate) fn first_text(el: &ElementRef, sel: &Selector) -> Option<String> {
    el.select(sel)
        .map(|e| element_text(&e))
        .find(|t| !t.is_empty())
}

/// Resolve `href` against `base`; absolute links pass through unchanged.
pub fn absolute_url(base: &str, href: &str) -> String {
    let href = href.trim();
    if href.is_empty() {
        return NOT_AVAILABLE.to_string();
    }
    match Url::parse(base).and_then(|b| b.join(href)) {
        Ok(u) => u.to_string(),
        Err(_) => href.to_string(),
    }
}

pub(crate) fn or_na(value: Option<String>) -> String {
    value.unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absolute_url() {
        assert_eq!(
            absolute_url("https://www.mycommunitydirectory.com.au", "/Victoria/Banyule"),
            "https://www.mycommunitydirectory.com.au/Victoria/Banyule"
        );
        assert_eq!(
            absolute_url("https://www.mycommunitydirectory.com.au", "https://other.org/x"),
            "https://other.org/x"
        );
        assert_eq!(absolute_url("https://www.mycommunitydirectory.com.au", "  "), NOT_AVAILABLE);
    }
}
