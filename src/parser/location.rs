//! Regex helpers for addresses and directory URLs.

use crate::common::constants::NOT_AVAILABLE;
use once_cell::sync::Lazy;
use regex::Regex;

static LOCATION_WITH_COMMA: Lazy<Regex> =
    Lazy::new(|| Regex::new(r",\s*([\w\s]+)\s([A-Z]{2,3})\s(\d{4})$").unwrap());
static LOCATION_PLAIN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([\w\s]+)\s([A-Z]{2,3})\s(\d{4})$").unwrap());
static OUTLET_IN_URL: Lazy<Regex> = Lazy::new(|| Regex::new(r"/(\d+)/[^/]+/?$").unwrap());
static STATE_IN_URL: Lazy<Regex> = Lazy::new(|| Regex::new(r"\.au/([^/]+)/").unwrap());
static MAP_CENTER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"center=(-?\d+\.\d+)(?:,|%2C)(-?\d+\.\d+)").unwrap());

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressParts {
    pub suburb: String,
    pub state: String,
    pub postal_code: String,
}

impl Default for AddressParts {
    fn default() -> Self {
        Self {
            suburb: NOT_AVAILABLE.to_string(),
            state: NOT_AVAILABLE.to_string(),
            postal_code: NOT_AVAILABLE.to_string(),
        }
    }
}

/// Split an Australian address into suburb, state and postcode.
///
/// `"12 High St, Heidelberg VIC 3084"` is tried first (suburb after the last
/// comma), then `"Heidelberg VIC 3084"`. Anything else yields `N/A` parts.
pub fn parse_location(location: &str) -> AddressParts {
    let location = location.trim();
    let caps = LOCATION_WITH_COMMA
        .captures(location)
        .or_else(|| LOCATION_PLAIN.captures(location));

    match caps {
        Some(c) => AddressParts {
            suburb: c[1].trim().to_string(),
            state: c[2].trim().to_string(),
            postal_code: c[3].trim().to_string(),
        },
        None => AddressParts::default(),
    }
}

/// Numeric outlet id from a profile URL such as `.../Heidelberg/Food-Bank/12345/98765`.
pub fn extract_outlet(details_url: &str) -> String {
    OUTLET_IN_URL
        .captures(details_url.trim())
        .map(|c| c[1].to_string())
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

/// State segment of a directory URL, e.g. `Victoria` for `https://x.com.au/Victoria/Banyule`.
pub fn extract_main_state(url: &str) -> String {
    if let Some(c) = STATE_IN_URL.captures(url) {
        return c[1].to_string();
    }
    url.split('/')
        .nth(3)
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

/// Latitude and longitude from a static map `center=` parameter anywhere in `text`.
pub fn extract_lat_long(text: &str) -> Option<(String, String)> {
    MAP_CENTER
        .captures(text)
        .map(|c| (c[1].to_string(), c[2].to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_location_with_street() {
        let parts = parse_location("1 Flintoff St, Greensborough VIC 3088");
        assert_eq!(parts.suburb, "Greensborough");
        assert_eq!(parts.state, "VIC");
        assert_eq!(parts.postal_code, "3088");
    }

    #[test]
    fn test_parse_location_multi_word_suburb() {
        let parts = parse_location("Heidelberg West VIC 3081");
        assert_eq!(parts.suburb, "Heidelberg West");
        assert_eq!(parts.state, "VIC");
        assert_eq!(parts.postal_code, "3081");
    }

    #[test]
    fn test_parse_location_unparseable() {
        assert_eq!(parse_location("Statewide"), AddressParts::default());
        assert_eq!(parse_location(""), AddressParts::default());
    }

    #[test]
    fn test_extract_outlet() {
        assert_eq!(
            extract_outlet("https://www.mycommunitydirectory.com.au/Victoria/Ivanhoe/Banyule_Community_Health/45678/123456"),
            "45678"
        );
        assert_eq!(
            extract_outlet("https://www.mycommunitydirectory.com.au/Victoria/Ivanhoe/Foo/45678/123456/"),
            "45678"
        );
        assert_eq!(extract_outlet("https://example.com/no/ids/here"), NOT_AVAILABLE);
    }

    #[test]
    fn test_extract_main_state() {
        assert_eq!(
            extract_main_state("https://www.mycommunitydirectory.com.au/Victoria/Banyule"),
            "Victoria"
        );
        assert_eq!(extract_main_state("not a url"), NOT_AVAILABLE);
    }

    #[test]
    fn test_extract_lat_long() {
        let src = "https://maps.googleapis.com/maps/api/staticmap?center=-37.7512,145.0687&zoom=15";
        assert_eq!(
            extract_lat_long(src),
            Some(("-37.7512".to_string(), "145.0687".to_string()))
        );
        assert_eq!(extract_lat_long("no map here"), None);
    }
}
