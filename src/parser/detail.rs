use super::location::{extract_lat_long, extract_outlet, parse_location};
use super::{absolute_url, element_text, or_na, selector};
use crate::common::types::ServiceDetails;
use once_cell::sync::Lazy;
use scraper::{Html, Selector};

static DESCRIPTION: Lazy<Selector> = Lazy::new(|| selector("div.description"));
static DESCRIPTION_PARAGRAPHS: Lazy<Selector> = Lazy::new(|| selector("p"));
static LOCATION_ICON: Lazy<Selector> = Lazy::new(|| {
    selector(".contact-info p.icon-map15 a, .contact-info p.icon-map15 span, .contact-info p.icon-map15")
});
static LOCATION_LABELLED: Lazy<Selector> = Lazy::new(|| selector(".contact-info [aria-label]"));
static PHONE: Lazy<Selector> = Lazy::new(|| selector("a[href^='tel:']"));
static WEBSITE_BUTTON: Lazy<Selector> = Lazy::new(|| selector("a[aria-label='Go to their website']"));
static WEBSITE_ICON: Lazy<Selector> = Lazy::new(|| selector(".contact-info p.icon-website a"));
static WEBSITE_EXTERNAL: Lazy<Selector> = Lazy::new(|| selector("a[rel='ugc'][target='_blank']"));

/// Extract profile fields from a business page fetched from `page_url`.
///
/// The website is returned as linked from the page (usually a directory
/// redirect); following it is left to the caller.
pub fn parse_details(html: &str, page_url: &str, base_url: &str) -> ServiceDetails {
    let document = Html::parse_document(html);

    let about = document
        .select(&DESCRIPTION)
        .next()
        .map(|desc| {
            let paragraphs: Vec<String> = desc
                .select(&DESCRIPTION_PARAGRAPHS)
                .map(|p| element_text(&p))
                .filter(|t| !t.is_empty())
                .collect();
            if paragraphs.is_empty() {
                element_text(&desc)
            } else {
                paragraphs.join("\n")
            }
        })
        .filter(|t| !t.is_empty());

    let location = document
        .select(&LOCATION_ICON)
        .map(|e| element_text(&e))
        .find(|t| !t.is_empty())
        .or_else(|| {
            document.select(&LOCATION_LABELLED).find_map(|e| {
                let text = element_text(&e);
                let text = if text.is_empty() {
                    e.value().attr("aria-label").unwrap_or_default().to_string()
                } else {
                    text
                };
                let text = text.trim_start_matches("Address:").trim().to_string();
                (!text.is_empty()).then_some(text)
            })
        });

    let phone = document.select(&PHONE).next().and_then(|a| {
        let text = element_text(&a);
        if text.is_empty() {
            a.value()
                .attr("href")
                .map(|h| h.trim_start_matches("tel:").trim().to_string())
        } else {
            Some(text)
        }
    });

    let website = [&*WEBSITE_BUTTON, &*WEBSITE_ICON, &*WEBSITE_EXTERNAL]
        .iter()
        .find_map(|sel| document.select(sel).find_map(|a| a.value().attr("href")))
        .map(|href| absolute_url(base_url, href));

    let (latitude, longitude) = match extract_lat_long(html) {
        Some((lat, lng)) => (Some(lat), Some(lng)),
        None => (None, None),
    };

    let address = parse_location(location.as_deref().unwrap_or_default());

    ServiceDetails {
        about: or_na(about),
        location: or_na(location),
        suburb: address.suburb,
        state: address.state,
        postal_code: address.postal_code,
        latitude: or_na(latitude),
        longitude: or_na(longitude),
        website: or_na(website),
        phone: or_na(phone),
        outlet: extract_outlet(page_url),
    }
}
