use super::{absolute_url, element_text, first_text, or_na, selector};
use crate::common::constants::NOT_AVAILABLE;
use crate::common::types::{CategoryInfo, ServiceListing};
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use tracing::debug;

static RESULT_ITEM: Lazy<Selector> = Lazy::new(|| selector("#results > li, li.search-result"));
static BUSINESS_NAME: Lazy<Selector> =
    Lazy::new(|| selector("h4.business-name, div.info h4 a, div.info h4"));
static DETAILS_LINK: Lazy<Selector> = Lazy::new(|| selector("a.orange, div.info h4 a"));
static SERVICE_AREA_LABEL: Lazy<Selector> = Lazy::new(|| selector("p[aria-label]"));
static SERVICE_AREA_ICON: Lazy<Selector> = Lazy::new(|| selector("div.contact-details p.icon-map15"));
static NDIS_MARKER: Lazy<Selector> = Lazy::new(|| {
    selector("img[title='Registered NDIS Provider'], div.info > a > img, a[href*='AccessingTheNDIS']")
});
static CRUMB_TITLES: Lazy<Selector> = Lazy::new(|| selector("span[itemprop='title']"));
static CRUMB_TRAIL: Lazy<Selector> = Lazy::new(|| selector("div.crumbtrail span"));
static RESULT_SUMMARY: Lazy<Selector> = Lazy::new(|| selector("p.search-summary strong"));

/// Search results on a subcategory page, in page order.
///
/// Relative profile links are resolved against `base_url`.
pub fn parse_service_listings(html: &str, base_url: &str) -> Vec<ServiceListing> {
    let document = Html::parse_document(html);
    let mut listings = Vec::new();

    for item in document.select(&RESULT_ITEM) {
        let company_name = or_na(first_text(&item, &BUSINESS_NAME));

        let details_url = item
            .select(&DETAILS_LINK)
            .find_map(|a| a.value().attr("href"))
            .map(|href| absolute_url(base_url, href))
            .unwrap_or_else(|| NOT_AVAILABLE.to_string());

        let service_area = item
            .select(&SERVICE_AREA_LABEL)
            .find_map(|p| p.value().attr("aria-label"))
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .or_else(|| first_text(&item, &SERVICE_AREA_ICON).map(|t| format!("Located in {}", t)))
            .unwrap_or_else(|| NOT_AVAILABLE.to_string());

        let ndis_provider = item.select(&NDIS_MARKER).next().is_some();

        listings.push(ServiceListing {
            company_name,
            service_area,
            ndis_provider,
            details_url,
        });
    }

    debug!("Parsed {} service listings", listings.len());
    listings
}

/// Category and subcategory names from the page breadcrumb.
///
/// The breadcrumb reads `Home > State > Council > Category > Subcategory`; a
/// page for a whole category has no fifth crumb and gets `N/A` for it.
pub fn parse_category_info(html: &str) -> CategoryInfo {
    let document = Html::parse_document(html);

    let mut crumbs: Vec<String> = document
        .select(&CRUMB_TITLES)
        .map(|e| element_text(&e))
        .collect();
    if crumbs.len() < 4 {
        crumbs = document
            .select(&CRUMB_TRAIL)
            .map(|e| element_text(&e))
            .collect();
    }

    let crumb = |idx: usize| {
        crumbs
            .get(idx)
            .filter(|s| !s.is_empty())
            .cloned()
            .unwrap_or_else(|| NOT_AVAILABLE.to_string())
    };

    if crumbs.len() < 4 {
        return CategoryInfo::default();
    }
    CategoryInfo {
        category_name: crumb(3),
        subcategory_name: crumb(4),
    }
}

/// Number of results announced by the search summary, zero when absent.
pub fn parse_result_count(html: &str) -> u32 {
    let document = Html::parse_document(html);
    document
        .select(&RESULT_SUMMARY)
        .next()
        .map(|e| element_text(&e))
        .and_then(|t| t.split_whitespace().next().map(|w| w.replace(',', "")))
        .and_then(|w| w.parse().ok())
        .unwrap_or(0)
}
