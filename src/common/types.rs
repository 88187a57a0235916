use crate::common::constants::NOT_AVAILABLE;
use serde::{Deserialize, Serialize};

fn na() -> String {
    NOT_AVAILABLE.to_string()
}

/// One row of the tracking worksheet selected for scraping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubcategoryLink {
    pub main_state: String,
    pub council_name: String,
    pub subcategory_url: String,
}

/// Breadcrumb names of the subcategory page a listing was found on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryInfo {
    pub category_name: String,
    pub subcategory_name: String,
}

impl Default for CategoryInfo {
    fn default() -> Self {
        Self {
            category_name: na(),
            subcategory_name: na(),
        }
    }
}

/// A single search result on a subcategory page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceListing {
    pub company_name: String,
    pub service_area: String,
    pub ndis_provider: bool,
    pub details_url: String,
}

/// Fields scraped from a business profile page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceDetails {
    pub about: String,
    pub location: String,
    pub suburb: String,
    pub state: String,
    pub postal_code: String,
    pub latitude: String,
    pub longitude: String,
    pub website: String,
    pub phone: String,
    pub outlet: String,
}

impl Default for ServiceDetails {
    fn default() -> Self {
        Self {
            about: na(),
            location: na(),
            suburb: na(),
            state: na(),
            postal_code: na(),
            latitude: na(),
            longitude: na(),
            website: na(),
            phone: na(),
            outlet: na(),
        }
    }
}

/// Everything known about a listing, merged from tracking metadata, the
/// subcategory page and the profile page. Maps 1:1 onto the output worksheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutletRecord {
    pub main_state: String,
    pub council_name: String,
    pub services: String,
    pub category: CategoryInfo,
    pub listing: ServiceListing,
    pub details: ServiceDetails,
    pub subcategory_url: String,
}

impl OutletRecord {
    pub fn new(
        link: &SubcategoryLink,
        category: &CategoryInfo,
        listing: ServiceListing,
        details: ServiceDetails,
        services: String,
    ) -> Self {
        Self {
            main_state: link.main_state.clone(),
            council_name: link.council_name.clone(),
            services,
            category: category.clone(),
            listing,
            details,
            subcategory_url: link.subcategory_url.clone(),
        }
    }

    pub fn outlet(&self) -> &str {
        &self.details.outlet
    }

    pub fn ndis_flag(&self) -> &'static str {
        if self.listing.ndis_provider {
            "Yes"
        } else {
            "No"
        }
    }

    /// Cell value for an output column, `None` for columns this record does not own
    /// (including `Timestamp`, which is stamped at write time).
    pub fn field(&self, column: &str) -> Option<&str> {
        let value = match column.trim().to_ascii_lowercase().as_str() {
            "main_state" => self.main_state.as_str(),
            "council_name" => self.council_name.as_str(),
            "services" => self.services.as_str(),
            "company_name" => self.listing.company_name.as_str(),
            "service_area" => self.listing.service_area.as_str(),
            "ndis_provider" => self.ndis_flag(),
            "about" => self.details.about.as_str(),
            "outlet" => self.details.outlet.as_str(),
            "details_url" => self.listing.details_url.as_str(),
            "location" => self.details.location.as_str(),
            "suburb" => self.details.suburb.as_str(),
            "state" => self.details.state.as_str(),
            "postal_code" => self.details.postal_code.as_str(),
            "latitude" => self.details.latitude.as_str(),
            "longitude" => self.details.longitude.as_str(),
            "website" => self.details.website.as_str(),
            "phone" => self.details.phone.as_str(),
            "subcategory_url" => self.subcategory_url.as_str(),
            _ => return None,
        };
        Some(value)
    }
}

/// A listing that already existed in the output sheet, recorded in the skipped ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedEntry {
    pub council_name: String,
    pub category_name: String,
    pub subcategory_name: String,
    pub company_name: String,
    pub details_url: String,
    pub outlet: String,
    pub location: String,
}

impl From<&OutletRecord> for SkippedEntry {
    fn from(record: &OutletRecord) -> Self {
        Self {
            council_name: record.council_name.clone(),
            category_name: record.category.category_name.clone(),
            subcategory_name: record.category.subcategory_name.clone(),
            company_name: record.listing.company_name.clone(),
            details_url: record.listing.details_url.clone(),
            outlet: record.details.outlet.clone(),
            location: record.details.location.clone(),
        }
    }
}

impl SkippedEntry {
    /// Ledger row without the timestamp column.
    pub fn cells(&self) -> Vec<String> {
        vec![
            self.council_name.clone(),
            self.category_name.clone(),
            self.subcategory_name.clone(),
            self.company_name.clone(),
            self.details_url.clone(),
            self.outlet.clone(),
            self.location.clone(),
        ]
    }
}

/// Where the previous run stopped, read from the bottom of the output sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastScraped {
    pub subcategory_url: String,
    pub details_url: String,
    pub outlet: String,
}

/// A subcategory found while walking the directory, destined for the tracking sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveredSubcategory {
    pub council_name: String,
    pub council_url: String,
    pub category_name: String,
    pub category_url: String,
    pub subcategory_name: String,
    pub subcategory_url: String,
    pub result_count: u32,
}

impl DiscoveredSubcategory {
    pub fn to_row(&self, timestamp: &str) -> Vec<String> {
        vec![
            self.council_name.clone(),
            self.council_url.clone(),
            self.category_name.clone(),
            self.category_url.clone(),
            self.subcategory_name.clone(),
            self.subcategory_url.clone(),
            self.result_count.to_string(),
            timestamp.to_string(),
        ]
    }
}
