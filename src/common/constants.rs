//! Shared names and literals for the directory site and the worksheets.

// Placeholder written into any cell whose value could not be extracted
pub const NOT_AVAILABLE: &str = "N/A";

pub const DIRECTORY_BASE_URL: &str = "https://www.mycommunitydirectory.com.au";
pub const DEFAULT_STATE_URL: &str = "https://www.mycommunitydirectory.com.au/Victoria/";

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// Separator used for the `services` tag list
pub const SERVICES_SEPARATOR: &str = ", ";

pub const DEFAULT_TRACKING_WORKSHEET: &str = "Tracking Code (0 results)";

/// Output worksheet header row, one column per scraped field.
pub const OUTPUT_HEADERS: [&str; 19] = [
    "Timestamp",
    "main_state",
    "council_name",
    "services",
    "company_name",
    "service_area",
    "ndis_provider",
    "about",
    "outlet",
    "details_url",
    "location",
    "suburb",
    "state",
    "postal_code",
    "latitude",
    "longitude",
    "website",
    "phone",
    "subcategory_url",
];

/// Skipped-ledger header row.
pub const SKIPPED_HEADERS: [&str; 8] = [
    "Timestamp",
    "council_name",
    "category_name",
    "subcategory_name",
    "company_name",
    "details_url",
    "outlet",
    "location",
];

/// Tracking worksheet header row written by discovery.
pub const TRACKING_HEADERS: [&str; 8] = [
    "Council",
    "Council URL",
    "Category",
    "Category URL",
    "Subcategory",
    "Subcategory URL",
    "Result",
    "Time Added",
];

// Column names looked up by the resume protocol
pub const COL_SERVICES: &str = "services";
pub const COL_COMPANY: &str = "company_name";
pub const COL_OUTLET: &str = "outlet";
pub const COL_DETAILS_URL: &str = "details_url";
pub const COL_SUBCATEGORY_URL: &str = "subcategory_url";

pub const COL_TRACK_COUNCIL: &str = "Council";
pub const COL_TRACK_COUNCIL_URL: &str = "Council URL";
pub const COL_TRACK_SUBCATEGORY_URL: &str = "Subcategory URL";
pub const COL_TRACK_RESULT: &str = "Result";

/// Name of the skipped ledger worksheet for a council.
pub fn skipped_worksheet_name(council: &str) -> String {
    format!("Skipped Link ({})", council)
}

/// Current local time formatted the way every worksheet stores it.
pub fn timestamp_now() -> String {
    chrono::Local::now().format(TIMESTAMP_FORMAT).to_string()
}

pub fn is_missing(value: &str) -> bool {
    let v = value.trim();
    v.is_empty() || v == NOT_AVAILABLE
}
