//! Counters and histograms for a scrape run.
//!
//! Recording is always on; the values are only exported when a Prometheus
//! listener is installed with [`init`].

use std::net::SocketAddr;
use tracing::info;

/// Every metric name used by the crate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricName {
    // Fetch metrics
    FetchSuccess,
    FetchError,
    FetchRetries,
    FetchDuration,
    FetchBytes,

    // Tracking metrics
    ListingsAppended,
    ListingsMerged,
    ListingsUnchanged,
    LedgerEntriesWritten,
    SubcategoriesCompleted,
    DetailFailures,

    // Discovery metrics
    SubcategoriesDiscovered,
}

impl MetricName {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricName::FetchSuccess => "council_scraper_fetch_success_total",
            MetricName::FetchError => "council_scraper_fetch_error_total",
            MetricName::FetchRetries => "council_scraper_fetch_retries_total",
            MetricName::FetchDuration => "council_scraper_fetch_duration_seconds",
            MetricName::FetchBytes => "council_scraper_fetch_bytes",

            MetricName::ListingsAppended => "council_scraper_listings_appended_total",
            MetricName::ListingsMerged => "council_scraper_listings_merged_total",
            MetricName::ListingsUnchanged => "council_scraper_listings_unchanged_total",
            MetricName::LedgerEntriesWritten => "council_scraper_ledger_entries_written_total",
            MetricName::SubcategoriesCompleted => "council_scraper_subcategories_completed_total",
            MetricName::DetailFailures => "council_scraper_detail_failures_total",

            MetricName::SubcategoriesDiscovered => "council_scraper_subcategories_discovered_total",
        }
    }
}

/// Install the Prometheus recorder with an HTTP listener on `listen`.
///
/// Must be called from inside the tokio runtime.
pub fn init(listen: SocketAddr) -> Result<(), Box<dyn std::error::Error>> {
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(listen)
        .install()
        .map_err(|e| format!("Failed to install Prometheus recorder: {}", e))?;
    info!("Prometheus metrics listening on {}", listen);
    Ok(())
}

pub mod fetch {
    use super::MetricName;

    pub fn success(duration_secs: f64, bytes: usize) {
        ::metrics::counter!(MetricName::FetchSuccess.as_str()).increment(1);
        ::metrics::histogram!(MetricName::FetchDuration.as_str()).record(duration_secs);
        ::metrics::histogram!(MetricName::FetchBytes.as_str()).record(bytes as f64);
    }

    pub fn error() {
        ::metrics::counter!(MetricName::FetchError.as_str()).increment(1);
    }

    pub fn retry() {
        ::metrics::counter!(MetricName::FetchRetries.as_str()).increment(1);
    }
}

pub mod tracking {
    use super::MetricName;

    pub fn listing_appended() {
        ::metrics::counter!(MetricName::ListingsAppended.as_str()).increment(1);
    }

    pub fn listing_merged() {
        ::metrics::counter!(MetricName::ListingsMerged.as_str()).increment(1);
    }

    pub fn listing_unchanged() {
        ::metrics::counter!(MetricName::ListingsUnchanged.as_str()).increment(1);
    }

    pub fn ledger_entry_written() {
        ::metrics::counter!(MetricName::LedgerEntriesWritten.as_str()).increment(1);
    }

    pub fn subcategory_completed() {
        ::metrics::counter!(MetricName::SubcategoriesCompleted.as_str()).increment(1);
    }

    pub fn detail_failed() {
        ::metrics::counter!(MetricName::DetailFailures.as_str()).increment(1);
    }
}

pub mod discovery {
    use super::MetricName;

    pub fn subcategory_discovered() {
        ::metrics::counter!(MetricName::SubcategoriesDiscovered.as_str()).increment(1);
    }
}
