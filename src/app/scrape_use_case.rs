use crate::app::ports::{PageFetcher, RowStore};
use crate::common::constants::is_missing;
use crate::common::error::Result;
use crate::common::types::{OutletRecord, ServiceDetails, ServiceListing, SubcategoryLink};
use crate::infra::pacing::Pacer;
use crate::observability::metrics;
use crate::parser::{extract_outlet, parse_category_info, parse_details, parse_service_listings};
use crate::tracking::{
    format_unique_categories, last_scraped_entry, resume_from, subcategory_links, OutputSheet,
    SkippedLedger, Table, UpsertOutcome,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, info_span, instrument, warn, Instrument};
use uuid::Uuid;

/// The three worksheets a scrape reads and writes.
#[derive(Clone)]
pub struct ScrapeStores {
    pub tracking: Arc<dyn RowStore>,
    pub output: Arc<dyn RowStore>,
    pub skipped: Arc<dyn RowStore>,
}

#[derive(Debug, Clone)]
pub struct ScrapeOptions {
    pub council: String,
    pub base_url: String,
    /// Profile page attempts before falling back to `N/A` details
    pub detail_attempts: u32,
    pub resolve_websites: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScrapeSummary {
    pub run_id: String,
    pub subcategories: usize,
    pub listings_seen: usize,
    pub appended: usize,
    pub merged: usize,
    pub unchanged: usize,
    pub ledger_entries: usize,
    pub detail_failures: usize,
    pub errors: usize,
}

/// Scrape every remaining subcategory of one council into the output sheet.
pub struct ScrapeUseCase {
    fetcher: Arc<dyn PageFetcher>,
    stores: ScrapeStores,
    options: ScrapeOptions,
    pacer: Pacer,
}

impl ScrapeUseCase {
    pub fn new(fetcher: Arc<dyn PageFetcher>, stores: ScrapeStores, options: ScrapeOptions, pacer: Pacer) -> Self {
        Self {
            fetcher,
            stores,
            options,
            pacer,
        }
    }

    #[instrument(skip(self), fields(council = %self.options.council))]
    pub async fn run(&self) -> Result<ScrapeSummary> {
        let mut summary = ScrapeSummary {
            run_id: Uuid::new_v4().to_string(),
            ..ScrapeSummary::default()
        };
        info!("Starting scrape run {}", summary.run_id);

        let tracking = Table::load(self.stores.tracking.as_ref()).await?;
        let links = subcategory_links(&tracking, &self.options.council)?;
        info!("Tracking sheet lists {} subcategories with results", links.len());

        let mut output = OutputSheet::open(Arc::clone(&self.stores.output)).await?;
        let mut ledger = SkippedLedger::open(Arc::clone(&self.stores.skipped)).await?;

        let last = last_scraped_entry(&Table::load(self.stores.output.as_ref()).await?)?;
        let remaining = resume_from(links, last.as_ref());
        if remaining.is_empty() {
            info!("All subcategories already scraped");
            return Ok(summary);
        }

        let total = remaining.len();
        for (i, link) in remaining.iter().enumerate() {
            let span = info_span!("subcategory", n = i + 1, of = total, url = %link.subcategory_url);
            self.scrape_subcategory(link, &mut output, &mut ledger, &mut summary)
                .instrument(span)
                .await?;
        }

        summary.ledger_entries = ledger.written();
        info!(
            "Run {} finished: {} subcategories, {} listings ({} new, {} merged, {} unchanged), {} errors",
            summary.run_id,
            summary.subcategories,
            summary.listings_seen,
            summary.appended,
            summary.merged,
            summary.unchanged,
            summary.errors
        );
        Ok(summary)
    }

    /// Fetch failures are logged and counted; only row store failures abort the run.
    async fn scrape_subcategory(
        &self,
        link: &SubcategoryLink,
        output: &mut OutputSheet,
        ledger: &mut SkippedLedger,
        summary: &mut ScrapeSummary,
    ) -> Result<()> {
        let html = match self.fetcher.fetch(&link.subcategory_url).await {
            Ok(html) => html,
            Err(e) => {
                error!("Failed to load subcategory page: {}", e);
                summary.errors += 1;
                return Ok(());
            }
        };
        self.pacer.wait().await;

        let listings = parse_service_listings(&html, &self.options.base_url);
        if listings.is_empty() {
            warn!("No listings found on subcategory page");
            summary.subcategories += 1;
            metrics::tracking::subcategory_completed();
            return Ok(());
        }

        let category = parse_category_info(&html);
        let services = format_unique_categories(&category.category_name, &category.subcategory_name);
        info!(
            "Found {} listings in {} / {}",
            listings.len(),
            category.category_name,
            category.subcategory_name
        );

        for listing in listings {
            summary.listings_seen += 1;
            let details = self.fetch_details(&listing, summary).await;
            let record = OutletRecord::new(link, &category, listing, details, services.clone());
            match output.upsert(&record, ledger).await? {
                UpsertOutcome::Appended { .. } => summary.appended += 1,
                UpsertOutcome::Merged { .. } => summary.merged += 1,
                UpsertOutcome::Unchanged { .. } => summary.unchanged += 1,
            }
        }

        summary.subcategories += 1;
        metrics::tracking::subcategory_completed();
        Ok(())
    }

    /// Profile page fields, or `N/A` defaults (keeping the outlet id from the URL)
    /// once every attempt has failed.
    async fn fetch_details(&self, listing: &ServiceListing, summary: &mut ScrapeSummary) -> ServiceDetails {
        let url = listing.details_url.as_str();
        if is_missing(url) {
            warn!("Listing '{}' has no profile link", listing.company_name);
            return ServiceDetails::default();
        }

        let attempts = self.options.detail_attempts.max(1);
        for attempt in 1..=attempts {
            match self.fetcher.fetch(url).await {
                Ok(html) => {
                    let mut details = parse_details(&html, url, &self.options.base_url);
                    if self.options.resolve_websites && !is_missing(&details.website) {
                        match self.fetcher.resolve(&details.website).await {
                            Ok(resolved) => details.website = resolved,
                            Err(e) => warn!("Could not resolve website {}: {}", details.website, e),
                        }
                    }
                    self.pacer.wait().await;
                    return details;
                }
                Err(e) => {
                    warn!("Profile attempt {}/{} for {} failed: {}", attempt, attempts, url, e);
                    self.pacer.wait().await;
                }
            }
        }

        error!("Giving up on profile page {}", url);
        summary.detail_failures += 1;
        metrics::tracking::detail_failed();
        ServiceDetails {
            outlet: extract_outlet(url),
            ..ServiceDetails::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::constants::{OUTPUT_HEADERS, TRACKING_HEADERS};
    use crate::common::error::ScraperError;
    use crate::infra::memory_store::InMemoryRowStore;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    const BASE: &str = "https://www.mycommunitydirectory.com.au";
    const DENTAL: &str = "https://www.mycommunitydirectory.com.au/Victoria/Banyule/Health/Dental";

    struct MockFetcher {
        pages: HashMap<String, String>,
        redirects: HashMap<String, String>,
        requested: Mutex<Vec<String>>,
    }

    impl MockFetcher {
        fn new(pages: &[(&str, String)]) -> Self {
            Self {
                pages: pages.iter().map(|(u, h)| (u.to_string(), h.clone())).collect(),
                redirects: HashMap::new(),
                requested: Mutex::new(Vec::new()),
            }
        }

        fn with_redirect(mut self, from: &str, to: &str) -> Self {
            self.redirects.insert(from.to_string(), to.to_string());
            self
        }

        fn request_count(&self) -> usize {
            self.requested.lock().unwrap().len()
        }

        fn requests_for(&self, url: &str) -> usize {
            self.requested.lock().unwrap().iter().filter(|u| *u == url).count()
        }
    }

    #[async_trait]
    impl PageFetcher for MockFetcher {
        async fn fetch(&self, url: &str) -> Result<String> {
            self.requested.lock().unwrap().push(url.to_string());
            self.pages
                .get(url)
                .cloned()
                .ok_or_else(|| ScraperError::fetch(url, "not found"))
        }

        async fn resolve(&self, url: &str) -> Result<String> {
            self.redirects
                .get(url)
                .cloned()
                .ok_or_else(|| ScraperError::fetch(url, "redirect failed"))
        }
    }

    fn listing_page(category: &str, subcategory: &str, outlets: &[(&str, &str)]) -> String {
        let items: String = outlets
            .iter()
            .map(|(id, name)| {
                format!(
                    r#"<li><div class="info"><h4><a href="/Victoria/Banyule/{id}/{name}">{name}</a></h4></div></li>"#
                )
            })
            .collect();
        format!(
            r#"<html><body>
            <span itemprop="title">Home</span><span itemprop="title">Victoria</span>
            <span itemprop="title">Banyule</span><span itemprop="title">{category}</span>
            <span itemprop="title">{subcategory}</span>
            <ul id="results">{items}</ul></body></html>"#
        )
    }

    fn tracking_store(urls: &[&str]) -> InMemoryRowStore {
        let mut rows = vec![TRACKING_HEADERS.iter().map(|h| h.to_string()).collect::<Vec<_>>()];
        for url in urls {
            rows.push(
                [
                    "Banyule Council",
                    "https://www.mycommunitydirectory.com.au/Victoria/Banyule",
                    "Health",
                    "",
                    "x",
                    url,
                    "3",
                    "",
                ]
                .iter()
                .map(|c| c.to_string())
                .collect(),
            );
        }
        InMemoryRowStore::with_rows("Tracking Code (0 results)", rows)
    }

    fn use_case(fetcher: Arc<MockFetcher>, tracking: &InMemoryRowStore, output: &InMemoryRowStore, skipped: &InMemoryRowStore) -> ScrapeUseCase {
        use_case_resolving(fetcher, tracking, output, skipped, false)
    }

    fn use_case_resolving(
        fetcher: Arc<MockFetcher>,
        tracking: &InMemoryRowStore,
        output: &InMemoryRowStore,
        skipped: &InMemoryRowStore,
        resolve_websites: bool,
    ) -> ScrapeUseCase {
        ScrapeUseCase::new(
            fetcher,
            ScrapeStores {
                tracking: Arc::new(tracking.clone()),
                output: Arc::new(output.clone()),
                skipped: Arc::new(skipped.clone()),
            },
            ScrapeOptions {
                council: "Banyule Council".into(),
                base_url: BASE.into(),
                detail_attempts: 2,
                resolve_websites,
            },
            Pacer::disabled(),
        )
    }

    #[tokio::test]
    async fn test_scrape_appends_listings_and_falls_back_on_failed_profiles() {
        let profile = format!("{BASE}/Victoria/Banyule/111/Smile");
        let fetcher = Arc::new(MockFetcher::new(&[
            (DENTAL, listing_page("Health", "Dental", &[("111", "Smile"), ("222", "Gone")])),
            (
                profile.as_str(),
                r#"<div class="contact-info"><p class="icon-map15"><span>1 Main St, Ivanhoe VIC 3079</span></p></div>"#.to_string(),
            ),
        ]));
        let tracking = tracking_store(&[DENTAL]);
        let output = InMemoryRowStore::new("Banyule Council");
        let skipped = InMemoryRowStore::new("Skipped");

        let summary = use_case(fetcher.clone(), &tracking, &output, &skipped).run().await.unwrap();

        assert_eq!(summary.subcategories, 1);
        assert_eq!(summary.appended, 2);
        assert_eq!(summary.detail_failures, 1);
        assert_eq!(fetcher.requests_for(&format!("{BASE}/Victoria/Banyule/222/Gone")), 2);

        let rows = output.snapshot();
        assert_eq!(rows[0], OUTPUT_HEADERS.iter().map(|h| h.to_string()).collect::<Vec<_>>());
        assert_eq!(rows[1][3], "Dental, Health");
        assert_eq!(rows[1][11], "Ivanhoe");
        assert_eq!(rows[2][8], "222");
        assert_eq!(rows[2][10], "N/A");
    }

    #[tokio::test]
    async fn test_website_redirects_are_resolved_when_possible() {
        let smile = format!("{BASE}/Victoria/Banyule/111/Smile");
        let bright = format!("{BASE}/Victoria/Banyule/222/Bright");
        let profile = |id: &str| {
            format!(r#"<div class="contact-info"><a aria-label="Go to their website" href="/redirect/{id}">Website</a></div>"#)
        };
        let fetcher = Arc::new(
            MockFetcher::new(&[
                (DENTAL, listing_page("Health", "Dental", &[("111", "Smile"), ("222", "Bright")])),
                (smile.as_str(), profile("111")),
                (bright.as_str(), profile("222")),
            ])
            .with_redirect(&format!("{BASE}/redirect/111"), "https://smile.example.com/"),
        );
        let tracking = tracking_store(&[DENTAL]);
        let output = InMemoryRowStore::new("Banyule Council");
        let skipped = InMemoryRowStore::new("Skipped");

        let summary = use_case_resolving(fetcher, &tracking, &output, &skipped, true)
            .run()
            .await
            .unwrap();
        assert_eq!(summary.appended, 2);

        let rows = output.snapshot();
        assert_eq!(rows[1][16], "https://smile.example.com/");
        // Failed resolution keeps the directory link.
        assert_eq!(rows[2][16], format!("{BASE}/redirect/222"));
    }

    #[tokio::test]
    async fn test_listing_without_profile_link_is_saved_without_fetch() {
        let page = DENTAL_NO_LINK_PAGE.to_string();
        let fetcher = Arc::new(MockFetcher::new(&[(DENTAL, page)]));
        let tracking = tracking_store(&[DENTAL]);
        let output = InMemoryRowStore::new("Banyule Council");
        let skipped = InMemoryRowStore::new("Skipped");

        let summary = use_case(fetcher.clone(), &tracking, &output, &skipped).run().await.unwrap();
        assert_eq!(summary.appended, 1);
        assert_eq!(summary.detail_failures, 0);
        // Only the subcategory page was requested.
        assert_eq!(fetcher.request_count(), 1);

        let rows = output.snapshot();
        assert_eq!(rows[1][4], "Walk-in Clinic");
        assert_eq!(rows[1][8], "N/A");
        assert_eq!(rows[1][9], "N/A");
        assert_eq!(rows[1][3], "Dental, Health");
    }

    const DENTAL_NO_LINK_PAGE: &str = r#"<html><body>
        <span itemprop="title">Home</span><span itemprop="title">Victoria</span>
        <span itemprop="title">Banyule</span><span itemprop="title">Health</span>
        <span itemprop="title">Dental</span>
        <ul id="results"><li><div class="info"><h4>Walk-in Clinic</h4></div></li></ul>
        </body></html>"#;

    #[tokio::test]
    async fn test_unreachable_subcategory_is_counted_and_skipped() {
        let fetcher = Arc::new(MockFetcher::new(&[]));
        let tracking = tracking_store(&[DENTAL]);
        let output = InMemoryRowStore::new("Banyule Council");
        let skipped = InMemoryRowStore::new("Skipped");

        let summary = use_case(fetcher, &tracking, &output, &skipped).run().await.unwrap();
        assert_eq!(summary.errors, 1);
        assert_eq!(summary.subcategories, 0);
        assert_eq!(output.snapshot().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_tracking_headers_is_an_error() {
        let fetcher = Arc::new(MockFetcher::new(&[]));
        let tracking = InMemoryRowStore::new("Tracking Code (0 results)");
        let output = InMemoryRowStore::new("Banyule Council");
        let skipped = InMemoryRowStore::new("Skipped");

        let err = use_case(fetcher, &tracking, &output, &skipped).run().await.unwrap_err();
        assert!(matches!(err, ScraperError::MissingColumn { .. }));
    }
}
