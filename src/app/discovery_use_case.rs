use crate::app::ports::{PageFetcher, RowStore};
use crate::common::constants::{timestamp_now, COL_TRACK_SUBCATEGORY_URL, TRACKING_HEADERS};
use crate::common::error::Result;
use crate::common::types::DiscoveredSubcategory;
use crate::infra::pacing::Pacer;
use crate::observability::metrics;
use crate::parser::{parse_council_categories, parse_result_count, parse_state_councils, CouncilLink};
use crate::tracking::table::cell;
use crate::tracking::{ensure_headers, Table};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{error, info, info_span, instrument, warn, Instrument};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DiscoverySummary {
    pub councils: usize,
    pub subcategories_added: usize,
    pub already_tracked: usize,
    pub errors: usize,
}

/// Walks a state page down to subcategories and records each one, with its
/// result count, in the tracking worksheet.
pub struct DiscoveryUseCase {
    fetcher: Arc<dyn PageFetcher>,
    tracking: Arc<dyn RowStore>,
    base_url: String,
    pacer: Pacer,
}

impl DiscoveryUseCase {
    pub fn new(fetcher: Arc<dyn PageFetcher>, tracking: Arc<dyn RowStore>, base_url: &str, pacer: Pacer) -> Self {
        Self {
            fetcher,
            tracking,
            base_url: base_url.to_string(),
            pacer,
        }
    }

    /// Discover every council on `state_url`, or only the one named `council_filter`.
    #[instrument(skip(self))]
    pub async fn run(&self, state_url: &str, council_filter: Option<&str>) -> Result<DiscoverySummary> {
        let mut summary = DiscoverySummary::default();
        ensure_headers(self.tracking.as_ref(), &TRACKING_HEADERS).await?;
        let mut tracked = self.tracked_urls().await?;
        info!("Tracking sheet already lists {} subcategories", tracked.len());

        let state_html = self.fetcher.fetch(state_url).await?;
        let councils: Vec<CouncilLink> = parse_state_councils(&state_html, &self.base_url)
            .into_iter()
            .filter(|c| council_filter.map_or(true, |f| c.name.trim().eq_ignore_ascii_case(f.trim())))
            .collect();
        if councils.is_empty() {
            warn!("No councils matched on {}", state_url);
            return Ok(summary);
        }
        info!("Discovering {} councils", councils.len());

        for council in &councils {
            let span = info_span!("council", name = %council.name);
            self.discover_council(council, &mut tracked, &mut summary)
                .instrument(span)
                .await?;
        }

        info!(
            "Discovery finished: {} councils, {} new subcategories, {} already tracked, {} errors",
            summary.councils, summary.subcategories_added, summary.already_tracked, summary.errors
        );
        Ok(summary)
    }

    async fn tracked_urls(&self) -> Result<HashSet<String>> {
        let table = Table::load(self.tracking.as_ref()).await?;
        let col = table.require_column(COL_TRACK_SUBCATEGORY_URL)?;
        Ok(table
            .rows()
            .iter()
            .map(|r| cell(r, col).trim().to_lowercase())
            .filter(|u| !u.is_empty())
            .collect())
    }

    async fn discover_council(
        &self,
        council: &CouncilLink,
        tracked: &mut HashSet<String>,
        summary: &mut DiscoverySummary,
    ) -> Result<()> {
        let html = match self.fetcher.fetch(&council.url).await {
            Ok(html) => html,
            Err(e) => {
                error!("Failed to load council page {}: {}", council.url, e);
                summary.errors += 1;
                return Ok(());
            }
        };
        self.pacer.wait().await;
        summary.councils += 1;

        for category in parse_council_categories(&html, &self.base_url) {
            for (subcategory_name, subcategory_url) in &category.subcategories {
                let key = subcategory_url.trim().to_lowercase();
                if tracked.contains(&key) {
                    summary.already_tracked += 1;
                    continue;
                }

                // Left untracked on failure so the next discovery run retries it.
                let Some(result_count) = self.result_count(subcategory_url).await else {
                    summary.errors += 1;
                    continue;
                };
                let discovered = DiscoveredSubcategory {
                    council_name: council.name.clone(),
                    council_url: council.url.clone(),
                    category_name: category.name.clone(),
                    category_url: category.url.clone(),
                    subcategory_name: subcategory_name.clone(),
                    subcategory_url: subcategory_url.clone(),
                    result_count,
                };
                // One row at a time so an interrupted discovery keeps what it found.
                self.tracking.append_row(discovered.to_row(&timestamp_now())).await?;
                tracked.insert(key);
                summary.subcategories_added += 1;
                metrics::discovery::subcategory_discovered();
                info!(
                    "{} > {} > {}: {} results",
                    council.name, category.name, subcategory_name, result_count
                );
            }
        }
        Ok(())
    }

    /// `None` when the subcategory page could not be fetched.
    async fn result_count(&self, url: &str) -> Option<u32> {
        let count = match self.fetcher.fetch(url).await {
            Ok(html) => Some(parse_result_count(&html)),
            Err(e) => {
                warn!("Failed to fetch result count for {}: {}", url, e);
                None
            }
        };
        self.pacer.wait().await;
        count
    }
}
