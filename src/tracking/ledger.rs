use super::table::{build_row, cell, ensure_headers, Table};
use crate::app::ports::RowStore;
use crate::common::constants::{timestamp_now, SKIPPED_HEADERS};
use crate::common::error::Result;
use crate::common::types::SkippedEntry;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info};

/// Side ledger of listings that were found again and merged instead of appended.
pub struct SkippedLedger {
    store: Arc<dyn RowStore>,
    headers: Vec<String>,
    seen: HashSet<String>,
    written: usize,
}

fn entry_key(council: &str, category: &str, subcategory: &str, company: &str, outlet: &str) -> String {
    [council, category, subcategory, company, outlet]
        .iter()
        .map(|s| s.trim().to_lowercase())
        .collect::<Vec<_>>()
        .join("\u{1f}")
}

impl SkippedLedger {
    pub async fn open(store: Arc<dyn RowStore>) -> Result<Self> {
        let headers = ensure_headers(store.as_ref(), &SKIPPED_HEADERS).await?;
        let table = Table::load(store.as_ref()).await?;

        let col = |name: &str| table.require_column(name);
        let (c_council, c_category, c_subcategory, c_company, c_outlet) = (
            col("council_name")?,
            col("category_name")?,
            col("subcategory_name")?,
            col("company_name")?,
            col("outlet")?,
        );

        let seen = table
            .rows()
            .iter()
            .map(|r| {
                entry_key(
                    cell(r, c_council),
                    cell(r, c_category),
                    cell(r, c_subcategory),
                    cell(r, c_company),
                    cell(r, c_outlet),
                )
            })
            .collect::<HashSet<_>>();
        debug!("Skipped ledger '{}' holds {} entries", store.name(), seen.len());

        Ok(Self {
            store,
            headers,
            seen,
            written: 0,
        })
    }

    pub fn contains(&self, entry: &SkippedEntry) -> bool {
        self.seen.contains(&Self::key(entry))
    }

    /// Append `entry` unless an equivalent one is already logged. Returns whether a row was written.
    pub async fn record(&mut self, entry: &SkippedEntry) -> Result<bool> {
        let key = Self::key(entry);
        if self.seen.contains(&key) {
            debug!(
                "Skipped entry already logged: {}, {}, {}",
                entry.outlet, entry.category_name, entry.subcategory_name
            );
            return Ok(false);
        }

        let timestamp = timestamp_now();
        let row = build_row(&self.headers, |col| match col.trim().to_lowercase().as_str() {
            "timestamp" => Some(timestamp.as_str()),
            "council_name" => Some(entry.council_name.as_str()),
            "category_name" => Some(entry.category_name.as_str()),
            "subcategory_name" => Some(entry.subcategory_name.as_str()),
            "company_name" => Some(entry.company_name.as_str()),
            "details_url" => Some(entry.details_url.as_str()),
            "outlet" => Some(entry.outlet.as_str()),
            "location" => Some(entry.location.as_str()),
            _ => None,
        });
        self.store.append_row(row).await?;
        self.seen.insert(key);
        self.written += 1;
        crate::observability::metrics::tracking::ledger_entry_written();
        info!(
            "Logged skipped entry for {}, {}, {}",
            entry.outlet, entry.category_name, entry.subcategory_name
        );
        Ok(true)
    }

    /// Rows appended through this handle.
    pub fn written(&self) -> usize {
        self.written
    }

    fn key(entry: &SkippedEntry) -> String {
        entry_key(
            &entry.council_name,
            &entry.category_name,
            &entry.subcategory_name,
            &entry.company_name,
            &entry.outlet,
        )
    }
}
