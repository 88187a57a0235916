use super::ledger::SkippedLedger;
use super::outlets::OutletIndex;
use super::services::{merge_services, same_services};
use super::table::{build_row, ensure_headers, Table};
use crate::app::ports::RowStore;
use crate::common::constants::{timestamp_now, COL_SERVICES, OUTPUT_HEADERS};
use crate::common::error::Result;
use crate::common::types::{OutletRecord, SkippedEntry};
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// New outlet, written as a new row.
    Appended { row: usize },
    /// Known outlet whose services cell gained tags.
    Merged { row: usize, services: String },
    /// Known outlet that already carried every tag.
    Unchanged { row: usize },
}

/// The output worksheet plus the in-memory index used to merge into it.
pub struct OutputSheet {
    store: Arc<dyn RowStore>,
    headers: Vec<String>,
    services_col: usize,
    index: OutletIndex,
}

impl OutputSheet {
    pub async fn open(store: Arc<dyn RowStore>) -> Result<Self> {
        let headers = ensure_headers(store.as_ref(), &OUTPUT_HEADERS).await?;
        let table = Table::load(store.as_ref()).await?;
        let services_col = table.require_column(COL_SERVICES)? + 1;
        let index = OutletIndex::build(&table)?;
        debug!("Output sheet '{}' indexes {} outlets", store.name(), index.len());
        Ok(Self {
            store,
            headers,
            services_col,
            index,
        })
    }

    pub fn index(&self) -> &OutletIndex {
        &self.index
    }

    /// Append `record` as a new row, or fold its services into the existing row
    /// for the same outlet and note the repeat in `ledger`.
    pub async fn upsert(&mut self, record: &OutletRecord, ledger: &mut SkippedLedger) -> Result<UpsertOutcome> {
        let outlet = record.outlet();
        let company = record.listing.company_name.as_str();

        let Some(existing) = self.index.get(outlet, company).cloned() else {
            let timestamp = timestamp_now();
            let row = build_row(&self.headers, |col| {
                if col.trim().eq_ignore_ascii_case("timestamp") {
                    Some(timestamp.as_str())
                } else {
                    record.field(col)
                }
            });
            self.store.append_row(row).await?;
            let row_number = self.index.record_append(outlet, company, &record.services);
            crate::observability::metrics::tracking::listing_appended();
            info!("Saved new outlet {} ({}) with services: {}", outlet, company, record.services);
            return Ok(UpsertOutcome::Appended { row: row_number });
        };

        let merged = merge_services(&existing.services, &record.services);
        let outcome = if same_services(&merged, &existing.services) {
            debug!("Outlet {} already has services: {}", outlet, existing.services);
            crate::observability::metrics::tracking::listing_unchanged();
            UpsertOutcome::Unchanged { row: existing.row }
        } else {
            self.store
                .update_cell(existing.row, self.services_col, &merged)
                .await?;
            self.index.record_services(outlet, company, &merged);
            crate::observability::metrics::tracking::listing_merged();
            info!("Updated {} with categories: {}", outlet, merged);
            UpsertOutcome::Merged {
                row: existing.row,
                services: merged,
            }
        };

        ledger.record(&SkippedEntry::from(record)).await?;
        Ok(outcome)
    }
}
