//! Resume and de-duplication over append-only worksheets.
//!
//! The output worksheet is the only record of progress: its last row tells a
//! run where to pick up, and its `outlet` column decides whether a listing is
//! appended or merged into an existing row. Merges are noted in the skipped
//! ledger so repeated sightings stay auditable.

pub mod ledger;
pub mod outlets;
pub mod resume;
pub mod services;
pub mod table;
pub mod upsert;

pub use ledger::SkippedLedger;
pub use outlets::{OutletEntry, OutletIndex};
pub use resume::{last_scraped_entry, resume_from, subcategory_links};
pub use services::{format_unique_categories, merge_services};
pub use table::{ensure_headers, Table};
pub use upsert::{OutputSheet, UpsertOutcome};
