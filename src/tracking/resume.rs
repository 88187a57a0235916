//! Working out where the previous run stopped and which subcategories remain.

use super::table::{cell, Table};
use crate::common::constants::*;
use crate::common::error::Result;
use crate::common::types::{LastScraped, SubcategoryLink};
use crate::parser::extract_main_state;
use std::collections::HashSet;
use tracing::{info, warn};

/// The bottom-most output row that carries a subcategory URL.
///
/// Rows are appended in scrape order, so this is the subcategory the last
/// run was working on. `None` for a sheet with no data rows.
pub fn last_scraped_entry(output: &Table) -> Result<Option<LastScraped>> {
    if output.is_empty() {
        return Ok(None);
    }
    let col_subcategory = output.require_column(COL_SUBCATEGORY_URL)?;
    let col_details = output.require_column(COL_DETAILS_URL)?;
    let col_outlet = output.require_column(COL_OUTLET)?;

    let last = output
        .rows()
        .iter()
        .rev()
        .find(|row| !cell(row, col_subcategory).trim().is_empty())
        .map(|row| LastScraped {
            subcategory_url: cell(row, col_subcategory).trim().to_string(),
            details_url: cell(row, col_details).to_string(),
            outlet: cell(row, col_outlet).to_string(),
        });
    Ok(last)
}

/// Subcategory links from the tracking sheet that belong to `council` and have results.
///
/// Rows whose `Result` is `"0"` or whose URL is blank are skipped, and a URL
/// listed twice is kept only at its first position.
pub fn subcategory_links(tracking: &Table, council: &str) -> Result<Vec<SubcategoryLink>> {
    let col_council = tracking.require_column(COL_TRACK_COUNCIL)?;
    let col_council_url = tracking.require_column(COL_TRACK_COUNCIL_URL)?;
    let col_subcategory = tracking.require_column(COL_TRACK_SUBCATEGORY_URL)?;
    let col_result = tracking.require_column(COL_TRACK_RESULT)?;

    let mut seen = HashSet::new();
    let links = tracking
        .rows()
        .iter()
        .filter(|row| cell(row, col_council).trim() == council.trim())
        .filter(|row| cell(row, col_result).trim() != "0")
        .filter(|row| !cell(row, col_subcategory).trim().is_empty())
        .filter(|row| seen.insert(cell(row, col_subcategory).trim().to_lowercase()))
        .map(|row| {
            let council_url = cell(row, col_council_url);
            let subcategory_url = cell(row, col_subcategory).trim().to_string();
            let state_source = if council_url.trim().is_empty() {
                subcategory_url.as_str()
            } else {
                council_url
            };
            SubcategoryLink {
                main_state: extract_main_state(state_source),
                council_name: cell(row, col_council).trim().to_string(),
                subcategory_url,
            }
        })
        .collect();
    Ok(links)
}

/// Drop the subcategories finished by earlier runs.
///
/// The subcategory the last run stopped in is included again, since it may
/// have been interrupted part way; its finished listings merge into their
/// existing rows. A last URL that is no longer tracked restarts from the top.
pub fn resume_from(links: Vec<SubcategoryLink>, last: Option<&LastScraped>) -> Vec<SubcategoryLink> {
    let Some(last) = last else {
        info!("No previous progress found, starting from the first subcategory");
        return links;
    };

    let wanted = last.subcategory_url.to_lowercase();
    match links
        .iter()
        .position(|l| l.subcategory_url.to_lowercase() == wanted)
    {
        Some(idx) => {
            info!(
                "Resuming at subcategory {} of {}: {}",
                idx + 1,
                links.len(),
                last.subcategory_url
            );
            links.into_iter().skip(idx).collect()
        }
        None => {
            warn!(
                "Last scraped subcategory '{}' is not in the tracking sheet, starting from the first subcategory",
                last.subcategory_url
            );
            links
        }
    }
}
