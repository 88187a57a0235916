use crate::app::ports::RowStore;
use crate::common::error::Result;
use crate::common::types::LastScraped;
use crate::tracking::{last_scraped_entry, resume_from, subcategory_links, Table};
use serde::Serialize;
use std::fmt;

/// Where the next scrape would start, computed from the worksheets alone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusReport {
    pub council: String,
    pub output_rows: usize,
    pub tracked_subcategories: usize,
    pub remaining_subcategories: usize,
    pub last: Option<LastScraped>,
    pub next_subcategory: Option<String>,
}

impl fmt::Display for StatusReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Council: {}", self.council)?;
        writeln!(f, "Output rows: {}", self.output_rows)?;
        writeln!(
            f,
            "Subcategories: {} remaining of {}",
            self.remaining_subcategories, self.tracked_subcategories
        )?;
        match &self.last {
            Some(last) => writeln!(f, "Last scraped: {} ({})", last.subcategory_url, last.outlet)?,
            None => writeln!(f, "Last scraped: nothing yet")?,
        }
        write!(f, "Next: {}", self.next_subcategory.as_deref().unwrap_or("nothing to do"))
    }
}

pub async fn council_status(council: &str, tracking: &dyn RowStore, output: &dyn RowStore) -> Result<StatusReport> {
    let tracking = Table::load(tracking).await?;
    let links = subcategory_links(&tracking, council)?;
    let output = Table::load(output).await?;
    let last = last_scraped_entry(&output)?;

    let tracked_subcategories = links.len();
    let remaining = resume_from(links, last.as_ref());
    Ok(StatusReport {
        council: council.to_string(),
        output_rows: output.rows().len(),
        tracked_subcategories,
        remaining_subcategories: remaining.len(),
        next_subcategory: remaining.first().map(|l| l.subcategory_url.clone()),
        last,
    })
}
