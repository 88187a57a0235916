use super::table::{cell, Table};
use crate::common::constants::{is_missing, COL_COMPANY, COL_OUTLET, COL_SERVICES};
use crate::common::error::Result;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutletEntry {
    /// 1-based sheet row.
    pub row: usize,
    pub services: String,
}

/// Lookup of listings already in the output sheet.
///
/// Listings are keyed by outlet id; a listing without an outlet id falls back
/// to its company name so that unrelated `N/A` outlets never collapse into one row.
#[derive(Debug, Default)]
pub struct OutletIndex {
    entries: HashMap<String, OutletEntry>,
    next_row: usize,
}

impl OutletIndex {
    pub fn build(output: &Table) -> Result<Self> {
        let mut index = Self {
            entries: HashMap::new(),
            next_row: output.rows().len() + 2,
        };
        if output.is_empty() {
            return Ok(index);
        }
        let col_outlet = output.require_column(COL_OUTLET)?;
        let col_company = output.require_column(COL_COMPANY)?;
        let col_services = output.require_column(COL_SERVICES)?;

        for (i, row) in output.rows().iter().enumerate() {
            if let Some(key) = Self::key_for(cell(row, col_outlet), cell(row, col_company)) {
                // the first row for an outlet is the one that gets updated
                index.entries.entry(key).or_insert_with(|| OutletEntry {
                    row: Table::row_number(i),
                    services: cell(row, col_services).trim().to_string(),
                });
            }
        }
        Ok(index)
    }

    pub fn key_for(outlet: &str, company: &str) -> Option<String> {
        if !is_missing(outlet) {
            Some(format!("outlet:{}", outlet.trim().to_lowercase()))
        } else if !is_missing(company) {
            Some(format!("company:{}", company.trim().to_lowercase()))
        } else {
            None
        }
    }

    pub fn get(&self, outlet: &str, company: &str) -> Option<&OutletEntry> {
        Self::key_for(outlet, company).and_then(|k| self.entries.get(&k))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Track a row just appended to the sheet; returns its row number.
    pub fn record_append(&mut self, outlet: &str, company: &str, services: &str) -> usize {
        let row = self.next_row;
        self.next_row += 1;
        if let Some(key) = Self::key_for(outlet, company) {
            self.entries.entry(key).or_insert_with(|| OutletEntry {
                row,
                services: services.to_string(),
            });
        }
        row
    }

    pub fn record_services(&mut self, outlet: &str, company: &str, services: &str) {
        if let Some(key) = Self::key_for(outlet, company) {
            if let Some(entry) = self.entries.get_mut(&key) {
                entry.services = services.to_string();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::constants::OUTPUT_HEADERS;

    fn output(rows: Vec<(&str, &str, &str)>) -> Table {
        let mut all = vec![OUTPUT_HEADERS.iter().map(|s| s.to_string()).collect::<Vec<_>>()];
        for (outlet, company, services) in rows {
            let mut r = vec![String::new(); OUTPUT_HEADERS.len()];
            r[8] = outlet.to_string();
            r[4] = company.to_string();
            r[3] = services.to_string();
            all.push(r);
        }
        Table::from_rows("out", all)
    }

    #[test]
    fn test_lookup_by_outlet_then_company() {
        let table = output(vec![
            ("1234", "Smile Clinic", "Dental"),
            ("N/A", "Tooth Co", "Health"),
            ("N/A", "N/A", "Other"),
            ("1234", "Smile Clinic", "Later duplicate"),
        ]);
        let index = OutletIndex::build(&table).unwrap();
        assert_eq!(index.len(), 2);

        let smile = index.get(" 1234 ", "anything").unwrap();
        assert_eq!(smile.row, 2);
        assert_eq!(smile.services, "Dental");

        assert_eq!(index.get("N/A", "tooth co").unwrap().row, 3);
        assert!(index.get("N/A", "N/A").is_none());
        assert!(index.get("9999", "Smile Clinic").is_none());
    }

    #[test]
    fn test_record_append_tracks_row_numbers() {
        let mut index = OutletIndex::build(&output(vec![("1", "A", "x")])).unwrap();
        assert_eq!(index.record_append("2", "B", "y"), 3);
        assert_eq!(index.record_append("3", "C", "z"), 4);
        assert_eq!(index.get("2", "").unwrap().row, 3);

        index.record_services("2", "", "y, w");
        assert_eq!(index.get("2", "").unwrap().services, "y, w");
    }
}
