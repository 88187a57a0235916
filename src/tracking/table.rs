use crate::app::ports::RowStore;
use crate::common::constants::NOT_AVAILABLE;
use crate::common::error::{Result, ScraperError};
use tracing::{info, warn};

/// Snapshot of a worksheet whose first row is a header row.
#[derive(Debug, Clone)]
pub struct Table {
    worksheet: String,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn from_rows(worksheet: &str, mut all: Vec<Vec<String>>) -> Self {
        let headers = if all.is_empty() { Vec::new() } else { all.remove(0) };
        Self {
            worksheet: worksheet.to_string(),
            headers,
            rows: all,
        }
    }

    pub async fn load(store: &dyn RowStore) -> Result<Self> {
        Ok(Self::from_rows(store.name(), store.read_all().await?))
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Data rows, header excluded.
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// 0-based index of a column, matched case-insensitively.
    pub fn column(&self, name: &str) -> Option<usize> {
        column_index(&self.headers, name)
    }

    pub fn require_column(&self, name: &str) -> Result<usize> {
        self.column(name).ok_or_else(|| ScraperError::MissingColumn {
            worksheet: self.worksheet.clone(),
            column: name.to_string(),
        })
    }

    /// Spreadsheet row number (1-based, header is row 1) of a data row index.
    pub fn row_number(data_index: usize) -> usize {
        data_index + 2
    }
}

pub fn column_index(headers: &[String], name: &str) -> Option<usize> {
    let wanted = name.trim().to_lowercase();
    headers.iter().position(|h| h.trim().to_lowercase() == wanted)
}

/// Cell at `col`, or an empty string for short rows.
pub fn cell(row: &[String], col: usize) -> &str {
    row.get(col).map(|s| s.as_str()).unwrap_or("")
}

/// Make sure the worksheet starts with a header row containing `expected`.
///
/// Returns the header row actually in use. An empty sheet gets `expected`
/// appended; a first row that already names every expected column is kept as
/// is, whatever its order; any other first row gets `expected` inserted above it.
pub async fn ensure_headers(store: &dyn RowStore, expected: &[&str]) -> Result<Vec<String>> {
    let expected_row: Vec<String> = expected.iter().map(|s| s.to_string()).collect();
    let existing = store.read_all().await?;

    let Some(first) = existing.first() else {
        info!("Writing header row to empty worksheet '{}'", store.name());
        store.append_row(expected_row.clone()).await?;
        return Ok(expected_row);
    };

    if expected.iter().all(|col| column_index(first, col).is_some()) {
        return Ok(first.clone());
    }

    warn!(
        "Worksheet '{}' has no recognisable header row, inserting one",
        store.name()
    );
    store.insert_row(1, expected_row.clone()).await?;
    Ok(expected_row)
}

/// Build a row in the order of `headers`, asking `value_for` for each column.
/// Columns it does not know are filled with `N/A`.
pub fn build_row<'a, F>(headers: &[String], mut value_for: F) -> Vec<String>
where
    F: FnMut(&str) -> Option<&'a str>,
{
    headers
        .iter()
        .map(|h| {
            value_for(h)
                .map(|v| v.to_string())
                .unwrap_or_else(|| NOT_AVAILABLE.to_string())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::memory_store::InMemoryRowStore;

    fn strings(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_column_lookup_is_case_insensitive() {
        let table = Table::from_rows("out", vec![strings(&["Timestamp", " Outlet ", "services"])]);
        assert_eq!(table.column("outlet"), Some(1));
        assert_eq!(table.column("SERVICES"), Some(2));
        assert!(table.require_column("phone").is_err());
        assert!(table.is_empty());
    }

    #[tokio::test]
    async fn test_ensure_headers_on_empty_sheet() {
        let store = InMemoryRowStore::new("out");
        let headers = ensure_headers(&store, &["a", "b"]).await.unwrap();
        assert_eq!(headers, strings(&["a", "b"]));
        assert_eq!(store.snapshot(), vec![strings(&["a", "b"])]);
    }

    #[tokio::test]
    async fn test_ensure_headers_keeps_reordered_headers() {
        let store = InMemoryRowStore::with_rows("out", vec![strings(&["B", "A", "extra"])]);
        let headers = ensure_headers(&store, &["a", "b"]).await.unwrap();
        assert_eq!(headers, strings(&["B", "A", "extra"]));
        assert_eq!(store.snapshot().len(), 1);
    }

    #[tokio::test]
    async fn test_ensure_headers_inserts_above_data() {
        let store = InMemoryRowStore::with_rows("out", vec![strings(&["1", "2"])]);
        ensure_headers(&store, &["a", "b"]).await.unwrap();
        assert_eq!(store.snapshot(), vec![strings(&["a", "b"]), strings(&["1", "2"])]);
    }

    #[test]
    fn test_build_row_follows_header_order() {
        let headers = strings(&["phone", "company_name", "unknown"]);
        let row = build_row(&headers, |col| match col {
            "company_name" => Some("Acme"),
            "phone" => Some("123"),
            _ => None,
        });
        assert_eq!(row, strings(&["123", "Acme", NOT_AVAILABLE]));
    }
}
