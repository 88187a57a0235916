use crate::app::ports::RowStore;
use crate::common::error::Result;
use std::path::Path;
use tracing::{debug, info};

/// Write every row of `store` to `path`. Returns the number of rows written.
pub async fn export_worksheet(store: &dyn RowStore, path: &Path) -> Result<usize> {
    let rows = store.read_all().await?;
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let mut writer = csv::WriterBuilder::new().flexible(true).from_path(path)?;
    for row in &rows {
        writer.write_record(row)?;
    }
    writer.flush()?;
    info!("Exported {} rows from '{}' to {}", rows.len(), store.name(), path.display());
    Ok(rows.len())
}

/// Append every record of the CSV at `path` to `store`.
///
/// The first record is dropped when it repeats the header row `store` already has.
pub async fn import_csv(path: &Path, store: &dyn RowStore) -> Result<usize> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)?;
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(|c| c.to_string()).collect::<Vec<_>>());
    }

    let existing = store.read_all().await?;
    if let (Some(header), Some(first)) = (existing.first(), rows.first()) {
        if same_row(header, first) {
            debug!("Dropping repeated header line from {}", path.display());
            rows.remove(0);
        }
    }
    let count = rows.len();
    store.append_rows(rows).await?;
    info!("Imported {} rows from {} into '{}'", count, path.display(), store.name());
    Ok(count)
}

fn same_row(a: &[String], b: &[String]) -> bool {
    a.len() == b.len()
        && a.iter()
            .zip(b)
            .all(|(x, y)| x.trim().eq_ignore_ascii_case(y.trim()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::memory_store::InMemoryRowStore;

    #[tokio::test]
    async fn test_export_then_import_keeps_ragged_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("sheet.csv");
        let source = InMemoryRowStore::with_rows(
            "Source",
            vec![
                vec!["Council".into(), "Result".into()],
                vec!["Banyule Council".into(), "12".into()],
                vec!["Quoted, name".into()],
            ],
        );

        assert_eq!(export_worksheet(&source, &path).await.unwrap(), 3);

        let target = InMemoryRowStore::new("Target");
        assert_eq!(import_csv(&path, &target).await.unwrap(), 3);
        assert_eq!(target.snapshot(), source.snapshot());
    }

    #[tokio::test]
    async fn test_import_into_sheet_with_headers_skips_header_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("output.csv");
        std::fs::write(
            &path,
            "Timestamp,outlet,subcategory_url\n2025-01-01 00:00:00,111,https://s/1\n",
        )
        .unwrap();
        let header: Vec<String> = vec!["Timestamp".into(), "outlet".into(), "subcategory_url".into()];
        let target = InMemoryRowStore::with_rows("Banyule Council", vec![header.clone()]);

        assert_eq!(import_csv(&path, &target).await.unwrap(), 1);

        let rows = target.snapshot();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], header);
        assert_eq!(rows[1][2], "https://s/1");
    }

    #[tokio::test]
    async fn test_import_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let target = InMemoryRowStore::new("Target");
        assert!(import_csv(&dir.path().join("nope.csv"), &target).await.is_err());
    }
}
