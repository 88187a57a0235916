use crate::app::ports::RowStore;
use crate::common::error::{Result, ScraperError};
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

/// A SQLite file holding any number of named worksheets.
#[derive(Clone)]
pub struct SqliteWorkbook {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteWorkbook {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        Self::init(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch(
            r#"
            PRAGMA journal_mode=WAL;
            CREATE TABLE IF NOT EXISTS worksheet_rows (
                worksheet TEXT    NOT NULL,
                row_idx   INTEGER NOT NULL,
                cells     TEXT    NOT NULL,
                PRIMARY KEY (worksheet, row_idx)
            );
            "#,
        )?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Handle to `name`; the worksheet exists as soon as a row is written to it.
    pub fn worksheet(&self, name: &str) -> SqliteWorksheet {
        SqliteWorksheet {
            conn: Arc::clone(&self.conn),
            name: name.to_string(),
        }
    }

    pub fn worksheet_names(&self) -> Result<Vec<String>> {
        let conn = lock(&self.conn)?;
        let mut stmt = conn.prepare("SELECT DISTINCT worksheet FROM worksheet_rows ORDER BY worksheet")?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(names)
    }
}

fn lock(conn: &Mutex<Connection>) -> Result<MutexGuard<'_, Connection>> {
    conn.lock()
        .map_err(|_| ScraperError::Store("workbook connection lock poisoned".into()))
}

/// One worksheet inside a [`SqliteWorkbook`]; rows are JSON arrays of cell strings.
#[derive(Clone)]
pub struct SqliteWorksheet {
    conn: Arc<Mutex<Connection>>,
    name: String,
}

impl SqliteWorksheet {
    fn load_row(conn: &Connection, worksheet: &str, row: usize) -> Result<Option<Vec<String>>> {
        let cells: Option<String> = conn
            .query_row(
                "SELECT cells FROM worksheet_rows WHERE worksheet = ?1 AND row_idx = ?2",
                params![worksheet, row as i64],
                |r| r.get(0),
            )
            .optional()?;
        match cells {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl RowStore for SqliteWorksheet {
    fn name(&self) -> &str {
        &self.name
    }

    async fn read_all(&self) -> Result<Vec<Vec<String>>> {
        let conn = lock(&self.conn)?;
        let mut stmt =
            conn.prepare("SELECT cells FROM worksheet_rows WHERE worksheet = ?1 ORDER BY row_idx")?;
        let raw = stmt
            .query_map(params![self.name], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let mut rows = Vec::with_capacity(raw.len());
        for json in raw {
            rows.push(serde_json::from_str(&json)?);
        }
        Ok(rows)
    }

    async fn append_rows(&self, rows: Vec<Vec<String>>) -> Result<()> {
        if rows.is_empty() {
            return Ok(());
        }
        let mut conn = lock(&self.conn)?;
        let tx = conn.transaction()?;
        let last: i64 = tx.query_row(
            "SELECT COALESCE(MAX(row_idx), 0) FROM worksheet_rows WHERE worksheet = ?1",
            params![self.name],
            |r| r.get(0),
        )?;
        {
            let mut stmt =
                tx.prepare("INSERT INTO worksheet_rows (worksheet, row_idx, cells) VALUES (?1, ?2, ?3)")?;
            for (offset, row) in rows.iter().enumerate() {
                stmt.execute(params![self.name, last + 1 + offset as i64, serde_json::to_string(row)?])?;
            }
        }
        tx.commit()?;
        debug!("Appended {} rows to '{}'", rows.len(), self.name);
        Ok(())
    }

    async fn update_cell(&self, row: usize, col: usize, value: &str) -> Result<()> {
        if row == 0 || col == 0 {
            return Err(ScraperError::Store(format!("cell ({row}, {col}) is not 1-based")));
        }
        let conn = lock(&self.conn)?;
        let mut cells = Self::load_row(&conn, &self.name, row)?.ok_or_else(|| {
            ScraperError::Store(format!("row {} does not exist in '{}'", row, self.name))
        })?;
        if cells.len() < col {
            cells.resize(col, String::new());
        }
        cells[col - 1] = value.to_string();
        conn.execute(
            "UPDATE worksheet_rows SET cells = ?1 WHERE worksheet = ?2 AND row_idx = ?3",
            params![serde_json::to_string(&cells)?, self.name, row as i64],
        )?;
        Ok(())
    }

    async fn insert_row(&self, index: usize, values: Vec<String>) -> Result<()> {
        let index = index.max(1) as i64;
        let mut conn = lock(&self.conn)?;
        let tx = conn.transaction()?;
        let last: i64 = tx.query_row(
            "SELECT COALESCE(MAX(row_idx), 0) FROM worksheet_rows WHERE worksheet = ?1",
            params![self.name],
            |r| r.get(0),
        )?;
        let index = index.min(last + 1);
        // Shift through negative indices so the primary key never collides mid-update.
        tx.execute(
            "UPDATE worksheet_rows SET row_idx = -(row_idx + 1) WHERE worksheet = ?1 AND row_idx >= ?2",
            params![self.name, index],
        )?;
        tx.execute(
            "UPDATE worksheet_rows SET row_idx = -row_idx WHERE worksheet = ?1 AND row_idx < 0",
            params![self.name],
        )?;
        tx.execute(
            "INSERT INTO worksheet_rows (worksheet, row_idx, cells) VALUES (?1, ?2, ?3)",
            params![self.name, index, serde_json::to_string(&values)?],
        )?;
        tx.commit()?;
        Ok(())
    }
}
