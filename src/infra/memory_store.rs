use crate::app::ports::RowStore;
use crate::common::error::{Result, ScraperError};
use async_trait::async_trait;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

/// In-memory worksheet for development/testing
#[derive(Clone)]
pub struct InMemoryRowStore {
    name: String,
    rows: Arc<Mutex<Vec<Vec<String>>>>,
}

impl InMemoryRowStore {
    pub fn new(name: &str) -> Self {
        Self::with_rows(name, Vec::new())
    }

    pub fn with_rows(name: &str, rows: Vec<Vec<String>>) -> Self {
        Self {
            name: name.to_string(),
            rows: Arc::new(Mutex::new(rows)),
        }
    }

    /// Copy of the current contents.
    pub fn snapshot(&self) -> Vec<Vec<String>> {
        match self.rows.lock() {
            Ok(rows) => rows.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Vec<Vec<String>>>> {
        self.rows
            .lock()
            .map_err(|_| ScraperError::Store(format!("worksheet '{}' lock poisoned", self.name)))
    }
}

#[async_trait]
impl RowStore for InMemoryRowStore {
    fn name(&self) -> &str {
        &self.name
    }

    async fn read_all(&self) -> Result<Vec<Vec<String>>> {
        Ok(self.lock()?.clone())
    }

    async fn append_rows(&self, rows: Vec<Vec<String>>) -> Result<()> {
        let mut all = self.lock()?;
        debug!("Appending {} rows to '{}'", rows.len(), self.name);
        all.extend(rows);
        Ok(())
    }

    async fn update_cell(&self, row: usize, col: usize, value: &str) -> Result<()> {
        if row == 0 || col == 0 {
            return Err(ScraperError::Store(format!("cell ({row}, {col}) is not 1-based")));
        }
        let mut all = self.lock()?;
        let target = all
            .get_mut(row - 1)
            .ok_or_else(|| ScraperError::Store(format!("row {} out of range in '{}'", row, self.name)))?;
        if target.len() < col {
            target.resize(col, String::new());
        }
        target[col - 1] = value.to_string();
        Ok(())
    }

    async fn insert_row(&self, index: usize, values: Vec<String>) -> Result<()> {
        let mut all = self.lock()?;
        let at = index.saturating_sub(1).min(all.len());
        all.insert(at, values);
        Ok(())
    }
}
