use crate::common::error::Result;
use async_trait::async_trait;

// Fetch-side port
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Return the raw markup of `url`.
    async fn fetch(&self, url: &str) -> Result<String>;

    /// Follow redirects from `url` and return where they end up.
    async fn resolve(&self, url: &str) -> Result<String> {
        Ok(url.to_string())
    }
}

// Store-side port.
//
// Rows and columns are 1-based, the way a spreadsheet addresses cells.
#[async_trait]
pub trait RowStore: Send + Sync {
    /// Worksheet name, used in log lines and error messages.
    fn name(&self) -> &str;

    async fn read_all(&self) -> Result<Vec<Vec<String>>>;

    async fn append_rows(&self, rows: Vec<Vec<String>>) -> Result<()>;

    async fn update_cell(&self, row: usize, col: usize, value: &str) -> Result<()>;

    /// Insert `values` so that it becomes row `index`, shifting later rows down.
    async fn insert_row(&self, index: usize, values: Vec<String>) -> Result<()>;

    async fn append_row(&self, values: Vec<String>) -> Result<()> {
        self.append_rows(vec![values]).await
    }
}
