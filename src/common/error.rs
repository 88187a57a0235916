use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScraperError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON deserialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Column '{column}' not found in worksheet '{worksheet}'")]
    MissingColumn { worksheet: String, column: String },

    #[error("Fetch failed for {url}: {message}")]
    Fetch { url: String, message: String },

    #[error("Row store error: {0}")]
    Store(String),
}

impl ScraperError {
    pub fn fetch(url: &str, message: impl Into<String>) -> Self {
        ScraperError::Fetch {
            url: url.to_string(),
            message: message.into(),
        }
    }

    /// Fetch errors are retried; everything else is a hard failure for the item.
    pub fn is_retryable(&self) -> bool {
        match self {
            ScraperError::Http(e) => match e.status() {
                Some(s) => s.is_server_error() || s.as_u16() == 429,
                None => e.is_timeout() || e.is_connect() || e.is_request(),
            },
            ScraperError::Fetch { .. } => true,
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, ScraperError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_invalid_url_is_not_retried() {
        let err = reqwest::Client::new().get("not a url").send().await.unwrap_err();
        assert!(err.is_builder());
        assert!(!ScraperError::from(err).is_retryable());
    }

    #[tokio::test]
    async fn test_refused_connection_is_retried() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = reqwest::Client::new()
            .get(format!("http://{addr}/"))
            .send()
            .await
            .unwrap_err();
        assert!(ScraperError::from(err).is_retryable());
    }

    #[test]
    fn test_non_fetch_errors_are_not_retried() {
        assert!(ScraperError::fetch("https://x", "reset").is_retryable());
        assert!(!ScraperError::Config("bad".into()).is_retryable());
        assert!(!ScraperError::Store("gone".into()).is_retryable());
    }
}
