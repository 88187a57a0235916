use crate::common::constants::{skipped_worksheet_name, DEFAULT_STATE_URL, DEFAULT_TRACKING_WORKSHEET, DIRECTORY_BASE_URL};
use crate::common::error::{Result, ScraperError};
use serde::Deserialize;
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub council: CouncilConfig,
    pub workbook: WorkbookConfig,
    pub fetch: FetchConfig,
    pub pacing: PacingConfig,
    pub firecrawl: FirecrawlConfig,
    pub metrics: MetricsConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CouncilConfig {
    pub name: String,
    pub state_url: String,
    pub base_url: String,
}

impl Default for CouncilConfig {
    fn default() -> Self {
        Self {
            name: "Banyule Council".to_string(),
            state_url: DEFAULT_STATE_URL.to_string(),
            base_url: DIRECTORY_BASE_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WorkbookConfig {
    /// SQLite file holding the tracking worksheet
    pub tracking_path: PathBuf,
    pub tracking_worksheet: String,
    /// SQLite file holding the output and skipped worksheets
    pub output_path: PathBuf,
    /// Defaults to the council name
    pub output_worksheet: Option<String>,
    /// Defaults to `Skipped Link (<council>)`
    pub skipped_worksheet: Option<String>,
}

impl WorkbookConfig {
    fn fill_defaults(&mut self) {
        if self.tracking_path.as_os_str().is_empty() {
            self.tracking_path = PathBuf::from("data/tracking.db");
        }
        if self.tracking_worksheet.is_empty() {
            self.tracking_worksheet = DEFAULT_TRACKING_WORKSHEET.to_string();
        }
        if self.output_path.as_os_str().is_empty() {
            self.output_path = PathBuf::from("data/output.db");
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchBackend {
    Http,
    Firecrawl,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub backend: FetchBackend,
    pub timeout_secs: u64,
    /// Attempts per page at the fetcher level
    pub max_retries: u32,
    pub backoff_min_ms: u64,
    pub backoff_max_ms: u64,
    /// Attempts per profile page at the scrape level
    pub detail_attempts: u32,
    pub user_agent: String,
    /// Follow the directory's website redirect to store the real website URL
    pub resolve_websites: bool,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            backend: FetchBackend::Http,
            timeout_secs: 120,
            max_retries: 3,
            backoff_min_ms: 2_000,
            backoff_max_ms: 5_000,
            detail_attempts: 3,
            user_agent: "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36".to_string(),
            resolve_websites: true,
        }
    }
}

impl FetchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PacingConfig {
    pub min_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            min_delay_ms: 3_000,
            max_delay_ms: 6_000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FirecrawlConfig {
    pub url: String,
    pub api_key: Option<String>,
    pub retry_wait_min_ms: u64,
    pub retry_wait_max_ms: u64,
}

impl Default for FirecrawlConfig {
    fn default() -> Self {
        Self {
            url: "https://api.firecrawl.dev/v1/scrape".to_string(),
            api_key: None,
            retry_wait_min_ms: 10_000,
            retry_wait_max_ms: 20_000,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub listen: Option<SocketAddr>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub dir: PathBuf,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("logs"),
        }
    }
}

impl Config {
    /// Load `path`, or defaults if it does not exist, then apply environment overrides.
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = fs::read_to_string(path).map_err(|e| {
                ScraperError::Config(format!("Failed to read config file '{}': {}", path.display(), e))
            })?;
            Self::from_toml(&content)?
        } else {
            Self::from_toml("")?
        };

        if let Ok(key) = std::env::var("FIRECRAWL_API_KEY") {
            if !key.trim().is_empty() {
                config.firecrawl.api_key = Some(key);
            }
        }
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let mut config: Config = toml::from_str(content)?;
        config.workbook.fill_defaults();
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.council.name.trim().is_empty() {
            return Err(ScraperError::Config("council.name must not be empty".into()));
        }
        if self.pacing.min_delay_ms > self.pacing.max_delay_ms {
            return Err(ScraperError::Config("pacing.min_delay_ms exceeds pacing.max_delay_ms".into()));
        }
        if self.fetch.backoff_min_ms > self.fetch.backoff_max_ms {
            return Err(ScraperError::Config("fetch.backoff_min_ms exceeds fetch.backoff_max_ms".into()));
        }
        if self.fetch.backend == FetchBackend::Firecrawl && self.firecrawl.api_key.is_none() {
            return Err(ScraperError::Config(
                "firecrawl backend needs firecrawl.api_key or FIRECRAWL_API_KEY".into(),
            ));
        }
        Ok(())
    }

    pub fn output_worksheet(&self) -> String {
        self.workbook
            .output_worksheet
            .clone()
            .unwrap_or_else(|| self.council.name.clone())
    }

    pub fn skipped_worksheet(&self) -> String {
        self.workbook
            .skipped_worksheet
            .clone()
            .unwrap_or_else(|| skipped_worksheet_name(&self.council.name))
    }
}
