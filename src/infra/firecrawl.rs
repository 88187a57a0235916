use crate::app::ports::PageFetcher;
use crate::common::error::{Result, ScraperError};
use crate::config::{FetchConfig, FirecrawlConfig};
use crate::infra::pacing::Pacer;
use crate::observability::metrics;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, warn};

#[derive(Debug, Serialize)]
struct ScrapeRequest<'a> {
    url: &'a str,
    formats: [&'a str; 1],
}

#[derive(Debug, Deserialize)]
struct ScrapeResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    data: Option<ScrapeData>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ScrapeData {
    #[serde(default)]
    html: Option<String>,
}

/// Page fetcher backed by the Firecrawl scrape API.
pub struct FirecrawlFetcher {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    attempts: u32,
    retry_wait: Pacer,
}

impl FirecrawlFetcher {
    pub fn new(config: &FirecrawlConfig, fetch: &FetchConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| ScraperError::MissingField("firecrawl.api_key".into()))?;
        let client = reqwest::Client::builder().timeout(fetch.timeout()).build()?;
        Ok(Self {
            client,
            endpoint: config.url.clone(),
            api_key,
            attempts: fetch.max_retries.max(1),
            retry_wait: Pacer::new(config.retry_wait_min_ms, config.retry_wait_max_ms),
        })
    }

    async fn scrape_once(&self, url: &str) -> Result<String> {
        let resp = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&ScrapeRequest { url, formats: ["html"] })
            .send()
            .await?;
        let status = resp.status().as_u16();
        let body = resp.text().await?;
        html_from_response(url, status, &body)
    }
}

/// Only an HTTP 200 carrying `success: true` and an html payload counts as a page.
fn html_from_response(url: &str, status: u16, body: &str) -> Result<String> {
    if status != 200 {
        return Err(ScraperError::fetch(url, format!("firecrawl returned HTTP {}", status)));
    }
    let parsed: ScrapeResponse = serde_json::from_str(body)?;
    if !parsed.success {
        let reason = parsed.error.unwrap_or_else(|| "success=false".to_string());
        return Err(ScraperError::fetch(url, reason));
    }
    parsed
        .data
        .and_then(|d| d.html)
        .ok_or_else(|| ScraperError::fetch(url, "response has no data.html"))
}

#[async_trait]
impl PageFetcher for FirecrawlFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        let started = Instant::now();
        let mut last_error = None;
        for attempt in 1..=self.attempts {
            match self.scrape_once(url).await {
                Ok(html) => {
                    debug!("Firecrawl fetched {} ({} bytes)", url, html.len());
                    metrics::fetch::success(started.elapsed().as_secs_f64(), html.len());
                    return Ok(html);
                }
                Err(e) => {
                    warn!("Firecrawl attempt {}/{} for {} failed: {}", attempt, self.attempts, url, e);
                    last_error = Some(e);
                    if attempt < self.attempts {
                        metrics::fetch::retry();
                        self.retry_wait.wait().await;
                    }
                }
            }
        }
        metrics::fetch::error();
        Err(last_error.unwrap_or_else(|| ScraperError::fetch(url, "no attempts made")))
    }
}
