use crate::app::ports::PageFetcher;
use crate::common::error::{Result, ScraperError};
use crate::config::FetchConfig;
use crate::observability::metrics;
use async_trait::async_trait;
use rand::Rng;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Plain HTTP page fetcher with retry and jittered exponential backoff.
pub struct ReqwestFetcher {
    client: reqwest::Client,
    max_retries: u32,
    backoff_min_ms: u64,
    backoff_max_ms: u64,
}

impl ReqwestFetcher {
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent.as_str())
            .gzip(true)
            .build()?;
        Ok(Self {
            client,
            max_retries: config.max_retries.max(1),
            backoff_min_ms: config.backoff_min_ms,
            backoff_max_ms: config.backoff_max_ms,
        })
    }

    async fn get_once(&self, url: &str) -> Result<reqwest::Response> {
        let resp = self.client.get(url).send().await?;
        Ok(resp.error_for_status()?)
    }

    async fn with_retries<T, F, Fut>(&self, url: &str, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T>>,
    {
        let mut attempt = 1;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if attempt < self.max_retries && e.is_retryable() => {
                    let delay = backoff_delay(attempt, self.backoff_min_ms, self.backoff_max_ms);
                    warn!(
                        "Attempt {}/{} for {} failed: {}. Retrying in {:?}",
                        attempt, self.max_retries, url, e, delay
                    );
                    metrics::fetch::retry();
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    metrics::fetch::error();
                    return Err(e);
                }
            }
        }
    }
}

/// Exponential backoff capped at `max_ms`, with the actual wait drawn from the upper half.
pub(crate) fn backoff_delay(attempt: u32, min_ms: u64, max_ms: u64) -> Duration {
    let exp = min_ms.saturating_mul(1u64 << attempt.saturating_sub(1).min(16));
    let ceiling = exp.min(max_ms.max(min_ms));
    if ceiling == 0 {
        return Duration::ZERO;
    }
    let ms = rand::thread_rng().gen_range(ceiling / 2..=ceiling);
    Duration::from_millis(ms)
}

#[async_trait]
impl PageFetcher for ReqwestFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        let started = Instant::now();
        let body = self
            .with_retries(url, || async move {
                let resp = self.get_once(url).await?;
                Ok(resp.text().await?)
            })
            .await?;
        debug!("Fetched {} ({} bytes)", url, body.len());
        metrics::fetch::success(started.elapsed().as_secs_f64(), body.len());
        Ok(body)
    }

    /// Where the redirect chain ends, whatever that page answers; only
    /// transport errors, 5xx and 429 are treated as failures.
    async fn resolve(&self, url: &str) -> Result<String> {
        let final_url = self
            .with_retries(url, || async move {
                let resp = self.client.get(url).send().await?;
                let status = resp.status();
                if status.is_server_error() || status.as_u16() == 429 {
                    return Err(ScraperError::fetch(url, format!("HTTP {}", status)));
                }
                Ok(resp.url().to_string())
            })
            .await?;
        if final_url.is_empty() {
            return Err(ScraperError::fetch(url, "redirect chain ended without a URL"));
        }
        Ok(final_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_grows_and_caps() {
        for _ in 0..20 {
            let first = backoff_delay(1, 100, 1_000);
            assert!(first >= Duration::from_millis(50) && first <= Duration::from_millis(100));

            let third = backoff_delay(3, 100, 1_000);
            assert!(third >= Duration::from_millis(200) && third <= Duration::from_millis(400));

            let capped = backoff_delay(10, 100, 1_000);
            assert!(capped >= Duration::from_millis(500) && capped <= Duration::from_millis(1_000));
        }
    }

    #[test]
    fn test_zero_backoff() {
        assert_eq!(backoff_delay(1, 0, 0), Duration::ZERO);
    }

    /// Serve `routes` (path -> raw status line and headers) on a local port.
    async fn serve(routes: Vec<(&'static str, &'static str)>) -> String {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            loop {
                let Ok((mut socket, _)) = listener.accept().await else {
                    return;
                };
                let mut buf = vec![0u8; 4096];
                let n = socket.read(&mut buf).await.unwrap_or(0);
                let request = String::from_utf8_lossy(&buf[..n]).to_string();
                let path = request.split_whitespace().nth(1).unwrap_or("/").to_string();
                let head = routes
                    .iter()
                    .find(|(p, _)| *p == path)
                    .map(|(_, h)| *h)
                    .unwrap_or("HTTP/1.1 404 Not Found");
                let response = format!("{head}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n");
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });
        format!("http://{addr}")
    }

    fn quick_config() -> FetchConfig {
        FetchConfig {
            max_retries: 2,
            backoff_min_ms: 1,
            backoff_max_ms: 2,
            ..FetchConfig::default()
        }
    }

    #[tokio::test]
    async fn test_resolve_keeps_final_url_of_forbidden_page() {
        let base = serve(vec![
            ("/r", "HTTP/1.1 302 Found\r\nLocation: /final"),
            ("/final", "HTTP/1.1 403 Forbidden"),
        ])
        .await;
        let fetcher = ReqwestFetcher::new(&quick_config()).unwrap();

        let resolved = fetcher.resolve(&format!("{base}/r")).await.unwrap();
        assert_eq!(resolved, format!("{base}/final"));

        assert!(fetcher.fetch(&format!("{base}/final")).await.is_err());
    }

    #[tokio::test]
    async fn test_resolve_fails_on_server_error() {
        let base = serve(vec![("/down", "HTTP/1.1 503 Service Unavailable")]).await;
        let fetcher = ReqwestFetcher::new(&quick_config()).unwrap();
        assert!(fetcher.resolve(&format!("{base}/down")).await.is_err());
    }

    #[test]
    fn test_builds_from_default_config() {
        let fetcher = ReqwestFetcher::new(&FetchConfig::default()).unwrap();
        assert_eq!(fetcher.max_retries, 3);
    }
}
