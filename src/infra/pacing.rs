use crate::config::PacingConfig;
use rand::Rng;
use std::time::Duration;
use tracing::debug;

/// Random politeness delay between page loads.
#[derive(Debug, Clone, Copy)]
pub struct Pacer {
    min_ms: u64,
    max_ms: u64,
}

impl Pacer {
    pub fn new(min_ms: u64, max_ms: u64) -> Self {
        Self {
            min_ms: min_ms.min(max_ms),
            max_ms: max_ms.max(min_ms),
        }
    }

    pub fn from_config(config: &PacingConfig) -> Self {
        Self::new(config.min_delay_ms, config.max_delay_ms)
    }

    /// A pacer that never sleeps.
    pub fn disabled() -> Self {
        Self::new(0, 0)
    }

    pub fn is_disabled(&self) -> bool {
        self.max_ms == 0
    }

    pub fn next_delay(&self) -> Duration {
        if self.is_disabled() {
            return Duration::ZERO;
        }
        let ms = rand::thread_rng().gen_range(self.min_ms..=self.max_ms);
        Duration::from_millis(ms)
    }

    pub async fn wait(&self) {
        let delay = self.next_delay();
        if delay.is_zero() {
            return;
        }
        debug!("Pacing for {:?}", delay);
        tokio::time::sleep(delay).await;
    }
}
