//! Penalty Worker
//!
//! Background task that lifts penalties once their holds expire.
//! It sleeps until the earliest pending expiry (capped by the sweep
//! interval) and is woken early whenever a new penalty is scheduled.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::time::sleep;

use crate::domain::LendingError;

use super::LendingEngine;

/// Configuration for the penalty worker
#[derive(Debug, Clone)]
pub struct PenaltyWorkerConfig {
    /// Longest the worker sleeps between sweeps (default: 1 minute)
    pub sweep_interval: Duration,
    /// Wait after a failed sweep before trying again (default: 5 seconds)
    pub retry_delay: Duration,
}

impl Default for PenaltyWorkerConfig {
    fn default() -> Self {
        Self {
            sweep_interval: Duration::from_secs(60),
            retry_delay: Duration::from_secs(5),
        }
    }
}

/// Penalty Worker - fires due penalty clears
pub struct PenaltyWorker {
    engine: Arc<LendingEngine>,
    config: PenaltyWorkerConfig,
}

impl PenaltyWorker {
    pub fn new(engine: Arc<LendingEngine>) -> Self {
        Self {
            engine,
            config: PenaltyWorkerConfig::default(),
        }
    }

    pub fn with_config(engine: Arc<LendingEngine>, config: PenaltyWorkerConfig) -> Self {
        Self { engine, config }
    }

    /// Start the worker in the background.
    /// Returns a handle that can be used to abort it.
    pub fn start(self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            self.run().await;
        })
    }

    async fn run(&self) {
        tracing::info!(
            sweep_interval_secs = self.config.sweep_interval.as_secs(),
            "Penalty worker started"
        );

        loop {
            let wait = match self.run_once().await {
                Ok(next_expiry) => self.wait_until(next_expiry),
                Err(e) => {
                    tracing::error!(error = ?e, "Penalty sweep failed");
                    self.config.retry_delay
                }
            };

            tokio::select! {
                _ = sleep(wait) => {}
                _ = self.engine.penalty_scheduled().notified() => {
                    tracing::debug!("Penalty worker woken by new penalty");
                }
            }
        }
    }

    /// Lift every due penalty once.
    /// Returns the next pending expiry, if any.
    pub async fn run_once(&self) -> Result<Option<DateTime<Utc>>, LendingError> {
        let released = self.engine.release_expired_penalties().await?;
        if !released.is_empty() {
            tracing::info!(count = released.len(), members = ?released, "Penalties expired");
        }
        self.engine.next_penalty_expiry().await
    }

    fn wait_until(&self, next_expiry: Option<DateTime<Utc>>) -> Duration {
        sleep_duration(self.engine.now(), next_expiry, self.config.sweep_interval)
    }
}

/// Time to sleep before the next sweep
fn sleep_duration(
    now: DateTime<Utc>,
    next_expiry: Option<DateTime<Utc>>,
    sweep_interval: Duration,
) -> Duration {
    match next_expiry {
        // Past-due expiries convert to a negative duration; sweep right away
        Some(at) => (at - now)
            .to_std()
            .unwrap_or(Duration::ZERO)
            .min(sweep_interval),
        None => sweep_interval,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 10, 8, 0, 0).unwrap()
    }

    #[test]
    fn test_worker_config_default() {
        let config = PenaltyWorkerConfig::default();
        assert_eq!(config.sweep_interval, Duration::from_secs(60));
        assert_eq!(config.retry_delay, Duration::from_secs(5));
    }

    #[test]
    fn test_sleep_duration_idle() {
        assert_eq!(sleep_duration(t0(), None, Duration::from_secs(60)), Duration::from_secs(60));
    }

    #[test]
    fn test_sleep_duration_until_expiry() {
        let next = t0() + chrono::Duration::seconds(20);
        assert_eq!(
            sleep_duration(t0(), Some(next), Duration::from_secs(60)),
            Duration::from_secs(20)
        );
    }

    #[test]
    fn test_sleep_duration_capped_by_sweep_interval() {
        let next = t0() + chrono::Duration::days(3);
        assert_eq!(
            sleep_duration(t0(), Some(next), Duration::from_secs(60)),
            Duration::from_secs(60)
        );
    }

    #[test]
    fn test_sleep_duration_past_due() {
        let next = t0() - chrono::Duration::seconds(5);
        assert_eq!(sleep_duration(t0(), Some(next), Duration::from_secs(60)), Duration::ZERO);
    }
}
