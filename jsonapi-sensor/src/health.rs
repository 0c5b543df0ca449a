use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::registry::SensorRegistry;
use crate::sensor::PollOutcome;

#[derive(Debug, Serialize, Deserialize)]
pub struct RuntimeHealth {
    pub uptime_seconds: u64,
    pub sensors_tracked: u32,
    pub sensors_available: u32,
    pub polls_succeeded: u64,
    pub polls_failed: u64,
    pub render_fallbacks: u64,
}

#[derive(Clone)]
pub struct HealthTracker {
    start_time: Instant,
    polls_succeeded: Arc<AtomicU64>,
    polls_failed: Arc<AtomicU64>,
    render_fallbacks: Arc<AtomicU64>,
}

impl Default for HealthTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl HealthTracker {
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            polls_succeeded: Arc::new(AtomicU64::new(0)),
            polls_failed: Arc::new(AtomicU64::new(0)),
            render_fallbacks: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn record(&self, outcome: &PollOutcome) {
        match outcome {
            PollOutcome::Updated { render_fallback } => {
                self.polls_succeeded.fetch_add(1, Ordering::Relaxed);
                if *render_fallback {
                    self.render_fallbacks.fetch_add(1, Ordering::Relaxed);
                }
            }
            PollOutcome::Unavailable(_) => {
                self.polls_failed.fetch_add(1, Ordering::Relaxed);
            }
            PollOutcome::Skipped => {}
        }
    }

    pub fn get_health(&self, sensors: &SensorRegistry) -> RuntimeHealth {
        let sensors_available = sensors.iter().filter(|s| s.available()).count() as u32;

        RuntimeHealth {
            uptime_seconds: self.start_time.elapsed().as_secs(),
            sensors_tracked: sensors.len() as u32,
            sensors_available,
            polls_succeeded: self.polls_succeeded.load(Ordering::Relaxed),
            polls_failed: self.polls_failed.load(Ordering::Relaxed),
            render_fallbacks: self.render_fallbacks.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::FetchError;

    #[test]
    fn test_record_outcomes() {
        let tracker = HealthTracker::new();
        tracker.record(&PollOutcome::Updated { render_fallback: false });
        tracker.record(&PollOutcome::Updated { render_fallback: true });
        tracker.record(&PollOutcome::Unavailable(FetchError::Http(503)));
        tracker.record(&PollOutcome::Skipped);

        let health = tracker.get_health(&SensorRegistry::default());
        assert_eq!(health.polls_succeeded, 2);
        assert_eq!(health.render_fallbacks, 1);
        assert_eq!(health.polls_failed, 1);
        assert_eq!(health.sensors_tracked, 0);
    }
}
