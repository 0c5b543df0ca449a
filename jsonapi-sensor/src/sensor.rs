//! JSON API sensor - one poll cycle: fetch, optional render, normalize, commit
//!
//! The sensor is a plain stateful object. The scheduler drives `update()`; the
//! host reads snapshots through `state()` and the accessors.

use serde_json::{Map, Value};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, error, warn};

use crate::config::SensorConfig;
use crate::fetch::{FetchError, Fetcher};
use crate::normalize::{normalize, Reading};
use crate::render::{render_value, Render};
use crate::state::{new_state, SensorState, Shared};

#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    /// State replaced; `render_fallback` is set when the template failed and
    /// the raw payload was normalized instead.
    Updated { render_fallback: bool },
    /// Fetch failed, state kept but marked unavailable.
    Unavailable(FetchError),
    /// Another cycle was still in flight.
    Skipped,
}

pub struct JsonApiSensor {
    config: Arc<SensorConfig>,
    fetcher: Fetcher,
    renderer: Arc<dyn Render>,
    state: Shared<SensorState>,
    polling: AtomicBool,
}

impl JsonApiSensor {
    pub fn new(config: SensorConfig, fetcher: Fetcher, renderer: Arc<dyn Render>) -> Self {
        Self {
            config: Arc::new(config),
            fetcher,
            renderer,
            state: new_state(SensorState::default()),
            polling: AtomicBool::new(false),
        }
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn config(&self) -> &SensorConfig {
        &self.config
    }

    /// Consistent copy of primary value, attributes and availability.
    pub fn state(&self) -> SensorState {
        self.state.lock().clone()
    }

    pub fn primary_value(&self) -> Value {
        self.state.lock().primary.clone()
    }

    pub fn attributes(&self) -> Map<String, Value> {
        self.state.lock().attributes.clone()
    }

    pub fn available(&self) -> bool {
        self.state.lock().available
    }

    pub fn is_polling(&self) -> bool {
        self.polling.load(Ordering::Acquire)
    }

    /// Runs one poll cycle to completion. Never fails: fetch errors only flip
    /// availability, render errors fall back to the raw payload.
    pub async fn update(&self) -> PollOutcome {
        let Some(_guard) = PollGuard::acquire(&self.polling) else {
            warn!(sensor = %self.name(), "previous poll still running, skipping");
            return PollOutcome::Skipped;
        };

        match self.fetcher.fetch(&self.config.url, &self.config.request_headers).await {
            Ok(payload) => {
                let (reading, render_fallback) = self.transform(payload);
                self.state.lock().commit(reading);
                debug!(sensor = %self.name(), url = %self.config.url, "successfully fetched data");
                PollOutcome::Updated { render_fallback }
            }
            Err(err) => {
                error!(sensor = %self.name(), url = %self.config.url, error = %err, "error fetching data");
                self.state.lock().mark_unavailable();
                PollOutcome::Unavailable(err)
            }
        }
    }

    fn transform(&self, payload: Value) -> (Reading, bool) {
        let Some(rule) = self.config.attributes_template.as_deref() else {
            return (normalize(payload), false);
        };

        debug!(sensor = %self.name(), "applying attributes_template");
        match render_value(self.renderer.as_ref(), rule, &payload) {
            Ok(processed) => (normalize(processed), false),
            Err(err) => {
                error!(sensor = %self.name(), error = %err, "error processing attributes_template, using raw payload");
                (normalize(payload), true)
            }
        }
    }
}

/// Idle/Polling flag; released on drop so every exit path returns to Idle.
struct PollGuard<'a>(&'a AtomicBool);

impl<'a> PollGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for PollGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}
