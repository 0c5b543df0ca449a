/**
 * SENSOR REGISTRY - catalogue des capteurs configurés et leurs pollers
 *
 * ROLE: builds one `JsonApiSensor` per configured entry, all sharing the same
 * HTTP client and renderer, and drives each of them on its own interval.
 *
 * SCHEDULING: one tokio task per sensor. Each cycle is awaited before the next
 * tick is taken and late ticks are skipped, so a sensor never has two polls in
 * flight. The first tick fires immediately.
 */

use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::{self, JoinHandle};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::config::RuntimeConfig;
use crate::fetch::Fetcher;
use crate::health::HealthTracker;
use crate::render::Render;
use crate::sensor::JsonApiSensor;

#[derive(Clone, Default)]
pub struct SensorRegistry {
    sensors: Vec<Arc<JsonApiSensor>>,
}

impl SensorRegistry {
    pub fn from_config(config: &RuntimeConfig, client: Client, renderer: Arc<dyn Render>) -> Self {
        let fetcher = Fetcher::new(client);
        let sensors = config
            .sensors
            .iter()
            .cloned()
            .map(|sensor_config| {
                Arc::new(JsonApiSensor::new(sensor_config, fetcher.clone(), renderer.clone()))
            })
            .collect();
        Self { sensors }
    }

    pub fn get(&self, name: &str) -> Option<&Arc<JsonApiSensor>> {
        self.sensors.iter().find(|s| s.name() == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<JsonApiSensor>> {
        self.sensors.iter()
    }

    pub fn len(&self) -> usize {
        self.sensors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sensors.is_empty()
    }

    pub fn spawn_pollers(&self, health: &HealthTracker) -> Vec<JoinHandle<()>> {
        self.sensors
            .iter()
            .map(|sensor| spawn_poller(sensor.clone(), health.clone()))
            .collect()
    }
}

pub fn spawn_poller(sensor: Arc<JsonApiSensor>, health: HealthTracker) -> JoinHandle<()> {
    let period = sensor.config().scan_interval;
    info!(
        sensor = %sensor.name(),
        url = %sensor.config().url,
        interval = %humantime::format_duration(period),
        "poller started"
    );

    task::spawn(async move {
        let mut interval = tokio::time::interval(period.max(Duration::from_millis(1)));
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            interval.tick().await;
            let outcome = sensor.update().await;
            debug!(sensor = %sensor.name(), ?outcome, "poll cycle finished");
            health.record(&outcome);
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::JinjaRenderer;
    use serde_json::json;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_for(urls: &[(&str, String)]) -> RuntimeConfig {
        let mut yaml = String::from("sensors:\n");
        for (name, url) in urls {
            yaml.push_str(&format!("  - url: {url}\n    name: {name}\n    scan_interval: 1\n"));
        }
        RuntimeConfig::from_yaml(&yaml).unwrap()
    }

    #[tokio::test]
    async fn test_lookup_by_name() {
        let server = MockServer::start().await;
        let config = config_for(&[
            ("alpha", format!("{}/a", server.uri())),
            ("beta", format!("{}/b", server.uri())),
        ]);

        let registry = SensorRegistry::from_config(&config, Client::new(), Arc::new(JinjaRenderer::new()));
        assert_eq!(registry.len(), 2);
        assert!(registry.get("beta").is_some());
        assert!(registry.get("gamma").is_none());
    }

    #[tokio::test]
    async fn test_poller_runs_first_cycle_immediately() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"total": 9})))
            .mount(&server)
            .await;

        let config = config_for(&[("alpha", format!("{}/a", server.uri()))]);
        let registry = SensorRegistry::from_config(&config, Client::new(), Arc::new(JinjaRenderer::new()));
        let health = HealthTracker::new();
        let handles = registry.spawn_pollers(&health);

        let sensor = registry.get("alpha").unwrap().clone();
        for _ in 0..50 {
            if sensor.state().last_updated.is_some() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }

        assert_eq!(sensor.primary_value(), json!(9));
        for handle in handles {
            handle.abort();
        }
    }
}
