/*!
Test Harness pour capteurs JSON API

Assemble un endpoint simulé et un capteur configuré dessus:
- Construction du capteur (template, headers, authorization, timeout)
- Exécution d'un cycle de poll
- Assertions sur l'état observable
*/

use crate::stub_endpoint::StubEndpoint;
use anyhow::Result;
use jsonapi_sensor::{
    Fetcher, JinjaRenderer, JsonApiSensor, PollOutcome, Render, SensorConfig, SensorEntry,
};
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Duration;

pub struct TestHarness {
    pub endpoint: StubEndpoint,
    pub sensor: JsonApiSensor,
}

/// Builder for the sensor under test.
pub struct HarnessBuilder {
    entry: SensorEntry,
    renderer: Arc<dyn Render>,
    timeout: Option<Duration>,
    endpoint: StubEndpoint,
}

impl HarnessBuilder {
    pub fn template(mut self, rule: &str) -> Self {
        self.entry.attributes_template = Some(rule.to_string());
        self
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.entry.headers.insert(name.to_string(), value.to_string());
        self
    }

    pub fn authorization(mut self, value: &str) -> Self {
        self.entry.authorization = Some(value.to_string());
        self
    }

    pub fn renderer(mut self, renderer: Arc<dyn Render>) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn fetch_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn build(self) -> Result<TestHarness> {
        let config = SensorConfig::try_from(self.entry)?;
        let mut fetcher = Fetcher::new(reqwest::Client::new());
        if let Some(timeout) = self.timeout {
            fetcher = fetcher.with_timeout(timeout);
        }

        Ok(TestHarness {
            endpoint: self.endpoint,
            sensor: JsonApiSensor::new(config, fetcher, self.renderer),
        })
    }
}

impl TestHarness {
    /// Starts a stub endpoint; the sensor defaults to the Jinja renderer and no template.
    pub async fn builder() -> HarnessBuilder {
        init_tracing();
        let endpoint = StubEndpoint::start().await;
        HarnessBuilder {
            entry: SensorEntry::new(endpoint.url()),
            renderer: Arc::new(JinjaRenderer::new()),
            timeout: None,
            endpoint,
        }
    }

    pub async fn new() -> Result<Self> {
        Self::builder().await.build()
    }

    /// Serves `body` and runs one poll cycle.
    pub async fn poll_with(&self, body: Value) -> PollOutcome {
        self.endpoint.respond_json(body).await;
        self.sensor.update().await
    }

    pub fn assert_state(&self, primary: &Value, attributes: &Value) -> Result<()> {
        let state = self.sensor.state();
        if state.primary != *primary {
            anyhow::bail!("primary mismatch: expected {primary}, got {}", state.primary);
        }
        let actual = Value::Object(state.attributes);
        if actual != *attributes {
            anyhow::bail!("attributes mismatch: expected {attributes}, got {actual}");
        }
        Ok(())
    }

    /// Attribute lookup with a dotted path (`meta.region`).
    pub fn attribute(&self, path: &str) -> Option<Value> {
        get_nested_field(&self.sensor.attributes(), path).cloned()
    }
}

fn get_nested_field<'a>(attributes: &'a Map<String, Value>, path: &str) -> Option<&'a Value> {
    let mut parts = path.split('.');
    let mut current = attributes.get(parts.next()?)?;

    for part in parts {
        current = match current {
            Value::Object(obj) => obj.get(part)?,
            Value::Array(items) => items.get(part.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }

    Some(current)
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
