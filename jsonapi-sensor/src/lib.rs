//! JSON API sensor
//!
//! Polls an HTTP JSON endpoint, optionally reshapes the payload through an
//! `attributes_template`, and keeps a primary value plus attribute map that a
//! host reads as snapshots.
//!
//! - `fetch`: one bounded GET per cycle
//! - `render` / `template`: injected template engine and the default minijinja renderer
//! - `normalize`: payload to primary value + attributes
//! - `sensor`: the poll cycle and observable state
//! - `registry` / `http` / `health`: runtime plumbing around the sensors

pub mod config;
pub mod fetch;
pub mod health;
pub mod http;
pub mod normalize;
pub mod registry;
pub mod render;
pub mod sensor;
pub mod state;
pub mod template;

pub use config::{RuntimeConfig, SensorConfig, SensorEntry};
pub use fetch::{FetchError, Fetcher};
pub use normalize::{normalize, Reading};
pub use registry::SensorRegistry;
pub use render::{Render, RenderContext, RenderError};
pub use sensor::{JsonApiSensor, PollOutcome};
pub use state::SensorState;
pub use template::JinjaRenderer;
