use parking_lot::Mutex;
use serde_json::{Map, Value};
use std::sync::Arc;
use time::OffsetDateTime;

use crate::normalize::Reading;

pub type Shared<T> = Arc<Mutex<T>>;

pub fn new_state<T>(value: T) -> Shared<T> {
    Arc::new(Mutex::new(value))
}

/// Observable state of one sensor, read by the host as a snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct SensorState {
    pub primary: Value,
    pub attributes: Map<String, Value>,
    pub available: bool,
    pub last_updated: Option<OffsetDateTime>,
}

impl Default for SensorState {
    fn default() -> Self {
        Self {
            primary: Value::Null,
            attributes: Map::new(),
            available: true,
            last_updated: None,
        }
    }
}

impl SensorState {
    /// Replaces the whole record with a fresh reading.
    pub fn commit(&mut self, reading: Reading) {
        *self = Self {
            primary: reading.primary,
            attributes: reading.attributes,
            available: true,
            last_updated: Some(OffsetDateTime::now_utc()),
        };
    }

    /// Failed cycle: previous primary/attributes stay readable.
    pub fn mark_unavailable(&mut self) {
        self.available = false;
    }
}
