//! Optional render step applied to the fetched payload before normalization.
//!
//! The template engine is injected through [`Render`]; the payload is exposed
//! to it under the single binding [`VALUE_BINDING`] and the rendered text must
//! itself be JSON.

use serde_json::Value;
use tracing::debug;

pub const VALUE_BINDING: &str = "value_json";

const LOGGED_OUTPUT_CHARS: usize = 200;

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("template evaluation failed: {0}")]
    Evaluate(String),
    #[error("rendered output is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

/// Execution context handed to the template engine.
#[derive(Debug, Clone, Copy)]
pub struct RenderContext<'a> {
    value: &'a Value,
}

impl<'a> RenderContext<'a> {
    pub fn new(value: &'a Value) -> Self {
        Self { value }
    }

    pub fn lookup(&self, name: &str) -> Option<&'a Value> {
        (name == VALUE_BINDING).then_some(self.value)
    }

    pub fn value(&self) -> &'a Value {
        self.value
    }
}

pub trait Render: Send + Sync {
    fn render(&self, rule: &str, context: &RenderContext<'_>) -> Result<String, RenderError>;
}

/// Evaluates `rule` against `value` and parses the output back into JSON.
pub fn render_value(renderer: &dyn Render, rule: &str, value: &Value) -> Result<Value, RenderError> {
    let rendered = renderer.render(rule, &RenderContext::new(value))?;
    debug!(rendered = %preview(&rendered), "template rendered");
    Ok(serde_json::from_str(&rendered)?)
}

fn preview(text: &str) -> &str {
    match text.char_indices().nth(LOGGED_OUTPUT_CHARS) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
