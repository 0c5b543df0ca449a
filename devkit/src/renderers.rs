/*!
Renderers scriptés pour tester le repli sur le payload brut
*/

use jsonapi_sensor::render::VALUE_BINDING;
use jsonapi_sensor::{Render, RenderContext, RenderError};
use parking_lot::Mutex;
use serde_json::Value;

/// Always fails during evaluation, like a template that raises.
#[derive(Debug, Default)]
pub struct FailingRenderer;

impl Render for FailingRenderer {
    fn render(&self, _rule: &str, _context: &RenderContext<'_>) -> Result<String, RenderError> {
        Err(RenderError::Evaluate("scripted failure".into()))
    }
}

/// Ignores the rule and returns a fixed text.
#[derive(Debug)]
pub struct StaticRenderer(pub String);

impl Render for StaticRenderer {
    fn render(&self, _rule: &str, _context: &RenderContext<'_>) -> Result<String, RenderError> {
        Ok(self.0.clone())
    }
}

/// Records the rule and the bound value of every call, then echoes the value
/// back as JSON.
#[derive(Debug, Default)]
pub struct RecordingRenderer {
    calls: Mutex<Vec<(String, Value)>>,
}

impl RecordingRenderer {
    pub fn calls(&self) -> Vec<(String, Value)> {
        self.calls.lock().clone()
    }
}

impl Render for RecordingRenderer {
    fn render(&self, rule: &str, context: &RenderContext<'_>) -> Result<String, RenderError> {
        let bound = context
            .lookup(VALUE_BINDING)
            .cloned()
            .ok_or_else(|| RenderError::Evaluate(format!("`{VALUE_BINDING}` is undefined")))?;
        let text = bound.to_string();
        self.calls.lock().push((rule.to_string(), bound));
        Ok(text)
    }
}
