/**
 * JINJA RENDERER - Renderer par défaut des attributes_template
 *
 * ROLE: evaluates an `attributes_template` with minijinja, the payload bound
 * as `value_json`. The output must itself be JSON, so a template usually
 * looks like hand-written JSON with expressions spliced in:
 *
 * ```text
 * {"count": {{ value_json.items | length }}, "first": {{ value_json.items | first | tojson }}}
 * ```
 *
 * Full Jinja syntax is available (`{% for %}`, `{% if %}`, arithmetic, the
 * builtin filters). Undefined values are strict: printing or iterating a
 * missing key is an error, which sends the cycle to the raw-payload fallback.
 */

use minijinja::{Environment, UndefinedBehavior};
use std::collections::BTreeMap;

use crate::render::{Render, RenderContext, RenderError, VALUE_BINDING};

#[derive(Debug)]
pub struct JinjaRenderer {
    env: Environment<'static>,
}

impl JinjaRenderer {
    pub fn new() -> Self {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        Self { env }
    }
}

impl Default for JinjaRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Render for JinjaRenderer {
    fn render(&self, rule: &str, context: &RenderContext<'_>) -> Result<String, RenderError> {
        let mut vars = BTreeMap::new();
        vars.insert(VALUE_BINDING, minijinja::Value::from_serialize(context.value()));

        self.env
            .render_str(rule, vars)
            .map_err(|e| RenderError::Evaluate(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::render_value;
    use serde_json::{json, Value};

    fn render(rule: &str, payload: &Value) -> Result<String, RenderError> {
        JinjaRenderer::new().render(rule, &RenderContext::new(payload))
    }

    #[test]
    fn test_literal_text_untouched() {
        assert_eq!(render(r#"{"a": 1}"#, &json!(null)).unwrap(), r#"{"a": 1}"#);
    }

    #[test]
    fn test_paths() {
        let payload = json!({
            "data": {"items": [{"id": 7}, {"id": 8}], "weird key": true},
            "name": "probe"
        });
        assert_eq!(render("{{ value_json.data.items[1].id }}", &payload).unwrap(), "8");
        assert_eq!(render("{{ value_json.data['weird key'] | tojson }}", &payload).unwrap(), "true");
        assert_eq!(render(r#"{{ value_json["name"] }}"#, &payload).unwrap(), "probe");
    }

    #[test]
    fn test_quoted_key_with_pipe_and_bracket() {
        let payload = json!({"a|b": 1, "x]y": 2});
        assert_eq!(render("{{ value_json['a|b'] }}", &payload).unwrap(), "1");
        assert_eq!(render("{{ value_json['x]y'] }}", &payload).unwrap(), "2");
    }

    #[test]
    fn test_strings_raw_unless_tojson() {
        let payload = json!({"name": "probe"});
        assert_eq!(render("{{ value_json.name }}", &payload).unwrap(), "probe");
        assert_eq!(render("{{ value_json.name | tojson }}", &payload).unwrap(), "\"probe\"");
    }

    #[test]
    fn test_filters() {
        let payload = json!({"items": ["a", "b", "c"], "meta": {"x": 1, "y": 2}});
        assert_eq!(render("{{ value_json.items | length }}", &payload).unwrap(), "3");
        assert_eq!(render("{{ value_json.items | first }}", &payload).unwrap(), "a");
        assert_eq!(render("{{ value_json.items | last | tojson }}", &payload).unwrap(), "\"c\"");
        assert_eq!(render("{{ value_json.meta | length }}", &payload).unwrap(), "2");
    }

    #[test]
    fn test_loop_builds_json_array() {
        let payload = json!({"items": [{"id": 1}, {"id": 2}, {"id": 3}]});
        let rule = r#"{"ids": [{% for item in value_json.items %}{{ item.id }}{% if not loop.last %}, {% endif %}{% endfor %}]}"#;
        let out = render_value(&JinjaRenderer::new(), rule, &payload).unwrap();
        assert_eq!(out, json!({"ids": [1, 2, 3]}));
    }

    #[test]
    fn test_conditional_and_arithmetic() {
        let payload = json!({"used": 3, "free": 5});
        let rule = r#"{"count": {{ value_json.used + value_json.free }}, "full": {% if value_json.free == 0 %}true{% else %}false{% endif %}}"#;
        let out = render_value(&JinjaRenderer::new(), rule, &payload).unwrap();
        assert_eq!(out, json!({"count": 8, "full": false}));
    }

    #[test]
    fn test_strict_undefined() {
        let payload = json!({"a": 1, "list": [1]});
        assert!(render("{{ value.a }}", &payload).is_err());
        assert!(render("{{ value_json.b }}", &payload).is_err());
        assert!(render("{{ value_json.missing | length }}", &payload).is_err());
        assert!(render("{{ value_json.list[3] }}", &payload).is_err());
        assert!(render("{% for x in value_json.nope %}{{ x }}{% endfor %}", &payload).is_err());
    }

    #[test]
    fn test_syntax_errors() {
        let payload = json!({"a": [1]});
        assert!(render("{{ value_json.a", &payload).is_err());
        assert!(render("{{ value_json.a[0 }}", &payload).is_err());
        assert!(render("{{ }}", &payload).is_err());
        assert!(render("{{ value_json.a | shout }}", &payload).is_err());
        assert!(render("{% for x in value_json.a %}", &payload).is_err());
    }

    #[test]
    fn test_reshapes_payload_for_normalization() {
        let payload = json!({"results": [{"n": 1}, {"n": 2}], "page": 1});
        let rule = r#"{"count": {{ value_json.results | length }}, "latest": {{ value_json.results | last | tojson }}}"#;
        let out = render_value(&JinjaRenderer::new(), rule, &payload).unwrap();
        assert_eq!(out, json!({"count": 2, "latest": {"n": 2}}));
    }
}
