//! Widget selection and value shaping between stored values and widget text.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::domain::{FieldKind, FieldSpec};

/// Value the server returns for a secret that is set but never sent back.
pub const ENCRYPTED_PLACEHOLDER: &str = "$encrypted$";

/// Text shown in place of a masked secret.
pub const MASK: &str = "********";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "widget", rename_all = "snake_case")]
pub enum Widget {
    TextInput,
    SecretInput {
        revealed: bool,
        /// Whether a reveal/mask toggle is offered
        toggle: bool,
    },
    TextArea {
        #[serde(skip_serializing_if = "Option::is_none")]
        rows: Option<u32>,
    },
    CodeEditor {
        #[serde(skip_serializing_if = "Option::is_none")]
        rows: Option<u32>,
    },
}

impl Widget {
    pub fn for_field(spec: &FieldSpec, revealed: bool) -> Self {
        match spec.kind {
            FieldKind::Text => Widget::TextInput,
            FieldKind::Sensitive => Widget::SecretInput {
                revealed,
                toggle: spec.has_show_input_button,
            },
            FieldKind::Textarea if spec.code_mirror => Widget::CodeEditor { rows: spec.rows },
            FieldKind::Textarea => Widget::TextArea { rows: spec.rows },
        }
    }
}

pub fn is_encrypted_placeholder(value: &Value) -> bool {
    value.as_str() == Some(ENCRYPTED_PLACEHOLDER)
}

/// Text a widget shows for a stored value, before any masking.
pub fn display_text(spec: &FieldSpec, value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) if !(spec.kind == FieldKind::Textarea && spec.code_mirror) => s.clone(),
        _ if spec.kind == FieldKind::Textarea && spec.code_mirror => {
            serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
        }
        Value::Array(items) if spec.kind == FieldKind::Textarea => items
            .iter()
            .map(|item| match item {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect::<Vec<_>>()
            .join("\n"),
        other => other.to_string(),
    }
}

/// Text shown for a sensitive value, honoring the reveal toggle.
pub fn masked_text(spec: &FieldSpec, value: &Value, revealed: bool) -> String {
    if value.is_null() || value.as_str() == Some("") {
        return String::new();
    }
    if revealed && spec.has_show_input_button && !is_encrypted_placeholder(value) {
        display_text(spec, value)
    } else {
        MASK.to_string()
    }
}

/// Turn widget text back into a stored value. `prior` decides the shape of
/// plain textareas: a list-valued setting takes one item per non-empty line.
pub fn parse_input(spec: &FieldSpec, prior: &Value, text: &str) -> Result<Value, String> {
    match spec.kind {
        FieldKind::Text | FieldKind::Sensitive => Ok(Value::String(text.to_string())),
        FieldKind::Textarea if spec.code_mirror => {
            if text.trim().is_empty() {
                return Ok(Value::Object(Map::new()));
            }
            // YAML is a superset of JSON, so one parser covers both.
            let parsed: Value = serde_yaml::from_str(text).map_err(|e| e.to_string())?;
            match parsed {
                Value::Object(_) | Value::Array(_) => Ok(parsed),
                Value::Null => Ok(Value::Object(Map::new())),
                _ => Err("expected a JSON or YAML mapping or list".to_string()),
            }
        }
        FieldKind::Textarea => match prior {
            Value::Array(_) => Ok(Value::Array(
                text.lines()
                    .map(str::trim)
                    .filter(|line| !line.is_empty())
                    .map(|line| Value::String(line.to_string()))
                    .collect(),
            )),
            _ => Ok(Value::String(text.to_string())),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_widget_selection() {
        assert_eq!(Widget::for_field(&FieldSpec::text("A"), false), Widget::TextInput);
        assert_eq!(
            Widget::for_field(&FieldSpec::sensitive("A").show_input_button(), true),
            Widget::SecretInput { revealed: true, toggle: true }
        );
        assert_eq!(
            Widget::for_field(&FieldSpec::textarea("A").rows(6), false),
            Widget::TextArea { rows: Some(6) }
        );
        assert_eq!(
            Widget::for_field(&FieldSpec::textarea("A").code_mirror(), false),
            Widget::CodeEditor { rows: None }
        );
    }

    #[test]
    fn test_list_textarea_shapes_lines() {
        let spec = FieldSpec::textarea("DOMAINS").rows(6);
        let prior = json!(["example.com"]);
        assert_eq!(display_text(&spec, &prior), "example.com");

        let parsed = parse_input(&spec, &prior, "a.com\n\n  b.org  \n").unwrap();
        assert_eq!(parsed, json!(["a.com", "b.org"]));
    }

    #[test]
    fn test_rows_do_not_limit_value_length() {
        let spec = FieldSpec::textarea("DOMAINS").rows(1);
        let text = (0..20).map(|i| format!("d{}.com", i)).collect::<Vec<_>>().join("\n");
        let parsed = parse_input(&spec, &json!([]), &text).unwrap();
        assert_eq!(parsed.as_array().unwrap().len(), 20);
    }

    #[test]
    fn test_code_editor_accepts_json_and_yaml() {
        let spec = FieldSpec::textarea("MAP").code_mirror();
        assert_eq!(
            parse_input(&spec, &json!({}), r#"{"Default": {"users": true}}"#).unwrap(),
            json!({"Default": {"users": true}})
        );
        assert_eq!(
            parse_input(&spec, &json!({}), "Default:\n  users: true\n").unwrap(),
            json!({"Default": {"users": true}})
        );
        assert_eq!(parse_input(&spec, &json!(null), "  ").unwrap(), json!({}));
        assert!(parse_input(&spec, &json!({}), "{unclosed").is_err());
        assert!(parse_input(&spec, &json!({}), "just text").is_err());
    }

    #[test]
    fn test_code_editor_display_is_pretty_json() {
        let spec = FieldSpec::textarea("MAP").code_mirror();
        assert_eq!(display_text(&spec, &json!({"a": 1})), "{\n  \"a\": 1\n}");
    }

    #[test]
    fn test_masking() {
        let spec = FieldSpec::sensitive("S").show_input_button();
        assert_eq!(masked_text(&spec, &json!("hunter2"), false), MASK);
        assert_eq!(masked_text(&spec, &json!("hunter2"), true), "hunter2");
        assert_eq!(masked_text(&spec, &json!(ENCRYPTED_PLACEHOLDER), true), MASK);
        assert_eq!(masked_text(&spec, &json!(""), false), "");

        let no_toggle = FieldSpec::sensitive("S");
        assert_eq!(masked_text(&no_toggle, &json!("hunter2"), true), MASK);
    }
}
