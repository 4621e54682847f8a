//! Form schema types.
//!
//! Two layers live here:
//!
//! - the **wire documents** (`FormSchemaDoc` and friends), which mirror the
//!   camelCase JSON/YAML/TOML shape schema authors write and keep widget types,
//!   predicates and commands as loose strings;
//! - the **compiled schema** (`FormSchema`), where every one of those has been
//!   resolved to a closed enum by `config::validator::SchemaValidator`.
//!
//! ## Example schema
//!
//! ```yaml
//! name: configuration_google_oauth_template
//! showActions: true
//! showHeader: false
//! fields:
//!   SOCIAL_AUTH_GOOGLE_OAUTH2_SECRET:
//!     type: sensitive
//!     hasShowInputButton: true
//!     reset: SOCIAL_AUTH_GOOGLE_OAUTH2_SECRET
//! buttons:
//!   reset:
//!     ngShow: "!user_is_system_auditor"
//!     ngClick: vm.resetAllConfirm()
//!   save:
//!     ngClick: vm.formSave()
//!     ngDisabled: true
//! ```

use indexmap::IndexMap;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use super::predicate::{Command, Predicate};
use super::ResetBinding;

// ============================================================================
// Wire documents
// ============================================================================

/// A form schema as written by schema authors.
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FormSchemaDoc {
    /// Unique identifier within the form registry
    pub name: String,
    /// Whether the button row is rendered
    #[serde(default = "default_true")]
    pub show_actions: bool,
    /// Whether a title/header region is rendered
    #[serde(default)]
    pub show_header: bool,
    /// Field key to field spec; document order is render order
    pub fields: IndexMap<String, FieldSpecDoc>,
    #[serde(default)]
    pub buttons: ButtonsDoc,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FieldSpecDoc {
    /// Widget type: `text`, `sensitive` or `textarea`
    #[serde(rename = "type")]
    pub kind: String,
    /// Configuration key whose server-side default this field resets to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reset: Option<String>,
    /// Line height hint for multi-line widgets
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rows: Option<i64>,
    /// Render a textarea as a code editor
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_mirror: Option<bool>,
    /// Render a reveal/mask toggle on a sensitive field
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_show_input_button: Option<bool>,
    /// Styling hint, opaque to behavior
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,
}

/// The fixed button-role set. Any other key is rejected.
#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct ButtonsDoc {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reset: Option<ButtonSpecDoc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cancel: Option<ButtonSpecDoc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub save: Option<ButtonSpecDoc>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ButtonSpecDoc {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Visibility predicate: a boolean or an expression such as `"!user_is_system_auditor"`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ng_show: Option<Value>,
    /// Command reference such as `"vm.formSave()"`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ng_click: Option<String>,
    /// Disabling predicate: a boolean or an expression
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ng_disabled: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,
}

// ============================================================================
// Compiled schema
// ============================================================================

/// Widget kinds the interpreter can render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Text,
    Sensitive,
    Textarea,
}

impl FieldKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKind::Text => "text",
            FieldKind::Sensitive => "sensitive",
            FieldKind::Textarea => "textarea",
        }
    }
}

impl FromStr for FieldKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(FieldKind::Text),
            "sensitive" => Ok(FieldKind::Sensitive),
            "textarea" => Ok(FieldKind::Textarea),
            _ => Err(()),
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldSpec {
    #[serde(rename = "type")]
    pub kind: FieldKind,
    pub reset: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rows: Option<u32>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub code_mirror: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub has_show_input_button: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,
}

impl FieldSpec {
    pub fn new(kind: FieldKind, reset: impl Into<String>) -> Self {
        Self {
            kind,
            reset: reset.into(),
            rows: None,
            code_mirror: false,
            has_show_input_button: false,
            class: None,
        }
    }

    pub fn text(reset: impl Into<String>) -> Self {
        Self::new(FieldKind::Text, reset)
    }

    pub fn sensitive(reset: impl Into<String>) -> Self {
        Self::new(FieldKind::Sensitive, reset)
    }

    pub fn textarea(reset: impl Into<String>) -> Self {
        Self::new(FieldKind::Textarea, reset)
    }

    pub fn rows(mut self, rows: u32) -> Self {
        self.rows = Some(rows);
        self
    }

    pub fn code_mirror(mut self) -> Self {
        self.code_mirror = true;
        self
    }

    pub fn show_input_button(mut self) -> Self {
        self.has_show_input_button = true;
        self
    }

    pub fn class(mut self, class: impl Into<String>) -> Self {
        self.class = Some(class.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ButtonRole {
    Reset,
    Cancel,
    Save,
}

impl ButtonRole {
    /// Roles in button-row order
    pub const ALL: [ButtonRole; 3] = [ButtonRole::Reset, ButtonRole::Cancel, ButtonRole::Save];

    pub fn as_str(&self) -> &'static str {
        match self {
            ButtonRole::Reset => "reset",
            ButtonRole::Cancel => "cancel",
            ButtonRole::Save => "save",
        }
    }

    /// The command a button of this role must be bound to
    pub fn command(&self) -> Command {
        match self {
            ButtonRole::Reset => Command::ResetAllConfirm,
            ButtonRole::Cancel => Command::FormCancel,
            ButtonRole::Save => Command::FormSave,
        }
    }

    /// Engine default label, used when the schema provides none
    pub fn default_label(&self) -> &'static str {
        match self {
            ButtonRole::Reset => "Revert all to default",
            ButtonRole::Cancel => "Cancel",
            ButtonRole::Save => "Save",
        }
    }
}

impl fmt::Display for ButtonRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ButtonSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(rename = "ngShow", skip_serializing_if = "Option::is_none")]
    pub show: Option<Predicate>,
    #[serde(rename = "ngClick", skip_serializing_if = "Option::is_none")]
    pub command: Option<Command>,
    #[serde(rename = "ngDisabled", skip_serializing_if = "Option::is_none")]
    pub disabled: Option<Predicate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Buttons {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reset: Option<ButtonSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancel: Option<ButtonSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub save: Option<ButtonSpec>,
}

impl Buttons {
    pub fn get(&self, role: ButtonRole) -> Option<&ButtonSpec> {
        match role {
            ButtonRole::Reset => self.reset.as_ref(),
            ButtonRole::Cancel => self.cancel.as_ref(),
            ButtonRole::Save => self.save.as_ref(),
        }
    }

    /// Declared buttons in button-row order
    pub fn iter(&self) -> impl Iterator<Item = (ButtonRole, &ButtonSpec)> {
        ButtonRole::ALL
            .into_iter()
            .filter_map(move |role| self.get(role).map(|spec| (role, spec)))
    }
}

/// A validated, immutable form schema.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormSchema {
    pub name: String,
    pub show_actions: bool,
    pub show_header: bool,
    pub fields: IndexMap<String, FieldSpec>,
    pub buttons: Buttons,
}

impl FormSchema {
    pub fn field(&self, key: &str) -> Option<&FieldSpec> {
        self.fields.get(key)
    }

    /// Field keys in render order
    pub fn field_keys(&self) -> Vec<String> {
        self.fields.keys().cloned().collect()
    }

    /// Reset keys in render order
    pub fn reset_keys(&self) -> Vec<String> {
        self.fields.values().map(|f| f.reset.clone()).collect()
    }

    /// Each field key with the key whose default it resets to
    pub fn reset_bindings(&self) -> Vec<ResetBinding> {
        self.fields
            .iter()
            .map(|(key, f)| ResetBinding::new(key.clone(), f.reset.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_doc_preserves_field_order() {
        let yaml = r#"
name: ordered
fields:
  ZETA: { type: text, reset: ZETA }
  ALPHA: { type: text, reset: ALPHA }
  MID: { type: textarea, reset: MID, rows: 4 }
"#;
        let doc: FormSchemaDoc = serde_yaml::from_str(yaml).unwrap();
        let keys: Vec<&str> = doc.fields.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["ZETA", "ALPHA", "MID"]);
        assert!(doc.show_actions);
        assert!(!doc.show_header);
    }

    #[test]
    fn test_doc_rejects_unknown_button_role() {
        let json = r#"{"name": "x", "fields": {}, "buttons": {"delete": {}}}"#;
        assert!(serde_json::from_str::<FormSchemaDoc>(json).is_err());
    }

    #[test]
    fn test_field_kind_parse() {
        assert_eq!("sensitive".parse::<FieldKind>(), Ok(FieldKind::Sensitive));
        assert!("checkbox".parse::<FieldKind>().is_err());
    }

    #[test]
    fn test_compiled_schema_serializes_to_wire_shape() {
        let mut fields = IndexMap::new();
        fields.insert(
            "SECRET".to_string(),
            FieldSpec::sensitive("SECRET").show_input_button(),
        );
        let schema = FormSchema {
            name: "demo".to_string(),
            show_actions: true,
            show_header: false,
            fields,
            buttons: Buttons {
                save: Some(ButtonSpec {
                    command: Some(Command::FormSave),
                    ..Default::default()
                }),
                ..Default::default()
            },
        };
        let value = serde_json::to_value(&schema).unwrap();
        assert_eq!(value["showActions"], true);
        assert_eq!(value["fields"]["SECRET"]["type"], "sensitive");
        assert_eq!(value["fields"]["SECRET"]["hasShowInputButton"], true);
        assert!(value["fields"]["SECRET"].get("codeMirror").is_none());
        assert_eq!(value["buttons"]["save"]["ngClick"], "formSave");
    }

    #[test]
    fn test_buttons_iterate_in_row_order() {
        let buttons = Buttons {
            save: Some(ButtonSpec::default()),
            reset: Some(ButtonSpec::default()),
            cancel: None,
        };
        let roles: Vec<ButtonRole> = buttons.iter().map(|(r, _)| r).collect();
        assert_eq!(roles, vec![ButtonRole::Reset, ButtonRole::Save]);
    }
}
