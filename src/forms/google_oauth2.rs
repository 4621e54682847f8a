//! Google OAuth2 authentication settings form.

use indexmap::IndexMap;
use serde_json::{json, Value};
use std::collections::HashMap;

use crate::domain::predicate::{Flag, Predicate};
use crate::domain::schema::{ButtonSpec, Buttons, FieldSpec, FormSchema};
use crate::domain::Command;

pub const NAME: &str = "configuration_google_oauth_template";

pub const CALLBACK_URL: &str = "SOCIAL_AUTH_GOOGLE_OAUTH2_CALLBACK_URL";
pub const KEY: &str = "SOCIAL_AUTH_GOOGLE_OAUTH2_KEY";
pub const SECRET: &str = "SOCIAL_AUTH_GOOGLE_OAUTH2_SECRET";
pub const WHITELISTED_DOMAINS: &str = "SOCIAL_AUTH_GOOGLE_OAUTH2_WHITELISTED_DOMAINS";
pub const AUTH_EXTRA_ARGUMENTS: &str = "SOCIAL_AUTH_GOOGLE_OAUTH2_AUTH_EXTRA_ARGUMENTS";
pub const ORGANIZATION_MAP: &str = "SOCIAL_AUTH_GOOGLE_OAUTH2_ORGANIZATION_MAP";
pub const TEAM_MAP: &str = "SOCIAL_AUTH_GOOGLE_OAUTH2_TEAM_MAP";

const FULL_WIDTH_TEXTAREA: &str = "Form-textAreaLabel Form-formGroup--fullWidth";

pub fn schema() -> FormSchema {
    let mut fields = IndexMap::new();
    fields.insert(CALLBACK_URL.to_string(), FieldSpec::text(CALLBACK_URL));
    fields.insert(KEY.to_string(), FieldSpec::text(KEY));
    fields.insert(
        SECRET.to_string(),
        FieldSpec::sensitive(SECRET).show_input_button(),
    );
    fields.insert(
        WHITELISTED_DOMAINS.to_string(),
        FieldSpec::textarea(WHITELISTED_DOMAINS).rows(6),
    );
    for key in [AUTH_EXTRA_ARGUMENTS, ORGANIZATION_MAP, TEAM_MAP] {
        fields.insert(
            key.to_string(),
            FieldSpec::textarea(key)
                .rows(6)
                .code_mirror()
                .class(FULL_WIDTH_TEXTAREA),
        );
    }

    FormSchema {
        name: NAME.to_string(),
        show_actions: true,
        show_header: false,
        fields,
        buttons: Buttons {
            reset: Some(ButtonSpec {
                label: Some("Revert all to default".to_string()),
                show: Some(Predicate::Not(Box::new(Predicate::Flag(Flag::UserIsSystemAuditor)))),
                command: Some(Command::ResetAllConfirm),
                disabled: None,
                class: Some("Form-resetAll".to_string()),
            }),
            cancel: Some(ButtonSpec {
                command: Some(Command::FormCancel),
                ..Default::default()
            }),
            save: Some(ButtonSpec {
                command: Some(Command::FormSave),
                disabled: Some(Predicate::Flag(Flag::FormPristine)),
                ..Default::default()
            }),
        },
    }
}

/// Server-side defaults for every key the form binds
pub fn defaults() -> HashMap<String, Value> {
    let mut defaults = HashMap::new();
    defaults.insert(
        CALLBACK_URL.to_string(),
        json!("https://localhost/sso/complete/google-oauth2/"),
    );
    defaults.insert(KEY.to_string(), json!(""));
    defaults.insert(SECRET.to_string(), json!(""));
    defaults.insert(WHITELISTED_DOMAINS.to_string(), json!([]));
    defaults.insert(AUTH_EXTRA_ARGUMENTS.to_string(), json!({}));
    defaults.insert(ORGANIZATION_MAP.to_string(), json!({}));
    defaults.insert(TEAM_MAP.to_string(), json!({}));
    defaults
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::validator::SchemaValidator;
    use crate::domain::schema::{FieldKind, FormSchemaDoc};

    #[test]
    fn test_field_order_and_kinds() {
        let schema = schema();
        let kinds: Vec<(&str, FieldKind)> = schema
            .fields
            .iter()
            .map(|(k, f)| (k.as_str(), f.kind))
            .collect();
        assert_eq!(
            kinds,
            vec![
                (CALLBACK_URL, FieldKind::Text),
                (KEY, FieldKind::Text),
                (SECRET, FieldKind::Sensitive),
                (WHITELISTED_DOMAINS, FieldKind::Textarea),
                (AUTH_EXTRA_ARGUMENTS, FieldKind::Textarea),
                (ORGANIZATION_MAP, FieldKind::Textarea),
                (TEAM_MAP, FieldKind::Textarea),
            ]
        );
        assert!(schema.fields[SECRET].has_show_input_button);
        assert!(!schema.fields[WHITELISTED_DOMAINS].code_mirror);
        assert!(schema.fields[TEAM_MAP].code_mirror);
        assert!(schema.fields.iter().all(|(k, f)| k == &f.reset));
    }

    #[test]
    fn test_defaults_cover_every_reset_key() {
        let defaults = defaults();
        for key in schema().reset_keys() {
            assert!(defaults.contains_key(&key), "missing default for {}", key);
        }
    }

    #[test]
    fn test_builtin_survives_wire_round_trip() {
        let original = schema();
        let wire = serde_json::to_value(&original).unwrap();
        let doc: FormSchemaDoc = serde_json::from_value(wire).unwrap();
        let compiled = SchemaValidator::compile(&doc).unwrap();
        assert_eq!(compiled, original);
    }
}
