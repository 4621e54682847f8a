use indexmap::IndexMap;
use std::collections::HashMap;

use crate::domain::predicate::{Flag, Predicate};
use crate::domain::schema::{
    ButtonRole, ButtonSpec, ButtonSpecDoc, Buttons, FieldKind, FieldSpec, FieldSpecDoc, FormSchema,
    FormSchemaDoc,
};
use crate::domain::{Command, SchemaError};

/// Compiles wire documents into validated schemas, collecting every defect
/// instead of stopping at the first one.
pub struct SchemaValidator;

impl SchemaValidator {
    pub fn compile(doc: &FormSchemaDoc) -> Result<FormSchema, Vec<SchemaError>> {
        let mut errors = Vec::new();

        if doc.name.trim().is_empty() {
            errors.push(SchemaError::MissingField("name".to_string()));
        }

        let fields = match Self::compile_fields(&doc.fields) {
            Ok(fields) => fields,
            Err(e) => {
                errors.extend(e);
                IndexMap::new()
            }
        };

        let mut buttons = Buttons::default();
        for (role, spec) in [
            (ButtonRole::Reset, &doc.buttons.reset),
            (ButtonRole::Cancel, &doc.buttons.cancel),
            (ButtonRole::Save, &doc.buttons.save),
        ] {
            let Some(spec) = spec else { continue };
            match Self::compile_button(role, spec) {
                Ok(compiled) => match role {
                    ButtonRole::Reset => buttons.reset = Some(compiled),
                    ButtonRole::Cancel => buttons.cancel = Some(compiled),
                    ButtonRole::Save => buttons.save = Some(compiled),
                },
                Err(e) => errors.extend(e),
            }
        }

        if errors.is_empty() {
            Ok(FormSchema {
                name: doc.name.clone(),
                show_actions: doc.show_actions,
                show_header: doc.show_header,
                fields,
                buttons,
            })
        } else {
            Err(errors)
        }
    }

    fn compile_fields(
        docs: &IndexMap<String, FieldSpecDoc>,
    ) -> Result<IndexMap<String, FieldSpec>, Vec<SchemaError>> {
        let mut errors = Vec::new();
        let mut fields = IndexMap::new();
        let mut seen_resets: HashMap<&str, &str> = HashMap::new();

        for (key, doc) in docs {
            if key.trim().is_empty() {
                errors.push(SchemaError::MissingField("fields.<key>".to_string()));
                continue;
            }

            let kind = match doc.kind.parse::<FieldKind>() {
                Ok(kind) => kind,
                Err(()) => {
                    errors.push(SchemaError::UnknownFieldType {
                        field: key.clone(),
                        kind: doc.kind.clone(),
                    });
                    continue;
                }
            };

            let reset = match doc.reset.as_deref().map(str::trim) {
                Some(reset) if !reset.is_empty() => reset,
                _ => {
                    errors.push(SchemaError::MissingField(format!("fields.{}.reset", key)));
                    continue;
                }
            };
            if let Some(prev) = seen_resets.insert(reset, key) {
                errors.push(SchemaError::Duplicate(format!(
                    "Reset key '{}' is bound by fields '{}' and '{}'",
                    reset, prev, key
                )));
            }

            let rows = match doc.rows {
                None => None,
                Some(_) if kind != FieldKind::Textarea => {
                    errors.push(SchemaError::InvalidValue {
                        field: format!("fields.{}.rows", key),
                        reason: "rows is only valid on textarea fields".to_string(),
                    });
                    None
                }
                Some(rows) => match u32::try_from(rows) {
                    Ok(rows) if rows > 0 => Some(rows),
                    _ => {
                        errors.push(SchemaError::InvalidValue {
                            field: format!("fields.{}.rows", key),
                            reason: format!("rows must be a positive integer, got {}", rows),
                        });
                        None
                    }
                },
            };

            let code_mirror = doc.code_mirror.unwrap_or(false);
            if code_mirror && kind != FieldKind::Textarea {
                errors.push(SchemaError::InvalidValue {
                    field: format!("fields.{}.codeMirror", key),
                    reason: "codeMirror is only valid on textarea fields".to_string(),
                });
            }

            let has_show_input_button = doc.has_show_input_button.unwrap_or(false);
            if has_show_input_button && kind != FieldKind::Sensitive {
                errors.push(SchemaError::InvalidValue {
                    field: format!("fields.{}.hasShowInputButton", key),
                    reason: "hasShowInputButton is only valid on sensitive fields".to_string(),
                });
            }

            fields.insert(
                key.clone(),
                FieldSpec {
                    kind,
                    reset: reset.to_string(),
                    rows,
                    code_mirror,
                    has_show_input_button,
                    class: doc.class.clone(),
                },
            );
        }

        if errors.is_empty() {
            Ok(fields)
        } else {
            Err(errors)
        }
    }

    fn compile_button(role: ButtonRole, doc: &ButtonSpecDoc) -> Result<ButtonSpec, Vec<SchemaError>> {
        let mut errors = Vec::new();

        let show = match doc.ng_show.as_ref().map(Predicate::from_value).transpose() {
            Ok(show) => show,
            Err(e) => {
                errors.push(e);
                None
            }
        };

        let disabled = match doc.ng_disabled.as_ref().map(Predicate::from_value).transpose() {
            // A literal `true` on save asks for engine-managed gating: disabled until dirty.
            Ok(Some(Predicate::Const(true))) if role == ButtonRole::Save => {
                Some(Predicate::Flag(Flag::FormPristine))
            }
            Ok(disabled) => disabled,
            Err(e) => {
                errors.push(e);
                None
            }
        };

        let command = match doc.ng_click.as_deref().map(str::parse::<Command>).transpose() {
            Ok(Some(command)) if command.role() != role => {
                errors.push(SchemaError::CommandMismatch {
                    role: role.to_string(),
                    command: command.to_string(),
                });
                None
            }
            Ok(command) => command,
            Err(e) => {
                errors.push(e);
                None
            }
        };

        if errors.is_empty() {
            Ok(ButtonSpec {
                label: doc.label.clone(),
                show,
                command,
                disabled,
                class: doc.class.clone(),
            })
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: serde_json::Value) -> FormSchemaDoc {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_valid_schema() {
        let schema = SchemaValidator::compile(&doc(json!({
            "name": "demo",
            "fields": {
                "A": {"type": "text", "reset": "A"},
                "B": {"type": "sensitive", "reset": "B", "hasShowInputButton": true},
                "C": {"type": "textarea", "reset": "C", "rows": 6, "codeMirror": true}
            },
            "buttons": {
                "reset": {"ngShow": "!user_is_system_auditor", "ngClick": "vm.resetAllConfirm()"},
                "cancel": {"ngClick": "vm.formCancel()"},
                "save": {"ngClick": "vm.formSave()", "ngDisabled": true}
            }
        })))
        .unwrap();

        assert_eq!(schema.fields.len(), 3);
        assert_eq!(schema.fields["C"].rows, Some(6));
        assert!(schema.fields["C"].code_mirror);
        assert_eq!(
            schema.buttons.save.as_ref().unwrap().disabled,
            Some(Predicate::Flag(Flag::FormPristine))
        );
        assert_eq!(schema.buttons.reset.as_ref().unwrap().command, Some(Command::ResetAllConfirm));
    }

    #[test]
    fn test_unknown_field_type() {
        let errors = SchemaValidator::compile(&doc(json!({
            "name": "demo",
            "fields": {"A": {"type": "checkbox", "reset": "A"}}
        })))
        .unwrap_err();
        assert_eq!(
            errors,
            vec![SchemaError::UnknownFieldType {
                field: "A".to_string(),
                kind: "checkbox".to_string()
            }]
        );
    }

    #[test]
    fn test_collects_every_defect() {
        let errors = SchemaValidator::compile(&doc(json!({
            "name": "",
            "fields": {
                "A": {"type": "text"},
                "B": {"type": "text", "reset": "B", "rows": 3, "codeMirror": true},
                "C": {"type": "textarea", "reset": "C", "rows": 0},
                "D": {"type": "text", "reset": "D", "hasShowInputButton": true}
            },
            "buttons": {
                "cancel": {"ngClick": "vm.formSave()"},
                "reset": {"ngShow": "user_is_root"}
            }
        })))
        .unwrap_err();

        assert!(errors.contains(&SchemaError::MissingField("name".to_string())));
        assert!(errors.contains(&SchemaError::MissingField("fields.A.reset".to_string())));
        assert!(errors.iter().any(|e| matches!(e, SchemaError::InvalidValue { field, .. } if field == "fields.B.rows")));
        assert!(errors.iter().any(|e| matches!(e, SchemaError::InvalidValue { field, .. } if field == "fields.B.codeMirror")));
        assert!(errors.iter().any(|e| matches!(e, SchemaError::InvalidValue { field, .. } if field == "fields.C.rows")));
        assert!(errors.iter().any(|e| matches!(e, SchemaError::InvalidValue { field, .. } if field == "fields.D.hasShowInputButton")));
        assert!(errors.iter().any(|e| matches!(e, SchemaError::CommandMismatch { .. })));
        assert!(errors.iter().any(|e| matches!(e, SchemaError::UnknownPredicate(_))));
    }

    #[test]
    fn test_duplicate_reset_keys() {
        let errors = SchemaValidator::compile(&doc(json!({
            "name": "demo",
            "fields": {
                "A": {"type": "text", "reset": "SHARED"},
                "B": {"type": "text", "reset": "SHARED"}
            }
        })))
        .unwrap_err();
        assert!(errors.iter().any(|e| matches!(e, SchemaError::Duplicate(_))));
    }

    #[test]
    fn test_disabled_true_only_normalized_on_save() {
        let schema = SchemaValidator::compile(&doc(json!({
            "name": "demo",
            "fields": {},
            "buttons": {"cancel": {"ngDisabled": true}}
        })))
        .unwrap();
        assert_eq!(
            schema.buttons.cancel.as_ref().unwrap().disabled,
            Some(Predicate::Const(true))
        );
    }
}
