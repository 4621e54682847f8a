//! Visibility/enablement predicates and button command references.
//!
//! Schemas written for the legacy admin UI carry these as expression strings
//! (`"!user_is_system_auditor"`, `"vm.formSave()"`). Here they parse into
//! closed enums so an unrecognized expression is a load-time defect.

use serde::{Serialize, Serializer};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use super::auth::PermissionContext;
use super::error::SchemaError;
use super::schema::ButtonRole;

/// Ambient state a predicate may refer to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Flag {
    UserIsSystemAuditor,
    UserCanWrite,
    /// No field differs from its last-saved value
    FormPristine,
    /// A fetch or save is in flight
    FormBusy,
}

impl Flag {
    fn name(&self) -> &'static str {
        match self {
            Flag::UserIsSystemAuditor => "user_is_system_auditor",
            Flag::UserCanWrite => "user_can_write",
            Flag::FormPristine => "form_pristine",
            Flag::FormBusy => "form_busy",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        match name {
            "user_is_system_auditor" => Some(Flag::UserIsSystemAuditor),
            "user_can_write" => Some(Flag::UserCanWrite),
            "form_pristine" | "pristine" => Some(Flag::FormPristine),
            "form_busy" | "busy" => Some(Flag::FormBusy),
            _ => None,
        }
    }
}

/// Snapshot a predicate is evaluated against.
#[derive(Debug, Clone, Copy)]
pub struct PredicateContext {
    pub permissions: PermissionContext,
    pub pristine: bool,
    pub busy: bool,
}

impl PredicateContext {
    fn flag(&self, flag: Flag) -> bool {
        match flag {
            Flag::UserIsSystemAuditor => self.permissions.user_is_system_auditor,
            Flag::UserCanWrite => self.permissions.can_write,
            Flag::FormPristine => self.pristine,
            Flag::FormBusy => self.busy,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    Const(bool),
    Flag(Flag),
    Not(Box<Predicate>),
}

impl Predicate {
    pub fn evaluate(&self, ctx: &PredicateContext) -> bool {
        match self {
            Predicate::Const(b) => *b,
            Predicate::Flag(flag) => ctx.flag(*flag),
            Predicate::Not(inner) => !inner.evaluate(ctx),
        }
    }

    /// Parse a predicate from its wire form: a JSON boolean or an expression string.
    pub fn from_value(value: &Value) -> Result<Self, SchemaError> {
        match value {
            Value::Bool(b) => Ok(Predicate::Const(*b)),
            Value::String(s) => s.parse(),
            other => Err(SchemaError::UnknownPredicate(other.to_string())),
        }
    }
}

impl FromStr for Predicate {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Negations cancel in pairs; only the parity of the `!` prefix matters.
        let mut expr = s.trim();
        let mut negated = false;
        while let Some(rest) = expr.strip_prefix('!') {
            negated = !negated;
            expr = rest.trim_start();
        }
        let base = match expr.trim_end() {
            "" => return Err(SchemaError::UnknownPredicate(s.to_string())),
            "true" => Predicate::Const(true),
            "false" => Predicate::Const(false),
            name => Flag::from_name(name)
                .map(Predicate::Flag)
                .ok_or_else(|| SchemaError::UnknownPredicate(s.to_string()))?,
        };
        Ok(if negated {
            Predicate::Not(Box::new(base))
        } else {
            base
        })
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::Const(b) => write!(f, "{}", b),
            Predicate::Flag(flag) => write!(f, "{}", flag.name()),
            Predicate::Not(inner) => write!(f, "!{}", inner),
        }
    }
}

impl Serialize for Predicate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Predicate::Const(b) => serializer.serialize_bool(*b),
            other => serializer.serialize_str(&other.to_string()),
        }
    }
}

/// Named commands a host view-controller implements for the button row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    ResetAllConfirm,
    FormCancel,
    FormSave,
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::ResetAllConfirm => "resetAllConfirm",
            Command::FormCancel => "formCancel",
            Command::FormSave => "formSave",
        }
    }

    /// The button role this command belongs to
    pub fn role(&self) -> ButtonRole {
        match self {
            Command::ResetAllConfirm => ButtonRole::Reset,
            Command::FormCancel => ButtonRole::Cancel,
            Command::FormSave => ButtonRole::Save,
        }
    }
}

impl FromStr for Command {
    type Err = SchemaError;

    /// Accepts `formSave`, `formSave()` and `vm.formSave()`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let name = trimmed.strip_prefix("vm.").unwrap_or(trimmed);
        let name = name.strip_suffix("()").unwrap_or(name);
        match name {
            "resetAllConfirm" => Ok(Command::ResetAllConfirm),
            "formCancel" => Ok(Command::FormCancel),
            "formSave" => Ok(Command::FormSave),
            _ => Err(SchemaError::UnknownCommand(s.to_string())),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for Command {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ctx(permissions: PermissionContext) -> PredicateContext {
        PredicateContext {
            permissions,
            pristine: true,
            busy: false,
        }
    }

    #[test]
    fn test_parse_negated_auditor_flag() {
        let p: Predicate = "!user_is_system_auditor".parse().unwrap();
        assert_eq!(p, Predicate::Not(Box::new(Predicate::Flag(Flag::UserIsSystemAuditor))));
        assert!(p.evaluate(&ctx(PermissionContext::administrator())));
        assert!(!p.evaluate(&ctx(PermissionContext::auditor())));
    }

    #[test]
    fn test_parse_bool_values() {
        assert_eq!(Predicate::from_value(&json!(true)).unwrap(), Predicate::Const(true));
        assert_eq!(Predicate::from_value(&json!("false")).unwrap(), Predicate::Const(false));
    }

    #[test]
    fn test_unknown_predicate_is_rejected() {
        assert!(matches!(
            "user_is_superuser".parse::<Predicate>(),
            Err(SchemaError::UnknownPredicate(_))
        ));
        assert!("!".parse::<Predicate>().is_err());
        assert!(Predicate::from_value(&json!(3)).is_err());
    }

    #[test]
    fn test_display_matches_wire_form() {
        let p: Predicate = "!form_pristine".parse().unwrap();
        assert_eq!(p.to_string(), "!form_pristine");
        assert_eq!(serde_json::to_value(Predicate::Const(true)).unwrap(), json!(true));
    }

    #[test]
    fn test_negation_prefix_collapses_by_parity() {
        let p: Predicate = "!!form_pristine".parse().unwrap();
        assert_eq!(p, Predicate::Flag(Flag::FormPristine));
        let p: Predicate = "! !!user_can_write".parse().unwrap();
        assert_eq!(p, Predicate::Not(Box::new(Predicate::Flag(Flag::UserCanWrite))));

        let long = format!("{}form_busy", "!".repeat(1_000_000));
        assert_eq!(long.parse::<Predicate>().unwrap(), Predicate::Flag(Flag::FormBusy));
        let long = format!("{}form_busy", "!".repeat(1_000_001));
        assert_eq!(
            long.parse::<Predicate>().unwrap(),
            Predicate::Not(Box::new(Predicate::Flag(Flag::FormBusy)))
        );
        assert!("!!!".parse::<Predicate>().is_err());
    }

    #[test]
    fn test_command_accepts_legacy_binding() {
        assert_eq!("vm.resetAllConfirm()".parse::<Command>().unwrap(), Command::ResetAllConfirm);
        assert_eq!("formCancel()".parse::<Command>().unwrap(), Command::FormCancel);
        assert_eq!("formSave".parse::<Command>().unwrap(), Command::FormSave);
        assert!(matches!(
            "vm.formDelete()".parse::<Command>(),
            Err(SchemaError::UnknownCommand(_))
        ));
    }

    #[test]
    fn test_command_roles() {
        assert_eq!(Command::ResetAllConfirm.role(), ButtonRole::Reset);
        assert_eq!(Command::FormCancel.role(), ButtonRole::Cancel);
        assert_eq!(Command::FormSave.role(), ButtonRole::Save);
    }
}
