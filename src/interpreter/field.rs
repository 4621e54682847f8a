//! Per-field value, default and dirty state.

use serde::Serialize;
use serde_json::Value;

use crate::domain::FieldSpec;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum FieldStatus {
    /// Values are being fetched
    Loading,
    Ready,
    /// The current or default value could not be fetched
    Unavailable(String),
    /// The last input could not be parsed; the live value is unchanged
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Availability {
    Loading,
    Ready,
    Unavailable(String),
}

#[derive(Debug, Clone)]
pub struct FieldState {
    pub(crate) key: String,
    pub(crate) spec: FieldSpec,
    pub(crate) live: Option<Value>,
    pub(crate) saved: Option<Value>,
    pub(crate) default: Option<Value>,
    pub(crate) revealed: bool,
    pub(crate) availability: Availability,
    /// Rejected widget text and the parse error
    pub(crate) input_error: Option<(String, String)>,
    /// Edits were discarded by a cancel while a save was in flight
    pub(crate) discarded_during_save: bool,
}

impl FieldState {
    pub(crate) fn new(key: String, spec: FieldSpec) -> Self {
        Self {
            key,
            spec,
            live: None,
            saved: None,
            default: None,
            revealed: false,
            availability: Availability::Loading,
            input_error: None,
            discarded_during_save: false,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn spec(&self) -> &FieldSpec {
        &self.spec
    }

    pub fn live(&self) -> Option<&Value> {
        self.live.as_ref()
    }

    pub fn saved(&self) -> Option<&Value> {
        self.saved.as_ref()
    }

    pub fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    pub fn is_revealed(&self) -> bool {
        self.revealed
    }

    /// Live value differs from the last-saved value
    pub fn is_dirty(&self) -> bool {
        match (&self.live, &self.saved) {
            (Some(live), Some(saved)) => live != saved,
            _ => false,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.availability == Availability::Ready
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self.availability, Availability::Unavailable(_))
    }

    pub fn is_invalid(&self) -> bool {
        self.input_error.is_some()
    }

    pub fn status(&self) -> FieldStatus {
        match &self.availability {
            Availability::Loading => FieldStatus::Loading,
            Availability::Unavailable(reason) => FieldStatus::Unavailable(reason.clone()),
            Availability::Ready => match &self.input_error {
                Some((_, reason)) => FieldStatus::Invalid(reason.clone()),
                None => FieldStatus::Ready,
            },
        }
    }

    pub(crate) fn mark_loading(&mut self) {
        self.availability = Availability::Loading;
        self.input_error = None;
    }

    pub(crate) fn mark_unavailable(&mut self, reason: impl Into<String>) {
        self.availability = Availability::Unavailable(reason.into());
        self.live = None;
        self.saved = None;
        self.input_error = None;
    }

    /// Install freshly fetched values, dropping any local edits.
    pub(crate) fn install(&mut self, current: Value, default: Option<Value>) {
        self.live = Some(current.clone());
        self.saved = Some(current);
        self.default = default;
        self.availability = Availability::Ready;
        self.input_error = None;
        self.discarded_during_save = false;
    }

    pub(crate) fn set_live(&mut self, value: Value) {
        self.live = Some(value);
        self.input_error = None;
        self.discarded_during_save = false;
    }

    pub(crate) fn discard_edits(&mut self) {
        self.live = self.saved.clone();
        self.input_error = None;
        self.revealed = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_dirty_tracks_saved_value() {
        let mut field = FieldState::new("A".to_string(), FieldSpec::text("A"));
        assert!(!field.is_dirty());
        assert_eq!(field.status(), FieldStatus::Loading);

        field.install(json!("x"), Some(json!("d")));
        assert!(!field.is_dirty());
        field.set_live(json!("y"));
        assert!(field.is_dirty());
        field.set_live(json!("x"));
        assert!(!field.is_dirty());
    }

    #[test]
    fn test_discard_edits_restores_saved() {
        let mut field = FieldState::new("A".to_string(), FieldSpec::text("A"));
        field.install(json!("x"), None);
        field.set_live(json!("y"));
        field.input_error = Some(("bad".to_string(), "nope".to_string()));
        field.discard_edits();
        assert_eq!(field.live(), Some(&json!("x")));
        assert!(!field.is_invalid());
    }

    #[test]
    fn test_unavailable_clears_values() {
        let mut field = FieldState::new("A".to_string(), FieldSpec::text("A"));
        field.install(json!("x"), None);
        field.mark_unavailable("timeout");
        assert!(field.live().is_none());
        assert_eq!(field.status(), FieldStatus::Unavailable("timeout".to_string()));
        assert!(!field.is_dirty());
    }
}
