//! Error types for schema loading and form interaction

use thiserror::Error;

/// Defects in a form schema. These are developer-facing: a schema that
/// produces any of them is never rendered.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// The schema document could not be parsed into the wire format
    #[error("Malformed schema '{source_name}': {reason}")]
    Malformed { source_name: String, reason: String },

    /// A field declares a widget type the interpreter does not know
    #[error("Unknown field type '{kind}' for field '{field}'")]
    UnknownFieldType { field: String, kind: String },

    /// A predicate expression could not be parsed
    #[error("Unknown predicate expression '{0}'")]
    UnknownPredicate(String),

    /// A click binding names a command the interpreter does not provide
    #[error("Unknown command reference '{0}'")]
    UnknownCommand(String),

    /// A button is bound to a command that does not belong to its role
    #[error("Button '{role}' is bound to command '{command}'")]
    CommandMismatch { role: String, command: String },

    /// A required attribute is missing or empty
    #[error("Missing required field: {0}")]
    MissingField(String),

    /// An attribute is present but not allowed or out of range
    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    /// A name or key appears more than once
    #[error("Duplicate entry: {0}")]
    Duplicate(String),
}

/// Reasons a user interaction with a form instance was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    #[error("Unknown field: {0}")]
    UnknownField(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// A fetch or save is in flight
    #[error("Form is busy: {0}")]
    Busy(&'static str),

    /// The form holds fields whose current or default value could not be fetched
    #[error("Field '{0}' is unavailable")]
    Unavailable(String),

    #[error("Invalid input for '{field}': {reason}")]
    InvalidInput { field: String, reason: String },

    /// The action is hidden or disabled in the current render state
    #[error("Action '{0}' is not available")]
    ActionUnavailable(String),

    #[error("Nothing to save")]
    NothingToSave,
}

/// Failures reported by a settings backing store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The store could not be reached
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// The store refused a write
    #[error("Write rejected for '{key}': {reason}")]
    Rejected { key: String, reason: String },

    /// The store's stored document could not be read or written
    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("I/O error: {0}")]
    Io(String),
}

impl From<std::io::Error> for StoreError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}
