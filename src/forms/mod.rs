//! Schemas compiled into the binary.

use serde_json::Value;
use std::collections::HashMap;

use crate::domain::FormSchema;

pub mod google_oauth2;

/// Every built-in form schema
pub fn builtin() -> Vec<FormSchema> {
    vec![google_oauth2::schema()]
}

/// Defaults of every key bound by a built-in schema
pub fn builtin_defaults() -> HashMap<String, Value> {
    google_oauth2::defaults()
}
