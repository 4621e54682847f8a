//! Render model: a plain, serializable description of what a form shows.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::field::FieldStatus;
use super::widget::Widget;
use crate::domain::{ButtonRole, Command};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", content = "message", rename_all = "snake_case")]
pub enum FormStatus {
    Idle,
    Loading,
    Ready,
    Saving,
    Reverting,
    /// A fetch failed; affected fields carry their own status
    Error(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedForm {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub header: Option<String>,
    pub status: FormStatus,
    pub dirty: bool,
    pub fields: Vec<RenderedField>,
    /// Visible buttons in row order; empty when the schema hides actions
    pub buttons: Vec<RenderedButton>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_saved_at: Option<DateTime<Utc>>,
}

impl RenderedForm {
    pub fn field(&self, key: &str) -> Option<&RenderedField> {
        self.fields.iter().find(|f| f.key == key)
    }

    pub fn button(&self, role: ButtonRole) -> Option<&RenderedButton> {
        self.buttons.iter().find(|b| b.role == role)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedField {
    pub key: String,
    pub label: String,
    #[serde(flatten)]
    pub widget: Widget,
    /// Text shown in the widget, masked for hidden secrets
    pub display: String,
    pub status: FieldStatus,
    pub dirty: bool,
    pub read_only: bool,
    pub reset: ResetAction,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResetAction {
    /// Configuration key whose default the action restores
    pub key: String,
    pub label: String,
    pub enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedButton {
    pub role: ButtonRole,
    pub label: String,
    pub command: Command,
    pub enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,
}
