//! Form instance state machine.
//!
//! A `FormInstance` owns the value, default and dirty records of one rendered
//! form. It performs no I/O: asynchronous work is split into a `begin_*` step,
//! which validates the action and marks the instance busy, and a
//! `complete_*` step, which installs the store's answer. `FormSession` drives
//! the I/O in between.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::field::FieldState;
use super::render::{FormStatus, RenderedButton, RenderedField, RenderedForm, ResetAction};
use super::widget::{self, Widget};
use crate::domain::predicate::PredicateContext;
use crate::domain::{
    ButtonRole, Command, ConfirmPrompt, FieldKind, FormError, FormSchema, PermissionContext,
    ResetBinding, StoreError, Translator,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    Idle,
    Loading,
    Loaded,
    /// At least one fetch failed as a whole
    Failed(String),
}

/// Keys to fetch for a load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadRequest {
    pub current_keys: Vec<String>,
    pub default_keys: Vec<String>,
}

/// Values captured for an in-flight save.
#[derive(Debug, Clone, PartialEq)]
pub struct SaveRequest {
    pub ticket: u64,
    pub values: HashMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevertRequest {
    pub bindings: Vec<ResetBinding>,
}

/// Whether an action's button is shown and clickable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionState {
    pub visible: bool,
    pub enabled: bool,
}

#[derive(Debug)]
pub struct FormInstance {
    id: Uuid,
    schema: Arc<FormSchema>,
    permissions: PermissionContext,
    fields: IndexMap<String, FieldState>,
    load_state: LoadState,
    saving: Option<u64>,
    next_ticket: u64,
    reverting: bool,
    editing: bool,
    last_error: Option<String>,
    last_saved_at: Option<DateTime<Utc>>,
}

impl FormInstance {
    pub fn new(schema: Arc<FormSchema>, permissions: PermissionContext) -> Self {
        let fields = schema
            .fields
            .iter()
            .map(|(key, spec)| (key.clone(), FieldState::new(key.clone(), spec.clone())))
            .collect();
        Self {
            id: Uuid::new_v4(),
            schema,
            permissions,
            fields,
            load_state: LoadState::Idle,
            saving: None,
            next_ticket: 0,
            reverting: false,
            editing: false,
            last_error: None,
            last_saved_at: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.schema.name
    }

    pub fn schema(&self) -> &Arc<FormSchema> {
        &self.schema
    }

    pub fn permissions(&self) -> PermissionContext {
        self.permissions
    }

    pub fn load_state(&self) -> &LoadState {
        &self.load_state
    }

    pub fn field(&self, key: &str) -> Option<&FieldState> {
        self.fields.get(key)
    }

    pub fn fields(&self) -> impl Iterator<Item = &FieldState> {
        self.fields.values()
    }

    /// Live values of every field that has one
    pub fn values(&self) -> HashMap<String, Value> {
        self.fields
            .values()
            .filter_map(|f| f.live.clone().map(|v| (f.key.clone(), v)))
            .collect()
    }

    pub fn is_editing(&self) -> bool {
        self.editing
    }

    pub fn is_saving(&self) -> bool {
        self.saving.is_some()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn last_saved_at(&self) -> Option<DateTime<Utc>> {
        self.last_saved_at
    }

    /// A fetch, save or revert is in flight
    pub fn is_busy(&self) -> bool {
        self.load_state == LoadState::Loading || self.saving.is_some() || self.reverting
    }

    pub fn is_dirty(&self) -> bool {
        self.fields.values().any(FieldState::is_dirty)
    }

    fn all_fields_ready(&self) -> bool {
        self.load_state == LoadState::Loaded && self.fields.values().all(FieldState::is_ready)
    }

    fn any_invalid(&self) -> bool {
        self.fields.values().any(FieldState::is_invalid)
    }

    fn predicate_context(&self) -> PredicateContext {
        PredicateContext {
            permissions: self.permissions,
            pristine: !self.is_dirty(),
            busy: self.is_busy(),
        }
    }

    // ------------------------------------------------------------------
    // Action gating
    // ------------------------------------------------------------------

    /// Visibility and enablement of a button role, combining the schema's
    /// predicates with the engine's own gating.
    pub fn action_state(&self, role: ButtonRole) -> ActionState {
        let Some(spec) = self.schema.buttons.get(role) else {
            return ActionState {
                visible: false,
                enabled: false,
            };
        };
        let ctx = self.predicate_context();

        let mut visible = spec.show.as_ref().map_or(true, |p| p.evaluate(&ctx));
        if role == ButtonRole::Reset && self.permissions.user_is_system_auditor {
            visible = false;
        }

        let gated = match role {
            ButtonRole::Cancel => true,
            ButtonRole::Reset => {
                self.permissions.can_mutate() && !self.is_busy() && self.all_fields_ready()
            }
            ButtonRole::Save => {
                self.permissions.can_mutate()
                    && !self.is_busy()
                    && self.all_fields_ready()
                    && !self.any_invalid()
                    && self.is_dirty()
            }
        };
        let disabled = spec.disabled.as_ref().is_some_and(|p| p.evaluate(&ctx));

        ActionState {
            visible,
            enabled: visible && gated && !disabled,
        }
    }

    pub fn can_save(&self) -> bool {
        self.action_state(ButtonRole::Save).enabled
    }

    pub fn can_revert_all(&self) -> bool {
        self.action_state(ButtonRole::Reset).enabled
    }

    fn require_action(&self, role: ButtonRole) -> Result<(), FormError> {
        if self.action_state(role).enabled {
            return Ok(());
        }
        if !self.permissions.can_mutate() && role != ButtonRole::Cancel {
            return Err(FormError::PermissionDenied(format!(
                "{} requires write permission",
                role.command()
            )));
        }
        if self.is_busy() {
            return Err(FormError::Busy("a fetch or save is in flight"));
        }
        if let Some(field) = self.fields.values().find(|f| f.is_unavailable()) {
            return Err(FormError::Unavailable(field.key.clone()));
        }
        if role == ButtonRole::Save && !self.is_dirty() && !self.any_invalid() {
            return Err(FormError::NothingToSave);
        }
        Err(FormError::ActionUnavailable(role.command().to_string()))
    }

    fn editable_field(&mut self, key: &str) -> Result<&mut FieldState, FormError> {
        if !self.permissions.can_mutate() {
            return Err(FormError::PermissionDenied(format!("{} is read-only", key)));
        }
        if self.reverting {
            return Err(FormError::Busy("a revert is in flight"));
        }
        let field = self
            .fields
            .get_mut(key)
            .ok_or_else(|| FormError::UnknownField(key.to_string()))?;
        if !field.is_ready() {
            return Err(FormError::Unavailable(key.to_string()));
        }
        Ok(field)
    }

    // ------------------------------------------------------------------
    // Loading
    // ------------------------------------------------------------------

    pub fn begin_load(&mut self) -> Result<LoadRequest, FormError> {
        if self.is_busy() {
            return Err(FormError::Busy("a fetch or save is in flight"));
        }
        self.load_state = LoadState::Loading;
        for field in self.fields.values_mut() {
            field.mark_loading();
        }
        debug!(form = %self.schema.name, id = %self.id, "Loading form values");
        Ok(LoadRequest {
            current_keys: self.schema.field_keys(),
            default_keys: self.schema.reset_keys(),
        })
    }

    /// Install fetched values. A failed fetch, or a key missing from a
    /// successful one, leaves the affected fields unavailable.
    pub fn complete_load(
        &mut self,
        current: Result<HashMap<String, Value>, StoreError>,
        defaults: Result<HashMap<String, Value>, StoreError>,
    ) {
        let mut failure = None;
        if let Err(e) = &current {
            warn!(form = %self.schema.name, "Failed to fetch current values: {}", e);
            failure = Some(format!("current values unavailable: {}", e));
        }
        if let Err(e) = &defaults {
            warn!(form = %self.schema.name, "Failed to fetch default values: {}", e);
            failure = Some(format!("default values unavailable: {}", e));
        }

        for field in self.fields.values_mut() {
            let cur = match &current {
                Ok(values) => values.get(&field.key).cloned().ok_or("no current value"),
                Err(_) => Err("current value fetch failed"),
            };
            let def = match &defaults {
                Ok(values) => values.get(&field.spec.reset).cloned().ok_or("no default value"),
                Err(_) => Err("default value fetch failed"),
            };
            match (cur, def) {
                (Ok(cur), Ok(def)) => field.install(cur, Some(def)),
                (Err(reason), _) | (_, Err(reason)) => {
                    warn!(form = %self.schema.name, field = %field.key, "Field unavailable: {}", reason);
                    field.mark_unavailable(reason);
                }
            }
        }

        self.load_state = match failure {
            Some(reason) => LoadState::Failed(reason),
            None => LoadState::Loaded,
        };
        self.editing = false;
        info!(
            form = %self.schema.name,
            id = %self.id,
            unavailable = self.fields.values().filter(|f| f.is_unavailable()).count(),
            "Form values loaded"
        );
    }

    // ------------------------------------------------------------------
    // Field interactions
    // ------------------------------------------------------------------

    /// Set a field's live value directly.
    pub fn edit(&mut self, key: &str, value: Value) -> Result<(), FormError> {
        let field = self.editable_field(key)?;
        field.set_live(value);
        self.editing = true;
        Ok(())
    }

    /// Apply widget text to a field. Unparseable text marks the field invalid
    /// and leaves the live value untouched.
    pub fn input(&mut self, key: &str, text: &str) -> Result<(), FormError> {
        let field = self.editable_field(key)?;
        let prior = field.live.clone().unwrap_or(Value::Null);
        match widget::parse_input(&field.spec, &prior, text) {
            Ok(value) => {
                field.set_live(value);
                self.editing = true;
                Ok(())
            }
            Err(reason) => {
                field.input_error = Some((text.to_string(), reason.clone()));
                self.editing = true;
                Err(FormError::InvalidInput {
                    field: key.to_string(),
                    reason,
                })
            }
        }
    }

    /// Flip the reveal toggle of a sensitive field. Never touches its value.
    pub fn toggle_reveal(&mut self, key: &str) -> Result<bool, FormError> {
        let field = self
            .fields
            .get_mut(key)
            .ok_or_else(|| FormError::UnknownField(key.to_string()))?;
        if field.spec.kind != FieldKind::Sensitive || !field.spec.has_show_input_button {
            return Err(FormError::ActionUnavailable(format!("{}: reveal toggle", key)));
        }
        field.revealed = !field.revealed;
        Ok(field.revealed)
    }

    /// Whether a field's reset-to-default action may run now
    pub fn can_reset_field(&self, key: &str) -> bool {
        self.permissions.can_mutate()
            && self.load_state != LoadState::Loading
            && !self.reverting
            && self
                .fields
                .get(key)
                .is_some_and(|f| f.is_ready() && f.default.is_some())
    }

    /// Confirmation prompt for a per-field reset
    pub fn reset_field_prompt(&self, key: &str) -> Result<ConfirmPrompt, FormError> {
        let field = self
            .fields
            .get(key)
            .ok_or_else(|| FormError::UnknownField(key.to_string()))?;
        if !self.permissions.can_mutate() {
            return Err(FormError::PermissionDenied(format!("{} is read-only", key)));
        }
        if !self.can_reset_field(key) {
            return Err(FormError::Unavailable(key.to_string()));
        }
        let default = field.default.clone().unwrap_or(Value::Null);
        let default = if field.spec.kind == FieldKind::Sensitive {
            Value::String(widget::masked_text(&field.spec, &default, false))
        } else {
            default
        };
        Ok(ConfirmPrompt::ResetField {
            form: self.schema.name.clone(),
            field: key.to_string(),
            default,
        })
    }

    /// Overwrite a field's live value with its fetched default.
    pub fn apply_field_reset(&mut self, key: &str) -> Result<(), FormError> {
        if !self.can_reset_field(key) {
            self.reset_field_prompt(key)?;
        }
        let field = self.editable_field(key)?;
        let default = field
            .default
            .clone()
            .ok_or_else(|| FormError::Unavailable(key.to_string()))?;
        field.set_live(default);
        self.editing = true;
        debug!(form = %self.schema.name, field = %key, dirty = field_dirty(&self.fields, key), "Field reset to default");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Form-level commands
    // ------------------------------------------------------------------

    /// Discard in-progress edits and leave edit mode. Does not affect a save
    /// already in flight.
    pub fn cancel(&mut self) {
        let save_in_flight = self.saving.is_some();
        for field in self.fields.values_mut() {
            let discarded = save_in_flight && (field.is_dirty() || field.discarded_during_save);
            field.discard_edits();
            field.discarded_during_save = discarded;
        }
        self.editing = false;
        self.last_error = None;
        debug!(form = %self.schema.name, "Edits discarded");
    }

    pub fn begin_save(&mut self) -> Result<SaveRequest, FormError> {
        self.require_action(ButtonRole::Save)?;
        let values: HashMap<String, Value> = self
            .fields
            .values()
            .filter(|f| f.is_dirty())
            .filter_map(|f| f.live.clone().map(|v| (f.key.clone(), v)))
            .collect();
        self.next_ticket += 1;
        let ticket = self.next_ticket;
        self.saving = Some(ticket);
        self.last_error = None;
        info!(form = %self.schema.name, id = %self.id, keys = values.len(), "Saving form");
        Ok(SaveRequest { ticket, values })
    }

    /// Record the store's answer to a save. On failure local edits are kept.
    pub fn complete_save(&mut self, request: &SaveRequest, result: Result<(), StoreError>) {
        if self.saving == Some(request.ticket) {
            self.saving = None;
        }
        match result {
            Ok(()) => {
                for (key, value) in &request.values {
                    if let Some(field) = self.fields.get_mut(key) {
                        // Edits discarded while the save was in flight follow the stored value.
                        if field.discarded_during_save {
                            field.live = Some(value.clone());
                        }
                        field.saved = Some(value.clone());
                    }
                }
                self.last_saved_at = Some(Utc::now());
                if !self.is_dirty() {
                    self.editing = false;
                }
                info!(form = %self.schema.name, id = %self.id, "Form saved");
            }
            Err(e) => {
                warn!(form = %self.schema.name, id = %self.id, "Save failed: {}", e);
                self.last_error = Some(e.to_string());
            }
        }
        for field in self.fields.values_mut() {
            field.discarded_during_save = false;
        }
    }

    pub fn revert_all_prompt(&self) -> Result<ConfirmPrompt, FormError> {
        self.require_action(ButtonRole::Reset)?;
        Ok(ConfirmPrompt::RevertAll {
            form: self.schema.name.clone(),
        })
    }

    pub fn begin_revert(&mut self) -> Result<RevertRequest, FormError> {
        self.require_action(ButtonRole::Reset)?;
        self.reverting = true;
        info!(form = %self.schema.name, id = %self.id, "Reverting all fields to defaults");
        Ok(RevertRequest {
            bindings: self.schema.reset_bindings(),
        })
    }

    /// Install the outcome of a revert. Every field moves to its default, or
    /// none does.
    pub fn complete_revert(&mut self, result: Result<(), StoreError>) {
        self.reverting = false;
        match result {
            Ok(()) => {
                for field in self.fields.values_mut() {
                    // Enablement required every default to be present.
                    if let Some(default) = field.default.clone() {
                        field.install(default.clone(), Some(default));
                    }
                }
                self.editing = false;
                self.last_error = None;
                self.last_saved_at = Some(Utc::now());
                info!(form = %self.schema.name, id = %self.id, "Form reverted to defaults");
            }
            Err(e) => {
                warn!(form = %self.schema.name, id = %self.id, "Revert failed: {}", e);
                self.last_error = Some(e.to_string());
            }
        }
    }

    // ------------------------------------------------------------------
    // Rendering
    // ------------------------------------------------------------------

    pub fn render(&self, translator: &dyn Translator) -> RenderedForm {
        let status = match &self.load_state {
            LoadState::Idle => FormStatus::Idle,
            LoadState::Loading => FormStatus::Loading,
            LoadState::Failed(reason) => FormStatus::Error(reason.clone()),
            LoadState::Loaded if self.reverting => FormStatus::Reverting,
            LoadState::Loaded if self.saving.is_some() => FormStatus::Saving,
            LoadState::Loaded => FormStatus::Ready,
        };
        let read_only = !self.permissions.can_mutate();
        let reset_label = translator.translate("Reset");

        let fields = self
            .fields
            .values()
            .map(|field| {
                let display = match (&field.input_error, &field.live) {
                    (Some((text, _)), _) => text.clone(),
                    (None, Some(value)) if field.spec.kind == FieldKind::Sensitive => {
                        widget::masked_text(&field.spec, value, field.revealed)
                    }
                    (None, Some(value)) => widget::display_text(&field.spec, value),
                    (None, None) => String::new(),
                };
                RenderedField {
                    key: field.key.clone(),
                    label: translator.translate(&field.key),
                    widget: Widget::for_field(&field.spec, field.revealed),
                    display,
                    status: field.status(),
                    dirty: field.is_dirty(),
                    read_only: read_only || !field.is_ready(),
                    reset: ResetAction {
                        key: field.spec.reset.clone(),
                        label: reset_label.clone(),
                        enabled: self.can_reset_field(&field.key),
                    },
                    class: field.spec.class.clone(),
                }
            })
            .collect();

        let buttons = if self.schema.show_actions {
            self.schema
                .buttons
                .iter()
                .filter_map(|(role, spec)| {
                    let state = self.action_state(role);
                    state.visible.then(|| RenderedButton {
                        role,
                        label: translator
                            .translate(spec.label.as_deref().unwrap_or(role.default_label())),
                        command: spec.command.unwrap_or(role.command()),
                        enabled: state.enabled,
                        class: spec.class.clone(),
                    })
                })
                .collect()
        } else {
            Vec::new()
        };

        RenderedForm {
            name: self.schema.name.clone(),
            header: self
                .schema
                .show_header
                .then(|| translator.translate(&self.schema.name)),
            status,
            dirty: self.is_dirty(),
            fields,
            buttons,
            last_error: self.last_error.clone(),
            last_saved_at: self.last_saved_at,
        }
    }

    /// Button role a command is bound to in this form
    pub fn role_for(&self, command: Command) -> Option<ButtonRole> {
        self.schema
            .buttons
            .iter()
            .find(|(role, spec)| spec.command.unwrap_or(role.command()) == command)
            .map(|(role, _)| role)
    }
}

fn field_dirty(fields: &IndexMap<String, FieldState>, key: &str) -> bool {
    fields.get(key).is_some_and(FieldState::is_dirty)
}
