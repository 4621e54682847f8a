//! Async driver for a form instance: fetches, confirmations, saves.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::{Arc, Weak};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{error, info};

use super::form::{FormInstance, SaveRequest};
use super::render::RenderedForm;
use crate::domain::{
    ButtonRole, Command, Confirmer, FormError, FormSchema, Notification, Notifier,
    PermissionContext, SettingsStorePort, StoreError, Translator,
};

/// Result of a form-level command that was allowed to run.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandOutcome {
    Saved { keys: usize },
    SaveFailed(StoreError),
    Reverted,
    RevertFailed(StoreError),
    FieldReset,
    Cancelled,
    /// The user declined the confirmation; nothing changed
    Declined,
}

/// The capability set the button row is bound to.
#[async_trait]
pub trait FormCommands: Send + Sync {
    async fn reset_all(&self) -> Result<CommandOutcome, FormError>;
    async fn cancel(&self) -> Result<CommandOutcome, FormError>;
    async fn save(&self) -> Result<CommandOutcome, FormError>;
}

/// Route a bound command to its capability.
pub async fn dispatch(commands: &dyn FormCommands, command: Command) -> Result<CommandOutcome, FormError> {
    match command {
        Command::ResetAllConfirm => commands.reset_all().await,
        Command::FormCancel => commands.cancel().await,
        Command::FormSave => commands.save().await,
    }
}

/// Collaborators a session needs besides the schema
#[derive(Clone)]
pub struct SessionContext {
    pub store: Arc<dyn SettingsStorePort>,
    pub confirmer: Arc<dyn Confirmer>,
    pub notifier: Arc<dyn Notifier>,
    pub translator: Arc<dyn Translator>,
}

/// One open form. Dropping the session tears the instance down; a save that
/// was already dispatched still completes and reports through the notifier.
pub struct FormSession {
    form: Arc<Mutex<FormInstance>>,
    ctx: SessionContext,
}

impl FormSession {
    pub fn new(schema: Arc<FormSchema>, permissions: PermissionContext, ctx: SessionContext) -> Self {
        Self {
            form: Arc::new(Mutex::new(FormInstance::new(schema, permissions))),
            ctx,
        }
    }

    /// Create a session and fetch its values
    pub async fn open(
        schema: Arc<FormSchema>,
        permissions: PermissionContext,
        ctx: SessionContext,
    ) -> Result<Self, FormError> {
        let session = Self::new(schema, permissions, ctx);
        session.load().await?;
        Ok(session)
    }

    /// Shared handle to the underlying instance
    pub fn instance(&self) -> Arc<Mutex<FormInstance>> {
        self.form.clone()
    }

    /// Fetch current and default values. Fetch failures are not errors here:
    /// they show up as unavailable fields.
    pub async fn load(&self) -> Result<(), FormError> {
        let request = self.form.lock().await.begin_load()?;
        let (current, defaults) = futures::join!(
            self.ctx.store.fetch_current(&request.current_keys),
            self.ctx.store.fetch_defaults(&request.default_keys),
        );
        self.form.lock().await.complete_load(current, defaults);
        Ok(())
    }

    pub async fn render(&self) -> RenderedForm {
        self.form.lock().await.render(self.ctx.translator.as_ref())
    }

    pub async fn edit(&self, key: &str, value: Value) -> Result<(), FormError> {
        self.form.lock().await.edit(key, value)
    }

    pub async fn input(&self, key: &str, text: &str) -> Result<(), FormError> {
        self.form.lock().await.input(key, text)
    }

    pub async fn toggle_reveal(&self, key: &str) -> Result<bool, FormError> {
        self.form.lock().await.toggle_reveal(key)
    }

    /// Per-field reset to default, after confirmation.
    pub async fn reset_field(&self, key: &str) -> Result<CommandOutcome, FormError> {
        let prompt = self.form.lock().await.reset_field_prompt(key)?;
        if !self.ctx.confirmer.confirm(&prompt).await {
            return Ok(CommandOutcome::Declined);
        }
        self.form.lock().await.apply_field_reset(key)?;
        Ok(CommandOutcome::FieldReset)
    }

    /// Invoke the command bound to a visible, enabled button.
    pub async fn click(&self, role: ButtonRole) -> Result<CommandOutcome, FormError> {
        let command = {
            let form = self.form.lock().await;
            let state = form.action_state(role);
            if !state.visible {
                return Err(FormError::ActionUnavailable(role.to_string()));
            }
            form.schema()
                .buttons
                .get(role)
                .and_then(|b| b.command)
                .unwrap_or(role.command())
        };
        dispatch(self, command).await
    }

    /// Start a save without waiting for it. The returned handle resolves once
    /// the store answers, even if this session is dropped meanwhile.
    pub async fn dispatch_save(&self) -> Result<JoinHandle<CommandOutcome>, FormError> {
        let (request, name) = {
            let mut form = self.form.lock().await;
            (form.begin_save()?, form.name().to_string())
        };
        let weak = Arc::downgrade(&self.form);
        let store = self.ctx.store.clone();
        let notifier = self.ctx.notifier.clone();

        Ok(tokio::spawn(async move {
            let result = store.save(&request.values).await;
            finish_save(weak, notifier, &name, request, result).await
        }))
    }
}

async fn finish_save(
    form: Weak<Mutex<FormInstance>>,
    notifier: Arc<dyn Notifier>,
    name: &str,
    request: SaveRequest,
    result: Result<(), StoreError>,
) -> CommandOutcome {
    let keys = request.values.len();
    match form.upgrade() {
        Some(form) => form.lock().await.complete_save(&request, result.clone()),
        None => info!(form = %name, "Save completed after the form was closed"),
    }
    match result {
        Ok(()) => {
            notifier.notify(Notification::info(name, format!("Saved {} setting(s)", keys)));
            CommandOutcome::Saved { keys }
        }
        Err(e) => {
            error!(form = %name, "Save failed: {}", e);
            notifier.notify(Notification::error(name, format!("Save failed: {}", e)));
            CommandOutcome::SaveFailed(e)
        }
    }
}

#[async_trait]
impl FormCommands for FormSession {
    async fn reset_all(&self) -> Result<CommandOutcome, FormError> {
        let (prompt, name) = {
            let form = self.form.lock().await;
            (form.revert_all_prompt()?, form.name().to_string())
        };
        if !self.ctx.confirmer.confirm(&prompt).await {
            info!(form = %name, "Revert all declined");
            return Ok(CommandOutcome::Declined);
        }

        let request = self.form.lock().await.begin_revert()?;
        let result = self.ctx.store.revert(&request.bindings).await;
        self.form.lock().await.complete_revert(result.clone());
        match result {
            Ok(()) => Ok(CommandOutcome::Reverted),
            Err(e) => {
                self.ctx
                    .notifier
                    .notify(Notification::error(name, format!("Revert failed: {}", e)));
                Ok(CommandOutcome::RevertFailed(e))
            }
        }
    }

    async fn cancel(&self) -> Result<CommandOutcome, FormError> {
        self.form.lock().await.cancel();
        Ok(CommandOutcome::Cancelled)
    }

    async fn save(&self) -> Result<CommandOutcome, FormError> {
        let handle = self.dispatch_save().await?;
        handle
            .await
            .map_err(|e| FormError::ActionUnavailable(format!("save task failed: {}", e)))
    }
}
