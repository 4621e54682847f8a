pub mod confirm;
pub mod file_settings_store;
pub mod notifier;
pub mod settings_store;
pub mod translator;
