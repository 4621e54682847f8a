use clap::Parser;
use serde_json::Value;
use std::path::Path;
use themis::cli::{Cli, Commands};
use themis::config::{FormRegistry, Settings};
use themis::domain::ButtonRole;
use themis::interpreter::{CommandOutcome, FormCommands, FormSession};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let settings = Settings::new_with_cli(&cli)?;

    // Initialize tracing; stdout is reserved for command output
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.log.level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match &cli.command {
        Commands::Forms => {
            let registry = settings.load_registry()?;
            for name in registry.names() {
                let fields = registry.get(name).map_or(0, |schema| schema.fields.len());
                println!("{}\t{} field(s)", name, fields);
            }
        }
        Commands::Validate { files } => validate(files)?,
        Commands::Schema => {
            println!("{}", serde_json::to_string_pretty(&themis::json_schema())?);
        }
        Commands::Render { form } => {
            let session = open(&settings, form, false).await?;
            println!("{}", serde_json::to_string_pretty(&session.render().await)?);
        }
        Commands::Set {
            form,
            key,
            value,
            json,
        } => {
            let session = open(&settings, form, false).await?;
            if *json {
                let value: Value = serde_json::from_str(value)?;
                session.edit(key, value).await?;
            } else {
                session.input(key, value).await?;
            }
            save(&session).await?;
        }
        Commands::Reset { form, key, .. } => {
            let session = open(&settings, form, cli.command.assume_yes()).await?;
            match session.reset_field(key).await? {
                CommandOutcome::Declined => println!("Reset declined"),
                _ => save(&session).await?,
            }
        }
        Commands::Revert { form, .. } => {
            let session = open(&settings, form, cli.command.assume_yes()).await?;
            match session.click(ButtonRole::Reset).await? {
                CommandOutcome::Reverted => println!("Reverted {} to defaults", form),
                CommandOutcome::Declined => println!("Revert declined"),
                CommandOutcome::RevertFailed(e) => anyhow::bail!("Revert failed: {}", e),
                other => anyhow::bail!("Unexpected outcome: {:?}", other),
            }
        }
    }

    Ok(())
}

fn validate(files: &[std::path::PathBuf]) -> anyhow::Result<()> {
    let mut failed = 0;
    for path in files {
        match FormRegistry::load_file(Path::new(path)) {
            Ok(schema) => println!("{}: ok ({})", path.display(), schema.name),
            Err(errors) => {
                failed += 1;
                println!("{}: {} defect(s)", path.display(), errors.len());
                for e in errors {
                    println!("  - {}", e);
                }
            }
        }
    }
    if failed > 0 {
        anyhow::bail!("{} of {} schema file(s) failed validation", failed, files.len());
    }
    Ok(())
}

async fn open(settings: &Settings, form: &str, assume_yes: bool) -> anyhow::Result<FormSession> {
    let registry = settings.load_registry()?;
    let schema = registry
        .get(form)
        .ok_or_else(|| anyhow::anyhow!("Unknown form: {}", form))?;
    let ctx = themis::create_session_context(settings, assume_yes).await?;
    info!("Opening form {}", form);
    Ok(FormSession::open(schema, settings.permissions(), ctx).await?)
}

async fn save(session: &FormSession) -> anyhow::Result<()> {
    if !session.instance().lock().await.is_dirty() {
        println!("No changes to save");
        return Ok(());
    }
    match session.save().await? {
        CommandOutcome::Saved { keys } => {
            println!("Saved {} setting(s)", keys);
            Ok(())
        }
        CommandOutcome::SaveFailed(e) => {
            error!("Save failed: {}", e);
            anyhow::bail!("Save failed: {}", e)
        }
        other => anyhow::bail!("Unexpected outcome: {:?}", other),
    }
}
