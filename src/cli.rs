use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Themis - interpreter for declarative settings forms
#[derive(Parser, Debug, Clone)]
#[command(name = "themis", version, about, long_about = None)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, env = "THEMIS_CONFIG", default_value = "themis.toml")]
    pub config: PathBuf,

    /// Directory of additional form schema files
    #[arg(long, env = "THEMIS_FORMS_DIR")]
    pub forms_dir: Option<PathBuf>,

    /// Use the file-backed settings store at this path
    #[arg(long, env = "THEMIS_STORE")]
    pub store: Option<PathBuf>,

    /// Translation catalog (json, yaml or toml)
    #[arg(long, env = "THEMIS_CATALOG")]
    pub catalog: Option<PathBuf>,

    /// Act as a system auditor
    #[arg(long)]
    pub auditor: bool,

    /// Act as a user without write permission
    #[arg(long)]
    pub read_only: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// List registered forms
    Forms,

    /// Check schema files and report every defect
    Validate {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Print the JSON Schema of the form schema format
    Schema,

    /// Print the render model of a form
    Render { form: String },

    /// Edit one field and save the form
    Set {
        form: String,
        key: String,
        value: String,
        /// Parse VALUE as JSON instead of widget text
        #[arg(long)]
        json: bool,
    },

    /// Reset one field to its default and save the form
    Reset {
        form: String,
        key: String,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },

    /// Revert every field of a form to its default
    Revert {
        form: String,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
}

impl Commands {
    /// Whether the command asked to skip confirmation prompts
    pub fn assume_yes(&self) -> bool {
        matches!(self, Commands::Reset { yes: true, .. } | Commands::Revert { yes: true, .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["themis", "forms"]);
        assert_eq!(cli.config, PathBuf::from("themis.toml"));
        assert!(cli.forms_dir.is_none());
        assert!(cli.store.is_none());
        assert!(!cli.auditor);
        assert!(!cli.read_only);
        assert_eq!(cli.command, Commands::Forms);
    }

    #[test]
    fn test_cli_with_args() {
        let cli = Cli::parse_from([
            "themis",
            "--config",
            "custom.toml",
            "--forms-dir",
            "forms",
            "--store",
            "settings.json",
            "--auditor",
            "set",
            "configuration_google_oauth_template",
            "SOCIAL_AUTH_GOOGLE_OAUTH2_KEY",
            "abc",
        ]);
        assert_eq!(cli.config, PathBuf::from("custom.toml"));
        assert_eq!(cli.forms_dir, Some(PathBuf::from("forms")));
        assert_eq!(cli.store, Some(PathBuf::from("settings.json")));
        assert!(cli.auditor);
        assert_eq!(
            cli.command,
            Commands::Set {
                form: "configuration_google_oauth_template".to_string(),
                key: "SOCIAL_AUTH_GOOGLE_OAUTH2_KEY".to_string(),
                value: "abc".to_string(),
                json: false,
            }
        );
    }

    #[test]
    fn test_assume_yes() {
        let cli = Cli::parse_from(["themis", "revert", "demo", "--yes"]);
        assert!(cli.command.assume_yes());

        let cli = Cli::parse_from(["themis", "reset", "demo", "KEY"]);
        assert!(!cli.command.assume_yes());
    }

    #[test]
    fn test_validate_requires_files() {
        assert!(Cli::try_parse_from(["themis", "validate"]).is_err());
    }
}
