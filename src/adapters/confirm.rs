use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use crate::domain::{ConfirmPrompt, Confirmer};

/// Answers every prompt the same way.
#[derive(Debug, Clone, Copy)]
pub struct StaticConfirmer {
    answer: bool,
}

impl StaticConfirmer {
    pub fn accept() -> Self {
        Self { answer: true }
    }

    pub fn decline() -> Self {
        Self { answer: false }
    }
}

#[async_trait]
impl Confirmer for StaticConfirmer {
    async fn confirm(&self, _prompt: &ConfirmPrompt) -> bool {
        self.answer
    }
}

/// Asks on the terminal; anything but `y`/`yes` declines.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalConfirmer;

impl TerminalConfirmer {
    fn question(prompt: &ConfirmPrompt) -> String {
        match prompt {
            ConfirmPrompt::ResetField { field, default, .. } => {
                format!("Reset {} to its default ({})? [y/N] ", field, default)
            }
            ConfirmPrompt::RevertAll { form } => {
                format!("Revert every setting in {} to its default? [y/N] ", form)
            }
        }
    }
}

#[async_trait]
impl Confirmer for TerminalConfirmer {
    async fn confirm(&self, prompt: &ConfirmPrompt) -> bool {
        let mut stdout = tokio::io::stdout();
        if stdout.write_all(Self::question(prompt).as_bytes()).await.is_err() {
            return false;
        }
        let _ = stdout.flush().await;

        let mut line = String::new();
        let mut reader = BufReader::new(tokio::io::stdin());
        match reader.read_line(&mut line).await {
            Ok(_) => matches!(line.trim().to_ascii_lowercase().as_str(), "y" | "yes"),
            Err(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_confirmer() {
        let prompt = ConfirmPrompt::RevertAll { form: "f".to_string() };
        assert!(StaticConfirmer::accept().confirm(&prompt).await);
        assert!(!StaticConfirmer::decline().confirm(&prompt).await);
    }

    #[test]
    fn test_terminal_question_text() {
        let prompt = ConfirmPrompt::ResetField {
            form: "f".to_string(),
            field: "KEY".to_string(),
            default: serde_json::json!(""),
        };
        assert_eq!(TerminalConfirmer::question(&prompt), "Reset KEY to its default (\"\")? [y/N] ");
    }
}
