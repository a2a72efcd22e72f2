// Bash tool - executes shell commands

use crate::tools::registry::Tool;
use crate::tools::types::{ToolContext, ToolInputSchema};
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::path::Path;
use tokio::process::Command;

const MAX_OUTPUT_CHARS: usize = 10_000;

/// Captured result of a shell command
pub(crate) struct ShellOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

/// Run `command` through `sh -c` in `dir`
pub(crate) async fn run_shell(command: &str, dir: &Path) -> Result<ShellOutput> {
    tracing::debug!("Running shell command in {}: {}", dir.display(), command);

    let output = Command::new("sh")
        .arg("-c")
        .arg(command)
        .current_dir(dir)
        .output()
        .await
        .with_context(|| format!("Failed to execute command: {}", command))?;

    Ok(ShellOutput {
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        exit_code: output.status.code().unwrap_or(-1),
    })
}

fn truncate(text: String) -> String {
    match text.char_indices().nth(MAX_OUTPUT_CHARS) {
        Some((cut, _)) => format!(
            "{}\n\n[Output truncated - showing first {} characters]",
            &text[..cut],
            MAX_OUTPUT_CHARS
        ),
        None => text,
    }
}

pub struct BashTool;

#[async_trait]
impl Tool for BashTool {
    fn name(&self) -> &str {
        "bash"
    }

    fn description(&self) -> &str {
        "Execute shell commands and get the output"
    }

    fn input_schema(&self) -> ToolInputSchema {
        ToolInputSchema::simple(vec![("command", "The shell command to execute")])
    }

    async fn execute(&self, input: Value, context: &ToolContext) -> Result<String> {
        let command = input["command"]
            .as_str()
            .context("Missing command parameter")?;

        let output = run_shell(command, &context.working_dir).await?;

        if output.exit_code != 0 {
            anyhow::bail!(
                "Error executing command: exit code {}\n{}",
                output.exit_code,
                output.stderr.trim_end()
            );
        }

        let result = if !output.stderr.is_empty() {
            format!(
                "Command executed with warnings:\n{}\nOutput:\n{}",
                output.stderr, output.stdout
            )
        } else if output.stdout.is_empty() {
            "Command executed successfully (no output)".to_string()
        } else {
            output.stdout
        };

        Ok(truncate(result))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_bash_echo() {
        let dir = TempDir::new().unwrap();
        let ctx = ToolContext::new(dir.path());
        let output = BashTool
            .execute(serde_json::json!({"command": "echo 'Hello, World!'"}), &ctx)
            .await
            .unwrap();
        assert_eq!(output, "Hello, World!\n");
    }

    #[tokio::test]
    async fn test_bash_runs_in_working_dir() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("marker.txt"), "").unwrap();
        let ctx = ToolContext::new(dir.path());
        let output = BashTool
            .execute(serde_json::json!({"command": "ls"}), &ctx)
            .await
            .unwrap();
        assert!(output.contains("marker.txt"));
    }

    #[tokio::test]
    async fn test_bash_no_output() {
        let dir = TempDir::new().unwrap();
        let ctx = ToolContext::new(dir.path());
        let output = BashTool
            .execute(serde_json::json!({"command": "true"}), &ctx)
            .await
            .unwrap();
        assert_eq!(output, "Command executed successfully (no output)");
    }

    #[tokio::test]
    async fn test_bash_nonzero_exit() {
        let dir = TempDir::new().unwrap();
        let ctx = ToolContext::new(dir.path());
        let result = BashTool
            .execute(serde_json::json!({"command": "exit 3"}), &ctx)
            .await;
        let err = result.unwrap_err().to_string();
        assert!(err.contains("exit code 3"));
    }
}
