// Git info tool - read-only repository queries

use super::bash::run_shell;
use crate::tools::registry::Tool;
use crate::tools::types::{ToolContext, ToolInputSchema, ToolParam};
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;

const DEFAULT_LOG_LIMIT: u64 = 5;

pub struct GitInfoTool;

/// Map a subcommand name to the git invocation it runs
fn git_command(command: &str, limit: u64) -> Option<String> {
    let cmd = match command {
        "status" => "git status -s".to_string(),
        "log" => format!("git log --oneline --decorate --graph -n {}", limit),
        "branch" => "git branch -v".to_string(),
        "remote" => "git remote -v".to_string(),
        "summary" => "git shortlog -sn --no-merges".to_string(),
        _ => return None,
    };
    Some(cmd)
}

#[async_trait]
impl Tool for GitInfoTool {
    fn name(&self) -> &str {
        "gitInfo"
    }

    fn description(&self) -> &str {
        "Get information about the Git repository"
    }

    fn input_schema(&self) -> ToolInputSchema {
        let mut schema = ToolInputSchema::object(vec![
            ToolParam::required("command", "string", "The Git command to run"),
            ToolParam::optional("limit", "number", "Limit the number of results (for log)"),
        ]);
        schema.properties["command"]["enum"] =
            serde_json::json!(["status", "log", "branch", "remote", "summary"]);
        schema
    }

    async fn execute(&self, input: Value, context: &ToolContext) -> Result<String> {
        let command = input["command"]
            .as_str()
            .context("Missing command parameter")?;
        let limit = input["limit"].as_u64().unwrap_or(DEFAULT_LOG_LIMIT);

        let Some(git) = git_command(command, limit) else {
            return Ok("Invalid Git command.".to_string());
        };

        let output = run_shell(&git, &context.working_dir).await?;

        if output.exit_code != 0 {
            anyhow::bail!(
                "Error executing Git command: {}",
                output.stderr.trim_end()
            );
        }

        if !output.stderr.is_empty() {
            let stdout = if output.stdout.is_empty() {
                "No output"
            } else {
                output.stdout.as_str()
            };
            return Ok(format!(
                "Git warning/error: {}\nOutput: {}",
                output.stderr, stdout
            ));
        }

        if output.stdout.trim().is_empty() {
            return Ok("No output from Git command.".to_string());
        }

        Ok(output.stdout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_git_command_mapping() {
        assert_eq!(git_command("status", 5).as_deref(), Some("git status -s"));
        assert_eq!(
            git_command("log", 12).as_deref(),
            Some("git log --oneline --decorate --graph -n 12")
        );
        assert_eq!(
            git_command("summary", 5).as_deref(),
            Some("git shortlog -sn --no-merges")
        );
        assert_eq!(git_command("push", 5), None);
    }

    #[tokio::test]
    async fn test_invalid_command() {
        let dir = TempDir::new().unwrap();
        let ctx = ToolContext::new(dir.path());
        let output = GitInfoTool
            .execute(serde_json::json!({"command": "push"}), &ctx)
            .await
            .unwrap();
        assert_eq!(output, "Invalid Git command.");
    }

    #[tokio::test]
    async fn test_outside_repository_fails() {
        let dir = TempDir::new().unwrap();
        let ctx = ToolContext::new(dir.path());
        let result = GitInfoTool
            .execute(serde_json::json!({"command": "status"}), &ctx)
            .await;
        assert!(result.is_err());
    }
}
