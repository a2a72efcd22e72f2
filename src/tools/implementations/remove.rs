// Remove tool - deletes files and directories

use crate::tools::registry::Tool;
use crate::tools::types::{ToolContext, ToolInputSchema, ToolParam};
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;

pub struct RemoveTool;

#[async_trait]
impl Tool for RemoveTool {
    fn name(&self) -> &str {
        "remove"
    }

    fn description(&self) -> &str {
        "Delete a file or directory"
    }

    fn input_schema(&self) -> ToolInputSchema {
        ToolInputSchema::object(vec![
            ToolParam::required("path", "string", "The path to the file or directory to delete"),
            ToolParam::optional(
                "recursive",
                "boolean",
                "Delete directories recursively (default: false)",
            ),
        ])
    }

    async fn execute(&self, input: Value, context: &ToolContext) -> Result<String> {
        let target = input["path"].as_str().context("Missing path parameter")?;
        let recursive = input["recursive"].as_bool().unwrap_or(false);
        let full_path = context.resolve(target);

        let metadata = tokio::fs::metadata(&full_path)
            .await
            .with_context(|| format!("Error deleting path: {}", target))?;

        let message = if metadata.is_dir() {
            if recursive {
                tokio::fs::remove_dir_all(&full_path)
                    .await
                    .with_context(|| format!("Error deleting path: {}", target))?;
                format!("Directory {} deleted recursively", target)
            } else {
                tokio::fs::remove_dir(&full_path)
                    .await
                    .with_context(|| format!("Error deleting path: {}", target))?;
                format!("Directory {} deleted", target)
            }
        } else {
            tokio::fs::remove_file(&full_path)
                .await
                .with_context(|| format!("Error deleting path: {}", target))?;
            format!("File {} deleted", target)
        };

        tracing::info!("{}", message);
        Ok(message)
    }
}
