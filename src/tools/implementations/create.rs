// Create tool - new files and directories

use crate::tools::registry::Tool;
use crate::tools::types::{ToolContext, ToolInputSchema, ToolParam};
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;

pub struct CreateTool;

#[async_trait]
impl Tool for CreateTool {
    fn name(&self) -> &str {
        "create"
    }

    fn description(&self) -> &str {
        "Create a new file or directory"
    }

    fn input_schema(&self) -> ToolInputSchema {
        ToolInputSchema::object(vec![
            ToolParam::required("path", "string", "The path for the new file or directory"),
            ToolParam::optional(
                "content",
                "string",
                "The content for the file (if creating a file)",
            ),
            ToolParam::optional(
                "isDirectory",
                "boolean",
                "Whether to create a directory (default: false)",
            ),
        ])
    }

    async fn execute(&self, input: Value, context: &ToolContext) -> Result<String> {
        let target = input["path"].as_str().context("Missing path parameter")?;
        let content = input["content"].as_str().unwrap_or("");
        let is_directory = input["isDirectory"].as_bool().unwrap_or(false);

        let full_path = context.resolve(target);

        if is_directory {
            tokio::fs::create_dir_all(&full_path)
                .await
                .with_context(|| format!("Error creating directory: {}", target))?;
            return Ok(format!("Directory created successfully at {}", target));
        }

        if let Some(parent) = full_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Error creating file: {}", target))?;
        }
        tokio::fs::write(&full_path, content)
            .await
            .with_context(|| format!("Error creating file: {}", target))?;

        let preview = content
            .split('\n')
            .map(|line| format!("+ {}", line))
            .collect::<Vec<_>>()
            .join("\n");

        Ok(format!(
            "File created successfully at {}\n\nNew content:\n{}",
            target, preview
        ))
    }
}
