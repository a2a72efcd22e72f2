// Edit tool - targeted text replacement inside a file

use crate::tools::registry::Tool;
use crate::tools::types::{ToolContext, ToolInputSchema, ToolParam};
use anyhow::{Context, Result};
use async_trait::async_trait;
use regex::Regex;
use serde_json::Value;

pub struct EditTool;

#[async_trait]
impl Tool for EditTool {
    fn name(&self) -> &str {
        "edit"
    }

    fn description(&self) -> &str {
        "Make targeted changes to a file by replacing specific text"
    }

    fn input_schema(&self) -> ToolInputSchema {
        ToolInputSchema::object(vec![
            ToolParam::required("path", "string", "The path to the file to edit"),
            ToolParam::required("search", "string", "The text or regex pattern to search for"),
            ToolParam::required("replace", "string", "The text to replace the matches with"),
            ToolParam::optional("regex", "boolean", "Treat search as regex (default: false)"),
        ])
    }

    async fn execute(&self, input: Value, context: &ToolContext) -> Result<String> {
        let file = input["path"].as_str().context("Missing path parameter")?;
        let search = input["search"].as_str().context("Missing search parameter")?;
        let replace = input["replace"].as_str().context("Missing replace parameter")?;
        let use_regex = input["regex"].as_bool().unwrap_or(false);

        let path = context.resolve(file);
        let content = tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("Error editing file: {}", path.display()))?;

        let updated = if use_regex {
            let pattern = Regex::new(search)
                .with_context(|| format!("Invalid regex pattern: {}", search))?;
            pattern.replace_all(&content, replace).into_owned()
        } else if search.is_empty() {
            content.clone()
        } else {
            content.replace(search, replace)
        };

        if updated == content {
            return Ok("No changes were made (search text not found).".to_string());
        }

        tokio::fs::write(&path, updated)
            .await
            .with_context(|| format!("Error editing file: {}", path.display()))?;

        tracing::info!("Edited {}", path.display());
        Ok("File updated successfully.".to_string())
    }
}
