// View tool - reads a file with optional line selection

use crate::tools::registry::Tool;
use crate::tools::types::{ToolContext, ToolInputSchema, ToolParam};
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;

pub struct ViewTool;

#[async_trait]
impl Tool for ViewTool {
    fn name(&self) -> &str {
        "view"
    }

    fn description(&self) -> &str {
        "Read and display the contents of a file with optional line selection"
    }

    fn input_schema(&self) -> ToolInputSchema {
        ToolInputSchema::object(vec![
            ToolParam::required("path", "string", "The path to the file to view"),
            ToolParam::optional("startLine", "number", "Starting line number (default: 1)"),
            ToolParam::optional("endLine", "number", "Ending line number (default: all lines)"),
        ])
    }

    async fn execute(&self, input: Value, context: &ToolContext) -> Result<String> {
        let file = input["path"].as_str().context("Missing path parameter")?;
        let start_line = input["startLine"].as_u64().unwrap_or(1) as usize;
        let end_line = input["endLine"].as_u64().map(|n| n as usize);

        let path = context.resolve(file);
        let content = tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("Error reading file: {}", path.display()))?;

        let lines: Vec<&str> = content.split('\n').collect();
        let start = start_line.saturating_sub(1);
        let end = end_line.map_or(lines.len(), |e| e.min(lines.len()));

        if start >= lines.len() {
            return Ok(format!(
                "File has only {} lines. Cannot start at line {}.",
                lines.len(),
                start_line
            ));
        }

        if end <= start {
            return Ok(String::new());
        }

        Ok(lines[start..end].join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn file_with_lines() -> TempDir {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("lines.txt"), "one\ntwo\nthree\nfour").unwrap();
        dir
    }

    #[tokio::test]
    async fn test_view_whole_file() {
        let dir = file_with_lines();
        let ctx = ToolContext::new(dir.path());
        let output = ViewTool
            .execute(serde_json::json!({"path": "lines.txt"}), &ctx)
            .await
            .unwrap();
        assert_eq!(output, "one\ntwo\nthree\nfour");
    }

    #[tokio::test]
    async fn test_view_line_range() {
        let dir = file_with_lines();
        let ctx = ToolContext::new(dir.path());
        let output = ViewTool
            .execute(
                serde_json::json!({"path": "lines.txt", "startLine": 2, "endLine": 3}),
                &ctx,
            )
            .await
            .unwrap();
        assert_eq!(output, "two\nthree");
    }

    #[tokio::test]
    async fn test_view_start_past_end() {
        let dir = file_with_lines();
        let ctx = ToolContext::new(dir.path());
        let output = ViewTool
            .execute(serde_json::json!({"path": "lines.txt", "startLine": 10}), &ctx)
            .await
            .unwrap();
        assert_eq!(output, "File has only 4 lines. Cannot start at line 10.");
    }
}
