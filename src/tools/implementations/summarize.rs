// Summarize tool - returns file contents so the model can describe them

use crate::tools::registry::Tool;
use crate::tools::types::{ToolContext, ToolInputSchema};
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;

pub struct SummarizeTool;

#[async_trait]
impl Tool for SummarizeTool {
    fn name(&self) -> &str {
        "summarize"
    }

    fn description(&self) -> &str {
        "Get the content of a file to understand what it contains"
    }

    fn input_schema(&self) -> ToolInputSchema {
        ToolInputSchema::simple(vec![("file", "The path to the file to summarize")])
    }

    async fn execute(&self, input: Value, context: &ToolContext) -> Result<String> {
        let file = input["file"].as_str().context("Missing file parameter")?;
        let path = context.resolve(file);

        tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("Error reading file: {}", path.display()))
    }
}
