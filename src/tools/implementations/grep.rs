// Grep tool - searches for patterns in files

use crate::tools::registry::Tool;
use crate::tools::types::{ToolContext, ToolInputSchema, ToolParam};
use anyhow::{Context, Result};
use async_trait::async_trait;
use regex::Regex;
use serde_json::Value;
use std::fs;
use walkdir::WalkDir;

const MAX_MATCHES: usize = 200;

pub struct GrepTool;

#[async_trait]
impl Tool for GrepTool {
    fn name(&self) -> &str {
        "grep"
    }

    fn description(&self) -> &str {
        "Search file contents using regex patterns"
    }

    fn input_schema(&self) -> ToolInputSchema {
        ToolInputSchema::object(vec![
            ToolParam::required("pattern", "string", "The regex pattern to search for"),
            ToolParam::required("path", "string", "File or directory to search in"),
            ToolParam::optional(
                "recursive",
                "boolean",
                "Search recursively in directories (default: false)",
            ),
        ])
    }

    async fn execute(&self, input: Value, context: &ToolContext) -> Result<String> {
        let pattern = input["pattern"]
            .as_str()
            .context("Missing pattern parameter")?;
        let target = input["path"].as_str().context("Missing path parameter")?;
        let recursive = input["recursive"].as_bool().unwrap_or(false);

        let regex = Regex::new(pattern)
            .with_context(|| format!("Invalid regex pattern: {}", pattern))?;

        let root = context.resolve(target);
        if !root.exists() {
            anyhow::bail!("Error during search: {}: No such file or directory", target);
        }

        let walker = WalkDir::new(&root)
            .max_depth(if recursive { usize::MAX } else { 1 })
            .sort_by_file_name();

        let mut results = Vec::new();
        for entry in walker.into_iter().filter_map(|e| e.ok()) {
            if !entry.file_type().is_file() {
                continue;
            }
            // Binary and unreadable files are skipped
            let Ok(contents) = fs::read_to_string(entry.path()) else {
                continue;
            };
            let shown = entry
                .path()
                .strip_prefix(&context.working_dir)
                .unwrap_or(entry.path());

            for (line_num, line) in contents.lines().enumerate() {
                if regex.is_match(line) {
                    results.push(format!("{}:{}:{}", shown.display(), line_num + 1, line));
                    if results.len() >= MAX_MATCHES {
                        results.push(format!("... (truncated to {} matches)", MAX_MATCHES));
                        return Ok(results.join("\n"));
                    }
                }
            }
        }

        if results.is_empty() {
            Ok("No matches found.".to_string())
        } else {
            Ok(results.join("\n"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn tree() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("src/nested")).unwrap();
        fs::write(dir.path().join("src/lib.rs"), "pub mod agent;\nfn helper() {}").unwrap();
        fs::write(dir.path().join("src/nested/deep.rs"), "fn helper_two() {}").unwrap();
        dir
    }

    #[tokio::test]
    async fn test_grep_single_level() {
        let dir = tree();
        let ctx = ToolContext::new(dir.path());
        let output = GrepTool
            .execute(serde_json::json!({"pattern": "fn helper", "path": "src"}), &ctx)
            .await
            .unwrap();
        assert_eq!(output, "src/lib.rs:2:fn helper() {}");
    }

    #[tokio::test]
    async fn test_grep_recursive() {
        let dir = tree();
        let ctx = ToolContext::new(dir.path());
        let output = GrepTool
            .execute(
                serde_json::json!({"pattern": "fn helper", "path": "src", "recursive": true}),
                &ctx,
            )
            .await
            .unwrap();
        assert!(output.contains("src/lib.rs:2:"));
        assert!(output.contains("src/nested/deep.rs:1:"));
    }

    #[tokio::test]
    async fn test_grep_no_matches() {
        let dir = tree();
        let ctx = ToolContext::new(dir.path());
        let output = GrepTool
            .execute(serde_json::json!({"pattern": "zzz", "path": "src/lib.rs"}), &ctx)
            .await
            .unwrap();
        assert_eq!(output, "No matches found.");
    }

    #[tokio::test]
    async fn test_grep_invalid_regex() {
        let dir = tree();
        let ctx = ToolContext::new(dir.path());
        let result = GrepTool
            .execute(serde_json::json!({"pattern": "[invalid(", "path": "."}), &ctx)
            .await;
        assert!(result.is_err());
    }
}
