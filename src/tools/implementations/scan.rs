// Scan tool - lists project files grouped by directory

use crate::tools::registry::Tool;
use crate::tools::types::{ToolContext, ToolInputSchema, ToolParam};
use anyhow::{Context, Result};
use async_trait::async_trait;
use glob::{glob_with, MatchOptions, Pattern};
use indexmap::IndexMap;
use serde_json::Value;
use std::path::Path;

const DEFAULT_PATTERN: &str = "**/*";
const DEFAULT_MAX_DEPTH: usize = 5;
const IGNORED_DIRS: [&str; 4] = ["node_modules", "dist", "build", ".git"];

pub struct ScanTool;

#[async_trait]
impl Tool for ScanTool {
    fn name(&self) -> &str {
        "scan"
    }

    fn description(&self) -> &str {
        "Scan the project to list files with optional filtering"
    }

    fn input_schema(&self) -> ToolInputSchema {
        ToolInputSchema::object(vec![
            ToolParam::optional(
                "directory",
                "string",
                "Directory to scan (default: current directory)",
            ),
            ToolParam::optional("pattern", "string", "Glob pattern to filter files (default: **/*)"),
            ToolParam::optional("ignore", "array", "Patterns to ignore (e.g., node_modules)"),
            ToolParam::optional("maxDepth", "number", "Maximum directory depth to traverse"),
        ])
    }

    async fn execute(&self, input: Value, context: &ToolContext) -> Result<String> {
        let root = context.resolve(input["directory"].as_str().unwrap_or("."));
        let pattern = input["pattern"].as_str().unwrap_or(DEFAULT_PATTERN);
        let max_depth = input["maxDepth"]
            .as_u64()
            .map(|d| d as usize)
            .unwrap_or(DEFAULT_MAX_DEPTH);

        let extra_ignores = input["ignore"]
            .as_array()
            .map(|items| {
                items
                    .iter()
                    .filter_map(|v| v.as_str())
                    .map(Pattern::new)
                    .collect::<std::result::Result<Vec<_>, _>>()
            })
            .transpose()
            .context("Invalid ignore pattern")?
            .unwrap_or_default();

        let full_pattern = root.join(pattern);
        let full_pattern = full_pattern
            .to_str()
            .context("Scan path is not valid UTF-8")?;

        let options = MatchOptions {
            require_literal_leading_dot: true,
            ..MatchOptions::new()
        };

        let mut files = Vec::new();
        for entry in glob_with(full_pattern, options)
            .with_context(|| format!("Invalid glob pattern: {}", pattern))?
        {
            let path = match entry {
                Ok(path) => path,
                Err(e) => {
                    tracing::debug!("Skipping unreadable path: {}", e);
                    continue;
                }
            };
            if !path.is_file() {
                continue;
            }
            let Ok(relative) = path.strip_prefix(&root) else {
                continue;
            };
            if is_ignored(relative, &extra_ignores) || relative.components().count() > max_depth {
                continue;
            }
            files.push(relative.to_path_buf());
        }

        if files.is_empty() {
            return Ok("No files found matching the criteria.".to_string());
        }

        files.sort();

        let mut by_dir: IndexMap<String, Vec<String>> = IndexMap::new();
        for file in &files {
            let dir = match file.parent() {
                Some(parent) if !parent.as_os_str().is_empty() => parent.display().to_string(),
                _ => ".".to_string(),
            };
            let name = file
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            by_dir.entry(dir).or_default().push(name);
        }

        let mut result = format!("Found {} files:\n\n", files.len());
        for (dir, names) in by_dir {
            result.push_str(&format!("{}/\n", dir));
            for name in names {
                result.push_str(&format!("  {}\n", name));
            }
            result.push('\n');
        }

        Ok(result)
    }
}

fn is_ignored(relative: &Path, extra: &[Pattern]) -> bool {
    let in_ignored_dir = relative.components().any(|c| {
        let part = c.as_os_str().to_string_lossy();
        IGNORED_DIRS.contains(&part.as_ref())
    });
    in_ignored_dir || extra.iter().any(|p| p.matches_path(relative))
}
