// Analyze dependencies tool - summarizes package.json or Cargo.toml

use crate::tools::registry::Tool;
use crate::tools::types::{ToolContext, ToolInputSchema, ToolParam};
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::path::Path;

const DEFAULT_MANIFEST: &str = "./package.json";
const MAX_DEV_DEPENDENCIES: usize = 10;

pub struct AnalyzeDependenciesTool;

#[async_trait]
impl Tool for AnalyzeDependenciesTool {
    fn name(&self) -> &str {
        "analyzeDependencies"
    }

    fn description(&self) -> &str {
        "Analyze package.json (or Cargo.toml) to extract project information and dependencies"
    }

    fn input_schema(&self) -> ToolInputSchema {
        ToolInputSchema::object(vec![ToolParam::optional(
            "path",
            "string",
            "Path to package.json or Cargo.toml (default: ./package.json)",
        )])
    }

    async fn execute(&self, input: Value, context: &ToolContext) -> Result<String> {
        let manifest = input["path"].as_str().unwrap_or(DEFAULT_MANIFEST);
        let full_path = context.resolve(manifest);

        if !full_path.exists() {
            return Ok("No package.json found at the specified path.".to_string());
        }

        let content = tokio::fs::read_to_string(&full_path)
            .await
            .with_context(|| format!("Error analyzing {}", full_path.display()))?;

        if is_cargo_manifest(&full_path) {
            summarize_cargo(&content)
        } else {
            summarize_package_json(&content)
        }
    }
}

fn is_cargo_manifest(path: &Path) -> bool {
    path.file_name().and_then(|n| n.to_str()) == Some("Cargo.toml")
}

fn summarize_package_json(content: &str) -> Result<String> {
    let package: Value =
        serde_json::from_str(content).context("Error analyzing package.json")?;

    let mut result = format!(
        "Project: {} {}\n",
        package["name"].as_str().unwrap_or("Unnamed"),
        package["version"]
            .as_str()
            .map(|v| format!("(v{})", v))
            .unwrap_or_default()
    );

    if let Some(description) = package["description"].as_str() {
        result.push_str(&format!("Description: {}\n", description));
    }
    if let Some(main) = package["main"].as_str() {
        result.push_str(&format!("Main entry point: {}\n", main));
    }

    if let Some(scripts) = package["scripts"].as_object().filter(|s| !s.is_empty()) {
        result.push_str("\nAvailable scripts:\n");
        for (name, command) in scripts {
            result.push_str(&format!("  - {}: {}\n", name, display_value(command)));
        }
    }

    if let Some(deps) = package["dependencies"].as_object().filter(|d| !d.is_empty()) {
        result.push_str(&format!("\nDependencies ({}):\n", deps.len()));
        for (name, version) in deps {
            result.push_str(&format!("  - {}: {}\n", name, display_value(version)));
        }
    }

    if let Some(dev) = package["devDependencies"].as_object().filter(|d| !d.is_empty()) {
        result.push_str(&format!("\nDev Dependencies ({}):\n", dev.len()));
        for (name, version) in dev.iter().take(MAX_DEV_DEPENDENCIES) {
            result.push_str(&format!("  - {}: {}\n", name, display_value(version)));
        }
        if dev.len() > MAX_DEV_DEPENDENCIES {
            result.push_str(&format!(
                "  - ... and {} more\n",
                dev.len() - MAX_DEV_DEPENDENCIES
            ));
        }
    }

    if !package["author"].is_null() {
        result.push_str(&format!("\nAuthor: {}\n", display_value(&package["author"])));
    }
    if let Some(license) = package["license"].as_str() {
        result.push_str(&format!("License: {}\n", license));
    }

    Ok(result)
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn summarize_cargo(content: &str) -> Result<String> {
    let manifest: toml::Table = content.parse().context("Error analyzing Cargo.toml")?;

    let package = manifest.get("package").and_then(|p| p.as_table());
    let field = |key: &str| {
        package
            .and_then(|p| p.get(key))
            .and_then(|v| v.as_str())
            .map(str::to_string)
    };

    let mut result = format!(
        "Project: {} {}\n",
        field("name").unwrap_or_else(|| "Unnamed".to_string()),
        field("version").map(|v| format!("(v{})", v)).unwrap_or_default()
    );
    if let Some(description) = field("description") {
        result.push_str(&format!("Description: {}\n", description));
    }
    if let Some(edition) = field("edition") {
        result.push_str(&format!("Edition: {}\n", edition));
    }

    for (section, title) in [
        ("dependencies", "Dependencies"),
        ("dev-dependencies", "Dev Dependencies"),
    ] {
        let Some(deps) = manifest.get(section).and_then(|d| d.as_table()) else {
            continue;
        };
        if deps.is_empty() {
            continue;
        }
        result.push_str(&format!("\n{} ({}):\n", title, deps.len()));
        for (name, spec) in deps {
            result.push_str(&format!("  - {}: {}\n", name, cargo_version(spec)));
        }
    }

    if let Some(license) = field("license") {
        result.push_str(&format!("\nLicense: {}\n", license));
    }

    Ok(result)
}

fn cargo_version(spec: &toml::Value) -> String {
    match spec {
        toml::Value::String(version) => version.clone(),
        toml::Value::Table(table) => table
            .get("version")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .or_else(|| {
                table
                    .get("path")
                    .and_then(|p| p.as_str())
                    .map(|p| format!("path {}", p))
            })
            .or_else(|| {
                table
                    .get("git")
                    .and_then(|g| g.as_str())
                    .map(|g| format!("git {}", g))
            })
            .unwrap_or_else(|| "*".to_string()),
        other => other.to_string(),
    }
}
