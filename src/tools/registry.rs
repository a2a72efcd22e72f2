// Tool registry and trait definition
//
// Manages available tools and provides a uniform, non-failing execution entry

use crate::tools::implementations::{
    AnalyzeDependenciesTool, BashTool, CreateTool, EditTool, GitInfoTool, GrepTool, RemoveTool,
    ScanTool, SummarizeTool, ViewTool,
};
use crate::tools::types::{ToolContext, ToolDefinition, ToolInputSchema, ToolResult, ToolUse};
use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;

/// Tool trait - all tools must implement this
#[async_trait]
pub trait Tool: Send + Sync {
    /// Tool name as the model sees it (e.g. "bash", "gitInfo")
    fn name(&self) -> &str;

    /// Human-readable description of what the tool does
    fn description(&self) -> &str;

    /// JSON Schema defining expected input parameters
    fn input_schema(&self) -> ToolInputSchema;

    /// Execute the tool with given input and context
    async fn execute(&self, input: Value, context: &ToolContext) -> Result<String>;

    /// Full tool definition for provider requests
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            input_schema: self.input_schema(),
        }
    }
}

/// Registry of available tools
pub struct ToolRegistry {
    tools: HashMap<String, Box<dyn Tool>>,
}

impl ToolRegistry {
    /// Create empty registry
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Registry with every built-in tool
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(ScanTool));
        registry.register(Box::new(SummarizeTool));
        registry.register(Box::new(ViewTool));
        registry.register(Box::new(EditTool));
        registry.register(Box::new(CreateTool));
        registry.register(Box::new(RemoveTool));
        registry.register(Box::new(GrepTool));
        registry.register(Box::new(BashTool));
        registry.register(Box::new(AnalyzeDependenciesTool));
        registry.register(Box::new(GitInfoTool));
        registry
    }

    /// Register a tool
    pub fn register(&mut self, tool: Box<dyn Tool>) {
        let name = tool.name().to_string();
        self.tools.insert(name, tool);
    }

    /// Get tool by name
    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.tools.get(name).map(|b| b.as_ref())
    }

    /// Check if tool exists
    pub fn has_tool(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Tool names, sorted
    pub fn tool_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tools.keys().cloned().collect();
        names.sort();
        names
    }

    /// All tool definitions, sorted by name so requests are stable
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        let mut defs: Vec<ToolDefinition> = self.tools.values().map(|t| t.definition()).collect();
        defs.sort_by(|a, b| a.name.cmp(&b.name));
        defs
    }

    /// Run a requested tool call; failures come back as error results
    pub async fn execute(&self, tool_use: &ToolUse, context: &ToolContext) -> ToolResult {
        let Some(tool) = self.get(&tool_use.name) else {
            tracing::warn!("Model requested unknown tool {}", tool_use.name);
            return ToolResult::error(
                tool_use.id.clone(),
                format!("Unknown tool: {}", tool_use.name),
            );
        };

        tracing::debug!("Executing tool {} with {}", tool_use.name, tool_use.input);

        match tool.execute(tool_use.input.clone(), context).await {
            Ok(output) => ToolResult::success(tool_use.id.clone(), output),
            Err(e) => {
                tracing::warn!("Tool {} failed: {:#}", tool_use.name, e);
                ToolResult::error(tool_use.id.clone(), format!("Error: {:#}", e))
            }
        }
    }

    /// Number of registered tools
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Check if registry is empty
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
