// Tool execution system
//
// Filesystem, shell and git helpers the model may call during a response.

pub mod implementations;
pub mod registry;
pub mod types;

pub use registry::{Tool, ToolRegistry};
pub use types::{ContentBlock, ToolContext, ToolDefinition, ToolInputSchema, ToolResult, ToolUse};
