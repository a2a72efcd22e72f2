// Tool implementations
//
// Concrete implementations of the built-in tools

// Read-only tools
pub mod analyze_dependencies;
pub mod grep;
pub mod scan;
pub mod summarize;
pub mod view;

// File mutation
pub mod create;
pub mod edit;
pub mod remove;

// Command execution
pub mod bash;
pub mod git_info;

// Re-exports for convenience
pub use analyze_dependencies::AnalyzeDependenciesTool;
pub use bash::BashTool;
pub use create::CreateTool;
pub use edit::EditTool;
pub use git_info::GitInfoTool;
pub use grep::GrepTool;
pub use remove::RemoveTool;
pub use scan::ScanTool;
pub use summarize::SummarizeTool;
pub use view::ViewTool;
