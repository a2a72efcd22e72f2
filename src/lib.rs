// Omni - terminal assistant with a guided provider setup
// Library exports

pub mod agent; // Provider dispatch and tool loop
pub mod cli;
pub mod config;
pub mod errors;
pub mod providers; // Multi-provider LLM support
pub mod tools; // Tool execution system
