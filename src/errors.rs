// Error types and user-friendly messages
//
// Domain failures are typed (`OmniError`) so callers can match on them;
// everything operational flows through anyhow with context attached.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Failures raised by the config store, model registry and wizard engine
#[derive(Debug, Error)]
pub enum OmniError {
    /// Application state accessed before configuration was loaded
    #[error("Omni is not initialized: configuration has not been loaded")]
    NotInitialized,

    #[error("Unknown wizard step: {0}")]
    UnknownStep(String),

    #[error("Already at the first wizard step")]
    AtFirstStep,

    #[error("Already at the last wizard step")]
    AtLastStep,

    #[error("Wizard has no steps")]
    EmptyWizard,

    #[error("No provider found for model: {0}")]
    UnknownModel(String),

    #[error("Unknown provider: {0}")]
    UnknownProvider(String),

    #[error("No API key found for provider: {0}")]
    MissingApiKey(String),

    #[error("Failed to parse config file {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Message printed when `query` or the default command runs unconfigured
pub fn not_configured_message() -> String {
    "Omni CLI is not configured. Please run \"omni config\" to set up.".to_string()
}

/// Reply shown when the selected provider has no key yet
pub fn missing_api_key_message(provider: &str) -> String {
    format!(
        "No API key found for provider: {}. Run \"omni config\" to add one.",
        provider
    )
}

/// Format a config parse error with recovery steps
pub fn config_parse_error(path: &str, error: impl fmt::Display) -> String {
    format!(
        "Failed to parse config file {}\n\n\
        \x1b[1;33mError:\x1b[0m {}\n\n\
        \x1b[1;32mTry:\x1b[0m\n\
        1. Validate the JSON syntax:\n\
           \x1b[36mcat {}\x1b[0m\n\n\
        2. Remove the file and run setup again:\n\
           \x1b[36momni config:rm\x1b[0m\n\
           \x1b[36momni config\x1b[0m",
        path, error, path
    )
}
