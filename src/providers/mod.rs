// Multi-provider LLM support
//
// A thin abstraction over the OpenAI-compatible and Anthropic HTTP APIs so
// the agent can dispatch to whichever provider owns the selected model.

use anyhow::Result;
use async_trait::async_trait;

pub mod types;

// Provider implementations
pub mod anthropic;
pub mod openai;

// Provider factory and retry helper
pub mod factory;
pub mod retry;

// Re-export commonly used types
pub use factory::{create_provider, HttpProviderFactory, ProviderFactory, SUPPORTED_PROVIDERS};
pub use retry::{with_retry, RetryPolicy};
pub use types::{Message, ProviderMessage, ProviderRequest, ProviderResponse, Role};

/// Trait for LLM providers
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Send a message and get a complete response (single attempt)
    async fn send_message(&self, request: &ProviderRequest) -> Result<ProviderResponse>;

    /// Provider name (e.g., "openai", "anthropic", "mistral")
    fn name(&self) -> &str;

    /// Model used when the request leaves it empty
    fn default_model(&self) -> &str;
}
