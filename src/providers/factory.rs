// Provider factory
//
// Creates LLM providers by configured provider name

use anyhow::{bail, Result};

use super::anthropic::AnthropicProvider;
use super::openai::OpenAIProvider;
use super::LlmProvider;

/// Provider names the CLI can talk to
pub const SUPPORTED_PROVIDERS: [&str; 3] = ["openai", "anthropic", "mistral"];

/// Create a provider from its name and API key
pub fn create_provider(name: &str, api_key: &str) -> Result<Box<dyn LlmProvider>> {
    let api_key = api_key.to_string();
    match name {
        "openai" => Ok(Box::new(OpenAIProvider::new_openai(api_key)?)),
        "mistral" => Ok(Box::new(OpenAIProvider::new_mistral(api_key)?)),
        "anthropic" => Ok(Box::new(AnthropicProvider::new(api_key)?)),
        _ => bail!("Unknown provider: {}", name),
    }
}

/// Builds providers for the agent; tests substitute fakes
pub trait ProviderFactory: Send + Sync {
    fn create(&self, name: &str, api_key: &str) -> Result<Box<dyn LlmProvider>>;
}

/// Factory backed by the real HTTP clients
#[derive(Debug, Default, Clone, Copy)]
pub struct HttpProviderFactory;

impl ProviderFactory for HttpProviderFactory {
    fn create(&self, name: &str, api_key: &str) -> Result<Box<dyn LlmProvider>> {
        create_provider(name, api_key)
    }
}
