// Agent bridge
//
// Turns one user utterance plus the running conversation into a provider
// request, runs the tool loop, and always hands back a displayable string.

use anyhow::Result;
use std::sync::Arc;

use crate::config::{models, ConfigStore};
use crate::errors::{missing_api_key_message, OmniError};
use crate::providers::{
    with_retry, HttpProviderFactory, LlmProvider, Message, ProviderFactory, ProviderMessage,
    ProviderRequest, RetryPolicy, Role,
};
use crate::tools::{ContentBlock, ToolContext, ToolRegistry};

/// Most provider round-trips one response may take
pub const MAX_TOOL_STEPS: usize = 15;

/// Messages kept when building a request (oldest dropped first)
pub const CONTEXT_WINDOW: usize = 10;

pub(crate) const ERROR_PREFIX: &str = "An error occurred while generating the response";

/// Bridge between the query loop and the configured provider
#[derive(Clone)]
pub struct Agent {
    store: ConfigStore,
    factory: Arc<dyn ProviderFactory>,
    tools: Arc<ToolRegistry>,
    tool_context: ToolContext,
    retry: RetryPolicy,
    max_steps: usize,
    context_window: usize,
}

impl Agent {
    /// Agent using the real HTTP providers and every built-in tool
    pub fn new(store: ConfigStore) -> Self {
        Self::with_factory(store, Arc::new(HttpProviderFactory))
    }

    pub fn with_factory(store: ConfigStore, factory: Arc<dyn ProviderFactory>) -> Self {
        Self {
            store,
            factory,
            tools: Arc::new(ToolRegistry::with_defaults()),
            tool_context: ToolContext::current_dir(),
            retry: RetryPolicy::default(),
            max_steps: MAX_TOOL_STEPS,
            context_window: CONTEXT_WINDOW,
        }
    }

    pub fn with_tools(mut self, tools: ToolRegistry) -> Self {
        self.tools = Arc::new(tools);
        self
    }

    pub fn with_tool_context(mut self, context: ToolContext) -> Self {
        self.tool_context = context;
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Produce the assistant reply for `text`
    ///
    /// Never fails: any error is rendered into the returned string.
    pub async fn respond(
        &self,
        text: &str,
        messages: &[Message],
        model_override: Option<&str>,
        provider_override: Option<&str>,
    ) -> String {
        match self
            .try_respond(text, messages, model_override, provider_override)
            .await
        {
            Ok(reply) => reply,
            Err(e) => {
                tracing::error!("Failed to generate response: {:#}", e);
                match e.downcast_ref::<OmniError>() {
                    Some(OmniError::MissingApiKey(provider)) => {
                        format!("{}: {}", ERROR_PREFIX, missing_api_key_message(provider))
                    }
                    _ => format!("{}: {:#}", ERROR_PREFIX, e),
                }
            }
        }
    }

    async fn try_respond(
        &self,
        text: &str,
        messages: &[Message],
        model_override: Option<&str>,
        provider_override: Option<&str>,
    ) -> Result<String> {
        let config = self.store.read()?;

        let model = model_override
            .filter(|m| !m.is_empty())
            .unwrap_or(&config.default_model)
            .to_string();

        // An override only counts when that provider actually lists the model
        let provider_name = provider_override
            .filter(|name| {
                config
                    .providers
                    .get(*name)
                    .map(|p| p.has_model(&model))
                    .unwrap_or(false)
            })
            .or_else(|| models::provider_for_model(&config, &model))
            .map(str::to_string)
            .ok_or_else(|| OmniError::UnknownModel(model.clone()))?;

        let api_key = config
            .providers
            .get(&provider_name)
            .and_then(|p| p.api_key())
            .ok_or_else(|| OmniError::MissingApiKey(provider_name.clone()))?
            .to_string();

        let system_prompt = models::system_prompt(&config, &model);
        let conversation = build_context(text, messages, &system_prompt, self.context_window);

        let provider = self.factory.create(&provider_name, &api_key)?;
        let wire_model = models::api_model_id(&provider_name, &model).to_string();

        tracing::info!(
            "Sending {} messages to {}:{}",
            conversation.len(),
            provider_name,
            wire_model
        );

        self.run_tool_loop(provider.as_ref(), conversation, &wire_model, &system_prompt)
            .await
    }

    async fn run_tool_loop(
        &self,
        provider: &dyn LlmProvider,
        mut conversation: Vec<ProviderMessage>,
        model: &str,
        system_prompt: &str,
    ) -> Result<String> {
        let definitions = self.tools.definitions();
        let mut last_text = String::new();

        for step in 0..self.max_steps {
            let mut request = ProviderRequest::new(conversation.clone())
                .with_model(model)
                .with_system(system_prompt);
            if !definitions.is_empty() {
                request = request.with_tools(definitions.clone());
            }

            let response = with_retry(self.retry, || provider.send_message(&request)).await?;
            last_text = response.text();

            if !response.has_tool_uses() {
                return Ok(last_text);
            }

            tracing::debug!(
                "Step {}: executing {} tool call(s)",
                step + 1,
                response.tool_uses().len()
            );

            conversation.push(response.to_message());

            let mut results: Vec<ContentBlock> = Vec::new();
            for tool_use in response.tool_uses() {
                let result = self.tools.execute(&tool_use, &self.tool_context).await;
                results.push(result.into());
            }
            conversation.push(ProviderMessage::tool_results(results));
        }

        tracing::warn!("Tool loop stopped after {} steps", self.max_steps);
        Ok(last_text)
    }
}

/// System message (if missing) + history + user text, trimmed to the window
fn build_context(
    text: &str,
    messages: &[Message],
    system_prompt: &str,
    window: usize,
) -> Vec<ProviderMessage> {
    let mut all: Vec<Message> = Vec::with_capacity(messages.len() + 2);

    let has_system = messages.iter().any(|m| m.role == Role::System);
    if !has_system && !system_prompt.trim().is_empty() {
        all.push(Message::system(system_prompt));
    }
    all.extend_from_slice(messages);
    all.push(Message::user(text));

    let skip = all.len().saturating_sub(window);
    all[skip..].iter().map(ProviderMessage::from).collect()
}
