// Model registry and resolution
//
// Pure lookups over an `OmniConfig`. Provider order is the document's
// insertion order and every model -> provider lookup is first-match.

use std::fmt;

use super::settings::OmniConfig;

/// Prompt used when neither the model nor its provider defines one
pub const GENERIC_SYSTEM_PROMPT: &str = "You are a helpful assistant.";

/// Entry offered when no provider is enabled
const FALLBACK_PROVIDER: &str = "openai";
const FALLBACK_MODEL: &str = "gpt-4o";

/// A (provider, model) pair
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModelInfo {
    pub provider: String,
    pub model: String,
}

impl ModelInfo {
    pub fn new(provider: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            model: model.into(),
        }
    }
}

impl fmt::Display for ModelInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.provider, self.model)
    }
}

/// Every (provider, model) pair, provider order then model order
pub fn all_models(config: &OmniConfig) -> Vec<ModelInfo> {
    config
        .providers
        .iter()
        .flat_map(|(provider, settings)| {
            settings
                .model_list()
                .iter()
                .map(move |model| ModelInfo::new(provider.clone(), model.clone()))
        })
        .collect()
}

/// Models of enabled providers; never empty
pub fn enabled_models(config: &OmniConfig) -> Vec<ModelInfo> {
    let models: Vec<ModelInfo> = all_models(config)
        .into_iter()
        .filter(|info| {
            config
                .providers
                .get(&info.provider)
                .map(|p| p.is_enabled())
                .unwrap_or(false)
        })
        .collect();

    if models.is_empty() {
        vec![ModelInfo::new(FALLBACK_PROVIDER, FALLBACK_MODEL)]
    } else {
        models
    }
}

/// First provider whose model list contains `model`
pub fn provider_for_model<'a>(config: &'a OmniConfig, model: &str) -> Option<&'a str> {
    config
        .providers
        .iter()
        .find(|(_, settings)| settings.has_model(model))
        .map(|(name, _)| name.as_str())
}

/// Resolve the system prompt for a model
///
/// Order: per-model prompt on the owning provider, then that provider's
/// default prompt, then `GENERIC_SYSTEM_PROMPT`. First match wins.
pub fn system_prompt(config: &OmniConfig, model: &str) -> String {
    let Some(provider) = provider_for_model(config, model)
        .and_then(|name| config.providers.get(name))
    else {
        return GENERIC_SYSTEM_PROMPT.to_string();
    };

    if let Some(prompt) = provider
        .model_system_prompts
        .as_ref()
        .and_then(|prompts| prompts.get(model))
        .filter(|p| !p.is_empty())
    {
        return prompt.clone();
    }

    if let Some(prompt) = provider.default_system_prompt.as_ref().filter(|p| !p.is_empty()) {
        return prompt.clone();
    }

    GENERIC_SYSTEM_PROMPT.to_string()
}

/// Find a model among enabled providers
///
/// Accepts `provider:model` or a bare `model` (first enabled provider that
/// lists it wins).
pub fn find_model(config: &OmniConfig, spec: &str) -> Option<ModelInfo> {
    let spec = spec.trim();
    if spec.is_empty() {
        return None;
    }

    let enabled = |name: &str| {
        config
            .providers
            .get(name)
            .map(|p| p.is_enabled())
            .unwrap_or(false)
    };

    if let Some((provider, model)) = spec.split_once(':') {
        if let Some(settings) = config.providers.get(provider) {
            if enabled(provider) && settings.has_model(model) {
                return Some(ModelInfo::new(provider, model));
            }
            return None;
        }
    }

    config
        .providers
        .iter()
        .find(|(name, settings)| enabled(name) && settings.has_model(spec))
        .map(|(name, _)| ModelInfo::new(name.clone(), spec))
}

/// Map a catalog model name to the id the provider API expects
///
/// Names without a known mapping are sent unchanged, so users can list
/// raw API ids in config.json.
pub fn api_model_id<'a>(provider: &str, model: &'a str) -> &'a str {
    match (provider, model) {
        ("anthropic", "claude-v3-haiku") => "claude-3-haiku-20240307",
        ("anthropic", "claude-v3-sonnet") => "claude-3-sonnet-20240229",
        ("anthropic", "claude-v3-opus") => "claude-3-opus-latest",
        ("anthropic", "claude-v3.5-sonnet") => "claude-3-5-sonnet-latest",
        ("anthropic", "claude-v3.5-haiku") => "claude-3-5-haiku-latest",
        ("anthropic", "claude-v3.7-sonnet") => "claude-3-7-sonnet-latest",
        ("mistral", "mistral-small") => "mistral-small-latest",
        ("mistral", "mistral-medium") => "mistral-medium-latest",
        ("mistral", "mistral-large") => "mistral-large-latest",
        ("openai", "gpt-4.5") => "gpt-4.5-preview",
        ("openai", "o3-mini-high") => "o3-mini",
        _ => model,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::settings::{default_config, ProviderConfig};

    #[test]
    fn test_all_models_preserves_order() {
        let config = default_config();
        let models = all_models(&config);
        assert_eq!(models[0], ModelInfo::new("openai", "gpt-4"));
        assert_eq!(models[9], ModelInfo::new("anthropic", "claude-v3-haiku"));
        assert_eq!(models.last().unwrap(), &ModelInfo::new("mistral", "mistral-large"));
        assert_eq!(models.len(), 9 + 6 + 3);
    }

    #[test]
    fn test_each_pair_appears_once() {
        let config = default_config();
        let models = all_models(&config);
        for (provider, settings) in &config.providers {
            for model in settings.model_list() {
                let count = models
                    .iter()
                    .filter(|m| &m.provider == provider && &m.model == model)
                    .count();
                assert_eq!(count, 1, "{}:{}", provider, model);
            }
        }
    }

    #[test]
    fn test_enabled_models_fallback() {
        let mut config = default_config();
        for provider in config.providers.values_mut() {
            provider.enabled = Some(false);
        }
        assert_eq!(enabled_models(&config), vec![ModelInfo::new("openai", "gpt-4o")]);
    }

    #[test]
    fn test_enabled_models_filters_disabled() {
        let config = default_config();
        let models = enabled_models(&config);
        assert!(models.iter().all(|m| m.provider == "openai"));
    }

    #[test]
    fn test_system_prompt_resolution() {
        let config = default_config();
        assert_eq!(
            system_prompt(&config, "gpt-4o"),
            "You are a helpful assistant powered by GPT-4o."
        );
        assert_eq!(
            system_prompt(&config, "claude-v3-haiku"),
            "You are Claude, a helpful AI assistant."
        );
        assert_eq!(system_prompt(&config, "not-a-model"), GENERIC_SYSTEM_PROMPT);
    }

    #[test]
    fn test_system_prompt_generic_when_provider_has_none() {
        let mut config = default_config();
        config.providers.insert(
            "local".to_string(),
            ProviderConfig {
                models: Some(vec!["llama".to_string()]),
                ..Default::default()
            },
        );
        assert_eq!(system_prompt(&config, "llama"), GENERIC_SYSTEM_PROMPT);
    }

    #[test]
    fn test_provider_for_model_first_match() {
        let mut config = default_config();
        config.providers.insert(
            "azure".to_string(),
            ProviderConfig {
                models: Some(vec!["gpt-4o".to_string()]),
                ..Default::default()
            },
        );
        assert_eq!(provider_for_model(&config, "gpt-4o"), Some("openai"));
        assert_eq!(provider_for_model(&config, "unknown"), None);
    }

    #[test]
    fn test_find_model_qualified_and_bare() {
        let mut config = default_config();
        config.providers["anthropic"].enabled = Some(true);

        assert_eq!(
            find_model(&config, "anthropic:claude-v3.5-haiku"),
            Some(ModelInfo::new("anthropic", "claude-v3.5-haiku"))
        );
        assert_eq!(
            find_model(&config, "o1"),
            Some(ModelInfo::new("openai", "o1"))
        );
        assert_eq!(find_model(&config, "anthropic:claude-3-5-haiku-latest"), None);
        assert_eq!(find_model(&config, "mistral:mistral-large"), None);
        assert_eq!(find_model(&config, ""), None);
    }

    #[test]
    fn test_api_model_id_mapping() {
        assert_eq!(api_model_id("anthropic", "claude-v3.5-sonnet"), "claude-3-5-sonnet-latest");
        assert_eq!(api_model_id("mistral", "mistral-large"), "mistral-large-latest");
        assert_eq!(api_model_id("openai", "gpt-4o"), "gpt-4o");
        assert_eq!(api_model_id("anthropic", "claude-opus-4-1"), "claude-opus-4-1");
    }
}
