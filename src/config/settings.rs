// Configuration document types
//
// Mirrors the on-disk JSON layout of config.json (camelCase keys).

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Step id the setup flow starts from
pub const WELCOME_STEP: &str = "welcome";

/// Provider selected when no initialization record names one
pub const DEFAULT_SELECTED_PROVIDER: &str = "openai";

/// The whole config.json document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OmniConfig {
    #[serde(default)]
    pub default_model: String,

    #[serde(default)]
    pub default_provider: String,

    /// Providers in insertion order; resolution is first-match over this order
    #[serde(default)]
    pub providers: IndexMap<String, ProviderConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initialization: Option<InitializationState>,
}

/// Settings for a single provider
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub models: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_system_prompt: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_system_prompts: Option<IndexMap<String, String>>,
}

impl ProviderConfig {
    pub fn is_enabled(&self) -> bool {
        self.enabled.unwrap_or(false)
    }

    /// Model ids offered by this provider (empty when unset)
    pub fn model_list(&self) -> &[String] {
        self.models.as_deref().unwrap_or(&[])
    }

    pub fn has_model(&self, model: &str) -> bool {
        self.model_list().iter().any(|m| m == model)
    }

    /// API key if one has been entered
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().filter(|key| !key.trim().is_empty())
    }
}

/// Persisted progress of the setup wizard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializationState {
    #[serde(default)]
    pub completed: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_step: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_providers: Option<Vec<String>>,
}

impl Default for InitializationState {
    fn default() -> Self {
        Self {
            completed: false,
            current_step: Some(WELCOME_STEP.to_string()),
            selected_providers: None,
        }
    }
}

impl Default for OmniConfig {
    fn default() -> Self {
        default_config()
    }
}

fn prompts(entries: &[(&str, &str)]) -> Option<IndexMap<String, String>> {
    Some(
        entries
            .iter()
            .map(|(model, prompt)| (model.to_string(), prompt.to_string()))
            .collect(),
    )
}

fn models(ids: &[&str]) -> Option<Vec<String>> {
    Some(ids.iter().map(|id| id.to_string()).collect())
}

/// Document written on first use
pub fn default_config() -> OmniConfig {
    let mut providers = IndexMap::new();

    providers.insert(
        "openai".to_string(),
        ProviderConfig {
            api_key: Some(String::new()),
            models: models(&[
                "gpt-4",
                "gpt-4o",
                "gpt-4o-mini",
                "gpt-4.5",
                "o1",
                "o1-mini",
                "o3",
                "o3-mini",
                "o3-mini-high",
            ]),
            enabled: Some(true),
            default_system_prompt: Some("You are a helpful assistant.".to_string()),
            model_system_prompts: prompts(&[
                ("gpt-4o", "You are a helpful assistant powered by GPT-4o."),
                (
                    "o1",
                    "You are a helpful assistant powered by o1, OpenAI's most advanced model.",
                ),
            ]),
        },
    );

    providers.insert(
        "anthropic".to_string(),
        ProviderConfig {
            api_key: Some(String::new()),
            models: models(&[
                "claude-v3-haiku",
                "claude-v3-sonnet",
                "claude-v3-opus",
                "claude-v3.5-sonnet",
                "claude-v3.5-haiku",
                "claude-v3.7-sonnet",
            ]),
            enabled: Some(false),
            default_system_prompt: Some("You are Claude, a helpful AI assistant.".to_string()),
            model_system_prompts: prompts(&[
                (
                    "claude-v3-opus",
                    "You are Claude Opus, Anthropic's most capable model.",
                ),
                (
                    "claude-v3.7-sonnet",
                    "You are Claude 3.7 Sonnet, a helpful and harmless AI assistant.",
                ),
            ]),
        },
    );

    providers.insert(
        "mistral".to_string(),
        ProviderConfig {
            api_key: Some(String::new()),
            models: models(&["mistral-small", "mistral-medium", "mistral-large"]),
            enabled: Some(false),
            default_system_prompt: Some(
                "You are a helpful AI assistant by Mistral AI.".to_string(),
            ),
            model_system_prompts: prompts(&[(
                "mistral-large",
                "You are Mistral Large, the most powerful model from Mistral AI.",
            )]),
        },
    );

    OmniConfig {
        default_model: "gpt-4o".to_string(),
        default_provider: "openai".to_string(),
        providers,
        initialization: Some(InitializationState::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_provider_order() {
        let config = default_config();
        let names: Vec<&str> = config.providers.keys().map(|k| k.as_str()).collect();
        assert_eq!(names, vec!["openai", "anthropic", "mistral"]);
    }

    #[test]
    fn test_default_only_openai_enabled() {
        let config = default_config();
        assert!(config.providers["openai"].is_enabled());
        assert!(!config.providers["anthropic"].is_enabled());
        assert!(!config.providers["mistral"].is_enabled());
    }

    #[test]
    fn test_default_model_belongs_to_default_provider() {
        let config = default_config();
        assert!(config.providers[&config.default_provider].has_model(&config.default_model));
    }

    #[test]
    fn test_camel_case_keys() {
        let json = serde_json::to_string(&default_config()).unwrap();
        assert!(json.contains("\"defaultModel\""));
        assert!(json.contains("\"defaultProvider\""));
        assert!(json.contains("\"apiKey\""));
        assert!(json.contains("\"modelSystemPrompts\""));
        assert!(json.contains("\"currentStep\""));
    }

    #[test]
    fn test_missing_keys_default_silently() {
        let config: OmniConfig = serde_json::from_str(r#"{"providers": {"openai": {}}}"#).unwrap();
        assert_eq!(config.default_model, "");
        assert!(config.initialization.is_none());
        assert!(!config.providers["openai"].is_enabled());
        assert!(config.providers["openai"].model_list().is_empty());
    }

    #[test]
    fn test_blank_api_key_is_absent() {
        let provider = ProviderConfig {
            api_key: Some("   ".to_string()),
            ..Default::default()
        };
        assert_eq!(provider.api_key(), None);
    }
}
