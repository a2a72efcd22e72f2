// Config store
//
// Whole-document read-modify-write of config.json. No locking: concurrent
// processes on the same file are last-writer-wins.

use anyhow::{Context, Result};
use indexmap::IndexMap;
use std::fs;
use std::path::{Path, PathBuf};

use super::models::{self, ModelInfo};
use super::settings::{
    default_config, InitializationState, OmniConfig, DEFAULT_SELECTED_PROVIDER, WELCOME_STEP,
};
use crate::errors::OmniError;

/// Environment variable overriding the config directory
pub const CONFIG_DIR_ENV: &str = "OMNI_HOME";

const CONFIG_DIR_NAME: &str = ".omni";
const CONFIG_FILE_NAME: &str = "config.json";

/// Handle to the config.json file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigStore {
    dir: PathBuf,
    path: PathBuf,
}

impl ConfigStore {
    /// Store rooted at `dir` (config.json lives directly inside it)
    pub fn at(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        let path = dir.join(CONFIG_FILE_NAME);
        Self { dir, path }
    }

    /// Store at `$OMNI_HOME` or `~/.omni`
    pub fn default_location() -> Result<Self> {
        if let Ok(dir) = std::env::var(CONFIG_DIR_ENV) {
            if !dir.trim().is_empty() {
                return Ok(Self::at(dir));
            }
        }

        let home = dirs::home_dir().context("Could not determine home directory")?;
        Ok(Self::at(home.join(CONFIG_DIR_NAME)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Write the default document, creating the directory if needed
    pub fn init(&self) -> Result<OmniConfig> {
        let config = default_config();
        self.write(&config)?;
        tracing::info!("Initialized default config at {}", self.path.display());
        Ok(config)
    }

    /// Parse config.json, writing defaults first if the file is absent
    pub fn read(&self) -> Result<OmniConfig> {
        if !self.exists() {
            return self.init();
        }

        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read {}", self.path.display()))?;

        let config = serde_json::from_str(&contents).map_err(|source| OmniError::ConfigParse {
            path: self.path.clone(),
            source,
        })?;

        Ok(config)
    }

    /// Serialize the whole document (pretty-printed)
    pub fn write(&self, config: &OmniConfig) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create config directory {}", self.dir.display()))?;

        let json = serde_json::to_string_pretty(config).context("Failed to serialize config")?;

        fs::write(&self.path, json)
            .with_context(|| format!("Failed to write {}", self.path.display()))?;

        tracing::debug!("Wrote config to {}", self.path.display());
        Ok(())
    }

    fn update<F>(&self, mutate: F) -> Result<OmniConfig>
    where
        F: FnOnce(&mut OmniConfig),
    {
        let mut config = self.read()?;
        mutate(&mut config);
        self.write(&config)?;
        Ok(config)
    }

    /// Set the API key, creating the provider entry if needed
    pub fn update_provider_api_key(&self, provider: &str, api_key: &str) -> Result<()> {
        self.update(|config| {
            config
                .providers
                .entry(provider.to_string())
                .or_default()
                .api_key = Some(api_key.to_string());
        })?;
        tracing::info!("Saved API key for provider {}", provider);
        Ok(())
    }

    /// Bulk write of enabled flags; providers missing from the document are skipped
    pub fn set_provider_enabled_flags(&self, flags: &IndexMap<String, bool>) -> Result<()> {
        self.update(|config| {
            for (name, enabled) in flags {
                if let Some(provider) = config.providers.get_mut(name) {
                    provider.enabled = Some(*enabled);
                }
            }
        })?;
        Ok(())
    }

    /// Set the default model and re-derive its provider
    ///
    /// When no provider lists the model the previous `defaultProvider` is
    /// left as is.
    pub fn set_default_model(&self, model: &str) -> Result<()> {
        self.update(|config| {
            config.default_model = model.to_string();
            let owner = models::provider_for_model(config, model).map(str::to_string);
            if let Some(provider) = owner {
                config.default_provider = provider;
            } else {
                tracing::warn!(
                    "Model {} is not listed by any provider; keeping default provider {}",
                    model,
                    config.default_provider
                );
            }
        })?;
        Ok(())
    }

    pub fn all_models(&self) -> Result<Vec<ModelInfo>> {
        Ok(models::all_models(&self.read()?))
    }

    pub fn system_prompt(&self, model: &str) -> Result<String> {
        Ok(models::system_prompt(&self.read()?, model))
    }

    /// Store a per-model prompt on the provider that owns `model`
    pub fn update_model_system_prompt(&self, model: &str, prompt: &str) -> Result<()> {
        let mut config = self.read()?;
        let owner = models::provider_for_model(&config, model)
            .map(str::to_string)
            .ok_or_else(|| OmniError::UnknownModel(model.to_string()))?;

        if let Some(provider) = config.providers.get_mut(&owner) {
            provider
                .model_system_prompts
                .get_or_insert_with(IndexMap::new)
                .insert(model.to_string(), prompt.to_string());
        }

        self.write(&config)
    }

    pub fn update_provider_default_system_prompt(&self, provider: &str, prompt: &str) -> Result<()> {
        let mut config = self.read()?;
        let settings = config
            .providers
            .get_mut(provider)
            .ok_or_else(|| OmniError::UnknownProvider(provider.to_string()))?;
        settings.default_system_prompt = Some(prompt.to_string());
        self.write(&config)
    }

    /// Record setup progress; `selected` overwrites only when given
    pub fn update_initialization_state(
        &self,
        step_id: &str,
        completed: bool,
        selected: Option<&[String]>,
    ) -> Result<()> {
        self.update(|config| {
            let state = config
                .initialization
                .get_or_insert_with(InitializationState::default);
            state.current_step = Some(step_id.to_string());
            state.completed = completed;
            if let Some(selected) = selected {
                state.selected_providers = Some(selected.to_vec());
            }
        })?;
        tracing::debug!("Initialization step -> {} (completed: {})", step_id, completed);
        Ok(())
    }

    pub fn is_initialization_completed(&self) -> Result<bool> {
        Ok(self
            .read()?
            .initialization
            .map(|state| state.completed)
            .unwrap_or(false))
    }

    pub fn current_initialization_step(&self) -> Result<String> {
        Ok(self
            .read()?
            .initialization
            .and_then(|state| state.current_step)
            .filter(|step| !step.is_empty())
            .unwrap_or_else(|| WELCOME_STEP.to_string()))
    }

    pub fn selected_providers(&self) -> Result<Vec<String>> {
        Ok(self
            .read()?
            .initialization
            .and_then(|state| state.selected_providers)
            .filter(|selected| !selected.is_empty())
            .unwrap_or_else(|| vec![DEFAULT_SELECTED_PROVIDER.to_string()]))
    }

    /// Forget setup progress but keep keys, models and prompts
    pub fn reset_initialization_state(&self) -> Result<()> {
        self.update(|config| {
            config.initialization = Some(InitializationState::default());
        })?;
        tracing::info!("Reset initialization state");
        Ok(())
    }

    /// File exists and setup was completed
    pub fn is_configured(&self) -> bool {
        self.exists() && self.is_initialization_completed().unwrap_or(false)
    }

    /// Remove config.json and optionally its directory
    ///
    /// Returns false when anything fails (for example a non-empty directory).
    pub fn delete_config(&self, remove_directory: bool) -> bool {
        let result = (|| -> std::io::Result<()> {
            if self.path.exists() {
                fs::remove_file(&self.path)?;
            }
            if remove_directory && self.dir.exists() {
                fs::remove_dir(&self.dir)?;
            }
            Ok(())
        })();

        match result {
            Ok(()) => {
                tracing::info!("Deleted config at {}", self.path.display());
                true
            }
            Err(e) => {
                tracing::error!("Error deleting config: {}", e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store() -> (TempDir, ConfigStore) {
        let dir = TempDir::new().unwrap();
        let store = ConfigStore::at(dir.path().join("omni"));
        (dir, store)
    }

    #[test]
    fn test_read_initializes_missing_file() {
        let (_dir, store) = store();
        assert!(!store.exists());

        let config = store.read().unwrap();
        assert!(store.exists());
        assert_eq!(config, default_config());
    }

    #[test]
    fn test_read_reports_parse_errors() {
        let (_dir, store) = store();
        fs::create_dir_all(store.dir()).unwrap();
        fs::write(store.path(), "{ not json").unwrap();

        let err = store.read().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<OmniError>(),
            Some(OmniError::ConfigParse { .. })
        ));
    }

    #[test]
    fn test_set_default_model_rederives_provider() {
        let (_dir, store) = store();
        store.set_default_model("mistral-large").unwrap();

        let config = store.read().unwrap();
        assert_eq!(config.default_model, "mistral-large");
        assert_eq!(config.default_provider, "mistral");
    }

    #[test]
    fn test_set_default_model_unknown_keeps_provider() {
        let (_dir, store) = store();
        store.set_default_model("claude-v3-opus").unwrap();
        store.set_default_model("made-up-model").unwrap();

        let config = store.read().unwrap();
        assert_eq!(config.default_model, "made-up-model");
        assert_eq!(config.default_provider, "anthropic");
    }

    #[test]
    fn test_api_key_creates_provider_entry() {
        let (_dir, store) = store();
        store.update_provider_api_key("groq", "gsk-123").unwrap();

        let config = store.read().unwrap();
        assert_eq!(config.providers["groq"].api_key(), Some("gsk-123"));
        assert_eq!(config.providers.keys().last().map(String::as_str), Some("groq"));
    }

    #[test]
    fn test_update_model_system_prompt() {
        let (_dir, store) = store();
        store.update_model_system_prompt("mistral-small", "Be brief.").unwrap();
        assert_eq!(store.system_prompt("mistral-small").unwrap(), "Be brief.");

        let err = store.update_model_system_prompt("nope", "x").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<OmniError>(),
            Some(OmniError::UnknownModel(_))
        ));
    }

    #[test]
    fn test_update_provider_default_prompt() {
        let (_dir, store) = store();
        store
            .update_provider_default_system_prompt("anthropic", "Answer in French.")
            .unwrap();
        assert_eq!(store.system_prompt("claude-v3-haiku").unwrap(), "Answer in French.");
        // Per-model prompt still wins
        assert_eq!(
            store.system_prompt("claude-v3-opus").unwrap(),
            "You are Claude Opus, Anthropic's most capable model."
        );

        assert!(store.update_provider_default_system_prompt("nobody", "x").is_err());
    }

    #[test]
    fn test_initialization_state_roundtrip() {
        let (_dir, store) = store();
        assert_eq!(store.current_initialization_step().unwrap(), "welcome");
        assert_eq!(store.selected_providers().unwrap(), vec!["openai".to_string()]);

        let selected = vec!["anthropic".to_string(), "mistral".to_string()];
        store
            .update_initialization_state("model_selection", false, Some(selected.as_slice()))
            .unwrap();
        store.update_initialization_state("completion", true, None).unwrap();

        assert_eq!(store.current_initialization_step().unwrap(), "completion");
        assert!(store.is_initialization_completed().unwrap());
        assert_eq!(store.selected_providers().unwrap(), selected);
        assert!(store.is_configured());
    }

    #[test]
    fn test_reset_keeps_api_keys() {
        let (_dir, store) = store();
        store.update_provider_api_key("openai", "sk-keep").unwrap();
        store.update_initialization_state("completion", true, None).unwrap();

        store.reset_initialization_state().unwrap();

        let config = store.read().unwrap();
        assert_eq!(config.providers["openai"].api_key(), Some("sk-keep"));
        assert_eq!(config.initialization, Some(InitializationState::default()));
        assert!(!store.is_configured());
    }

    #[test]
    fn test_delete_config_removes_directory() {
        let (_dir, store) = store();
        store.init().unwrap();

        assert!(store.delete_config(true));
        assert!(!store.exists());
        assert!(!store.dir().exists());
    }

    #[test]
    fn test_delete_config_fails_on_non_empty_directory() {
        let (_dir, store) = store();
        store.init().unwrap();
        fs::write(store.dir().join("notes.txt"), "keep me").unwrap();

        assert!(!store.delete_config(true));
        assert!(!store.exists());
        assert!(store.dir().exists());
    }

    #[test]
    fn test_write_is_idempotent() {
        let (_dir, store) = store();
        store.update_provider_api_key("openai", "sk-test").unwrap();
        let before = fs::read_to_string(store.path()).unwrap();

        let config = store.read().unwrap();
        store.write(&config).unwrap();

        assert_eq!(fs::read_to_string(store.path()).unwrap(), before);
    }
}
