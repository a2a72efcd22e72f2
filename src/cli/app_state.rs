// Shared application state
//
// Loaded once at startup and passed by reference to whatever needs the
// configuration. Accessors fail with `OmniError::NotInitialized` until
// `load` has run against an existing config file.

use anyhow::Result;

use crate::config::{models, ConfigStore, OmniConfig};
use crate::errors::OmniError;

pub struct AppState {
    store: ConfigStore,
    config: Option<OmniConfig>,
}

impl AppState {
    pub fn new(store: ConfigStore) -> Self {
        Self {
            store,
            config: None,
        }
    }

    pub fn store(&self) -> &ConfigStore {
        &self.store
    }

    /// Read the config if the file exists; a missing file is not an error
    pub fn load(&mut self) -> Result<()> {
        self.config = if self.store.exists() {
            Some(self.store.read()?)
        } else {
            None
        };
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.config.is_some()
    }

    /// Loaded and setup was completed
    pub fn is_configured(&self) -> bool {
        self.config
            .as_ref()
            .and_then(|c| c.initialization.as_ref())
            .map(|state| state.completed)
            .unwrap_or(false)
    }

    pub fn config(&self) -> Result<&OmniConfig, OmniError> {
        self.config.as_ref().ok_or(OmniError::NotInitialized)
    }

    /// Re-read after something else wrote the file
    pub fn refresh_config(&mut self) -> Result<()> {
        if self.config.is_none() {
            return Err(OmniError::NotInitialized.into());
        }
        self.config = Some(self.store.read()?);
        Ok(())
    }
}

/// Model the query loop is currently talking to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveModel {
    pub model: String,
    pub provider: String,
    pub system_prompt: String,
}

impl ActiveModel {
    /// The configured default model and its owner
    ///
    /// A model no provider lists keeps `defaultProvider` for display.
    pub fn from_config(config: &OmniConfig) -> Self {
        Self::resolve(config, &config.default_model, None)
    }

    pub fn resolve(config: &OmniConfig, model: &str, provider: Option<&str>) -> Self {
        let provider = provider
            .or_else(|| models::provider_for_model(config, model))
            .unwrap_or(config.default_provider.as_str())
            .to_string();

        Self {
            model: model.to_string(),
            provider,
            system_prompt: models::system_prompt(config, model),
        }
    }

    /// "provider:model"
    pub fn label(&self) -> String {
        format!("{}:{}", self.provider, self.model)
    }
}
