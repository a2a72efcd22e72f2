// Configuration module
// Public interface for the config.json store and model resolution

pub mod models;
mod settings;
mod store;

pub use models::{ModelInfo, GENERIC_SYSTEM_PROMPT};
pub use settings::{default_config, InitializationState, OmniConfig, ProviderConfig, WELCOME_STEP};
pub use store::{ConfigStore, CONFIG_DIR_ENV};
