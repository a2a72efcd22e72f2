// Wizard step state machines
//
// Each step turns a key press into a `StepAction`. Steps never navigate
// themselves; the hosting flow applies the action to its `Wizard`.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use indexmap::IndexMap;
use std::time::Duration;

use crate::config::{models, ConfigStore, ModelInfo};

/// How long confirmation messages stay up before the flow moves on
pub const MESSAGE_DELAY: Duration = Duration::from_millis(1500);

/// What the flow should do after a key press
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepAction {
    None,
    Next,
    GoTo(String),
    Complete,
    Cancel,
    /// Show the current message, then clear it and apply `then`
    Deferred {
        after: Duration,
        then: Box<StepAction>,
    },
}

impl StepAction {
    pub fn deferred(then: StepAction) -> Self {
        StepAction::Deferred {
            after: MESSAGE_DELAY,
            then: Box::new(then),
        }
    }

    /// `GoTo(id)` when a target is configured, otherwise `Next`
    fn go_to_or_next(target: &Option<String>) -> Self {
        match target {
            Some(id) => StepAction::GoTo(id.clone()),
            None => StepAction::Next,
        }
    }
}

pub(crate) fn is_ctrl_c(key: &KeyEvent) -> bool {
    key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c')
}

/// "openai" -> "Openai"
pub fn display_name(provider: &str) -> String {
    let mut chars = provider.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Intro screen; Enter continues
#[derive(Debug, Clone)]
pub struct WelcomeStep {
    pub title: String,
    pub message: String,
    pub next_step: Option<String>,
}

impl WelcomeStep {
    pub fn new(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            next_step: None,
        }
    }

    pub fn with_next(mut self, id: impl Into<String>) -> Self {
        self.next_step = Some(id.into());
        self
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> StepAction {
        match key.code {
            KeyCode::Enter => StepAction::go_to_or_next(&self.next_step),
            _ => StepAction::None,
        }
    }
}

/// Two-option prompt; defaults to the cancel choice
#[derive(Debug, Clone)]
pub struct ConfirmationStep {
    pub title: String,
    pub message: String,
    pub confirm_label: String,
    pub cancel_label: String,
    pub confirm_step: Option<String>,
    pub cancel_step: Option<String>,
    pub next_step: Option<String>,
    /// Render the confirm option in red
    pub danger: bool,
    pub confirm_selected: bool,
    decision: Option<bool>,
}

impl ConfirmationStep {
    pub fn new(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            confirm_label: "Yes".to_string(),
            cancel_label: "No".to_string(),
            confirm_step: None,
            cancel_step: None,
            next_step: None,
            danger: false,
            confirm_selected: false,
            decision: None,
        }
    }

    pub fn with_labels(mut self, confirm: impl Into<String>, cancel: impl Into<String>) -> Self {
        self.confirm_label = confirm.into();
        self.cancel_label = cancel.into();
        self
    }

    pub fn with_next(mut self, id: impl Into<String>) -> Self {
        self.next_step = Some(id.into());
        self
    }

    pub fn with_cancel_step(mut self, id: impl Into<String>) -> Self {
        self.cancel_step = Some(id.into());
        self
    }

    pub fn danger(mut self) -> Self {
        self.danger = true;
        self
    }

    /// The choice made by the last Enter, if not yet consumed
    pub fn take_decision(&mut self) -> Option<bool> {
        self.decision.take()
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> StepAction {
        match key.code {
            KeyCode::Left | KeyCode::Right => {
                self.confirm_selected = !self.confirm_selected;
                StepAction::None
            }
            KeyCode::Enter => {
                self.decision = Some(self.confirm_selected);
                let target = if self.confirm_selected {
                    self.confirm_step.as_ref().or(self.next_step.as_ref())
                } else {
                    self.cancel_step.as_ref().or(self.next_step.as_ref())
                };
                match target {
                    Some(id) => StepAction::GoTo(id.clone()),
                    None => StepAction::Complete,
                }
            }
            _ => StepAction::None,
        }
    }

    fn reset(&mut self) {
        self.confirm_selected = false;
        self.decision = None;
    }
}

/// One row of the provider checklist
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderChoice {
    pub id: String,
    pub name: String,
    pub enabled: bool,
}

/// Checklist of providers to configure
#[derive(Debug, Clone, Default)]
pub struct ProviderSelectionStep {
    pub providers: Vec<ProviderChoice>,
    pub cursor: usize,
    pub message: Option<String>,
    pub error: Option<String>,
    pub next_step: Option<String>,
    submitted: Option<Vec<String>>,
}

impl ProviderSelectionStep {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the checklist from the stored enabled flags
    pub fn load(&mut self, store: &ConfigStore) {
        match store.read() {
            Ok(config) => {
                self.providers = config
                    .providers
                    .iter()
                    .map(|(id, settings)| ProviderChoice {
                        id: id.clone(),
                        name: display_name(id),
                        enabled: settings.is_enabled(),
                    })
                    .collect();
            }
            Err(e) => {
                tracing::error!("Failed to load providers: {:#}", e);
                self.error = Some(format!("Failed to load configuration: {:#}", e));
            }
        }
        self.cursor = 0;
        self.message = None;
        self.submitted = None;
    }

    /// Provider ids chosen by the last successful submit
    pub fn take_selection(&mut self) -> Option<Vec<String>> {
        self.submitted.take()
    }

    pub fn handle_key(&mut self, key: KeyEvent, store: &ConfigStore) -> StepAction {
        if is_ctrl_c(&key) {
            return StepAction::Cancel;
        }

        match key.code {
            KeyCode::Up => {
                self.cursor = self.cursor.saturating_sub(1);
                self.error = None;
                StepAction::None
            }
            KeyCode::Down => {
                if self.cursor + 1 < self.providers.len() {
                    self.cursor += 1;
                }
                self.error = None;
                StepAction::None
            }
            KeyCode::Char(' ') => {
                if let Some(choice) = self.providers.get_mut(self.cursor) {
                    choice.enabled = !choice.enabled;
                }
                self.error = None;
                StepAction::None
            }
            KeyCode::Enter => self.submit(store),
            KeyCode::Esc => StepAction::Cancel,
            _ => StepAction::None,
        }
    }

    fn submit(&mut self, store: &ConfigStore) -> StepAction {
        let selected: Vec<String> = self
            .providers
            .iter()
            .filter(|p| p.enabled)
            .map(|p| p.id.clone())
            .collect();

        if selected.is_empty() {
            self.error = Some("Please select at least one provider before continuing.".to_string());
            return StepAction::None;
        }

        let flags: IndexMap<String, bool> = self
            .providers
            .iter()
            .map(|p| (p.id.clone(), p.enabled))
            .collect();

        if let Err(e) = store.set_provider_enabled_flags(&flags) {
            tracing::error!("Failed to save provider selection: {:#}", e);
            self.error = Some(format!("Failed to save provider preferences: {:#}", e));
            return StepAction::None;
        }

        self.submitted = Some(selected);
        self.message = Some("Provider preferences saved!".to_string());
        StepAction::deferred(StepAction::go_to_or_next(&self.next_step))
    }
}

/// Masked API key entry for one provider
#[derive(Debug, Clone)]
pub struct ApiKeyStep {
    pub provider: String,
    pub input: String,
    pub message: Option<String>,
    pub next_step: Option<String>,
    pub skip_step: Option<String>,
}

impl ApiKeyStep {
    pub fn new(provider: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            input: String::new(),
            message: None,
            next_step: None,
            skip_step: None,
        }
    }

    pub fn title(&self) -> String {
        format!("{} API Key", display_name(&self.provider))
    }

    /// What the input box shows
    pub fn masked(&self) -> String {
        "*".repeat(self.input.chars().count())
    }

    pub fn handle_key(&mut self, key: KeyEvent, store: &ConfigStore) -> StepAction {
        if is_ctrl_c(&key) || key.code == KeyCode::Esc {
            return StepAction::go_to_or_next(&self.skip_step);
        }

        match key.code {
            KeyCode::Enter => self.submit(store),
            KeyCode::Backspace | KeyCode::Delete => {
                self.input.pop();
                StepAction::None
            }
            KeyCode::Char(c)
                if !key
                    .modifiers
                    .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
            {
                self.input.push(c);
                StepAction::None
            }
            _ => StepAction::None,
        }
    }

    fn submit(&mut self, store: &ConfigStore) -> StepAction {
        let key = self.input.trim();
        if key.is_empty() {
            self.message = Some("API key cannot be empty!".to_string());
            return StepAction::deferred(StepAction::None);
        }

        if let Err(e) = store.update_provider_api_key(&self.provider, key) {
            tracing::error!("Failed to save API key for {}: {:#}", self.provider, e);
            self.message = Some(format!("Failed to save API key: {:#}", e));
            return StepAction::None;
        }

        self.message = Some(format!("API key for {} saved!", self.provider));
        StepAction::deferred(StepAction::go_to_or_next(&self.next_step))
    }
}

/// Pick the default model among enabled providers
#[derive(Debug, Clone, Default)]
pub struct ModelSelectionStep {
    pub models: Vec<ModelInfo>,
    pub cursor: usize,
    pub message: Option<String>,
    pub next_step: Option<String>,
}

impl ModelSelectionStep {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_next(mut self, id: impl Into<String>) -> Self {
        self.next_step = Some(id.into());
        self
    }

    pub fn load(&mut self, store: &ConfigStore) {
        self.models = match store.read() {
            Ok(config) => models::enabled_models(&config),
            Err(e) => {
                tracing::error!("Failed to load models: {:#}", e);
                vec![ModelInfo::new("openai", "gpt-4o")]
            }
        };
        self.cursor = 0;
        self.message = None;
    }

    pub fn handle_key(&mut self, key: KeyEvent, store: &ConfigStore) -> StepAction {
        match key.code {
            KeyCode::Up => {
                self.cursor = self.cursor.saturating_sub(1);
                StepAction::None
            }
            KeyCode::Down => {
                if self.cursor + 1 < self.models.len() {
                    self.cursor += 1;
                }
                StepAction::None
            }
            KeyCode::Enter => {
                let Some(selected) = self.models.get(self.cursor) else {
                    return StepAction::None;
                };
                let model = selected.model.clone();
                if let Err(e) = store.set_default_model(&model) {
                    tracing::error!("Failed to set default model: {:#}", e);
                    self.message = Some(format!("Failed to set default model: {:#}", e));
                    return StepAction::None;
                }
                self.message = Some(format!("Default model set to {}!", model));
                StepAction::deferred(StepAction::go_to_or_next(&self.next_step))
            }
            _ => StepAction::None,
        }
    }
}

/// Final screen
#[derive(Debug, Clone)]
pub struct CompletionStep {
    pub title: String,
    pub message: String,
    pub next_step: Option<String>,
    pub show_complete_button: bool,
}

impl CompletionStep {
    pub fn new(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            next_step: None,
            show_complete_button: true,
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> StepAction {
        if key.code != KeyCode::Enter {
            return StepAction::None;
        }
        match &self.next_step {
            Some(id) => StepAction::GoTo(id.clone()),
            None if self.show_complete_button => StepAction::Complete,
            None => StepAction::Next,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopOption {
    Continue,
    LoopBack,
    Complete,
}

/// Continue, loop back or finish
#[derive(Debug, Clone)]
pub struct LoopingStep {
    pub title: String,
    pub message: String,
    pub next_step: Option<String>,
    pub loop_back_step: Option<String>,
    pub complete_step: Option<String>,
    pub selected: LoopOption,
}

impl LoopingStep {
    pub fn new(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            next_step: None,
            loop_back_step: None,
            complete_step: None,
            selected: LoopOption::Continue,
        }
    }

    /// Options shown, in cycle order
    pub fn options(&self) -> Vec<(LoopOption, &'static str)> {
        let mut options = vec![(LoopOption::Continue, "Continue to next step")];
        if self.loop_back_step.is_some() {
            options.push((LoopOption::LoopBack, "Loop back to previous step"));
        }
        if self.complete_step.is_some() {
            options.push((LoopOption::Complete, "Complete the wizard"));
        }
        options
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> StepAction {
        match key.code {
            KeyCode::Up | KeyCode::Down => {
                let options: Vec<LoopOption> =
                    self.options().into_iter().map(|(option, _)| option).collect();
                let at = options
                    .iter()
                    .position(|option| *option == self.selected)
                    .unwrap_or(0);
                self.selected = options[(at + 1) % options.len()];
                StepAction::None
            }
            KeyCode::Enter => match self.selected {
                LoopOption::Continue => StepAction::go_to_or_next(&self.next_step),
                LoopOption::LoopBack => self
                    .loop_back_step
                    .clone()
                    .map(StepAction::GoTo)
                    .unwrap_or(StepAction::None),
                LoopOption::Complete => self
                    .complete_step
                    .clone()
                    .map(StepAction::GoTo)
                    .unwrap_or(StepAction::None),
            },
            _ => StepAction::None,
        }
    }
}

/// Every kind of step a flow can hold
#[derive(Debug, Clone)]
pub enum StepContent {
    Welcome(WelcomeStep),
    Confirmation(ConfirmationStep),
    ProviderSelection(ProviderSelectionStep),
    ApiKey(ApiKeyStep),
    ModelSelection(ModelSelectionStep),
    Completion(CompletionStep),
    Looping(LoopingStep),
}

impl StepContent {
    pub fn handle_key(&mut self, key: KeyEvent, store: &ConfigStore) -> StepAction {
        match self {
            StepContent::Welcome(step) => step.handle_key(key),
            StepContent::Confirmation(step) => step.handle_key(key),
            StepContent::ProviderSelection(step) => step.handle_key(key, store),
            StepContent::ApiKey(step) => step.handle_key(key, store),
            StepContent::ModelSelection(step) => step.handle_key(key, store),
            StepContent::Completion(step) => step.handle_key(key),
            StepContent::Looping(step) => step.handle_key(key),
        }
    }

    /// Reset per-visit state when the step becomes current
    pub fn enter(&mut self, store: &ConfigStore) {
        match self {
            StepContent::Confirmation(step) => step.reset(),
            StepContent::ProviderSelection(step) => step.load(store),
            StepContent::ApiKey(step) => {
                step.input.clear();
                step.message = None;
            }
            StepContent::ModelSelection(step) => step.load(store),
            StepContent::Looping(step) => step.selected = LoopOption::Continue,
            StepContent::Welcome(_) | StepContent::Completion(_) => {}
        }
    }

    /// Drop a transient status message
    pub fn clear_message(&mut self) {
        match self {
            StepContent::ProviderSelection(step) => step.message = None,
            StepContent::ApiKey(step) => step.message = None,
            StepContent::ModelSelection(step) => step.message = None,
            _ => {}
        }
    }

    pub fn title(&self) -> String {
        match self {
            StepContent::Welcome(step) => step.title.clone(),
            StepContent::Confirmation(step) => step.title.clone(),
            StepContent::ProviderSelection(_) => "Provider Selection".to_string(),
            StepContent::ApiKey(step) => step.title(),
            StepContent::ModelSelection(_) => "Default Model Selection".to_string(),
            StepContent::Completion(step) => step.title.clone(),
            StepContent::Looping(step) => step.title.clone(),
        }
    }
}
