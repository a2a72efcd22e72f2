// Interactive configuration flows
//
// `omni config`, `omni config:loop` and `omni config:rm` are all a
// `Wizard<StepContent>` driven by `WizardFlow`. Flow-specific behaviour
// lives in a `FlowHooks` implementation that sees every action before it
// is applied.

use anyhow::Result;
use crossterm::event::{self, Event, KeyEvent, KeyEventKind};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Margin},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};
use std::cell::RefCell;
use std::rc::Rc;
use std::time::{Duration, Instant};

use super::steps::{
    display_name, is_ctrl_c, ApiKeyStep, CompletionStep, ConfirmationStep,
    LoopingStep, ModelSelectionStep, ProviderSelectionStep, StepAction, StepContent, WelcomeStep,
};
use super::terminal::{centered_rect, OmniTerminal};
use super::wizard::{Wizard, WizardStep};
use crate::config::{ConfigStore, WELCOME_STEP};

// Step ids
pub const RESET_CONFIRM: &str = "reset_confirm";
pub const PROVIDER_SELECTION: &str = "provider_selection";
pub const MODEL_SELECTION: &str = "model_selection";
pub const LOOPING_DECISION: &str = "looping_decision";
pub const CONFIRM: &str = "confirm";
pub const COMPLETION: &str = "completion";

/// Providers that get an API key step, in step order
const KEYED_PROVIDERS: [&str; 3] = ["openai", "anthropic", "mistral"];

const IDLE_POLL: Duration = Duration::from_millis(100);

pub fn api_key_step_id(provider: &str) -> String {
    format!("{}_api_key", provider)
}

/// How a flow ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowOutcome {
    Completed,
    Cancelled,
    /// Ctrl-C on a step with no cancel of its own; nothing is cleaned up
    Interrupted,
}

/// Flow-specific reaction to step actions
pub trait FlowHooks {
    /// Called after the current step handled a key; returns the action to apply
    fn intercept(
        &mut self,
        wizard: &mut Wizard<StepContent>,
        store: &ConfigStore,
        action: StepAction,
    ) -> StepAction;
}

struct PendingAction {
    due: Instant,
    then: StepAction,
}

/// Drives a wizard from key events and deferred timers
pub struct WizardFlow<H> {
    banner: &'static str,
    wizard: Wizard<StepContent>,
    store: ConfigStore,
    hooks: H,
    pending: Option<PendingAction>,
    outcome: Option<FlowOutcome>,
}

impl<H: FlowHooks> WizardFlow<H> {
    fn new(banner: &'static str, wizard: Wizard<StepContent>, store: ConfigStore, hooks: H) -> Self {
        let mut flow = Self {
            banner,
            wizard,
            store,
            hooks,
            pending: None,
            outcome: None,
        };
        flow.wizard.start();
        flow.enter_current();
        flow
    }

    pub fn current_step_id(&self) -> &str {
        self.wizard.current_step_id()
    }

    pub fn current_content(&self) -> Option<&StepContent> {
        self.wizard.current_step().map(|step| &step.content)
    }

    pub fn wizard(&self) -> &Wizard<StepContent> {
        &self.wizard
    }

    pub fn hooks(&self) -> &H {
        &self.hooks
    }

    pub fn outcome(&self) -> Option<FlowOutcome> {
        self.outcome
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Feed one key press to the current step
    pub fn handle_key(&mut self, key: KeyEvent) {
        if self.outcome.is_some() {
            return;
        }
        // Input is held while a confirmation message is counting down
        if matches!(&self.pending, Some(p) if p.then != StepAction::None) {
            return;
        }

        let before = self.wizard.current_step_id().to_string();
        let store = &self.store;
        let Some(step) = self.wizard.current_step_mut() else {
            return;
        };

        let action = step.content.handle_key(key, store);
        if action == StepAction::None && is_ctrl_c(&key) {
            tracing::info!("Setup interrupted at {}", before);
            self.pending = None;
            self.outcome = Some(FlowOutcome::Interrupted);
            return;
        }

        let action = self.hooks.intercept(&mut self.wizard, &self.store, action);
        self.apply(action);
        self.enter_if_changed(&before);
    }

    /// Fire the deferred action if its time has come
    pub fn tick(&mut self, now: Instant) {
        if matches!(&self.pending, Some(p) if p.due <= now) {
            self.fire_pending();
        }
    }

    /// Fire the deferred action immediately
    pub fn fire_pending(&mut self) {
        let Some(pending) = self.pending.take() else {
            return;
        };

        let before = self.wizard.current_step_id().to_string();
        if let Some(step) = self.wizard.current_step_mut() {
            step.content.clear_message();
        }
        self.apply(pending.then);
        self.enter_if_changed(&before);
    }

    /// Event loop on an already prepared terminal
    pub fn run(&mut self, terminal: &mut OmniTerminal) -> Result<FlowOutcome> {
        loop {
            terminal.draw(|f| self.render(f))?;

            if let Some(outcome) = self.outcome {
                return Ok(outcome);
            }

            let timeout = self
                .pending
                .as_ref()
                .map(|p| p.due.saturating_duration_since(Instant::now()).min(IDLE_POLL))
                .unwrap_or(IDLE_POLL);

            if event::poll(timeout)? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key(key);
                    }
                }
            }

            self.tick(Instant::now());
        }
    }

    fn apply(&mut self, action: StepAction) {
        match action {
            StepAction::None => {}
            StepAction::Next => {
                if let Err(e) = self.wizard.go_to_next_step() {
                    tracing::debug!("Next ignored: {}", e);
                }
            }
            StepAction::GoTo(id) => {
                if let Err(e) = self.wizard.go_to_step(&id) {
                    tracing::debug!("Navigation ignored: {}", e);
                }
            }
            StepAction::Complete => {
                self.pending = None;
                self.wizard.complete_wizard();
                self.outcome = Some(FlowOutcome::Completed);
            }
            StepAction::Cancel => {
                self.pending = None;
                self.wizard.cancel_wizard();
                self.outcome = Some(FlowOutcome::Cancelled);
            }
            StepAction::Deferred { after, then } => {
                self.pending = Some(PendingAction {
                    due: Instant::now() + after,
                    then: *then,
                });
            }
        }
    }

    fn enter_if_changed(&mut self, before: &str) {
        if self.wizard.current_step_id() != before {
            self.enter_current();
        }
    }

    fn enter_current(&mut self) {
        let store = &self.store;
        if let Some(step) = self.wizard.current_step_mut() {
            step.content.enter(store);
        }
    }

    fn render(&self, f: &mut Frame) {
        if let Some(content) = self.current_content() {
            render_step(f, self.banner, content);
        }
    }
}

/// Rebuild a step list while keeping the live state of the current step
fn replace_steps(wizard: &mut Wizard<StepContent>, mut steps: Vec<WizardStep<StepContent>>) {
    if let Some(current) = wizard.current_step() {
        if let Some(slot) = steps.iter_mut().find(|s| s.id == current.id) {
            slot.content = current.content.clone();
        }
    }
    if let Err(e) = wizard.set_steps(steps) {
        tracing::error!("Failed to rebuild wizard steps: {}", e);
    }
}

fn content_mut<'a>(wizard: &'a mut Wizard<StepContent>) -> Option<&'a mut StepContent> {
    wizard.current_step_mut().map(|step| &mut step.content)
}

// ---------------------------------------------------------------------------
// Setup flow
// ---------------------------------------------------------------------------

const SETUP_TITLE: &str = "Welcome to Omni CLI!";
const RESUME_MESSAGE: &str = "It looks like you were in the middle of setting up. You can continue where you left off or reset the setup process.";
const FIRST_RUN_MESSAGE: &str =
    "This is the first-time setup wizard. We'll help you configure your API keys and default model.";

/// First-run (or resumed) configuration
pub struct SetupHooks {
    selected: Rc<RefCell<Vec<String>>>,
    resumable: bool,
    saved_step: String,
}

impl SetupHooks {
    pub fn selected_providers(&self) -> Vec<String> {
        self.selected.borrow().clone()
    }

    pub fn is_resumable(&self) -> bool {
        self.resumable
    }
}

pub type SetupFlow = WizardFlow<SetupHooks>;

fn setup_steps(selected: &[String], resumable: bool) -> Vec<WizardStep<StepContent>> {
    let welcome = if resumable {
        WelcomeStep::new(SETUP_TITLE, RESUME_MESSAGE).with_next(RESET_CONFIRM)
    } else {
        WelcomeStep::new(SETUP_TITLE, FIRST_RUN_MESSAGE).with_next(PROVIDER_SELECTION)
    };

    let mut steps = vec![WizardStep::new(WELCOME_STEP, StepContent::Welcome(welcome))];

    if resumable {
        let confirm = ConfirmationStep::new(
            "Reset Setup",
            "Would you like to reset the setup process and start over?",
        )
        .with_labels("Yes, start over", "No, continue where I left off");
        steps.push(WizardStep::new(RESET_CONFIRM, StepContent::Confirmation(confirm)));
    }

    steps.push(WizardStep::new(
        PROVIDER_SELECTION,
        StepContent::ProviderSelection(ProviderSelectionStep::new()),
    ));

    for provider in KEYED_PROVIDERS {
        if selected.iter().any(|p| p == provider) {
            steps.push(WizardStep::new(
                api_key_step_id(provider),
                StepContent::ApiKey(ApiKeyStep::new(provider)),
            ));
        }
    }

    steps.push(WizardStep::new(
        MODEL_SELECTION,
        StepContent::ModelSelection(ModelSelectionStep::new().with_next(COMPLETION)),
    ));
    steps.push(WizardStep::new(
        COMPLETION,
        StepContent::Completion(CompletionStep::new(
            "Setup Complete!",
            "Your Omni CLI is now configured and ready to use.",
        )),
    ));

    steps
}

/// Build the `omni config` flow
///
/// A config whose saved step is past `welcome` is resumable: the welcome
/// screen then leads to a reset prompt instead of provider selection.
pub fn setup_flow(store: ConfigStore) -> Result<SetupFlow> {
    let existed = store.exists();
    let saved_step = if existed {
        store.current_initialization_step()?
    } else {
        WELCOME_STEP.to_string()
    };
    let resumable = existed && saved_step != WELCOME_STEP;
    let selected = Rc::new(RefCell::new(store.selected_providers()?));

    tracing::info!(
        "Starting setup flow (resumable: {}, saved step: {})",
        resumable,
        saved_step
    );

    let observer_store = store.clone();
    let observed = selected.clone();
    let cancel_store = store.clone();

    let wizard = Wizard::new(setup_steps(&selected.borrow(), resumable), None)?
        .on_step_change(move |id| {
            let providers = observed.borrow().clone();
            if let Err(e) = observer_store.update_initialization_state(
                id,
                id == COMPLETION,
                Some(providers.as_slice()),
            ) {
                tracing::error!("Failed to persist setup progress: {:#}", e);
            }
        })
        .on_cancel(move || {
            cancel_store.delete_config(true);
        });

    let hooks = SetupHooks {
        selected,
        resumable,
        saved_step,
    };

    Ok(WizardFlow::new("Omni Setup", wizard, store, hooks))
}

impl FlowHooks for SetupHooks {
    fn intercept(
        &mut self,
        wizard: &mut Wizard<StepContent>,
        store: &ConfigStore,
        action: StepAction,
    ) -> StepAction {
        match content_mut(wizard) {
            Some(StepContent::ProviderSelection(step)) => {
                if let Some(providers) = step.take_selection() {
                    tracing::info!("Selected providers: {}", providers.join(", "));
                    *self.selected.borrow_mut() = providers.clone();
                    if let Err(e) = store.update_initialization_state(
                        PROVIDER_SELECTION,
                        false,
                        Some(providers.as_slice()),
                    ) {
                        tracing::error!("Failed to persist provider selection: {:#}", e);
                    }
                    replace_steps(wizard, setup_steps(&providers, self.resumable));
                }
                action
            }
            Some(StepContent::Confirmation(step)) => match step.take_decision() {
                Some(true) => {
                    if let Err(e) = store.reset_initialization_state() {
                        tracing::error!("Failed to reset setup progress: {:#}", e);
                    }
                    self.resumable = false;
                    let steps = setup_steps(&self.selected.borrow(), false);
                    let _ = wizard.go_to_step(PROVIDER_SELECTION);
                    replace_steps(wizard, steps);
                    StepAction::None
                }
                Some(false) => {
                    let resume_at = match self.saved_step.as_str() {
                        WELCOME_STEP | RESET_CONFIRM => PROVIDER_SELECTION,
                        step if wizard.has_step(step) => step,
                        _ => PROVIDER_SELECTION,
                    };
                    tracing::info!("Resuming setup at {}", resume_at);
                    StepAction::GoTo(resume_at.to_string())
                }
                None => action,
            },
            _ => action,
        }
    }
}

// ---------------------------------------------------------------------------
// Looping flow
// ---------------------------------------------------------------------------

/// The looping example needs no extra behaviour
pub struct LoopingHooks;

impl FlowHooks for LoopingHooks {
    fn intercept(
        &mut self,
        _wizard: &mut Wizard<StepContent>,
        _store: &ConfigStore,
        action: StepAction,
    ) -> StepAction {
        action
    }
}

pub type LoopingFlow = WizardFlow<LoopingHooks>;

/// Build the `omni config:loop` flow
pub fn looping_flow(store: ConfigStore) -> Result<LoopingFlow> {
    let mut steps = vec![WizardStep::new(
        WELCOME_STEP,
        StepContent::Welcome(WelcomeStep::new(
            "Welcome to Looping Wizard Example",
            "This example demonstrates how to create a wizard that can loop back to previous steps.",
        )),
    )];

    for provider in KEYED_PROVIDERS {
        steps.push(WizardStep::new(
            api_key_step_id(provider),
            StepContent::ApiKey(ApiKeyStep::new(provider)),
        ));
    }

    steps.push(WizardStep::new(
        MODEL_SELECTION,
        StepContent::ModelSelection(ModelSelectionStep::new()),
    ));

    let mut decision = LoopingStep::new(
        "What would you like to do next?",
        "You can continue to complete the wizard, or loop back to configure more settings.",
    );
    decision.next_step = Some(COMPLETION.to_string());
    decision.loop_back_step = Some(api_key_step_id("openai"));
    decision.complete_step = Some(COMPLETION.to_string());
    steps.push(WizardStep::new(LOOPING_DECISION, StepContent::Looping(decision)));

    steps.push(WizardStep::new(
        COMPLETION,
        StepContent::Completion(CompletionStep::new(
            "Setup Complete!",
            "Your configuration is now complete.",
        )),
    ));

    let wizard = Wizard::new(steps, None)?;
    Ok(WizardFlow::new("Omni Looping Setup", wizard, store, LoopingHooks))
}

// ---------------------------------------------------------------------------
// Remove flow
// ---------------------------------------------------------------------------

/// Result of the confirm step of `omni config:rm`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Removal {
    Removed,
    Kept,
    Failed(String),
}

#[derive(Default)]
pub struct RemoveHooks {
    removal: Option<Removal>,
}

impl RemoveHooks {
    pub fn removal(&self) -> Option<&Removal> {
        self.removal.as_ref()
    }
}

pub type RemoveFlow = WizardFlow<RemoveHooks>;

fn remove_config(store: &ConfigStore) -> Removal {
    if !store.exists() {
        return Removal::Failed("No configuration file found.".to_string());
    }
    if store.delete_config(true) {
        Removal::Removed
    } else {
        Removal::Failed("Failed to remove configuration.".to_string())
    }
}

fn removal_summary(removal: &Removal) -> (&'static str, String) {
    match removal {
        Removal::Removed => (
            "Configuration Removed",
            "Your configuration has been successfully removed.".to_string(),
        ),
        Removal::Kept => (
            "Operation Failed",
            "No changes were made to your configuration.".to_string(),
        ),
        Removal::Failed(error) => ("Operation Failed", format!("An error occurred: {}", error)),
    }
}

/// Build the `omni config:rm` flow
pub fn remove_flow(store: ConfigStore) -> Result<RemoveFlow> {
    let steps = vec![
        WizardStep::new(
            WELCOME_STEP,
            StepContent::Welcome(WelcomeStep::new(
                "Remove Configuration",
                "This will remove all your Omni CLI configuration, including API keys and default model settings.",
            )),
        ),
        WizardStep::new(
            CONFIRM,
            StepContent::Confirmation(
                ConfirmationStep::new(
                    "Confirm Removal",
                    "Are you sure you want to remove all configuration? This action cannot be undone.",
                )
                .with_labels("Yes, remove config", "No, keep config")
                .with_next(COMPLETION)
                .danger(),
            ),
        ),
        WizardStep::new(
            COMPLETION,
            StepContent::Completion(CompletionStep::new(
                "Operation Failed",
                "No changes were made to your configuration.",
            )),
        ),
    ];

    let wizard = Wizard::new(steps, None)?;
    Ok(WizardFlow::new(
        "Omni Configuration",
        wizard,
        store,
        RemoveHooks::default(),
    ))
}

impl FlowHooks for RemoveHooks {
    fn intercept(
        &mut self,
        wizard: &mut Wizard<StepContent>,
        store: &ConfigStore,
        action: StepAction,
    ) -> StepAction {
        let decision = match content_mut(wizard) {
            Some(StepContent::Confirmation(step)) => step.take_decision(),
            _ => None,
        };
        let Some(confirmed) = decision else {
            return action;
        };

        let removal = if confirmed {
            remove_config(store)
        } else {
            Removal::Kept
        };
        tracing::info!("Config removal result: {:?}", removal);

        let (title, message) = removal_summary(&removal);
        if let Some(WizardStep {
            content: StepContent::Completion(step),
            ..
        }) = wizard.step_mut(COMPLETION)
        {
            step.title = title.to_string();
            step.message = message;
        }
        self.removal = Some(removal);
        action
    }
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

fn render_step(f: &mut Frame, banner: &str, content: &StepContent) {
    let dialog_area = centered_rect(70, 70, f.area());

    let border = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(banner.to_string());
    f.render_widget(border, dialog_area);

    let inner = dialog_area.inner(Margin {
        horizontal: 2,
        vertical: 2,
    });

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title
            Constraint::Min(5),    // Body
            Constraint::Length(2), // Help
        ])
        .split(inner);

    let title = Paragraph::new(content.title())
        .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
        .alignment(Alignment::Center);
    f.render_widget(title, chunks[0]);

    let body = Paragraph::new(step_body(content)).wrap(Wrap { trim: false });
    f.render_widget(body, chunks[1]);

    let help = Paragraph::new(step_help(content))
        .style(Style::default().fg(Color::Gray))
        .alignment(Alignment::Center);
    f.render_widget(help, chunks[2]);
}

fn highlighted(selected: bool) -> Style {
    if selected {
        Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::Reset)
    }
}

fn status_line(message: &Option<String>) -> Option<Line<'static>> {
    message
        .as_ref()
        .map(|m| Line::from(Span::styled(m.clone(), Style::default().fg(Color::Cyan))))
}

fn step_body(content: &StepContent) -> Vec<Line<'static>> {
    let mut lines: Vec<Line<'static>> = Vec::new();

    match content {
        StepContent::Welcome(step) => {
            lines.push(Line::from(step.message.clone()));
        }
        StepContent::Confirmation(step) => {
            lines.push(Line::from(step.message.clone()));
            lines.push(Line::from(""));

            let confirm_style = if step.danger {
                Style::default().fg(Color::Red)
            } else {
                highlighted(step.confirm_selected)
            };
            let confirm_style = if step.confirm_selected {
                confirm_style.add_modifier(Modifier::BOLD | Modifier::REVERSED)
            } else {
                confirm_style
            };
            let cancel_style = if step.confirm_selected {
                highlighted(false)
            } else {
                highlighted(true).add_modifier(Modifier::REVERSED)
            };

            lines.push(Line::from(vec![
                Span::styled(format!(" {} ", step.confirm_label), confirm_style),
                Span::raw("    "),
                Span::styled(format!(" {} ", step.cancel_label), cancel_style),
            ]));
        }
        StepContent::ProviderSelection(step) => {
            lines.push(Line::from("Select which providers you want to configure:"));
            lines.push(Line::from(""));
            for (i, choice) in step.providers.iter().enumerate() {
                let cursor = if i == step.cursor { ">" } else { " " };
                let mark = if choice.enabled { "x" } else { " " };
                lines.push(Line::from(Span::styled(
                    format!("{} [{}] {}", cursor, mark, choice.name),
                    highlighted(i == step.cursor),
                )));
            }
            lines.push(Line::from(""));
            lines.extend(status_line(&step.message));
            if let Some(error) = &step.error {
                lines.push(Line::from(Span::styled(
                    error.clone(),
                    Style::default().fg(Color::Red),
                )));
            }
        }
        StepContent::ApiKey(step) => {
            lines.push(Line::from(format!(
                "Please enter your {} API key:",
                step.provider
            )));
            lines.push(Line::from(""));
            lines.push(Line::from(vec![
                Span::styled("> ", Style::default().fg(Color::Yellow)),
                Span::styled(format!("{}_", step.masked()), Style::default().fg(Color::Green)),
            ]));
            lines.push(Line::from(""));
            lines.extend(status_line(&step.message));
        }
        StepContent::ModelSelection(step) => {
            lines.push(Line::from("Select your default model:"));
            lines.push(Line::from(""));
            if step.models.is_empty() {
                lines.push(Line::from(Span::styled(
                    "No models available",
                    Style::default().fg(Color::Yellow),
                )));
            }
            for (i, info) in step.models.iter().enumerate() {
                let cursor = if i == step.cursor { "> " } else { "  " };
                lines.push(Line::from(Span::styled(
                    format!("{}{} ({})", cursor, info.model, info.provider),
                    highlighted(i == step.cursor),
                )));
            }
            lines.push(Line::from(""));
            lines.extend(status_line(&step.message));
        }
        StepContent::Completion(step) => {
            lines.push(Line::from(step.message.clone()));
            lines.push(Line::from(""));
            lines.push(Line::from("You can change these settings anytime by running:"));
            lines.push(Line::from(Span::styled(
                "omni config",
                Style::default().fg(Color::Yellow),
            )));
        }
        StepContent::Looping(step) => {
            lines.push(Line::from(step.message.clone()));
            lines.push(Line::from(""));
            for (option, label) in step.options() {
                let selected = option == step.selected;
                let cursor = if selected { "> " } else { "  " };
                lines.push(Line::from(Span::styled(
                    format!("{}{}", cursor, label),
                    highlighted(selected),
                )));
            }
        }
    }

    lines
}

fn step_help(content: &StepContent) -> String {
    match content {
        StepContent::Welcome(_) => "Press Enter to continue.".to_string(),
        StepContent::Confirmation(_) => "Use ←/→ to navigate and Enter to select.".to_string(),
        StepContent::ProviderSelection(_) => {
            "↑/↓ to navigate, Space to select, Enter to continue, and Esc to exit".to_string()
        }
        StepContent::ApiKey(step) => format!(
            "Press Enter to save or Esc to skip. ({} key)",
            display_name(&step.provider)
        ),
        StepContent::ModelSelection(_) | StepContent::Looping(_) => {
            "Use ↑/↓ to navigate and Enter to select.".to_string()
        }
        StepContent::Completion(step) if step.show_complete_button => {
            "Press Enter to continue.".to_string()
        }
        StepContent::Completion(_) => "Press Enter to proceed to the next step.".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyCode, KeyModifiers};
    use ratatui::{backend::TestBackend, Terminal};
    use tempfile::TempDir;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn store() -> (TempDir, ConfigStore) {
        let dir = TempDir::new().unwrap();
        let store = ConfigStore::at(dir.path().join("omni"));
        (dir, store)
    }

    fn ids<H: FlowHooks>(flow: &WizardFlow<H>) -> Vec<String> {
        flow.wizard().steps().iter().map(|s| s.id.clone()).collect()
    }

    fn screen_text<H: FlowHooks>(flow: &WizardFlow<H>) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 40)).unwrap();
        terminal.draw(|f| flow.render(f)).unwrap();
        let buffer = terminal.backend().buffer().clone();
        buffer.content().iter().map(|cell| cell.symbol()).collect()
    }

    #[test]
    fn test_first_run_steps() {
        let (_dir, store) = store();
        let flow = setup_flow(store.clone()).unwrap();

        assert!(!flow.hooks().is_resumable());
        assert_eq!(
            ids(&flow),
            vec![
                "welcome",
                "provider_selection",
                "openai_api_key",
                "model_selection",
                "completion"
            ]
        );
        assert_eq!(store.current_initialization_step().unwrap(), "welcome");
        assert!(screen_text(&flow).contains("Welcome to Omni CLI!"));
    }

    #[test]
    fn test_selection_rebuilds_key_steps() {
        let (_dir, store) = store();
        let mut flow = setup_flow(store.clone()).unwrap();

        flow.handle_key(key(KeyCode::Enter));
        assert_eq!(flow.current_step_id(), PROVIDER_SELECTION);

        // Enable mistral as well
        flow.handle_key(key(KeyCode::Down));
        flow.handle_key(key(KeyCode::Down));
        flow.handle_key(key(KeyCode::Char(' ')));
        flow.handle_key(key(KeyCode::Enter));

        assert!(flow.has_pending());
        assert!(screen_text(&flow).contains("Provider preferences saved!"));
        assert_eq!(
            ids(&flow),
            vec![
                "welcome",
                "provider_selection",
                "openai_api_key",
                "mistral_api_key",
                "model_selection",
                "completion"
            ]
        );
        assert_eq!(
            store.selected_providers().unwrap(),
            vec!["openai".to_string(), "mistral".to_string()]
        );

        flow.fire_pending();
        assert_eq!(flow.current_step_id(), "openai_api_key");
        assert_eq!(store.current_initialization_step().unwrap(), "openai_api_key");
    }

    #[test]
    fn test_cancel_deletes_config() {
        let (_dir, store) = store();
        let mut flow = setup_flow(store.clone()).unwrap();
        flow.handle_key(key(KeyCode::Enter));
        flow.handle_key(key(KeyCode::Esc));

        assert_eq!(flow.outcome(), Some(FlowOutcome::Cancelled));
        assert!(!store.exists());
        assert!(!store.dir().exists());
    }

    #[test]
    fn test_keys_held_while_message_counts_down() {
        let (_dir, store) = store();
        let mut flow = setup_flow(store).unwrap();
        flow.handle_key(key(KeyCode::Enter));
        flow.handle_key(key(KeyCode::Enter));
        assert!(flow.has_pending());

        flow.handle_key(key(KeyCode::Esc));
        assert_eq!(flow.outcome(), None);
        assert_eq!(flow.current_step_id(), PROVIDER_SELECTION);
    }

    #[test]
    fn test_resume_decline_returns_to_saved_step() {
        let (_dir, store) = store();
        store.init().unwrap();
        store
            .update_initialization_state(
                "model_selection",
                false,
                Some(&["openai".to_string()][..]),
            )
            .unwrap();

        let mut flow = setup_flow(store.clone()).unwrap();
        assert!(flow.hooks().is_resumable());
        assert!(screen_text(&flow).contains("It looks like you were in the middle"));

        flow.handle_key(key(KeyCode::Enter));
        assert_eq!(flow.current_step_id(), RESET_CONFIRM);
        flow.handle_key(key(KeyCode::Enter));
        assert_eq!(flow.current_step_id(), MODEL_SELECTION);
    }

    #[test]
    fn test_resume_confirm_resets() {
        let (_dir, store) = store();
        store.init().unwrap();
        store
            .update_initialization_state("openai_api_key", false, None)
            .unwrap();

        let mut flow = setup_flow(store.clone()).unwrap();
        flow.handle_key(key(KeyCode::Enter));
        flow.handle_key(key(KeyCode::Left));
        flow.handle_key(key(KeyCode::Enter));

        assert_eq!(flow.current_step_id(), PROVIDER_SELECTION);
        assert!(!flow.wizard().has_step(RESET_CONFIRM));
        assert!(!flow.hooks().is_resumable());
        assert_eq!(
            store.current_initialization_step().unwrap(),
            PROVIDER_SELECTION
        );
    }

    #[test]
    fn test_looping_flow_loops_back() {
        let (_dir, store) = store();
        let mut flow = looping_flow(store).unwrap();
        assert_eq!(ids(&flow).len(), 7);

        flow.handle_key(key(KeyCode::Enter));
        for _ in 0..3 {
            assert!(flow.current_step_id().ends_with("_api_key"));
            flow.handle_key(key(KeyCode::Esc));
        }
        assert_eq!(flow.current_step_id(), MODEL_SELECTION);
        flow.handle_key(key(KeyCode::Enter));
        flow.fire_pending();
        assert_eq!(flow.current_step_id(), LOOPING_DECISION);

        flow.handle_key(key(KeyCode::Down));
        flow.handle_key(key(KeyCode::Enter));
        assert_eq!(flow.current_step_id(), "openai_api_key");
    }

    #[test]
    fn test_remove_flow_confirm() {
        let (_dir, store) = store();
        store.init().unwrap();
        let mut flow = remove_flow(store.clone()).unwrap();

        flow.handle_key(key(KeyCode::Enter));
        assert_eq!(flow.current_step_id(), CONFIRM);
        assert!(screen_text(&flow).contains("Yes, remove config"));
        flow.handle_key(key(KeyCode::Right));
        flow.handle_key(key(KeyCode::Enter));

        assert_eq!(flow.current_step_id(), COMPLETION);
        assert_eq!(flow.hooks().removal(), Some(&Removal::Removed));
        assert!(!store.exists());
        assert!(screen_text(&flow).contains("Configuration Removed"));

        flow.handle_key(key(KeyCode::Enter));
        assert_eq!(flow.outcome(), Some(FlowOutcome::Completed));
    }

    #[test]
    fn test_remove_flow_without_file() {
        let (_dir, store) = store();
        let mut flow = remove_flow(store).unwrap();
        flow.handle_key(key(KeyCode::Enter));
        flow.handle_key(key(KeyCode::Right));
        flow.handle_key(key(KeyCode::Enter));

        assert_eq!(
            flow.hooks().removal(),
            Some(&Removal::Failed("No configuration file found.".to_string()))
        );
        let text = screen_text(&flow);
        assert!(text.contains("Operation Failed"));
        assert!(text.contains("An error occurred: No configuration file found."));
    }

    #[test]
    fn test_remove_flow_decline_keeps_file() {
        let (_dir, store) = store();
        store.init().unwrap();
        let mut flow = remove_flow(store.clone()).unwrap();
        flow.handle_key(key(KeyCode::Enter));
        flow.handle_key(key(KeyCode::Enter));

        assert_eq!(flow.hooks().removal(), Some(&Removal::Kept));
        assert!(store.exists());
    }
}
