// Query loop
//
// `QuerySession` holds everything the chat view shows and reacts to keys
// without touching the terminal, so it can be driven from tests. `run_query`
// wires it to crossterm events and a single in-flight agent request.

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Padding, Paragraph, Wrap},
    Frame,
};
use std::time::Duration;
use tokio::sync::oneshot;

use super::app_state::{ActiveModel, AppState};
use super::commands::{format_help, is_command_input, Command, CommandMenu};
use super::conversation::{Conversation, HistoryEntry};
use super::terminal::OmniTerminal;
use crate::agent::{Agent, ERROR_PREFIX};
use crate::config::{models, ConfigStore};
use crate::providers::Message;

pub const PLACEHOLDER: &str = "How can I help you today?";

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// A model request ready to hand to the agent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryRequest {
    pub query: String,
    /// Conversation as it was before this query's user message
    pub messages: Vec<Message>,
    pub model: String,
    pub provider: String,
}

/// What the loop should do after a key press
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyOutcome {
    Continue,
    Send(QueryRequest),
    Exit,
}

pub struct QuerySession {
    store: ConfigStore,
    active: ActiveModel,
    conversation: Conversation,
    input: String,
    menu: CommandMenu,
    is_command: bool,
    is_loading: bool,
}

impl QuerySession {
    pub fn new(app: &AppState) -> Result<Self> {
        let config = app.config()?;
        Ok(Self {
            store: app.store().clone(),
            active: ActiveModel::from_config(config),
            conversation: Conversation::new(),
            input: String::new(),
            menu: CommandMenu::new(),
            is_command: false,
            is_loading: false,
        })
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    /// Replace the buffer and refresh command mode
    pub fn set_input(&mut self, value: impl Into<String>) {
        self.input = value.into();
        self.is_command = is_command_input(&self.input);
        self.menu.update(&self.input);
    }

    pub fn is_command(&self) -> bool {
        self.is_command
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn menu(&self) -> &CommandMenu {
        &self.menu
    }

    pub fn active_model(&self) -> &ActiveModel {
        &self.active
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    /// "{provider}:{model} > "
    pub fn prompt_label(&self) -> String {
        format!("{} > ", self.active.label())
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> KeyOutcome {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        if ctrl && matches!(key.code, KeyCode::Char('c') | KeyCode::Char('d')) {
            return KeyOutcome::Exit;
        }

        match key.code {
            KeyCode::Enter => {
                return match self.submit() {
                    Some(request) => KeyOutcome::Send(request),
                    None => KeyOutcome::Continue,
                };
            }
            KeyCode::Backspace => {
                let mut value = self.input.clone();
                value.pop();
                self.set_input(value);
            }
            KeyCode::Char(c) if !ctrl && !key.modifiers.contains(KeyModifiers::ALT) => {
                let mut value = self.input.clone();
                value.push(c);
                self.set_input(value);
            }
            // Menu keys are ignored while a request is in flight
            KeyCode::Up if !self.is_loading => self.menu.move_up(),
            KeyCode::Down if !self.is_loading => self.menu.move_down(),
            KeyCode::Tab if !self.is_loading => {
                if let Some(completion) = self.menu.completion() {
                    self.set_input(completion);
                }
            }
            KeyCode::Esc if !self.is_loading => self.menu.hide(),
            _ => {}
        }
        KeyOutcome::Continue
    }

    /// Submit the buffer
    ///
    /// Commands are handled on the spot; plain text becomes a request and
    /// flips `is_loading` until `apply_reply` is called.
    pub fn submit(&mut self) -> Option<QueryRequest> {
        if self.input.trim().is_empty() || self.is_loading {
            return None;
        }

        let query = std::mem::take(&mut self.input);
        let was_command = self.is_command;
        self.set_input(String::new());

        if was_command {
            if let Some(command) = Command::parse(&query) {
                self.execute_command(&query, command);
            }
            return None;
        }

        let messages = self.conversation.messages().to_vec();
        self.conversation.add_user_message(query.clone());
        self.is_loading = true;

        tracing::debug!("Submitting query to {}", self.active.label());

        Some(QueryRequest {
            query,
            messages,
            model: self.active.model.clone(),
            provider: self.active.provider.clone(),
        })
    }

    /// Record the agent's reply for `query`
    pub fn apply_reply(&mut self, query: String, reply: String) {
        self.conversation.add_assistant_message(reply.clone());
        self.conversation.add_history(HistoryEntry::new(query, reply));
        self.is_loading = false;
    }

    fn execute_command(&mut self, query: &str, command: Command) {
        tracing::debug!("Executing command {:?}", command);

        let response = match command {
            Command::Clear => {
                self.conversation.clear_history();
                return;
            }
            Command::ClearContext => {
                self.conversation.clear_messages();
                "Conversation context cleared.".to_string()
            }
            Command::Context => self.conversation.describe_context(),
            Command::Help => format_help(),
            Command::Model => format!("Current model: {}", self.active.label()),
            Command::ModelSet(Some(spec)) => self.set_model(&spec),
            Command::ModelSet(None) => {
                "To set the model, use: /model:set <provider:model> or /model:set <model>"
                    .to_string()
            }
            Command::SystemPrompt => {
                format!("Current system prompt: {}", self.active.system_prompt)
            }
            Command::SystemPromptSet(Some(prompt)) => {
                match self
                    .store
                    .update_model_system_prompt(&self.active.model, &prompt)
                {
                    Ok(()) => {
                        self.active.system_prompt = prompt;
                        format!("System prompt updated for model {}", self.active.model)
                    }
                    Err(e) => {
                        tracing::warn!("Failed to update system prompt: {:#}", e);
                        format!("Could not update system prompt: {:#}", e)
                    }
                }
            }
            Command::SystemPromptSet(None) => {
                "To set a system prompt, use: /systemprompt:set <your prompt here>".to_string()
            }
            Command::SystemPromptDefault(Some(prompt)) => {
                match self
                    .store
                    .update_provider_default_system_prompt(&self.active.provider, &prompt)
                {
                    Ok(()) => {
                        self.active.system_prompt = prompt;
                        format!(
                            "Default system prompt updated for provider {}",
                            self.active.provider
                        )
                    }
                    Err(e) => {
                        tracing::warn!("Failed to update default system prompt: {:#}", e);
                        format!("Could not update default system prompt: {:#}", e)
                    }
                }
            }
            Command::SystemPromptDefault(None) => {
                "To set a default system prompt, use: /systemprompt:default <your prompt here>"
                    .to_string()
            }
            Command::Unknown(name) => format!("Unknown command: {}", name),
        };

        self.conversation
            .add_history(HistoryEntry::new(query, response));
    }

    fn set_model(&mut self, spec: &str) -> String {
        let config = match self.store.read() {
            Ok(config) => config,
            Err(e) => return format!("Could not read configuration: {:#}", e),
        };

        let Some(found) = models::find_model(&config, spec) else {
            return format!(
                "Model {} not found in enabled providers. Current model: {}",
                spec,
                self.active.label()
            );
        };

        if let Err(e) = self.store.set_default_model(&found.model) {
            tracing::warn!("Failed to persist default model: {:#}", e);
        }
        self.active = ActiveModel::resolve(&config, &found.model, Some(found.provider.as_str()));
        tracing::info!("Active model set to {}", self.active.label());
        format!("Model set to {}", found)
    }
}

/// Run the chat view until Ctrl-C / Ctrl-D
pub async fn run_query(
    terminal: &mut OmniTerminal,
    mut session: QuerySession,
    agent: Agent,
) -> Result<()> {
    let mut in_flight: Option<(String, oneshot::Receiver<String>)> = None;

    loop {
        if let Some((_, rx)) = in_flight.as_mut() {
            if let Some(reply) = take_reply(rx) {
                if let Some((query, _)) = in_flight.take() {
                    session.apply_reply(query, reply);
                }
            }
        }

        terminal.draw(|f| render_query(f, &session))?;

        if !event::poll(POLL_INTERVAL)? {
            continue;
        }
        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }

        match session.handle_key(key) {
            KeyOutcome::Continue => {}
            KeyOutcome::Exit => return Ok(()),
            KeyOutcome::Send(request) => {
                let (tx, rx) = oneshot::channel();
                let agent = agent.clone();
                let query = request.query.clone();
                tokio::spawn(async move {
                    let reply = agent
                        .respond(
                            &request.query,
                            &request.messages,
                            Some(request.model.as_str()),
                            Some(request.provider.as_str()),
                        )
                        .await;
                    let _ = tx.send(reply);
                });
                in_flight = Some((query, rx));
            }
        }
    }
}

/// The agent's reply once it has arrived; a dropped task becomes an error reply
fn take_reply(rx: &mut oneshot::Receiver<String>) -> Option<String> {
    match rx.try_recv() {
        Ok(reply) => Some(reply),
        Err(oneshot::error::TryRecvError::Empty) => None,
        Err(oneshot::error::TryRecvError::Closed) => {
            tracing::error!("Agent task ended without a reply");
            Some(format!("{}: request task ended", ERROR_PREFIX))
        }
    }
}

fn render_query(f: &mut Frame, session: &QuerySession) {
    let menu = session.menu();
    let menu_height = if menu.is_visible() {
        menu.filtered().len() as u16 + 2
    } else {
        0
    };
    let input_height = if session.is_loading() { 4 } else { 3 };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(1),               // Latest response
            Constraint::Length(input_height), // Input box
            Constraint::Length(menu_height),  // Command menu
        ])
        .split(f.area());

    if let Some(entry) = session.conversation().latest() {
        let response = Paragraph::new(entry.response.clone())
            .wrap(Wrap { trim: false })
            .block(Block::default().padding(Padding::left(2)));
        f.render_widget(response, chunks[0]);
    }

    let typed = if session.input().is_empty() {
        Span::styled(PLACEHOLDER, Style::default().fg(Color::DarkGray))
    } else {
        Span::raw(session.input().to_string())
    };
    let mut lines = vec![Line::from(vec![
        Span::styled(session.prompt_label(), Style::default().fg(Color::Cyan)),
        typed,
    ])];
    if session.is_loading() {
        lines.push(Line::from(Span::styled(
            "  Loading...",
            Style::default().fg(Color::Yellow),
        )));
    }

    let input = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(Color::Blue)),
    );
    f.render_widget(input, chunks[1]);

    if menu.is_visible() {
        let items: Vec<Line> = menu
            .filtered()
            .iter()
            .enumerate()
            .map(|(i, cmd)| {
                let style = if i == menu.selected_index() {
                    Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD)
                } else {
                    Style::default()
                };
                Line::from(Span::styled(
                    format!("{} - {}", cmd.name, cmd.description),
                    style,
                ))
            })
            .collect();
        let list = Paragraph::new(items).block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded),
        );
        f.render_widget(list, chunks[2]);
    }
}
