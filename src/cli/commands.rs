// Slash command handling

/// An entry in the slash command catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandInfo {
    pub name: &'static str,
    pub description: &'static str,
}

/// Every command the query loop understands, in menu order
pub const COMMANDS: [CommandInfo; 9] = [
    CommandInfo {
        name: "clear",
        description: "Clear the display history",
    },
    CommandInfo {
        name: "clear:context",
        description: "Clear the conversation context sent to the model",
    },
    CommandInfo {
        name: "context",
        description: "Show the conversation context",
    },
    CommandInfo {
        name: "help",
        description: "Show this help message",
    },
    CommandInfo {
        name: "model",
        description: "Show current model",
    },
    CommandInfo {
        name: "model:set",
        description: "Set the active model (provider:model or model)",
    },
    CommandInfo {
        name: "systemprompt",
        description: "Show current system prompt",
    },
    CommandInfo {
        name: "systemprompt:set",
        description: "Set system prompt for current model",
    },
    CommandInfo {
        name: "systemprompt:default",
        description: "Set default system prompt for current provider",
    },
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Clear,
    ClearContext,
    Context,
    Help,
    Model,
    /// `provider:model` or bare `model`
    ModelSet(Option<String>),
    SystemPrompt,
    SystemPromptSet(Option<String>),
    SystemPromptDefault(Option<String>),
    Unknown(String),
}

/// True when the buffer should be treated as a command
pub fn is_command_input(input: &str) -> bool {
    input.starts_with('/')
}

impl Command {
    /// Parse `/name arg arg...`
    ///
    /// Returns None for non-command input and for a bare `/`.
    pub fn parse(input: &str) -> Option<Self> {
        let text = input.strip_prefix('/')?;
        let mut parts = text.split(' ');
        let name = parts.next().filter(|n| !n.is_empty())?;

        let rest = parts.collect::<Vec<_>>().join(" ");
        let argument = Some(rest.trim().to_string()).filter(|a| !a.is_empty());

        Some(match name {
            "clear" => Command::Clear,
            "clear:context" => Command::ClearContext,
            "context" => Command::Context,
            "help" => Command::Help,
            "model" => Command::Model,
            "model:set" => Command::ModelSet(argument),
            "systemprompt" => Command::SystemPrompt,
            "systemprompt:set" => Command::SystemPromptSet(argument),
            "systemprompt:default" => Command::SystemPromptDefault(argument),
            other => Command::Unknown(other.to_string()),
        })
    }
}

/// Commands whose name contains `filter` (case-insensitive)
pub fn filter_commands(filter: &str) -> Vec<CommandInfo> {
    let filter = filter.to_lowercase();
    COMMANDS
        .iter()
        .filter(|cmd| cmd.name.to_lowercase().contains(&filter))
        .copied()
        .collect()
}

/// Body of the `/help` response
pub fn format_help() -> String {
    let lines: Vec<String> = COMMANDS
        .iter()
        .map(|cmd| format!("/{} - {}", cmd.name, cmd.description))
        .collect();
    format!("Available commands:\n{}", lines.join("\n"))
}

/// Dropdown state shown while typing a command
#[derive(Debug, Clone, Default)]
pub struct CommandMenu {
    filtered: Vec<CommandInfo>,
    selected: usize,
    visible: bool,
}

impl CommandMenu {
    pub fn new() -> Self {
        Self::default()
    }

    /// Re-filter for the current buffer; resets the selection
    pub fn update(&mut self, input: &str) {
        match input.strip_prefix('/') {
            Some(filter) => {
                self.filtered = filter_commands(filter);
                self.visible = !self.filtered.is_empty();
            }
            None => {
                self.filtered.clear();
                self.visible = false;
            }
        }
        self.selected = 0;
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn filtered(&self) -> &[CommandInfo] {
        &self.filtered
    }

    pub fn selected_index(&self) -> usize {
        self.selected
    }

    pub fn move_up(&mut self) {
        if self.visible && self.selected > 0 {
            self.selected -= 1;
        }
    }

    pub fn move_down(&mut self) {
        if self.visible && self.selected + 1 < self.filtered.len() {
            self.selected += 1;
        }
    }

    pub fn hide(&mut self) {
        self.visible = false;
    }

    /// Buffer text for Tab completion
    pub fn completion(&self) -> Option<String> {
        if !self.visible {
            return None;
        }
        self.filtered
            .get(self.selected)
            .map(|cmd| format!("/{}", cmd.name))
    }
}
