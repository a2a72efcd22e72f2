// Conversation state for the query loop
//
// Two separate lists: the Message list sent to the model as context, and the
// display history shown to the user (newest first).

use crate::providers::Message;

/// Usual window passed to `recent_messages`
pub const DEFAULT_RECENT: usize = 10;

/// One query and what was shown in response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub query: String,
    pub response: String,
}

impl HistoryEntry {
    pub fn new(query: impl Into<String>, response: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            response: response.into(),
        }
    }
}

/// Running model context plus display history
#[derive(Debug, Clone, Default)]
pub struct Conversation {
    messages: Vec<Message>,
    history: Vec<HistoryEntry>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_message(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn add_user_message(&mut self, content: impl Into<String>) {
        self.add_message(Message::user(content));
    }

    pub fn add_assistant_message(&mut self, content: impl Into<String>) {
        self.add_message(Message::assistant(content));
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// The last `count` messages, oldest first
    pub fn recent_messages(&self, count: usize) -> &[Message] {
        let skip = self.messages.len().saturating_sub(count);
        &self.messages[skip..]
    }

    pub fn clear_messages(&mut self) {
        self.messages.clear();
    }

    /// Record a display entry; newest entries go first
    pub fn add_history(&mut self, entry: HistoryEntry) {
        self.history.insert(0, entry);
    }

    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    /// The only entry the query view renders
    pub fn latest(&self) -> Option<&HistoryEntry> {
        self.history.first()
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    /// Text for the `/context` command
    pub fn describe_context(&self) -> String {
        let mut out = format!("Conversation context ({} messages):", self.messages.len());
        for message in &self.messages {
            out.push_str(&format!("\n{}: {}", message.role, message.content));
        }
        out
    }
}
