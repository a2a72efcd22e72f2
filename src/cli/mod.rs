// CLI module
// Public interface for the setup wizards and the query loop

pub mod app_state;
pub mod commands;
mod conversation;
pub mod query;
pub mod setup_wizard;
pub mod steps;
pub mod terminal;
pub mod wizard;

pub use app_state::{ActiveModel, AppState};
pub use commands::{Command, CommandInfo, CommandMenu, COMMANDS};
pub use conversation::{Conversation, HistoryEntry};
pub use query::{run_query, KeyOutcome, QueryRequest, QuerySession};
pub use setup_wizard::{
    looping_flow, remove_flow, setup_flow, FlowOutcome, LoopingFlow, Removal, RemoveFlow,
    SetupFlow,
};
pub use steps::{StepAction, StepContent};
pub use wizard::{Wizard, WizardStep};
