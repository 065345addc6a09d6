//! Bot lifecycle: start, stop and status of the managed bot

pub mod manager;
pub mod state;

pub use manager::{BotManager, ManagerConfig, Started, Stopped};
pub use state::{BotPhase, BotStatus, LifecycleEvent};
