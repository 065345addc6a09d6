//! botrunner-core: lifecycle management for a chat bot
//!
//! This crate provides the pieces between the web shell and the chat service:
//!
//! - **Lifecycle** - [`BotManager`] owns at most one bot session and exposes
//!   `start`, `stop` and `status`
//! - **Session** - [`Session`] runs one gateway connection and dispatches
//!   chat commands through a [`botrunner_commands::CommandTable`]
//! - **Gateway** - [`Connector`], [`Connection`] and [`ChatApi`] abstract the
//!   chat service; [`DiscordConnector`] implements them for Discord and
//!   [`MockConnector`] scripts them for tests
//! - **Token** - [`BotToken`] keeps the credential out of logs and status
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use botrunner_commands::CommandTable;
//! use botrunner_core::{BotManager, DiscordConnector};
//!
//! async fn example(token: &str) -> Result<(), Box<dyn std::error::Error>> {
//!     let manager = BotManager::new(
//!         Arc::new(DiscordConnector::default()),
//!         Arc::new(CommandTable::with_builtins("!")?),
//!     );
//!
//!     let started = manager.start(token).await?;
//!     println!("session {} running: {}", started.session_id, manager.status().running);
//!
//!     manager.stop().await?;
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │                 BotManager                   │
//! │  ┌────────────────────────────────────────┐  │
//! │  │          Session (tokio task)          │  │
//! │  │  ┌──────────────┐  ┌────────────────┐  │  │
//! │  │  │  Connection  │  │  CommandTable  │  │  │
//! │  │  │  (gateway)   │  │   (plugins)    │  │  │
//! │  │  └──────────────┘  └────────────────┘  │  │
//! │  └────────────────────────────────────────┘  │
//! └──────────────────────────────────────────────┘
//! ```

pub mod error;
pub mod gateway;
pub mod lifecycle;
pub mod session;
pub mod token;

// Re-export key types for convenience
pub use error::{ApiError, GatewayError, LifecycleError};
pub use gateway::{
    BotIdentity, ChatApi, Connection, Connector, DiscordConfig, DiscordConnector, GatewayEvent,
    InboundMessage, MockConnector, RecordingChatApi,
};
pub use lifecycle::{
    BotManager, BotPhase, BotStatus, LifecycleEvent, ManagerConfig, Started, Stopped,
};
pub use session::{Session, SessionExit, SessionObserver};
pub use token::{BotToken, DEFAULT_MIN_TOKEN_LENGTH};
