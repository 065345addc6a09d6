//! Error types for command handlers

use thiserror::Error;

use crate::context::Permissions;
use crate::reply::{Embed, Reply, colors};

/// Errors a command handler (or the dispatch table on its behalf) can produce.
///
/// None of these ever leave the dispatch layer: [`CommandError::into_reply`]
/// turns each one into a message for the originating conversation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CommandError {
    /// Required arguments were missing; carries the usage hint
    #[error("{0}")]
    Usage(String),

    /// An argument was present but unusable
    #[error("{0}")]
    InvalidArgument(String),

    /// The invoking user lacks a capability the command requires
    #[error("Missing permissions: {}", .0.names().join(", "))]
    MissingPermissions(Permissions),

    /// The command needs a server (guild) context
    #[error("This command can only be used in a server!")]
    GuildOnly,

    /// Two handlers registered under the same name
    #[error("Duplicate command: {0}")]
    DuplicateCommand(String),
}

impl CommandError {
    /// Create a usage error
    pub fn usage(message: impl Into<String>) -> Self {
        Self::Usage(message.into())
    }

    /// Create an invalid-argument error
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    /// Convert the error into the reply sent back to the channel
    pub fn into_reply(self) -> Reply {
        match self {
            Self::Usage(message) | Self::InvalidArgument(message) => Reply::text(message),
            Self::GuildOnly => Reply::text(self.to_string()),
            Self::MissingPermissions(missing) => Reply::embed(
                Embed::new("🔒 Missing Permissions")
                    .description(format!(
                        "You need the following permission(s) to run this command: {}",
                        missing.names().join(", ")
                    ))
                    .color(colors::RED),
            ),
            Self::DuplicateCommand(_) => Reply::embed(
                Embed::new("❌ Error")
                    .description("An error occurred while executing the command.")
                    .color(colors::RED),
            ),
        }
    }
}
