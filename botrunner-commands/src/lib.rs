//! botrunner-commands - chat command dispatch for botrunner
//!
//! This crate knows nothing about connections. It turns a parsed
//! [`Invocation`] into a [`CommandOutput`], a list of [`Step`]s describing
//! what should be sent, waited for, or moderated. The session in
//! `botrunner-core` carries those steps out against the chat service.
//!
//! # Example
//!
//! ```
//! use botrunner_commands::{CommandTable, Invocation, UserProfile};
//!
//! let table = CommandTable::with_builtins("!").unwrap();
//! let (name, args) = table.parse("!dice 20").unwrap();
//! let output = table.dispatch(&Invocation::new(name, args, UserProfile::new("1", "alice")));
//! assert!(output.first_embed().is_some());
//! ```

pub mod builtin;
pub mod context;
pub mod error;
pub mod output;
pub mod reply;
pub mod table;

pub use builtin::{CalcError, Ledger, LedgerError, evaluate};
pub use context::{
    Args, BotSnapshot, GuildInfo, Invocation, Permissions, RoleInfo, UserProfile,
    default_avatar_url, parse_user_mention, snowflake_timestamp,
};
pub use error::CommandError;
pub use output::{CommandOutput, ModAction, PurgeReport, Step};
pub use reply::{Embed, EmbedField, Reply, colors};
pub use table::{Category, CommandHandler, CommandSpec, CommandTable, HandlerResult};

/// Prefix used when none is configured
pub const DEFAULT_PREFIX: &str = "!";
