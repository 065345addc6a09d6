//! Command dispatch table
//!
//! Maps a case-insensitive command name to a handler. The table is built
//! once at startup and is read-only afterwards, so a single `Arc` can be
//! shared by every invocation task.

use std::collections::HashMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use tracing::{debug, error};

use crate::context::{Invocation, Permissions};
use crate::error::CommandError;
use crate::output::CommandOutput;
use crate::reply::{Embed, Reply, colors};

/// Result returned by every handler
pub type HandlerResult = Result<CommandOutput, CommandError>;

/// A command implementation
///
/// Any `Fn(&Invocation) -> HandlerResult` closure is a handler, which is how
/// the built-in plugins register themselves.
pub trait CommandHandler: Send + Sync {
    fn handle(&self, invocation: &Invocation) -> HandlerResult;
}

impl<F> CommandHandler for F
where
    F: Fn(&Invocation) -> HandlerResult + Send + Sync,
{
    fn handle(&self, invocation: &Invocation) -> HandlerResult {
        self(invocation)
    }
}

/// Help category a command is listed under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    Basic,
    Fun,
    Games,
    Utility,
    User,
    Tools,
    Random,
    Math,
    Text,
    Security,
    Music,
    Economy,
}

impl Category {
    pub const ALL: [Category; 12] = [
        Category::Basic,
        Category::Fun,
        Category::Games,
        Category::Utility,
        Category::User,
        Category::Tools,
        Category::Random,
        Category::Math,
        Category::Text,
        Category::Security,
        Category::Music,
        Category::Economy,
    ];

    /// Name used in `help <category>`
    pub fn key(self) -> &'static str {
        match self {
            Category::Basic => "basic",
            Category::Fun => "fun",
            Category::Games => "games",
            Category::Utility => "utility",
            Category::User => "user",
            Category::Tools => "tools",
            Category::Random => "random",
            Category::Math => "math",
            Category::Text => "text",
            Category::Security => "security",
            Category::Music => "music",
            Category::Economy => "economy",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Category::Basic => "🛠️ Basic",
            Category::Fun => "🎮 Fun",
            Category::Games => "🎯 Games",
            Category::Utility => "⚙️ Utility",
            Category::User => "👤 User",
            Category::Tools => "🔧 Tools",
            Category::Random => "🎲 Random",
            Category::Math => "📊 Math",
            Category::Text => "🔤 Text",
            Category::Security => "🔒 Security",
            Category::Music => "🎵 Music",
            Category::Economy => "💰 Economy",
        }
    }

    pub fn parse(key: &str) -> Option<Self> {
        let key = key.to_lowercase();
        Self::ALL.into_iter().find(|c| c.key() == key)
    }
}

/// Static description of a command
#[derive(Debug, Clone, PartialEq)]
pub struct CommandSpec {
    pub name: &'static str,
    /// Argument synopsis, e.g. `<min> <max>`
    pub usage: &'static str,
    pub description: &'static str,
    pub category: Category,
    /// Capabilities the author must hold
    pub permissions: Permissions,
    pub guild_only: bool,
}

impl CommandSpec {
    pub const fn new(
        name: &'static str,
        usage: &'static str,
        description: &'static str,
        category: Category,
    ) -> Self {
        Self {
            name,
            usage,
            description,
            category,
            permissions: Permissions::NONE,
            guild_only: false,
        }
    }

    pub const fn requires(mut self, permissions: Permissions) -> Self {
        self.permissions = permissions;
        self
    }

    pub const fn guild_only(mut self) -> Self {
        self.guild_only = true;
        self
    }

    /// Synopsis with prefix, e.g. `!dice [sides]`
    pub fn synopsis(&self, prefix: &str) -> String {
        if self.usage.is_empty() {
            format!("{}{}", prefix, self.name)
        } else {
            format!("{}{} {}", prefix, self.name, self.usage)
        }
    }
}

struct Registered {
    spec: CommandSpec,
    handler: Arc<dyn CommandHandler>,
}

/// Lookup from command name to handler
pub struct CommandTable {
    prefix: String,
    commands: HashMap<String, Registered>,
}

impl CommandTable {
    /// Empty table answering to `prefix`
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            commands: HashMap::new(),
        }
    }

    /// Table with every built-in plugin registered
    pub fn with_builtins(prefix: impl Into<String>) -> Result<Self, CommandError> {
        let mut table = Self::new(prefix);
        crate::builtin::register_all(&mut table)?;
        Ok(table)
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Register a handler under `spec.name`
    pub fn register<F>(&mut self, spec: CommandSpec, handler: F) -> Result<(), CommandError>
    where
        F: Fn(&Invocation) -> HandlerResult + Send + Sync + 'static,
    {
        let key = spec.name.to_lowercase();
        if self.commands.contains_key(&key) {
            return Err(CommandError::DuplicateCommand(key));
        }
        self.commands.insert(
            key,
            Registered {
                spec,
                handler: Arc::new(handler),
            },
        );
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.commands.contains_key(&name.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// All specs ordered by category, then name
    pub fn specs(&self) -> Vec<CommandSpec> {
        let mut specs: Vec<CommandSpec> = self.commands.values().map(|r| r.spec.clone()).collect();
        specs.sort_by(|a, b| a.category.cmp(&b.category).then(a.name.cmp(b.name)));
        specs
    }

    /// Split prefixed message text into `(lowercased name, argument text)`
    ///
    /// Returns `None` for text that is not a command invocation.
    pub fn parse<'a>(&self, content: &'a str) -> Option<(String, &'a str)> {
        let body = content.trim_start().strip_prefix(self.prefix.as_str())?;
        let end = body.find(char::is_whitespace).unwrap_or(body.len());
        let name = &body[..end];
        if name.is_empty() {
            return None;
        }
        Some((name.to_lowercase(), body[end..].trim()))
    }

    /// Run the handler for an invocation and return what it wants sent
    ///
    /// Never fails: unknown names, capability failures, handler errors and
    /// handler panics all become replies.
    pub fn dispatch(&self, invocation: &Invocation) -> CommandOutput {
        let Some(entry) = self.commands.get(&invocation.name) else {
            debug!(command = %invocation.name, "Unknown command");
            return self.unknown_command(invocation);
        };

        if let Err(err) = Self::check_capabilities(&entry.spec, invocation) {
            debug!(command = %invocation.name, error = %err, "Command rejected");
            return CommandOutput::reply(err.into_reply());
        }

        match catch_unwind(AssertUnwindSafe(|| entry.handler.handle(invocation))) {
            Ok(Ok(output)) => output,
            Ok(Err(err)) => {
                debug!(command = %invocation.name, error = %err, "Command returned error");
                CommandOutput::reply(err.into_reply())
            }
            Err(_) => {
                error!(command = %invocation.name, "Command handler panicked");
                CommandOutput::reply(
                    Embed::new("❌ Error")
                        .description("An error occurred while executing the command.")
                        .color(colors::RED),
                )
            }
        }
    }

    fn check_capabilities(spec: &CommandSpec, invocation: &Invocation) -> Result<(), CommandError> {
        if spec.guild_only && invocation.guild.is_none() {
            return Err(CommandError::GuildOnly);
        }
        let missing = invocation.permissions.missing(spec.permissions);
        if !missing.is_empty() {
            return Err(CommandError::MissingPermissions(missing));
        }
        Ok(())
    }

    /// Standard reply for a name nobody registered
    pub fn unknown_command(&self, invocation: &Invocation) -> CommandOutput {
        CommandOutput::reply(Reply::embed(
            Embed::new("❌ Command Not Found")
                .description(format!(
                    "The command `{}` was not found.\nUse `{}help` to see available commands.",
                    invocation.command_display(),
                    self.prefix
                ))
                .color(colors::RED),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::UserProfile;

    fn invocation(name: &str, args: &str) -> Invocation {
        Invocation::new(name, args, UserProfile::new("100", "tester"))
    }

    fn echo_table() -> CommandTable {
        let mut table = CommandTable::new("!");
        table
            .register(
                CommandSpec::new("echo", "<text>", "Echo text", Category::Text),
                |inv: &Invocation| {
                    let text = inv.args.text().ok_or_else(|| CommandError::usage("Usage: `!echo <text>`"))?;
                    Ok(CommandOutput::text(text))
                },
            )
            .unwrap();
        table
    }

    #[test]
    fn parse_splits_name_and_args() {
        let table = echo_table();
        assert_eq!(table.parse("!Echo  hi there"), Some(("echo".to_string(), "hi there")));
        assert_eq!(table.parse("!ping"), Some(("ping".to_string(), "")));
        assert_eq!(table.parse("hello"), None);
        assert_eq!(table.parse("!"), None);
        assert_eq!(table.parse("! echo"), None);
    }

    #[test]
    fn dispatch_runs_handler() {
        let table = echo_table();
        let output = table.dispatch(&invocation("echo", "hi"));
        assert_eq!(output.first_text(), Some("hi"));
    }

    #[test]
    fn lookup_is_case_insensitive() {
        let table = echo_table();
        assert!(table.contains("ECHO"));
        let output = table.dispatch(&invocation("EcHo", "hi"));
        assert_eq!(output.first_text(), Some("hi"));
    }

    #[test]
    fn unknown_command_gets_standard_reply() {
        let table = echo_table();
        let output = table.dispatch(&invocation("nope", ""));
        let embed = output.first_embed().unwrap();
        assert_eq!(embed.title.as_deref(), Some("❌ Command Not Found"));
        assert!(embed.description.as_ref().unwrap().contains("`!nope`"));
    }

    #[test]
    fn handler_error_becomes_reply() {
        let table = echo_table();
        let output = table.dispatch(&invocation("echo", ""));
        assert_eq!(output.first_text(), Some("Usage: `!echo <text>`"));
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let mut table = echo_table();
        let err = table
            .register(
                CommandSpec::new("ECHO", "", "again", Category::Text),
                |_: &Invocation| Ok(CommandOutput::default()),
            )
            .unwrap_err();
        assert_eq!(err, CommandError::DuplicateCommand("echo".into()));
    }

    #[test]
    fn missing_permissions_block_handler() {
        let mut table = CommandTable::new("!");
        table
            .register(
                CommandSpec::new("purge", "", "Purge", Category::Security)
                    .requires(Permissions::MANAGE_MESSAGES),
                |_: &Invocation| panic!("handler must not run"),
            )
            .unwrap();

        let output = table.dispatch(&invocation("purge", ""));
        let embed = output.first_embed().unwrap();
        assert_eq!(embed.title.as_deref(), Some("🔒 Missing Permissions"));

        let allowed = invocation("purge", "").with_permissions(Permissions::ALL);
        let output = table.dispatch(&allowed);
        assert_eq!(
            output.first_embed().unwrap().title.as_deref(),
            Some("❌ Error")
        );
    }

    #[test]
    fn guild_only_commands_reject_direct_messages() {
        let mut table = CommandTable::new("!");
        table
            .register(
                CommandSpec::new("server", "", "Server info", Category::Basic).guild_only(),
                |_: &Invocation| Ok(CommandOutput::text("ok")),
            )
            .unwrap();
        let output = table.dispatch(&invocation("server", ""));
        assert_eq!(output.first_text(), Some("This command can only be used in a server!"));
    }

    #[test]
    fn category_parse_round_trips_keys() {
        for category in Category::ALL {
            assert_eq!(Category::parse(category.key()), Some(category));
        }
        assert_eq!(Category::parse("GAMES"), Some(Category::Games));
        assert_eq!(Category::parse("nope"), None);
    }

    #[test]
    fn synopsis_includes_prefix_and_usage() {
        let spec = CommandSpec::new("dice", "[sides]", "Roll", Category::Games);
        assert_eq!(spec.synopsis("!"), "!dice [sides]");
        let bare = CommandSpec::new("ping", "", "Ping", Category::Basic);
        assert_eq!(bare.synopsis("?"), "?ping");
    }
}
