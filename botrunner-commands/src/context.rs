//! Invocation context handed to command handlers
//!
//! An [`Invocation`] bundles everything a handler may look at: the parsed
//! arguments, who sent the command, where it was sent, what the sender is
//! allowed to do, and a snapshot of the bot itself. Handlers read it and
//! return a [`CommandOutput`](crate::CommandOutput); they never mutate it.

use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};

use crate::error::CommandError;

/// Milliseconds between the Unix epoch and the chat service's snowflake epoch (2015-01-01).
const SNOWFLAKE_EPOCH_MS: i64 = 1_420_070_400_000;

/// Creation time encoded in a snowflake id
pub fn snowflake_timestamp(id: &str) -> Option<DateTime<Utc>> {
    let raw: u64 = id.parse().ok()?;
    let millis = (raw >> 22) as i64 + SNOWFLAKE_EPOCH_MS;
    Utc.timestamp_millis_opt(millis).single()
}

/// Capability bits a user holds in a guild
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Permissions(u64);

impl Permissions {
    pub const NONE: Self = Self(0);
    pub const KICK_MEMBERS: Self = Self(1 << 1);
    pub const BAN_MEMBERS: Self = Self(1 << 2);
    pub const ADMINISTRATOR: Self = Self(1 << 3);
    pub const MANAGE_MESSAGES: Self = Self(1 << 13);
    pub const ALL: Self = Self(u64::MAX);

    const NAMED: &'static [(Self, &'static str)] = &[
        (Self::KICK_MEMBERS, "Kick Members"),
        (Self::BAN_MEMBERS, "Ban Members"),
        (Self::ADMINISTRATOR, "Administrator"),
        (Self::MANAGE_MESSAGES, "Manage Messages"),
    ];

    pub const fn from_bits(bits: u64) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u64 {
        self.0
    }

    /// True when every bit of `other` is present
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Bits of `required` that are not held
    pub const fn missing(self, required: Self) -> Self {
        Self(required.0 & !self.0)
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Human-readable names of the known bits that are set
    pub fn names(self) -> Vec<&'static str> {
        Self::NAMED
            .iter()
            .filter(|(perm, _)| self.contains(*perm))
            .map(|(_, name)| *name)
            .collect()
    }
}

impl std::ops::BitOr for Permissions {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

/// The highest role a member holds
#[derive(Debug, Clone, PartialEq)]
pub struct RoleInfo {
    pub id: String,
    pub name: String,
    pub position: i64,
    pub color: u32,
}

impl RoleInfo {
    pub fn mention(&self) -> String {
        format!("<@&{}>", self.id)
    }
}

/// A user as seen from the invoking conversation
#[derive(Debug, Clone, PartialEq)]
pub struct UserProfile {
    pub id: String,
    pub username: String,
    /// Guild nickname, global display name, or username, in that order
    pub display_name: String,
    pub discriminator: Option<String>,
    pub avatar_url: String,
    pub bot: bool,
    pub created_at: DateTime<Utc>,
    /// Only known inside a guild
    pub joined_at: Option<DateTime<Utc>>,
    pub top_role: Option<RoleInfo>,
}

impl UserProfile {
    /// Minimal profile for a user id and name
    pub fn new(id: impl Into<String>, username: impl Into<String>) -> Self {
        let id = id.into();
        let username = username.into();
        let created_at = snowflake_timestamp(&id).unwrap_or_default();
        Self {
            avatar_url: default_avatar_url(&id),
            id,
            display_name: username.clone(),
            username,
            discriminator: None,
            bot: false,
            created_at,
            joined_at: None,
            top_role: None,
        }
    }

    pub fn mention(&self) -> String {
        format!("<@{}>", self.id)
    }

    /// Position of the top role, 0 (the implicit everyone role) when none is held
    pub fn role_rank(&self) -> i64 {
        self.top_role.as_ref().map(|r| r.position).unwrap_or(0)
    }

    /// Embed color of the top role, 0 for the default color
    pub fn color(&self) -> u32 {
        self.top_role.as_ref().map(|r| r.color).unwrap_or(0)
    }
}

/// URL of the stock avatar shown for users without a custom one
pub fn default_avatar_url(user_id: &str) -> String {
    let index = user_id.parse::<u64>().map(|id| (id >> 22) % 6).unwrap_or(0);
    format!("https://cdn.discordapp.com/embed/avatars/{}.png", index)
}

/// Snapshot of the guild (server) a command was sent in
#[derive(Debug, Clone, PartialEq)]
pub struct GuildInfo {
    pub id: String,
    pub name: String,
    pub owner_id: Option<String>,
    pub member_count: u64,
    pub text_channels: usize,
    pub voice_channels: usize,
    pub created_at: DateTime<Utc>,
    pub icon_url: Option<String>,
}

impl GuildInfo {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            created_at: snowflake_timestamp(&id).unwrap_or_default(),
            id,
            name: name.into(),
            owner_id: None,
            member_count: 0,
            text_channels: 0,
            voice_channels: 0,
            icon_url: None,
        }
    }
}

/// Snapshot of the bot answering the command
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BotSnapshot {
    pub name: String,
    pub id: String,
    pub avatar_url: Option<String>,
    pub guilds: usize,
    pub users: u64,
    /// Round trip of the last heartbeat, if one completed
    pub latency: Option<Duration>,
}

impl BotSnapshot {
    /// Latency in whole milliseconds, 0 when unknown
    pub fn latency_ms(&self) -> u128 {
        self.latency.map(|d| d.as_millis()).unwrap_or(0)
    }
}

/// Raw argument text plus whitespace-separated positional slots
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Args {
    raw: String,
}

impl Args {
    pub fn new(raw: impl Into<String>) -> Self {
        Self {
            raw: raw.into().trim().to_string(),
        }
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// Number of positional slots
    pub fn len(&self) -> usize {
        self.raw.split_whitespace().count()
    }

    pub fn positional(&self) -> Vec<&str> {
        self.raw.split_whitespace().collect()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.raw.split_whitespace().nth(index)
    }

    /// Parse the slot at `index`; `Ok(None)` when the slot is absent
    pub fn parse<T: FromStr>(&self, index: usize) -> Result<Option<T>, CommandError> {
        match self.get(index) {
            None => Ok(None),
            Some(value) => value.parse().map(Some).map_err(|_| {
                CommandError::invalid(format!("Invalid value for argument {}: `{}`", index + 1, value))
            }),
        }
    }

    /// Text after skipping `skip` slots, with its original spacing kept
    pub fn rest_after(&self, skip: usize) -> Option<&str> {
        let mut rest = self.raw.as_str();
        for _ in 0..skip {
            rest = rest.trim_start();
            let end = rest.find(char::is_whitespace)?;
            rest = &rest[end..];
        }
        let rest = rest.trim();
        if rest.is_empty() { None } else { Some(rest) }
    }

    /// The whole argument text, `None` when empty
    pub fn text(&self) -> Option<&str> {
        self.rest_after(0)
    }
}

/// Extract the user id from `<@id>`, `<@!id>` or a bare numeric id
pub fn parse_user_mention(token: &str) -> Option<&str> {
    let inner = token
        .strip_prefix("<@")
        .and_then(|t| t.strip_suffix('>'))
        .map(|t| t.trim_start_matches('!'))
        .unwrap_or(token);
    if !inner.is_empty() && inner.chars().all(|c| c.is_ascii_digit()) {
        Some(inner)
    } else {
        None
    }
}

/// Everything known about one command invocation
#[derive(Debug, Clone)]
pub struct Invocation {
    /// Prefix the command was invoked with
    pub prefix: String,
    /// Lowercased command name
    pub name: String,
    pub args: Args,
    pub author: UserProfile,
    pub channel_id: String,
    pub guild: Option<GuildInfo>,
    /// Author's capabilities in the guild, empty outside one
    pub permissions: Permissions,
    /// Users mentioned in the message
    pub mentions: Vec<UserProfile>,
    pub bot: BotSnapshot,
    pub now: DateTime<Utc>,
}

impl Invocation {
    pub fn new(name: impl Into<String>, args: impl Into<String>, author: UserProfile) -> Self {
        Self {
            prefix: "!".to_string(),
            name: name.into().to_lowercase(),
            args: Args::new(args),
            author,
            channel_id: String::new(),
            guild: None,
            permissions: Permissions::NONE,
            mentions: Vec::new(),
            bot: BotSnapshot::default(),
            now: Utc::now(),
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn with_channel(mut self, channel_id: impl Into<String>) -> Self {
        self.channel_id = channel_id.into();
        self
    }

    pub fn with_guild(mut self, guild: GuildInfo) -> Self {
        self.guild = Some(guild);
        self
    }

    pub fn with_permissions(mut self, permissions: Permissions) -> Self {
        self.permissions = permissions;
        self
    }

    pub fn with_mentions(mut self, mentions: Vec<UserProfile>) -> Self {
        self.mentions = mentions;
        self
    }

    pub fn with_bot(mut self, bot: BotSnapshot) -> Self {
        self.bot = bot;
        self
    }

    pub fn with_now(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self
    }

    /// The guild, or [`CommandError::GuildOnly`]
    pub fn guild(&self) -> Result<&GuildInfo, CommandError> {
        self.guild.as_ref().ok_or(CommandError::GuildOnly)
    }

    /// Resolve the user referenced by the slot at `index`
    ///
    /// `Ok(None)` when the slot is empty; an error when it names nobody
    /// mentioned in the message.
    pub fn member_arg(&self, index: usize) -> Result<Option<&UserProfile>, CommandError> {
        let Some(token) = self.args.get(index) else {
            return Ok(None);
        };
        parse_user_mention(token)
            .and_then(|id| {
                self.mentions
                    .iter()
                    .chain(std::iter::once(&self.author))
                    .find(|user| user.id == id)
            })
            .map(Some)
            .ok_or_else(|| CommandError::invalid(format!("Member \"{}\" not found.", token)))
    }

    /// The user in slot `index`, falling back to the author
    pub fn member_or_author(&self, index: usize) -> Result<&UserProfile, CommandError> {
        Ok(self.member_arg(index)?.unwrap_or(&self.author))
    }

    /// Command as typed, e.g. `!dice`
    pub fn command_display(&self) -> String {
        format!("{}{}", self.prefix, self.name)
    }
}
