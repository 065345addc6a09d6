//! Structured command output
//!
//! A handler answers with a [`CommandOutput`]: an ordered list of [`Step`]s
//! that the session executes against the chat service. Keeping the effects
//! as data lets every handler be tested without a connection.

use std::time::Duration;

use crate::reply::{Embed, Reply, colors};

/// Moderation call against the chat service
#[derive(Debug, Clone, PartialEq)]
pub enum ModAction {
    Kick {
        guild_id: String,
        user_id: String,
        reason: String,
    },
    Ban {
        guild_id: String,
        user_id: String,
        reason: String,
    },
    Unban {
        guild_id: String,
        user_id: String,
    },
}

/// Report rendered after a bulk delete
#[derive(Debug, Clone, PartialEq)]
pub struct PurgeReport {
    pub channel_mention: String,
    pub moderator_mention: String,
}

impl PurgeReport {
    /// Render the report; `deleted` includes the invoking message itself
    pub fn render(&self, deleted: usize) -> Reply {
        Reply::embed(
            Embed::new("🧹 Messages Cleared")
                .description(format!(
                    "Deleted {} messages from {}",
                    deleted.saturating_sub(1),
                    self.channel_mention
                ))
                .color(colors::GREEN)
                .field("Moderator", &self.moderator_mention, true),
        )
    }
}

/// One effect of a command, executed in order
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// Send a reply to the invoking channel
    Send(Reply),
    /// Send a reply and react to it
    SendWithReactions { reply: Reply, reactions: Vec<String> },
    /// Send a reply and delete it after `ttl`
    SendTransient { reply: Reply, ttl: Duration },
    /// Pause this invocation only
    Wait(Duration),
    /// Best-effort direct message; failures are ignored
    DirectMessage { user_id: String, reply: Reply },
    /// Run a moderation call, then report the outcome
    Moderate {
        action: ModAction,
        success: Reply,
        failure: Reply,
    },
    /// Delete up to `limit` recent messages in the invoking channel
    Purge {
        limit: u32,
        report: PurgeReport,
        report_ttl: Duration,
    },
}

/// Ordered effects produced by one command
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommandOutput {
    pub steps: Vec<Step>,
}

impl CommandOutput {
    /// Output consisting of a single reply
    pub fn reply(reply: impl Into<Reply>) -> Self {
        Self {
            steps: vec![Step::Send(reply.into())],
        }
    }

    pub fn text(content: impl Into<String>) -> Self {
        Self::reply(Reply::text(content))
    }

    /// Append a step
    pub fn then(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }

    /// All replies this output sends directly, in order
    pub fn replies(&self) -> Vec<&Reply> {
        self.steps
            .iter()
            .filter_map(|step| match step {
                Step::Send(reply)
                | Step::SendWithReactions { reply, .. }
                | Step::SendTransient { reply, .. } => Some(reply),
                _ => None,
            })
            .collect()
    }

    /// First embed sent, if any
    pub fn first_embed(&self) -> Option<&Embed> {
        self.replies().into_iter().find_map(|r| r.embed.as_ref())
    }

    /// First plain text sent, if any
    pub fn first_text(&self) -> Option<&str> {
        self.replies()
            .into_iter()
            .find_map(|r| r.content.as_deref())
    }
}

impl From<Reply> for CommandOutput {
    fn from(reply: Reply) -> Self {
        Self::reply(reply)
    }
}

impl From<Embed> for CommandOutput {
    fn from(embed: Embed) -> Self {
        Self::reply(embed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn purge_report_excludes_invoking_message() {
        let report = PurgeReport {
            channel_mention: "<#1>".into(),
            moderator_mention: "<@2>".into(),
        };
        let reply = report.render(6);
        let embed = reply.embed.unwrap();
        assert_eq!(embed.description.as_deref(), Some("Deleted 5 messages from <#1>"));
        assert_eq!(report.render(0).embed.unwrap().description.as_deref(), Some("Deleted 0 messages from <#1>"));
    }

    #[test]
    fn replies_skip_non_message_steps() {
        let output = CommandOutput::text("started")
            .then(Step::Wait(Duration::from_secs(1)))
            .then(Step::Send(Reply::embed(Embed::new("done"))));
        assert_eq!(output.replies().len(), 2);
        assert_eq!(output.first_text(), Some("started"));
        assert_eq!(output.first_embed().unwrap().title.as_deref(), Some("done"));
    }
}
