//! Executes command steps against the chat API

use botrunner_commands::{CommandOutput, Embed, Reply, Step, colors};
use tracing::{debug, warn};

use crate::error::ApiError;
use crate::gateway::ChatApi;

/// Run every step of `output` in order in `channel_id`
///
/// A failed send ends the invocation. Direct messages are best effort.
pub async fn execute(api: &dyn ChatApi, channel_id: &str, output: CommandOutput) {
    for step in output.steps {
        if let Err(e) = run_step(api, channel_id, step).await {
            warn!(channel_id, error = %e, "Command step failed");
            return;
        }
    }
}

async fn run_step(api: &dyn ChatApi, channel_id: &str, step: Step) -> Result<(), ApiError> {
    match step {
        Step::Send(reply) => {
            api.send_message(channel_id, &reply).await?;
        }
        Step::SendWithReactions { reply, reactions } => {
            let message_id = api.send_message(channel_id, &reply).await?;
            for emoji in reactions {
                api.add_reaction(channel_id, &message_id, &emoji).await?;
            }
        }
        Step::SendTransient { reply, ttl } => {
            let message_id = api.send_message(channel_id, &reply).await?;
            tokio::time::sleep(ttl).await;
            api.delete_message(channel_id, &message_id).await?;
        }
        Step::Wait(duration) => tokio::time::sleep(duration).await,
        Step::DirectMessage { user_id, reply } => {
            if let Err(e) = api.send_direct_message(&user_id, &reply).await {
                debug!(user_id, error = %e, "Direct message not delivered");
            }
        }
        Step::Moderate {
            action,
            success,
            failure,
        } => {
            let reply = match api.moderate(&action).await {
                Ok(()) => success,
                Err(e) => {
                    debug!(?action, error = %e, "Moderation call rejected");
                    failure
                }
            };
            api.send_message(channel_id, &reply).await?;
        }
        Step::Purge {
            limit,
            report,
            report_ttl,
        } => match api.purge(channel_id, limit).await {
            Ok(deleted) => {
                let message_id = api.send_message(channel_id, &report.render(deleted)).await?;
                tokio::time::sleep(report_ttl).await;
                api.delete_message(channel_id, &message_id).await?;
            }
            Err(e) => {
                warn!(channel_id, error = %e, "Purge failed");
                api.send_message(channel_id, &failure_reply(&e)).await?;
            }
        },
    }
    Ok(())
}

fn failure_reply(error: &ApiError) -> Reply {
    Reply::embed(
        Embed::new("❌ Error")
            .description(format!("An error occurred: {}", error))
            .color(colors::RED),
    )
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use botrunner_commands::{ModAction, PurgeReport};

    use super::*;
    use crate::gateway::mock::{ApiCall, RecordingChatApi};

    fn kick_step() -> Step {
        Step::Moderate {
            action: ModAction::Kick {
                guild_id: "1".into(),
                user_id: "2".into(),
                reason: "spam".into(),
            },
            success: Reply::text("kicked"),
            failure: Reply::text("I don't have permission to kick this user!"),
        }
    }

    #[tokio::test]
    async fn reactions_follow_their_message() {
        let api = RecordingChatApi::new();
        let output = CommandOutput::default().then(Step::SendWithReactions {
            reply: Reply::text("poll"),
            reactions: vec!["👍".into(), "👎".into()],
        });
        execute(&api, "9", output).await;

        assert_eq!(
            api.calls(),
            vec![
                ApiCall::Send {
                    channel_id: "9".into(),
                    reply: Reply::text("poll")
                },
                ApiCall::React {
                    message_id: "1".into(),
                    emoji: "👍".into()
                },
                ApiCall::React {
                    message_id: "1".into(),
                    emoji: "👎".into()
                },
            ]
        );
    }

    #[tokio::test]
    async fn moderation_outcome_picks_reply() {
        let api = RecordingChatApi::new();
        execute(&api, "9", CommandOutput::default().then(kick_step())).await;
        assert_eq!(api.sent(), vec![Reply::text("kicked")]);

        let api = RecordingChatApi::new();
        api.fail_moderation(true);
        execute(&api, "9", CommandOutput::default().then(kick_step())).await;
        assert_eq!(
            api.sent(),
            vec![Reply::text("I don't have permission to kick this user!")]
        );
    }

    #[tokio::test]
    async fn failed_direct_message_does_not_stop_output() {
        let api = RecordingChatApi::new();
        api.fail_direct_messages(true);
        let output = CommandOutput::default()
            .then(Step::DirectMessage {
                user_id: "2".into(),
                reply: Reply::text("warned"),
            })
            .then(Step::Send(Reply::text("after")));
        execute(&api, "9", output).await;
        assert_eq!(api.sent(), vec![Reply::text("after")]);
    }

    #[tokio::test]
    async fn failed_send_stops_remaining_steps() {
        let api = RecordingChatApi::new();
        api.fail_sends(true);
        let output = CommandOutput::text("one").then(Step::Moderate {
            action: ModAction::Unban {
                guild_id: "1".into(),
                user_id: "2".into(),
            },
            success: Reply::text("ok"),
            failure: Reply::text("no"),
        });
        execute(&api, "9", output).await;
        assert!(api.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn purge_report_is_transient() {
        let api = RecordingChatApi::new();
        let output = CommandOutput::default().then(Step::Purge {
            limit: 6,
            report: PurgeReport {
                channel_mention: "<#9>".into(),
                moderator_mention: "<@1>".into(),
            },
            report_ttl: Duration::from_secs(5),
        });
        execute(&api, "9", output).await;

        let calls = api.calls();
        assert_eq!(
            calls[0],
            ApiCall::Purge {
                channel_id: "9".into(),
                limit: 6
            }
        );
        let ApiCall::Send { reply, .. } = &calls[1] else {
            panic!("expected report, got {:?}", calls[1]);
        };
        assert_eq!(
            reply.embed.as_ref().unwrap().description.as_deref(),
            Some("Deleted 5 messages from <#9>")
        );
        assert_eq!(calls[2], ApiCall::Delete { message_id: "1".into() });
    }
}
