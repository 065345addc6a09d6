//! kick, ban, unban, clear, warn
//!
//! Handlers only describe the moderation call; the session performs it and
//! picks the success or failure reply from the outcome.

use std::time::Duration;

use crate::context::{Invocation, Permissions, UserProfile};
use crate::error::CommandError;
use crate::output::{CommandOutput, ModAction, PurgeReport, Step};
use crate::reply::{Embed, Reply, colors};
use crate::table::{Category, CommandSpec, CommandTable, HandlerResult};

const DEFAULT_REASON: &str = "No reason provided";
const PURGE_REPORT_TTL: Duration = Duration::from_secs(5);
const MAX_PURGE: i64 = 100;

pub(crate) fn register(table: &mut CommandTable) -> Result<(), CommandError> {
    table.register(
        CommandSpec::new("kick", "[@user] [reason]", "Kick a user (Admin only)", Category::Security)
            .requires(Permissions::KICK_MEMBERS)
            .guild_only(),
        kick,
    )?;
    table.register(
        CommandSpec::new("ban", "[@user] [reason]", "Ban a user (Admin only)", Category::Security)
            .requires(Permissions::BAN_MEMBERS)
            .guild_only(),
        ban,
    )?;
    table.register(
        CommandSpec::new("unban", "<user_id>", "Unban a user (Admin only)", Category::Security)
            .requires(Permissions::BAN_MEMBERS)
            .guild_only(),
        unban,
    )?;
    table.register(
        CommandSpec::new("clear", "<amount>", "Delete messages (Admin only)", Category::Security)
            .requires(Permissions::MANAGE_MESSAGES)
            .guild_only(),
        clear,
    )?;
    table.register(
        CommandSpec::new("warn", "[@user] <reason>", "Warn a user (Admin only)", Category::Security)
            .requires(Permissions::MANAGE_MESSAGES)
            .guild_only(),
        warn,
    )
}

/// Target in slot 0 plus the reason text after it
fn target_and_reason<'a>(
    inv: &'a Invocation,
    verb: &str,
) -> Result<(&'a UserProfile, &'a str), CommandError> {
    let target = inv
        .member_arg(0)?
        .ok_or_else(|| CommandError::usage(format!("Please specify a user to {}!", verb)))?;
    let reason = inv.args.rest_after(1).unwrap_or(DEFAULT_REASON);
    Ok((target, reason))
}

/// Moderators may only act on members ranked strictly below them
fn check_hierarchy(inv: &Invocation, target: &UserProfile, verb: &str) -> Result<(), CommandError> {
    if target.role_rank() >= inv.author.role_rank() {
        return Err(CommandError::invalid(format!(
            "You cannot {} someone with a higher or equal role!",
            verb
        )));
    }
    Ok(())
}

fn kick(inv: &Invocation) -> HandlerResult {
    let guild = inv.guild()?;
    let (target, reason) = target_and_reason(inv, "kick")?;
    check_hierarchy(inv, target, "kick")?;

    Ok(CommandOutput::default().then(Step::Moderate {
        action: ModAction::Kick {
            guild_id: guild.id.clone(),
            user_id: target.id.clone(),
            reason: reason.to_string(),
        },
        success: Reply::embed(
            Embed::new("👢 User Kicked")
                .description(format!("{} has been kicked from the server.", target.mention()))
                .color(0xff6b35)
                .field("Reason", reason, false)
                .field("Moderator", inv.author.mention(), true),
        ),
        failure: Reply::text("I don't have permission to kick this user!"),
    }))
}

fn ban(inv: &Invocation) -> HandlerResult {
    let guild = inv.guild()?;
    let (target, reason) = target_and_reason(inv, "ban")?;
    check_hierarchy(inv, target, "ban")?;

    Ok(CommandOutput::default().then(Step::Moderate {
        action: ModAction::Ban {
            guild_id: guild.id.clone(),
            user_id: target.id.clone(),
            reason: reason.to_string(),
        },
        success: Reply::embed(
            Embed::new("🔨 User Banned")
                .description(format!("{} has been banned from the server.", target.mention()))
                .color(colors::RED)
                .field("Reason", reason, false)
                .field("Moderator", inv.author.mention(), true),
        ),
        failure: Reply::text("I don't have permission to ban this user!"),
    }))
}

fn unban(inv: &Invocation) -> HandlerResult {
    let guild = inv.guild()?;
    let user_id = inv
        .args
        .parse::<u64>(0)
        .ok()
        .flatten()
        .filter(|id| *id != 0)
        .ok_or_else(|| CommandError::usage("Please provide a user ID to unban!"))?;

    Ok(CommandOutput::default().then(Step::Moderate {
        action: ModAction::Unban {
            guild_id: guild.id.clone(),
            user_id: user_id.to_string(),
        },
        success: Reply::embed(
            Embed::new("✅ User Unbanned")
                .description(format!("<@{}> has been unbanned from the server.", user_id))
                .color(colors::GREEN)
                .field("Moderator", inv.author.mention(), true),
        ),
        failure: Reply::text("Could not unban that user!"),
    }))
}

fn clear(inv: &Invocation) -> HandlerResult {
    let amount = inv
        .args
        .parse::<i64>(0)
        .ok()
        .flatten()
        .filter(|n| (1..=MAX_PURGE).contains(n))
        .ok_or_else(|| CommandError::invalid("Please specify a number between 1 and 100!"))?;

    // +1 covers the invoking message itself
    Ok(CommandOutput::default().then(Step::Purge {
        limit: amount as u32 + 1,
        report: PurgeReport {
            channel_mention: format!("<#{}>", inv.channel_id),
            moderator_mention: inv.author.mention(),
        },
        report_ttl: PURGE_REPORT_TTL,
    }))
}

fn warn(inv: &Invocation) -> HandlerResult {
    let guild = inv.guild()?;
    let (target, reason) = target_and_reason(inv, "warn")?;

    Ok(CommandOutput::reply(
        Embed::new("⚠️ User Warning")
            .description(format!("{} has been warned.", target.mention()))
            .color(0xffa500)
            .field("Reason", reason, false)
            .field("Moderator", inv.author.mention(), true),
    )
    .then(Step::DirectMessage {
        user_id: target.id.clone(),
        reply: Reply::embed(
            Embed::new("⚠️ Warning")
                .description(format!("You have been warned in {}", guild.name))
                .color(0xffa500)
                .field("Reason", reason, false),
        ),
    }))
}
