//! avatar, userinfo, joined, created

use crate::builtin::{long_date, long_date_time};
use crate::context::Invocation;
use crate::error::CommandError;
use crate::output::CommandOutput;
use crate::reply::{Embed, colors};
use crate::table::{Category, CommandSpec, CommandTable, HandlerResult};

pub(crate) fn register(table: &mut CommandTable) -> Result<(), CommandError> {
    table.register(
        CommandSpec::new("avatar", "[@user]", "Show user's avatar", Category::User),
        avatar,
    )?;
    table.register(
        CommandSpec::new("userinfo", "[@user]", "Get user information", Category::User),
        userinfo,
    )?;
    table.register(
        CommandSpec::new("joined", "[@user]", "When user joined server", Category::User)
            .guild_only(),
        joined,
    )?;
    table.register(
        CommandSpec::new("created", "[@user]", "When user created account", Category::User),
        created,
    )
}

fn avatar(inv: &Invocation) -> HandlerResult {
    let target = inv.member_or_author(0)?;
    Ok(CommandOutput::reply(
        Embed::new(format!("🖼️ {}'s Avatar", target.display_name))
            .color(target.color())
            .image(&target.avatar_url),
    ))
}

fn userinfo(inv: &Invocation) -> HandlerResult {
    let target = inv.member_or_author(0)?;
    let discriminator = target.discriminator.as_deref().unwrap_or("0");
    let top_role = target
        .top_role
        .as_ref()
        .map(|role| role.mention())
        .unwrap_or_else(|| "@everyone".to_string());
    let joined = target
        .joined_at
        .as_ref()
        .map(long_date)
        .unwrap_or_else(|| "Unknown".to_string());

    Ok(CommandOutput::reply(
        Embed::new(format!("👤 User Info: {}", target.display_name))
            .color(target.color())
            .thumbnail(&target.avatar_url)
            .field("Username", &target.username, true)
            .field("Discriminator", format!("#{}", discriminator), true)
            .field("ID", &target.id, true)
            .field("Bot", if target.bot { "Yes" } else { "No" }, true)
            .field("Highest Role", top_role, true)
            .field("Joined Server", joined, true)
            .field("Account Created", long_date(&target.created_at), true),
    ))
}

fn joined(inv: &Invocation) -> HandlerResult {
    let target = inv.member_or_author(0)?;
    let when = target
        .joined_at
        .as_ref()
        .map(long_date_time)
        .unwrap_or_else(|| "an unknown date".to_string());
    Ok(CommandOutput::reply(
        Embed::new("📅 Join Date")
            .description(format!("{} joined on {}", target.mention(), when))
            .color(colors::GREEN),
    ))
}

fn created(inv: &Invocation) -> HandlerResult {
    let target = inv.member_or_author(0)?;
    Ok(CommandOutput::reply(
        Embed::new("🎂 Account Creation")
            .description(format!(
                "{}'s account was created on {}",
                target.mention(),
                long_date_time(&target.created_at)
            ))
            .color(colors::BLUE),
    ))
}
