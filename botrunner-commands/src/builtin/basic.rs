//! ping, info, server

use crate::builtin::long_date;
use crate::context::{Invocation, default_avatar_url};
use crate::error::CommandError;
use crate::output::CommandOutput;
use crate::reply::{Embed, colors};
use crate::table::{Category, CommandSpec, CommandTable, HandlerResult};

pub(crate) fn register(table: &mut CommandTable) -> Result<(), CommandError> {
    table.register(
        CommandSpec::new("ping", "", "Check bot latency", Category::Basic),
        ping,
    )?;
    table.register(
        CommandSpec::new("info", "", "Show bot information", Category::Basic),
        info,
    )?;
    table.register(
        CommandSpec::new("server", "", "Show server information", Category::Basic).guild_only(),
        server,
    )
}

fn ping(inv: &Invocation) -> HandlerResult {
    Ok(CommandOutput::reply(
        Embed::new("🏓 Pong!")
            .description(format!("Bot latency: {}ms", inv.bot.latency_ms()))
            .color(colors::GREEN),
    ))
}

fn info(inv: &Invocation) -> HandlerResult {
    let bot = &inv.bot;
    let thumbnail = bot
        .avatar_url
        .clone()
        .unwrap_or_else(|| default_avatar_url(&bot.id));
    Ok(CommandOutput::reply(
        Embed::new("🤖 Bot Information")
            .color(colors::PURPLE)
            .field("Bot Name", &bot.name, true)
            .field("Bot ID", &bot.id, true)
            .field("Servers", bot.guilds, true)
            .field("Total Users", bot.users, true)
            .field("Latency", format!("{}ms", bot.latency_ms()), true)
            .field("Version", env!("CARGO_PKG_VERSION"), true)
            .thumbnail(thumbnail)
            .footer("Powered by Discord Bot Runner"),
    ))
}

fn server(inv: &Invocation) -> HandlerResult {
    let guild = inv.guild()?;
    let owner = guild
        .owner_id
        .as_ref()
        .map(|id| format!("<@{}>", id))
        .unwrap_or_else(|| "Unknown".to_string());

    let mut embed = Embed::new(format!("🏠 {}", guild.name))
        .description("Server Information")
        .color(0xff6b35)
        .field("Server ID", &guild.id, true)
        .field("Owner", owner, true)
        .field("Members", guild.member_count, true)
        .field("Text Channels", guild.text_channels, true)
        .field("Voice Channels", guild.voice_channels, true)
        .field("Created", long_date(&guild.created_at), true);
    if let Some(icon) = &guild.icon_url {
        embed = embed.thumbnail(icon);
    }
    Ok(CommandOutput::reply(embed))
}
