//! poll, timer, remind, weather

use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;

use crate::builtin::title_case;
use crate::context::Invocation;
use crate::error::CommandError;
use crate::output::{CommandOutput, Step};
use crate::reply::{Embed, Reply, colors};
use crate::table::{Category, CommandSpec, CommandTable, HandlerResult};

const MAX_TIMER_SECS: i64 = 3600;
const MAX_REMINDER: Duration = Duration::from_secs(7 * 86_400);

static REMIND_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^(\d+)([smhd])").ok());

pub(crate) fn register(table: &mut CommandTable) -> Result<(), CommandError> {
    table.register(
        CommandSpec::new("poll", "<question>", "Create a yes/no poll", Category::Utility),
        poll,
    )?;
    table.register(
        CommandSpec::new("timer", "<seconds>", "Set a timer", Category::Utility),
        timer,
    )?;
    table.register(
        CommandSpec::new(
            "remind",
            "<time> <message>",
            "Set reminder (e.g., !remind 5m message)",
            Category::Utility,
        ),
        remind,
    )?;
    table.register(
        CommandSpec::new("weather", "<city>", "Get weather info", Category::Utility),
        weather,
    )
}

fn poll(inv: &Invocation) -> HandlerResult {
    let question = inv
        .args
        .text()
        .ok_or_else(|| CommandError::usage(format!("Usage: `{}poll <question>`", inv.prefix)))?;
    let reply = Reply::embed(
        Embed::new("📊 Poll")
            .description(question)
            .color(colors::BLUE)
            .footer(format!("Poll created by {}", inv.author.display_name)),
    );
    Ok(CommandOutput::default().then(Step::SendWithReactions {
        reply,
        reactions: vec!["👍".to_string(), "👎".to_string()],
    }))
}

fn timer(inv: &Invocation) -> HandlerResult {
    let seconds = inv
        .args
        .parse::<i64>(0)
        .ok()
        .flatten()
        .filter(|s| (1..=MAX_TIMER_SECS).contains(s))
        .ok_or_else(|| {
            CommandError::usage(format!(
                "Set a timer between 1 and 3600 seconds! Usage: `{}timer <seconds>`",
                inv.prefix
            ))
        })?;

    Ok(CommandOutput::reply(
        Embed::new("⏰ Timer Started")
            .description(format!("Timer set for {} seconds!", seconds))
            .color(colors::ORANGE),
    )
    .then(Step::Wait(Duration::from_secs(seconds as u64)))
    .then(Step::Send(Reply::embed(
        Embed::new("⏰ Timer Finished")
            .description(format!(
                "{} Your {} second timer is done!",
                inv.author.mention(),
                seconds
            ))
            .color(colors::GREEN),
    ))))
}

/// Parse `<n>[smhd]`; anything after the unit is ignored
pub(crate) fn parse_reminder_delay(spec: &str) -> Option<Duration> {
    let lowered = spec.to_lowercase();
    let caps = REMIND_PATTERN.as_ref()?.captures(&lowered)?;
    let amount: u64 = caps[1].parse().unwrap_or(u64::MAX);
    let unit = match &caps[2] {
        "s" => 1,
        "m" => 60,
        "h" => 3_600,
        _ => 86_400,
    };
    Some(Duration::from_secs(amount.saturating_mul(unit)))
}

fn remind(inv: &Invocation) -> HandlerResult {
    let usage = || {
        CommandError::usage(format!(
            "Usage: `{p}remind <time> <message>`\nExample: `{p}remind 5m Take a break`",
            p = inv.prefix
        ))
    };
    let when = inv.args.get(0).ok_or_else(usage)?;
    let message = inv.args.rest_after(1).ok_or_else(usage)?;

    let delay = parse_reminder_delay(when)
        .ok_or_else(|| CommandError::invalid("Invalid time format! Use: 5s, 10m, 2h, 1d"))?;
    if delay > MAX_REMINDER {
        return Err(CommandError::invalid("Maximum reminder time is 7 days!"));
    }

    Ok(CommandOutput::reply(
        Embed::new("⏰ Reminder Set")
            .description(format!("I'll remind you in {}: {}", when, message))
            .color(colors::ORANGE),
    )
    .then(Step::Wait(delay))
    .then(Step::Send(Reply::embed(
        Embed::new("⏰ Reminder")
            .description(format!("{} {}", inv.author.mention(), message))
            .color(colors::GREEN),
    ))))
}

fn weather(inv: &Invocation) -> HandlerResult {
    let city = inv
        .args
        .text()
        .ok_or_else(|| CommandError::usage(format!("Usage: `{}weather <city>`", inv.prefix)))?;
    Ok(CommandOutput::reply(
        Embed::new(format!("🌤️ Weather in {}", title_case(city)))
            .description("Weather API integration needed for real data.\nThis is a demo bot!")
            .color(0x87ceeb)
            .field("Temperature", "22°C / 72°F", true)
            .field("Condition", "Partly Cloudy", true)
            .field("Humidity", "65%", true)
            .footer("Demo data - not real weather!"),
    ))
}
