//! reverse, upper, lower, count

use crate::context::Invocation;
use crate::error::CommandError;
use crate::output::CommandOutput;
use crate::reply::Embed;
use crate::table::{Category, CommandSpec, CommandTable, HandlerResult};

pub(crate) fn register(table: &mut CommandTable) -> Result<(), CommandError> {
    table.register(
        CommandSpec::new("reverse", "<text>", "Reverse text", Category::Text),
        |inv: &Invocation| {
            let text = required_text(inv)?;
            let reversed: String = text.chars().rev().collect();
            Ok(transformed(inv, "🔄 Text Reverser", "Reversed", &reversed, 0x40e0d0))
        },
    )?;
    table.register(
        CommandSpec::new("upper", "<text>", "Convert to uppercase", Category::Text),
        |inv: &Invocation| {
            let text = required_text(inv)?;
            Ok(transformed(inv, "🔠 Uppercase", "Uppercase", &text.to_uppercase(), 0xff7f50))
        },
    )?;
    table.register(
        CommandSpec::new("lower", "<text>", "Convert to lowercase", Category::Text),
        |inv: &Invocation| {
            let text = required_text(inv)?;
            Ok(transformed(inv, "🔡 Lowercase", "Lowercase", &text.to_lowercase(), 0x98fb98))
        },
    )?;
    table.register(
        CommandSpec::new("count", "<text>", "Count characters/words", Category::Text),
        count,
    )
}

fn required_text(inv: &Invocation) -> Result<&str, CommandError> {
    inv.args
        .text()
        .ok_or_else(|| CommandError::usage(format!("Usage: `{}{} <text>`", inv.prefix, inv.name)))
}

fn transformed(inv: &Invocation, title: &str, label: &str, result: &str, color: u32) -> CommandOutput {
    CommandOutput::reply(
        Embed::new(title)
            .description(format!(
                "**Original:** {}\n**{}:** {}",
                inv.args.raw(),
                label,
                result
            ))
            .color(color),
    )
}

fn count(inv: &Invocation) -> HandlerResult {
    let text = required_text(inv)?;
    Ok(CommandOutput::reply(
        Embed::new("📊 Text Counter")
            .description(format!("**Text:** {}", text))
            .color(0xdda0dd)
            .field("Characters", text.chars().count(), true)
            .field("Words", text.split_whitespace().count(), true),
    ))
}
