//! shorten, password, qr, base64

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use rand::Rng;

use crate::builtin::PREMIUM_FOOTER;
use crate::context::Invocation;
use crate::error::CommandError;
use crate::output::CommandOutput;
use crate::reply::{Embed, colors};
use crate::table::{Category, CommandSpec, CommandTable, HandlerResult};

const SHORT_ID_CHARS: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const PASSWORD_CHARS: &[u8] =
    b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789!@#$%^&*";

pub(crate) fn register(table: &mut CommandTable) -> Result<(), CommandError> {
    table.register(
        CommandSpec::new("shorten", "<url>", "Create short URL", Category::Tools),
        shorten,
    )?;
    table.register(
        CommandSpec::new("password", "[length]", "Generate secure password", Category::Tools),
        password,
    )?;
    table.register(
        CommandSpec::new("qr", "<text>", "Generate QR code", Category::Tools),
        qr,
    )?;
    table.register(
        CommandSpec::new(
            "base64",
            "<encode/decode> <text>",
            "Base64 encoding/decoding",
            Category::Tools,
        ),
        base64_command,
    )
}

fn random_string(alphabet: &[u8], len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| alphabet[rng.gen_range(0..alphabet.len())] as char)
        .collect()
}

fn shorten(inv: &Invocation) -> HandlerResult {
    let url = inv
        .args
        .get(0)
        .ok_or_else(|| CommandError::usage(format!("Usage: `{}shorten <url>`", inv.prefix)))?;
    let short_id = random_string(SHORT_ID_CHARS, 6);
    Ok(CommandOutput::reply(
        Embed::new("🔗 URL Shortener")
            .description(format!(
                "**Original:** {}\n**Shortened:** https://short.ly/{}",
                url, short_id
            ))
            .color(colors::BLUE)
            .footer("🎉 Acortador de URLs premium disponible GRATIS durante mantenimiento!"),
    ))
}

fn password(inv: &Invocation) -> HandlerResult {
    let length: i64 = inv.args.parse(0)?.unwrap_or(12);
    if !(4..=50).contains(&length) {
        return Err(CommandError::invalid(
            "Password length must be between 4 and 50 characters!",
        ));
    }
    let generated = random_string(PASSWORD_CHARS, length as usize);
    Ok(CommandOutput::reply(
        Embed::new("🔐 Password Generator")
            .description(format!("Generated password: `{}`", generated))
            .color(0xff6b6b)
            .footer("Keep this password safe!"),
    ))
}

fn qr(inv: &Invocation) -> HandlerResult {
    let text = inv
        .args
        .text()
        .ok_or_else(|| CommandError::usage(format!("Usage: `{}qr <text>`", inv.prefix)))?;
    Ok(CommandOutput::reply(
        Embed::new("📱 QR Code Generator")
            .description(format!(
                "QR code for: **{}**\n\n(Real QR generation requires additional libraries)",
                text
            ))
            .color(0x000000)
            .footer(PREMIUM_FOOTER),
    ))
}

fn base64_command(inv: &Invocation) -> HandlerResult {
    let usage =
        || CommandError::usage(format!("Usage: `{}base64 <encode/decode> <text>`", inv.prefix));
    let operation = inv.args.get(0).ok_or_else(usage)?.to_lowercase();
    let text = inv.args.rest_after(1).ok_or_else(usage)?;

    let (title, output) = match operation.as_str() {
        "encode" => ("📤 Base64 Encode", STANDARD.encode(text.as_bytes())),
        "decode" => {
            let decoded = STANDARD
                .decode(text.as_bytes())
                .ok()
                .and_then(|bytes| String::from_utf8(bytes).ok())
                .ok_or_else(|| CommandError::invalid("Invalid input for base64 operation!"))?;
            ("📥 Base64 Decode", decoded)
        }
        _ => {
            return Err(CommandError::invalid(
                "Operation must be 'encode' or 'decode'!",
            ));
        }
    };

    Ok(CommandOutput::reply(
        Embed::new(title)
            .description(format!("**Input:** {}\n**Output:** {}", text, output))
            .color(0x6495ed),
    ))
}
