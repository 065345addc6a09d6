//! play, pause, stop, queue (demo replies only, no audio)

use crate::builtin::PREMIUM_FOOTER;
use crate::context::Invocation;
use crate::error::CommandError;
use crate::output::CommandOutput;
use crate::reply::{Embed, colors};
use crate::table::{Category, CommandSpec, CommandTable, HandlerResult};

const SPOTIFY_GREEN: u32 = 0x1db954;

pub(crate) fn register(table: &mut CommandTable) -> Result<(), CommandError> {
    table.register(
        CommandSpec::new("play", "<song>", "Play music (Demo)", Category::Music),
        play,
    )?;
    table.register(
        CommandSpec::new("pause", "", "Pause music (Demo)", Category::Music),
        |_: &Invocation| {
            Ok(CommandOutput::reply(
                Embed::new("⏸️ Music Paused")
                    .description("Music playback has been paused.")
                    .color(0xffa500)
                    .footer(PREMIUM_FOOTER),
            ))
        },
    )?;
    table.register(
        CommandSpec::new("stop", "", "Stop music (Demo)", Category::Music),
        |_: &Invocation| {
            Ok(CommandOutput::reply(
                Embed::new("⏹️ Music Stopped")
                    .description("Music playback has been stopped.")
                    .color(colors::RED)
                    .footer(PREMIUM_FOOTER),
            ))
        },
    )?;
    table.register(
        CommandSpec::new("queue", "", "Show music queue (Demo)", Category::Music),
        |_: &Invocation| {
            Ok(CommandOutput::reply(
                Embed::new("🎵 Music Queue")
                    .description(
                        "**Now Playing:** Demo Song - 3:45\n\n**Up Next:**\n1. Another Demo Song - 4:12\n2. Third Demo Song - 2:58",
                    )
                    .color(SPOTIFY_GREEN)
                    .footer("🎉 Sistema de música premium disponible GRATIS!"),
            ))
        },
    )
}

fn play(inv: &Invocation) -> HandlerResult {
    let song = inv
        .args
        .text()
        .ok_or_else(|| CommandError::usage("Please specify a song to play!"))?;
    Ok(CommandOutput::reply(
        Embed::new("🎵 Now Playing (Demo)")
            .description(format!("**{}**", song))
            .color(SPOTIFY_GREEN)
            .field("Duration", "3:45", true)
            .field("Requested by", inv.author.mention(), true)
            .footer(PREMIUM_FOOTER),
    ))
}
