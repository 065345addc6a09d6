//! Built-in command plugins
//!
//! Each submodule registers one help category worth of commands. `help` is
//! registered last so its catalog covers everything else.

use std::sync::Arc;

use rand::seq::SliceRandom;

use crate::error::CommandError;
use crate::table::CommandTable;

mod basic;
mod economy;
mod fun;
mod games;
mod help;
mod math;
mod moderation;
mod music;
mod random;
mod text;
mod tools;
mod user;
mod utility;

pub use economy::{Ledger, LedgerError};
pub use math::{CalcError, evaluate};

/// Footer shown on the demo "premium" commands
pub(crate) const PREMIUM_FOOTER: &str =
    "🎉 Función premium disponible GRATIS durante mantenimiento!";

/// Register every built-in plugin, each with fresh plugin state
pub fn register_all(table: &mut CommandTable) -> Result<(), CommandError> {
    basic::register(table)?;
    fun::register(table)?;
    games::register(table)?;
    user::register(table)?;
    utility::register(table)?;
    tools::register(table)?;
    random::register(table)?;
    math::register(table)?;
    text::register(table)?;
    moderation::register(table)?;
    music::register(table)?;
    economy::register(table, Arc::new(Ledger::default()))?;
    help::register(table)
}

/// Uniformly chosen element of a non-empty constant list
pub(crate) fn pick<T: Copy + Default>(items: &[T]) -> T {
    items
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or_default()
}

/// Capitalize the first letter of each word and lowercase the rest
pub(crate) fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut at_word_start = true;
    for c in text.chars() {
        if c.is_alphabetic() {
            if at_word_start {
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(c);
            at_word_start = true;
        }
    }
    out
}

/// Long date, e.g. `January 05, 2024`
pub(crate) fn long_date(ts: &chrono::DateTime<chrono::Utc>) -> String {
    ts.format("%B %d, %Y").to_string()
}

/// Long date and time, e.g. `January 05, 2024 at 03:07 PM`
pub(crate) fn long_date_time(ts: &chrono::DateTime<chrono::Utc>) -> String {
    ts.format("%B %d, %Y at %I:%M %p").to_string()
}
