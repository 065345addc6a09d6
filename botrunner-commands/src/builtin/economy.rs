//! balance, daily, give, shop
//!
//! Balances live in a [`Ledger`] owned by the plugin instance. Nothing is
//! persisted; a new command table starts with an empty ledger.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::NaiveDate;
use rand::Rng;
use thiserror::Error;

use crate::context::Invocation;
use crate::error::CommandError;
use crate::output::CommandOutput;
use crate::reply::{Embed, colors};
use crate::table::{Category, CommandSpec, CommandTable};

/// Inclusive range of the daily reward
pub const DAILY_REWARD: std::ops::RangeInclusive<u64> = 50..=200;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LedgerError {
    #[error("already claimed on {0}")]
    AlreadyClaimed(NaiveDate),
    #[error("insufficient funds: have {have}, need {need}")]
    InsufficientFunds { have: u64, need: u64 },
}

#[derive(Default)]
struct LedgerState {
    balances: HashMap<String, u64>,
    last_claim: HashMap<String, NaiveDate>,
}

/// In-memory coin balances keyed by user id
#[derive(Default)]
pub struct Ledger {
    state: Mutex<LedgerState>,
}

impl Ledger {
    fn lock(&self) -> MutexGuard<'_, LedgerState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn balance(&self, user_id: &str) -> u64 {
        self.lock().balances.get(user_id).copied().unwrap_or(0)
    }

    /// Credit `reward` once per calendar day; returns the new balance
    pub fn claim_daily(&self, user_id: &str, today: NaiveDate, reward: u64) -> Result<u64, LedgerError> {
        let mut state = self.lock();
        if state.last_claim.get(user_id) == Some(&today) {
            return Err(LedgerError::AlreadyClaimed(today));
        }
        state.last_claim.insert(user_id.to_string(), today);
        let balance = state.balances.entry(user_id.to_string()).or_insert(0);
        *balance += reward;
        Ok(*balance)
    }

    /// Move coins between two users atomically
    pub fn transfer(&self, from: &str, to: &str, amount: u64) -> Result<(), LedgerError> {
        let mut state = self.lock();
        let have = state.balances.get(from).copied().unwrap_or(0);
        if have < amount {
            return Err(LedgerError::InsufficientFunds { have, need: amount });
        }
        state.balances.insert(from.to_string(), have - amount);
        *state.balances.entry(to.to_string()).or_insert(0) += amount;
        Ok(())
    }
}

pub(crate) fn register(table: &mut CommandTable, ledger: Arc<Ledger>) -> Result<(), CommandError> {
    let balances = Arc::clone(&ledger);
    table.register(
        CommandSpec::new("balance", "[@user]", "Check coin balance", Category::Economy),
        move |inv: &Invocation| {
            let target = inv.member_or_author(0)?;
            Ok(CommandOutput::reply(
                Embed::new("💰 Coin Balance")
                    .description(format!(
                        "{} has **{}** coins!",
                        target.mention(),
                        balances.balance(&target.id)
                    ))
                    .color(colors::GOLD),
            ))
        },
    )?;

    let claims = Arc::clone(&ledger);
    table.register(
        CommandSpec::new("daily", "", "Claim daily coins", Category::Economy),
        move |inv: &Invocation| {
            let reward = rand::thread_rng().gen_range(DAILY_REWARD);
            let embed = match claims.claim_daily(&inv.author.id, inv.now.date_naive(), reward) {
                Ok(balance) => Embed::new("💰 Daily Reward Claimed!")
                    .description(format!(
                        "You received **{}** coins!\nNew balance: **{}** coins",
                        reward, balance
                    ))
                    .color(colors::GREEN),
                Err(_) => Embed::new("💰 Daily Reward")
                    .description(
                        "You've already claimed your daily reward today! Come back tomorrow.",
                    )
                    .color(colors::RED),
            };
            Ok(CommandOutput::reply(embed))
        },
    )?;

    table.register(
        CommandSpec::new("give", "[@user] <amount>", "Give coins to user", Category::Economy),
        move |inv: &Invocation| {
            let usage = || CommandError::usage(format!("Usage: `{}give @user <amount>`", inv.prefix));
            let target = inv.member_arg(0)?.ok_or_else(usage)?;
            let amount = inv.args.parse::<i64>(1)?.filter(|n| *n != 0).ok_or_else(usage)?;
            if amount < 0 {
                return Err(CommandError::invalid("Amount must be positive!"));
            }
            if target.id == inv.author.id {
                return Err(CommandError::invalid("You can't give coins to yourself!"));
            }
            ledger
                .transfer(&inv.author.id, &target.id, amount as u64)
                .map_err(|_| CommandError::invalid("You don't have enough coins!"))?;

            Ok(CommandOutput::reply(
                Embed::new("💰 Coins Transferred")
                    .description(format!(
                        "{} gave **{}** coins to {}!",
                        inv.author.mention(),
                        amount,
                        target.mention()
                    ))
                    .color(colors::GREEN),
            ))
        },
    )?;

    table.register(
        CommandSpec::new("shop", "", "View the coin shop", Category::Economy),
        |_: &Invocation| {
            Ok(CommandOutput::reply(
                Embed::new("🛒 Coin Shop")
                    .description("Welcome to the coin shop! (Demo)")
                    .color(colors::PURPLE)
                    .field("🎭 Custom Role", "500 coins", true)
                    .field("🏆 VIP Status", "1000 coins", true)
                    .field("🌟 Special Badge", "750 coins", true)
                    .footer("🎉 Tienda premium disponible GRATIS durante mantenimiento!"),
            ))
        },
    )
}
