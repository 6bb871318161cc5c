//! `account`, `raids` and `wallet`.

use std::collections::HashMap;

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tyria_core::account::{Account, WalletEntry};
use tyria_core::card::{MessageCard, Reply};
use tyria_core::catalog::Catalog;
use tyria_core::currencies::{format_coins, group_ids};
use tyria_core::error::ApiError;
use tyria_core::permissions::Permission;
use tyria_core::rotations::raid_clears_current;
use tyria_core::types::GameId;
use tyria_db::models::reference::RaidEntry;
use tyria_db::repositories::{ReferenceRepo, UserRepo};
use tyria_gateway::Auth;

use super::{CommandError, Invocation, NoArgs};
use crate::state::AppState;

/// Wallet id of coin, shown as gold/silver/copper.
const COIN: GameId = 1;

pub async fn account(state: &AppState, inv: &Invocation) -> Result<Reply, CommandError> {
    let _: NoArgs = inv.args()?;
    let ring = UserRepo::key_ring(&state.pool, inv.user_id).await?;
    let account: Account = state
        .gateway
        .call("account", Auth::User(&ring), &[Permission::Account], None)
        .await?;

    let world = ReferenceRepo::get_by_ids(&state.pool, Catalog::Worlds, &[account.world])
        .await?
        .into_iter()
        .next()
        .and_then(|w| w.name)
        .unwrap_or_else(|| account.world.to_string());

    let mut card = MessageCard::new(account.name.clone())
        .field("World", world, true)
        .field("Commander tag", if account.commander { "Yes" } else { "No" }, true);
    if let Some(level) = account.fractal_level {
        card = card.field("Fractal level", level.to_string(), true);
    }
    if let Some(rank) = account.wvw_rank {
        card = card.field("WvW rank", rank.to_string(), true);
    }
    if !account.access.is_empty() {
        card = card.field("Access", account.access.join(", "), false);
    }
    card = card.field("Guilds", account.guilds.len().to_string(), true);
    if let Some(created) = account.created {
        card = card.footer(format!("Created {}", created.format("%Y-%m-%d")));
    }
    Ok(card.into())
}

#[derive(Debug, Deserialize)]
struct RaidDoc {
    #[serde(default)]
    wings: Vec<RaidWing>,
}

#[derive(Debug, Deserialize)]
struct RaidWing {
    id: String,
    #[serde(default)]
    events: Vec<RaidEvent>,
}

#[derive(Debug, Deserialize)]
struct RaidEvent {
    id: String,
}

/// `spirit_vale` -> `Spirit Vale`.
fn title_case(id: &str) -> String {
    id.split('_')
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// Wings of every cached raid, in cache order.
fn wings(raids: &[RaidEntry]) -> Vec<RaidWing> {
    raids
        .iter()
        .filter_map(|r| serde_json::from_value::<RaidDoc>(r.data.0.clone()).ok())
        .flat_map(|doc| doc.wings)
        .collect()
}

/// Display names of every cached raid wing, in order.
pub(crate) async fn wing_names(state: &AppState) -> Result<Vec<String>, CommandError> {
    let raids = ReferenceRepo::raids(&state.pool).await?;
    Ok(wings(&raids).iter().map(|w| title_case(&w.id)).collect())
}

fn raids_card(account: &str, raids: &[RaidEntry], cleared: &[String]) -> MessageCard {
    let wings = wings(raids);
    let total: usize = wings.iter().map(|w| w.events.len()).sum();
    let done = wings
        .iter()
        .flat_map(|w| &w.events)
        .filter(|e| cleared.contains(&e.id))
        .count();

    let mut card = MessageCard::new(format!("Raid clears of {account}"))
        .footer(format!("{done}/{total} encounters cleared this week"));
    for wing in &wings {
        let lines: Vec<String> = wing
            .events
            .iter()
            .map(|e| {
                let mark = if cleared.contains(&e.id) { "+" } else { "-" };
                format!("{mark} {}", title_case(&e.id))
            })
            .collect();
        card = card.field(title_case(&wing.id), lines.join("\n"), true);
    }
    card
}

fn decode<T: DeserializeOwned>(value: Option<Value>) -> Result<T, ApiError> {
    let value = value.ok_or_else(|| ApiError::Connection("missing response".into()))?;
    serde_json::from_value(value).map_err(|e| ApiError::Connection(format!("unexpected response: {e}")))
}

/// Raid clears are only trusted if the account changed since the weekly
/// reset; the publisher leaves stale clears in place otherwise.
pub async fn raids(state: &AppState, inv: &Invocation) -> Result<Reply, CommandError> {
    let _: NoArgs = inv.args()?;
    let ring = UserRepo::key_ring(&state.pool, inv.user_id).await?;
    let mut results = state
        .gateway
        .get_many::<Value>(
            &["account/raids", "account"],
            Auth::User(&ring),
            &[Permission::Account, Permission::Progression],
        )
        .await?
        .into_iter();
    let mut cleared: Vec<String> = decode(results.next())?;
    let account: Account = decode(results.next())?;

    let current = account
        .last_modified
        .is_some_and(|modified| raid_clears_current(modified, Utc::now()));
    if !current {
        cleared.clear();
    }

    let raids = ReferenceRepo::raids(&state.pool).await?;
    Ok(raids_card(&account.name, &raids, &cleared).into())
}

pub async fn wallet(state: &AppState, inv: &Invocation) -> Result<Reply, CommandError> {
    let _: NoArgs = inv.args()?;
    let ring = UserRepo::key_ring(&state.pool, inv.user_id).await?;
    let entries: Vec<WalletEntry> = state
        .gateway
        .call(
            "account/wallet",
            Auth::User(&ring),
            &[Permission::Account, Permission::Wallet],
            None,
        )
        .await?;

    let ids: Vec<GameId> = entries.iter().map(|e| e.id).collect();
    let names: HashMap<GameId, String> = ReferenceRepo::get_by_ids(&state.pool, Catalog::Currencies, &ids)
        .await?
        .into_iter()
        .filter_map(|c| Some((c.id, c.name?)))
        .collect();
    let amounts: HashMap<GameId, i64> = entries.iter().map(|e| (e.id, e.value)).collect();

    let account = ring.active().map(|k| k.account_name.clone()).unwrap_or_default();
    let mut card = MessageCard::new(format!("Wallet of {account}"));
    for (group, ids) in group_ids(&ids) {
        let lines: Vec<String> = ids
            .iter()
            .map(|id| {
                let name = names.get(id).cloned().unwrap_or_else(|| format!("Currency {id}"));
                let amount = amounts.get(id).copied().unwrap_or_default();
                let shown = if *id == COIN {
                    format_coins(amount)
                } else {
                    amount.to_string()
                };
                format!("{name}: {shown}")
            })
            .collect();
        card = card.field(group, lines.join("\n"), false);
    }
    Ok(card.into())
}
