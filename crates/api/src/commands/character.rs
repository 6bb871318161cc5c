//! `character`.

use std::collections::HashMap;

use serde::Deserialize;
use tyria_core::card::{MessageCard, Reply, ACCENT_COLOR};
use tyria_core::catalog::Catalog;
use tyria_core::error::ApiError;
use tyria_core::permissions::Permission;
use tyria_core::professions;
use tyria_core::types::GameId;
use tyria_db::repositories::{ReferenceRepo, UserRepo};
use tyria_gateway::{endpoint, Auth};
use validator::Validate;

use super::{CommandError, Invocation};
use crate::state::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct CharacterArgs {
    #[validate(length(min = 3, max = 19))]
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct Character {
    pub name: String,
    pub race: String,
    pub profession: String,
    pub level: u32,
    /// Seconds played.
    #[serde(default)]
    pub age: u64,
    #[serde(default)]
    pub deaths: u64,
    #[serde(default)]
    pub equipment: Vec<EquipmentSlot>,
}

#[derive(Debug, Deserialize)]
pub struct EquipmentSlot {
    pub id: GameId,
    pub slot: String,
}

/// Order in which equipped gear is listed.
const SLOT_ORDER: [&str; 16] = [
    "Helm",
    "Shoulders",
    "Coat",
    "Gloves",
    "Leggings",
    "Boots",
    "WeaponA1",
    "WeaponA2",
    "WeaponB1",
    "WeaponB2",
    "Backpack",
    "Accessory1",
    "Accessory2",
    "Amulet",
    "Ring1",
    "Ring2",
];

fn slot_rank(slot: &str) -> usize {
    SLOT_ORDER.iter().position(|s| *s == slot).unwrap_or(SLOT_ORDER.len())
}

/// Character card tinted with the profession colour.
pub fn character_card(character: &Character, item_names: &HashMap<GameId, String>) -> MessageCard {
    let profession = professions::find(&character.profession);
    let mut card = MessageCard::new(character.name.clone())
        .color(profession.map_or(ACCENT_COLOR, |p| p.color))
        .field("Level", character.level.to_string(), true)
        .field("Race", character.race.clone(), true)
        .field("Profession", character.profession.clone(), true)
        .field("Played", format!("{} hours", character.age / 3600), true)
        .field("Deaths", character.deaths.to_string(), true);
    if let Some(p) = profession {
        card = card.field("Armor", p.armor, true);
    }

    let mut gear: Vec<&EquipmentSlot> = character
        .equipment
        .iter()
        .filter(|e| slot_rank(&e.slot) < SLOT_ORDER.len())
        .collect();
    gear.sort_by_key(|e| slot_rank(&e.slot));
    if !gear.is_empty() {
        let lines: Vec<String> = gear
            .iter()
            .map(|e| {
                let name = item_names
                    .get(&e.id)
                    .cloned()
                    .unwrap_or_else(|| e.id.to_string());
                format!("**{}**: {name}", e.slot)
            })
            .collect();
        card = card.field("Equipment", lines.join("\n"), false);
    }
    card
}

pub async fn character(state: &AppState, inv: &Invocation) -> Result<Reply, CommandError> {
    let args: CharacterArgs = inv.args()?;
    let name = args.name.trim();
    let ring = UserRepo::key_ring(&state.pool, inv.user_id).await?;
    let endpoint = endpoint(&["characters", name], &[]);
    let character: Character = match state
        .gateway
        .call(&endpoint, Auth::User(&ring), &[Permission::Characters], None)
        .await
    {
        Ok(c) => c,
        Err(ApiError::NotFound) => {
            return Ok(Reply::text(format!(
                "No character named \"{name}\" was found on your active account."
            )))
        }
        Err(e) => return Err(e.into()),
    };

    let ids: Vec<GameId> = character.equipment.iter().map(|e| e.id).collect();
    let item_names: HashMap<GameId, String> =
        ReferenceRepo::get_by_ids(&state.pool, Catalog::Items, &ids)
            .await?
            .into_iter()
            .filter_map(|e| e.name.map(|n| (e.id, n)))
            .collect();
    Ok(character_card(&character, &item_names).into())
}
