//! Daily achievements and the snapshot compiled at each reset.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::card::MessageCard;
use crate::pact_supply::AgentLocation;
use crate::types::GameId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct LevelRange {
    pub min: u32,
    pub max: u32,
}

/// One entry of `achievements/daily`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DailyEntry {
    pub id: GameId,
    pub level: LevelRange,
}

/// Response shape of `achievements/daily` and `achievements/daily/tomorrow`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DailyResponse {
    #[serde(default)]
    pub pve: Vec<DailyEntry>,
    #[serde(default)]
    pub pvp: Vec<DailyEntry>,
    #[serde(default)]
    pub wvw: Vec<DailyEntry>,
    #[serde(default)]
    pub fractals: Vec<DailyEntry>,
    #[serde(default)]
    pub special: Vec<DailyEntry>,
}

impl DailyResponse {
    /// Every achievement id referenced, for a single cache lookup.
    pub fn all_ids(&self) -> Vec<GameId> {
        let mut ids: Vec<GameId> = [&self.pve, &self.pvp, &self.wvw, &self.fractals, &self.special]
            .into_iter()
            .flatten()
            .map(|e| e.id)
            .collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }
}

/// Named dailies for one day, by category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompiledDailies {
    pub pve: Vec<String>,
    pub pvp: Vec<String>,
    pub wvw: Vec<String>,
    pub fractals: Vec<String>,
    pub special: Vec<String>,
}

impl CompiledDailies {
    pub fn categories(&self) -> [(&'static str, &[String]); 5] {
        [
            ("PvE", &self.pve),
            ("PvP", &self.pvp),
            ("WvW", &self.wvw),
            ("Fractals", &self.fractals),
            ("Special", &self.special),
        ]
    }
}

fn names_for(
    entries: &[DailyEntry],
    names: &HashMap<GameId, String>,
    keep: impl Fn(&str) -> bool,
) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for entry in entries.iter().filter(|e| e.level.max == 80) {
        let Some(name) = names.get(&entry.id) else {
            continue;
        };
        if keep(name) && !out.contains(name) {
            out.push(name.clone());
        }
    }
    out
}

fn is_top_tier_fractal(name: &str) -> bool {
    name.contains("Tier 4") || name.contains("Recommended")
}

/// Resolve achievement names and keep the level-80 entries.
///
/// Fractal dailies are further narrowed to Tier 4 and recommended scales.
/// Ids missing from the cache are skipped.
pub fn compile(response: &DailyResponse, names: &HashMap<GameId, String>) -> CompiledDailies {
    CompiledDailies {
        pve: names_for(&response.pve, names, |_| true),
        pvp: names_for(&response.pvp, names, |_| true),
        wvw: names_for(&response.wvw, names, |_| true),
        fractals: names_for(&response.fractals, names, is_top_tier_fractal),
        special: names_for(&response.special, names, |_| true),
    }
}

/// What the daily-reset worker persists once per UTC day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailiesSnapshot {
    pub date: NaiveDate,
    pub today: CompiledDailies,
    pub tomorrow: CompiledDailies,
    pub psna_today: Vec<AgentLocation>,
    pub psna_tomorrow: Vec<AgentLocation>,
}

impl DailiesSnapshot {
    /// Card listing one day's dailies and Pact Supply locations.
    pub fn card(&self, tomorrow: bool) -> MessageCard {
        let (day, dailies, psna) = if tomorrow {
            ("Tomorrow's", &self.tomorrow, &self.psna_tomorrow)
        } else {
            ("Today's", &self.today, &self.psna_today)
        };
        let mut card = MessageCard::new(format!("{day} dailies"))
            .footer(format!("Compiled {}", self.date.format("%Y-%m-%d")));
        for (category, names) in dailies.categories() {
            if !names.is_empty() {
                card = card.field(category, names.join("\n"), false);
            }
        }
        if !psna.is_empty() {
            let lines: Vec<String> = psna
                .iter()
                .map(|a| format!("**{}**: {}", a.agent, a.location))
                .collect();
            card = card.field("Pact Supply Network", lines.join("\n"), false);
        }
        card
    }
}
