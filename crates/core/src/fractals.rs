//! Fractal instabilities at the highest difficulty.
//!
//! The bundled table maps a fractal scale to its instability rotation;
//! each entry lists indices into the instability name list, and the
//! rotation advances once per UTC day of the year.

use std::collections::HashMap;
use std::sync::OnceLock;

use chrono::Datelike;
use serde::Deserialize;

use crate::types::Timestamp;

#[derive(Debug, Deserialize)]
struct InstabilityTable {
    names: Vec<String>,
    scales: HashMap<u32, Vec<Vec<usize>>>,
}

fn table() -> Option<&'static InstabilityTable> {
    static TABLE: OnceLock<Option<InstabilityTable>> = OnceLock::new();
    TABLE
        .get_or_init(|| serde_json::from_str(include_str!("../data/instabilities.json")).ok())
        .as_ref()
}

/// Scales with a known instability rotation, ascending.
pub fn known_scales() -> Vec<u32> {
    let mut scales: Vec<u32> = table()
        .map(|t| t.scales.keys().copied().collect())
        .unwrap_or_default();
    scales.sort_unstable();
    scales
}

/// Instability names active on `scale` on the day of `now`.
pub fn instabilities(scale: u32, now: Timestamp) -> Vec<String> {
    let Some(table) = table() else {
        return Vec::new();
    };
    let Some(rotation) = table.scales.get(&scale).filter(|r| !r.is_empty()) else {
        return Vec::new();
    };
    let day = now.ordinal0() as usize % rotation.len();
    rotation[day]
        .iter()
        .filter_map(|&i| table.names.get(i).cloned())
        .collect()
}
