//! Grouping of wallet currencies for display.

use crate::types::GameId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrencyGroup {
    pub name: &'static str,
    pub ids: &'static [GameId],
}

pub const CURRENCY_GROUPS: [CurrencyGroup; 6] = [
    CurrencyGroup {
        name: "General",
        ids: &[1, 4, 2, 3, 23, 18, 63],
    },
    CurrencyGroup {
        name: "Competitive",
        ids: &[15, 26, 30, 31, 33, 36, 46, 65],
    },
    CurrencyGroup {
        name: "Map",
        ids: &[19, 20, 22, 25, 27, 29, 32, 34, 35, 45, 47, 50, 57, 58, 60, 61, 62],
    },
    CurrencyGroup {
        name: "Keys",
        ids: &[37, 38, 40, 41, 42, 43, 44, 49, 51],
    },
    CurrencyGroup {
        name: "Fractals & Raids",
        ids: &[7, 24, 28, 39, 59, 69, 70],
    },
    CurrencyGroup {
        name: "Historic",
        ids: &[5, 6, 9, 10, 11, 12, 13, 14, 52, 53, 54, 55, 56],
    },
];

/// Group a wallet's currency ids, keeping ids no group claims under "Other".
pub fn group_ids(ids: &[GameId]) -> Vec<(&'static str, Vec<GameId>)> {
    let mut out: Vec<(&'static str, Vec<GameId>)> = Vec::new();
    for group in &CURRENCY_GROUPS {
        let present: Vec<GameId> = group.ids.iter().copied().filter(|id| ids.contains(id)).collect();
        if !present.is_empty() {
            out.push((group.name, present));
        }
    }
    let other: Vec<GameId> = ids
        .iter()
        .copied()
        .filter(|id| !CURRENCY_GROUPS.iter().any(|g| g.ids.contains(id)))
        .collect();
    if !other.is_empty() {
        out.push(("Other", other));
    }
    out
}

/// Render an amount of coin as `12g 34s 56c`.
pub fn format_coins(copper: i64) -> String {
    let sign = if copper < 0 { "-" } else { "" };
    let copper = copper.abs();
    let (gold, silver, bronze) = (copper / 10_000, (copper / 100) % 100, copper % 100);
    let mut parts = Vec::new();
    if gold > 0 {
        parts.push(format!("{gold}g"));
    }
    if silver > 0 {
        parts.push(format!("{silver}s"));
    }
    if bronze > 0 || parts.is_empty() {
        parts.push(format!("{bronze}c"));
    }
    format!("{sign}{}", parts.join(" "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn groups_are_disjoint() {
        let mut seen = std::collections::HashSet::new();
        for group in &CURRENCY_GROUPS {
            for id in group.ids {
                assert!(seen.insert(*id), "currency {id} appears twice");
            }
        }
    }

    #[test]
    fn unknown_ids_land_in_other() {
        let grouped = group_ids(&[1, 4, 9999]);
        assert_eq!(grouped[0], ("General", vec![1, 4]));
        assert_eq!(grouped.last().unwrap(), &("Other", vec![9999]));
    }

    #[test]
    fn coins_format() {
        assert_eq!(format_coins(123_456), "12g 34s 56c");
        assert_eq!(format_coins(10_000), "1g");
        assert_eq!(format_coins(0), "0c");
        assert_eq!(format_coins(-250), "-2s 50c");
    }
}
