//! World population levels.

use serde::{Deserialize, Serialize};

/// Population level as reported by the `worlds` endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PopulationLevel {
    Low,
    Medium,
    High,
    VeryHigh,
    Full,
}

impl PopulationLevel {
    /// Encoding used in the time-series collection.
    pub fn as_level(self) -> i16 {
        match self {
            PopulationLevel::Low => 0,
            PopulationLevel::Medium => 1,
            PopulationLevel::High => 2,
            PopulationLevel::VeryHigh => 3,
            PopulationLevel::Full => 4,
        }
    }

    pub fn from_level(level: i16) -> Option<Self> {
        match level {
            0 => Some(PopulationLevel::Low),
            1 => Some(PopulationLevel::Medium),
            2 => Some(PopulationLevel::High),
            3 => Some(PopulationLevel::VeryHigh),
            4 => Some(PopulationLevel::Full),
            _ => None,
        }
    }

    pub fn is_full(self) -> bool {
        self == PopulationLevel::Full
    }

    pub fn label(self) -> &'static str {
        match self {
            PopulationLevel::Low => "Low",
            PopulationLevel::Medium => "Medium",
            PopulationLevel::High => "High",
            PopulationLevel::VeryHigh => "Very High",
            PopulationLevel::Full => "Full",
        }
    }
}

/// A world as returned by the `worlds` endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct World {
    pub id: crate::types::GameId,
    pub name: String,
    pub population: PopulationLevel,
}

/// Whether a new sample should be written given the latest stored one.
pub fn should_sample(latest: Option<i16>, current: PopulationLevel) -> bool {
    latest != Some(current.as_level())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encoding_round_trips() {
        for level in 0..=4 {
            assert_eq!(PopulationLevel::from_level(level).unwrap().as_level(), level);
        }
        assert!(PopulationLevel::from_level(5).is_none());
    }

    #[test]
    fn parses_publisher_names() {
        let world: World =
            serde_json::from_str(r#"{"id":1001,"name":"Anvil Rock","population":"VeryHigh"}"#)
                .unwrap();
        assert_eq!(world.population, PopulationLevel::VeryHigh);
    }

    #[test]
    fn samples_only_on_change() {
        assert!(should_sample(None, PopulationLevel::High));
        assert!(!should_sample(Some(2), PopulationLevel::High));
        assert!(should_sample(Some(2), PopulationLevel::Full));
    }
}
