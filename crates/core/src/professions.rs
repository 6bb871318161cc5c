//! Profession metadata used to decorate character replies.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Profession {
    pub name: &'static str,
    pub color: u32,
    pub armor: &'static str,
    pub elite_specs: &'static [&'static str],
}

pub const PROFESSIONS: [Profession; 9] = [
    Profession {
        name: "Guardian",
        color: 0x72C1D9,
        armor: "Heavy",
        elite_specs: &["Dragonhunter", "Firebrand", "Willbender"],
    },
    Profession {
        name: "Warrior",
        color: 0xFFD166,
        armor: "Heavy",
        elite_specs: &["Berserker", "Spellbreaker", "Bladesworn"],
    },
    Profession {
        name: "Revenant",
        color: 0xD16E5A,
        armor: "Heavy",
        elite_specs: &["Herald", "Renegade", "Vindicator"],
    },
    Profession {
        name: "Engineer",
        color: 0xD09C59,
        armor: "Medium",
        elite_specs: &["Scrapper", "Holosmith", "Mechanist"],
    },
    Profession {
        name: "Ranger",
        color: 0x8CDC82,
        armor: "Medium",
        elite_specs: &["Druid", "Soulbeast", "Untamed"],
    },
    Profession {
        name: "Thief",
        color: 0xC08F95,
        armor: "Medium",
        elite_specs: &["Daredevil", "Deadeye", "Specter"],
    },
    Profession {
        name: "Elementalist",
        color: 0xF68A87,
        armor: "Light",
        elite_specs: &["Tempest", "Weaver", "Catalyst"],
    },
    Profession {
        name: "Mesmer",
        color: 0xB679D5,
        armor: "Light",
        elite_specs: &["Chronomancer", "Mirage", "Virtuoso"],
    },
    Profession {
        name: "Necromancer",
        color: 0x52A76F,
        armor: "Light",
        elite_specs: &["Reaper", "Scourge", "Harbinger"],
    },
];

/// Look up a profession by its name or one of its elite specialization names.
pub fn find(name: &str) -> Option<&'static Profession> {
    PROFESSIONS.iter().find(|p| {
        p.name.eq_ignore_ascii_case(name)
            || p.elite_specs.iter().any(|s| s.eq_ignore_ascii_case(name))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_by_profession_or_spec() {
        assert_eq!(find("guardian").unwrap().name, "Guardian");
        assert_eq!(find("Firebrand").unwrap().name, "Guardian");
        assert!(find("Paragon").is_none());
    }
}
