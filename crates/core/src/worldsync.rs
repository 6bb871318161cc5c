//! Reconciliation plans for world and ally roles.

use std::collections::BTreeSet;

use serde::Deserialize;

use crate::types::{GameId, Snowflake};

/// The three teams of a WvW matchup, as returned by `wvw/matches?world=`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MatchTeams {
    #[serde(default)]
    pub red: Vec<GameId>,
    #[serde(default)]
    pub blue: Vec<GameId>,
    #[serde(default)]
    pub green: Vec<GameId>,
}

/// Subset of `wvw/matches` the synchronizer reads.
#[derive(Debug, Clone, Deserialize)]
pub struct Matchup {
    pub all_worlds: MatchTeams,
}

impl Matchup {
    /// Worlds linked with `home` this matchup, excluding `home` itself.
    pub fn linked_worlds(&self, home: GameId) -> BTreeSet<GameId> {
        let teams = [
            &self.all_worlds.red,
            &self.all_worlds.blue,
            &self.all_worlds.green,
        ];
        teams
            .into_iter()
            .find(|team| team.contains(&home))
            .map(|team| team.iter().copied().filter(|w| *w != home).collect())
            .unwrap_or_default()
    }
}

/// Where a member's accounts sit relative to the configured world.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Placement {
    pub on_home: bool,
    pub on_linked: bool,
}

impl Placement {
    /// A member is on home (linked) if any of their accounts is.
    pub fn from_worlds(worlds: &[GameId], home: GameId, linked: &BTreeSet<GameId>) -> Self {
        Placement {
            on_home: worlds.contains(&home),
            on_linked: worlds.iter().any(|w| linked.contains(w)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorldRoles {
    pub world_role: Snowflake,
    pub ally_role: Snowflake,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleEdits {
    pub add: Vec<Snowflake>,
    pub remove: Vec<Snowflake>,
}

impl RoleEdits {
    pub fn is_noop(&self) -> bool {
        self.add.is_empty() && self.remove.is_empty()
    }
}

/// Role edits bringing a member in line with their placement.
///
/// With a single shared role, the member keeps it while either condition
/// holds.
pub fn plan(current: &[Snowflake], roles: WorldRoles, placement: Placement) -> RoleEdits {
    let mut wanted: Vec<(Snowflake, bool)> = Vec::with_capacity(2);
    if roles.world_role == roles.ally_role {
        wanted.push((roles.world_role, placement.on_home || placement.on_linked));
    } else {
        wanted.push((roles.world_role, placement.on_home));
        wanted.push((roles.ally_role, placement.on_linked));
    }

    let mut edits = RoleEdits::default();
    for (role, should_have) in wanted {
        let has = current.contains(&role);
        if should_have && !has {
            edits.add.push(role);
        } else if !should_have && has {
            edits.remove.push(role);
        }
    }
    edits
}
