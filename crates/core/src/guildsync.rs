//! Reconciliation plans for mirroring ingame guild ranks onto chat roles.
//!
//! Roles are tracked by stored id only; renaming a role on the chat side
//! does not affect the mapping.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::Snowflake;

/// Rank name → chat role id.
pub type RankRoles = BTreeMap<String, Snowflake>;

/// Entry of `guild/:id/ranks`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GuildRank {
    pub id: String,
    #[serde(default)]
    pub order: i32,
}

/// Entry of `guild/:id/members`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GuildMember {
    pub name: String,
    pub rank: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RankPlan {
    /// Ranks that need a new role, in upstream order.
    pub create: Vec<String>,
    /// Stored ranks that no longer exist upstream.
    pub delete: Vec<(String, Snowflake)>,
    /// Stored ranks still present upstream.
    pub keep: RankRoles,
}

impl RankPlan {
    pub fn is_noop(&self) -> bool {
        self.create.is_empty() && self.delete.is_empty()
    }

    /// The mapping to persist once the created roles are known.
    pub fn into_mapping(self, created: impl IntoIterator<Item = (String, Snowflake)>) -> RankRoles {
        let mut mapping = self.keep;
        mapping.extend(created);
        mapping
    }
}

/// Diff upstream ranks against the stored mapping.
pub fn plan_ranks(upstream: &[GuildRank], stored: &RankRoles) -> RankPlan {
    let mut ordered: Vec<&GuildRank> = upstream.iter().collect();
    ordered.sort_by_key(|r| r.order);

    let mut plan = RankPlan::default();
    for rank in ordered {
        match stored.get(&rank.id) {
            Some(&role) => {
                plan.keep.insert(rank.id.clone(), role);
            }
            None => {
                if !plan.create.contains(&rank.id) {
                    plan.create.push(rank.id.clone());
                }
            }
        }
    }
    for (name, &role) in stored {
        if !upstream.iter().any(|r| &r.id == name) {
            plan.delete.push((name.clone(), role));
        }
    }
    plan
}

/// The roster entry for a chat member, picked from their accounts in
/// credential order.
pub fn roster_entry<'a>(accounts: &[&str], roster: &'a [GuildMember]) -> Option<&'a GuildMember> {
    accounts.iter().find_map(|account| {
        roster
            .iter()
            .find(|m| m.name.eq_ignore_ascii_case(account))
    })
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MemberPlan {
    pub remove: Vec<Snowflake>,
    pub add: Option<Snowflake>,
}

impl MemberPlan {
    pub fn is_noop(&self) -> bool {
        self.remove.is_empty() && self.add.is_none()
    }
}

/// Roles to strip and grant so a member holds exactly the role of
/// `desired_rank` among the mapped ones. Unmapped roles are untouched.
pub fn plan_member(current: &[Snowflake], mapping: &RankRoles, desired_rank: Option<&str>) -> MemberPlan {
    let desired = desired_rank.and_then(|rank| mapping.get(rank).copied());
    let remove = mapping
        .values()
        .copied()
        .filter(|role| Some(*role) != desired && current.contains(role))
        .collect();
    let add = desired.filter(|role| !current.contains(role));
    MemberPlan { remove, add }
}
