//! API key permission scopes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A permission scope an API key can be granted by the publisher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    Account,
    Builds,
    Characters,
    Guilds,
    Inventories,
    Progression,
    Pvp,
    Tradingpost,
    Unlocks,
    Wallet,
}

impl Permission {
    /// Every scope the service knows about, in display order.
    pub const ALL: [Permission; 10] = [
        Permission::Account,
        Permission::Builds,
        Permission::Characters,
        Permission::Guilds,
        Permission::Inventories,
        Permission::Progression,
        Permission::Pvp,
        Permission::Tradingpost,
        Permission::Unlocks,
        Permission::Wallet,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Permission::Account => "account",
            Permission::Builds => "builds",
            Permission::Characters => "characters",
            Permission::Guilds => "guilds",
            Permission::Inventories => "inventories",
            Permission::Progression => "progression",
            Permission::Pvp => "pvp",
            Permission::Tradingpost => "tradingpost",
            Permission::Unlocks => "unlocks",
            Permission::Wallet => "wallet",
        }
    }

    /// Parse the scope list returned by `tokeninfo`.
    ///
    /// Scopes this service does not model (the publisher adds new ones
    /// from time to time) are dropped.
    pub fn parse_list<S: AsRef<str>>(raw: &[S]) -> Vec<Permission> {
        let mut out: Vec<Permission> = raw
            .iter()
            .filter_map(|s| s.as_ref().parse().ok())
            .collect();
        out.sort();
        out.dedup();
        out
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Permission {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Permission::ALL
            .iter()
            .copied()
            .find(|p| p.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown permission '{s}'"))
    }
}

/// Required scopes that are not in `granted`, in the order of `required`.
pub fn missing(granted: &[Permission], required: &[Permission]) -> Vec<Permission> {
    required
        .iter()
        .copied()
        .filter(|p| !granted.contains(p))
        .collect()
}

/// Join a scope list for display, e.g. `wallet, progression`.
pub fn join(perms: &[Permission]) -> String {
    perms
        .iter()
        .map(|p| p.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_list_drops_unknown_scopes() {
        let parsed = Permission::parse_list(&["account", "wvw", "Wallet", "account"]);
        assert_eq!(parsed, vec![Permission::Account, Permission::Wallet]);
    }

    #[test]
    fn missing_keeps_required_order() {
        let granted = [Permission::Account, Permission::Characters];
        let required = [Permission::Wallet, Permission::Account, Permission::Progression];
        assert_eq!(
            missing(&granted, &required),
            vec![Permission::Wallet, Permission::Progression]
        );
    }

    #[test]
    fn missing_from_full_set_counts_ten() {
        assert_eq!(missing(&[], &Permission::ALL).len(), 10);
    }

    #[test]
    fn serde_uses_lowercase_names() {
        let json = serde_json::to_string(&Permission::Tradingpost).unwrap();
        assert_eq!(json, "\"tradingpost\"");
    }
}
