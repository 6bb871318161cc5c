//! Account-scoped publisher responses.

use serde::Deserialize;

use crate::permissions::Permission;
use crate::types::{GameId, Timestamp};

/// Subset of `account`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Account {
    pub id: String,
    pub name: String,
    pub world: GameId,
    #[serde(default)]
    pub guilds: Vec<String>,
    #[serde(default)]
    pub created: Option<Timestamp>,
    #[serde(default)]
    pub access: Vec<String>,
    #[serde(default)]
    pub commander: bool,
    #[serde(default)]
    pub fractal_level: Option<i32>,
    #[serde(default)]
    pub wvw_rank: Option<i32>,
    /// When the publisher last refreshed account data.
    #[serde(default)]
    pub last_modified: Option<Timestamp>,
}

/// `tokeninfo` response.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TokenInfo {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub permissions: Vec<String>,
}

impl TokenInfo {
    /// Granted scopes. Unknown scope names are ignored.
    pub fn granted(&self) -> Vec<Permission> {
        Permission::parse_list(&self.permissions)
    }
}

/// Entry of `account/wallet`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct WalletEntry {
    pub id: GameId,
    pub value: i64,
}

/// `commerce/prices/:id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct PriceListing {
    pub id: GameId,
    pub buys: PriceSide,
    pub sells: PriceSide,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct PriceSide {
    pub quantity: i64,
    pub unit_price: i64,
}

/// `commerce/exchange/coins?quantity=`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct CoinExchange {
    pub coins_per_gem: i64,
    pub quantity: i64,
}

/// Gems in the bundle gem alerts are priced against.
pub const GEM_BUNDLE: i64 = 400;

impl CoinExchange {
    /// Copper needed for [`GEM_BUNDLE`] gems.
    pub fn bundle_price(&self) -> i64 {
        self.coins_per_gem * GEM_BUNDLE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn account_tolerates_missing_optionals() {
        let raw = r#"{"id":"A-1","name":"Someone.1234","world":1001}"#;
        let account: Account = serde_json::from_str(raw).unwrap();
        assert_eq!(account.world, 1001);
        assert!(account.guilds.is_empty());
        assert!(account.last_modified.is_none());
    }

    #[test]
    fn tokeninfo_parses_known_scopes() {
        let raw = r#"{"id":"K","name":"main","permissions":["account","wallet","future"]}"#;
        let info: TokenInfo = serde_json::from_str(raw).unwrap();
        assert_eq!(info.granted(), vec![Permission::Account, Permission::Wallet]);
    }

    #[test]
    fn bundle_price_is_four_hundred_gems() {
        let ex = CoinExchange {
            coins_per_gem: 2_500,
            quantity: 4_000,
        };
        assert_eq!(ex.bundle_price(), 1_000_000);
    }
}
