use std::time::Duration;

use tyria_core::types::Snowflake;
use tyria_events::DiscordConfig;
use tyria_gateway::client::{DEFAULT_BASE_URL, DEFAULT_NEWS_FEED};
use tyria_gateway::GatewayConfig;
use tyria_worker::WorkerConfig;

pub const DEFAULT_DISCORD_API: &str = "https://discord.com/api/v10";

/// Server configuration loaded from environment variables.
///
/// Everything except the chat token has a default suitable for local
/// development. Feature toggles are not configured here; they live in the
/// server records.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Inbound request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// How long synchronizers get to stop on shutdown (default: `30`).
    pub shutdown_timeout_secs: u64,
    pub discord_token: String,
    pub discord_api_base: String,
    pub gw2_api_base: String,
    pub gw2_news_feed: String,
    /// Wait after the UTC day changes before compiling dailies.
    pub daily_reset_delay_secs: u64,
    /// The only user allowed to force a cache rebuild.
    pub owner_user_id: Option<Snowflake>,
    /// Combat-log service credential. Stored, not used by any command.
    pub dpsreport_token: Option<String>,
}

fn var_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.into())
}

fn optional_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                  | Default                               |
    /// |--------------------------|---------------------------------------|
    /// | `HOST`                   | `0.0.0.0`                             |
    /// | `PORT`                   | `3000`                                |
    /// | `REQUEST_TIMEOUT_SECS`   | `30`                                  |
    /// | `SHUTDOWN_TIMEOUT_SECS`  | `30`                                  |
    /// | `DISCORD_TOKEN`          | required                              |
    /// | `DISCORD_API_BASE`       | `https://discord.com/api/v10`         |
    /// | `GW2_API_BASE`           | `https://api.guildwars2.com/v2/`      |
    /// | `GW2_NEWS_FEED`          | `https://www.guildwars2.com/en/feed/` |
    /// | `DAILY_RESET_DELAY_SECS` | `300`                                 |
    /// | `OWNER_USER_ID`          | unset                                 |
    /// | `DPSREPORT_TOKEN`        | unset                                 |
    pub fn from_env() -> Self {
        let port: u16 = var_or("PORT", "3000")
            .parse()
            .expect("PORT must be a valid u16");

        let request_timeout_secs: u64 = var_or("REQUEST_TIMEOUT_SECS", "30")
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let shutdown_timeout_secs: u64 = var_or("SHUTDOWN_TIMEOUT_SECS", "30")
            .parse()
            .expect("SHUTDOWN_TIMEOUT_SECS must be a valid u64");

        let daily_reset_delay_secs: u64 = var_or("DAILY_RESET_DELAY_SECS", "300")
            .parse()
            .expect("DAILY_RESET_DELAY_SECS must be a valid u64");

        let owner_user_id = optional_var("OWNER_USER_ID").map(|v| {
            v.trim()
                .parse::<Snowflake>()
                .expect("OWNER_USER_ID must be a numeric user id")
        });

        Self {
            host: var_or("HOST", "0.0.0.0"),
            port,
            request_timeout_secs,
            shutdown_timeout_secs,
            discord_token: std::env::var("DISCORD_TOKEN").expect("DISCORD_TOKEN must be set"),
            discord_api_base: var_or("DISCORD_API_BASE", DEFAULT_DISCORD_API),
            gw2_api_base: var_or("GW2_API_BASE", DEFAULT_BASE_URL),
            gw2_news_feed: var_or("GW2_NEWS_FEED", DEFAULT_NEWS_FEED),
            daily_reset_delay_secs,
            owner_user_id,
            dpsreport_token: optional_var("DPSREPORT_TOKEN"),
        }
    }

    pub fn gateway_config(&self) -> GatewayConfig {
        GatewayConfig {
            base_url: self.gw2_api_base.clone(),
            news_feed_url: self.gw2_news_feed.clone(),
            ..GatewayConfig::default()
        }
    }

    pub fn discord_config(&self) -> DiscordConfig {
        DiscordConfig {
            api_base: self.discord_api_base.clone(),
            token: self.discord_token.clone(),
        }
    }

    pub fn worker_config(&self) -> WorkerConfig {
        WorkerConfig {
            daily_reset_delay: Duration::from_secs(self.daily_reset_delay_secs),
            ..WorkerConfig::default()
        }
    }

    pub fn is_owner(&self, user_id: Snowflake) -> bool {
        self.owner_user_id == Some(user_id)
    }
}
