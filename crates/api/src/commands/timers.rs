//! `bosses`.

use chrono::Utc;
use serde::Deserialize;
use tyria_core::bosses;
use tyria_core::card::Reply;
use tyria_db::repositories::ServerRepo;
use validator::Validate;

use super::{CommandError, Invocation};
use crate::state::AppState;

fn default_count() -> usize {
    8
}

#[derive(Debug, Deserialize, Validate)]
pub struct BossArgs {
    #[serde(default = "default_count")]
    #[validate(range(min = 1, max = 25))]
    pub count: usize,
}

/// Next bosses in the server's timezone, or UTC outside a server.
pub async fn bosses(state: &AppState, inv: &Invocation) -> Result<Reply, CommandError> {
    let args: BossArgs = inv.args()?;
    let tz = match inv.server_id {
        Some(server_id) => ServerRepo::find(&state.pool, server_id)
            .await?
            .map(|s| i32::from(s.timezone_offset))
            .unwrap_or(0),
        None => 0,
    };
    let upcoming = bosses::upcoming(Utc::now(), tz, args.count);
    Ok(bosses::card(&upcoming, tz).into())
}
