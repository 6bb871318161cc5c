//! `gemtrack`, `poptrack` and `raidlogs`.

use chrono::Utc;
use serde::Deserialize;
use tyria_core::account::GEM_BUNDLE;
use tyria_core::card::{MessageCard, Reply, DESCRIPTION_LIMIT};
use tyria_core::catalog::Catalog;
use tyria_core::currencies::format_coins;
use tyria_core::population::World;
use tyria_core::rotations::last_raid_reset;
use tyria_db::models::encounter::Encounter;
use tyria_db::repositories::{EncounterRepo, UserRepo};
use validator::Validate;

use super::{find_cached, CommandError, Invocation};
use crate::state::AppState;

const COPPER_PER_GOLD: i64 = 10_000;

#[derive(Debug, Default, Deserialize, Validate)]
pub struct GemTrackArgs {
    /// Alert threshold in gold for 400 gems; absent clears the alert.
    #[validate(range(min = 1, max = 100000))]
    pub gold: Option<i64>,
}

pub async fn gemtrack(state: &AppState, inv: &Invocation) -> Result<Reply, CommandError> {
    let args: GemTrackArgs = inv.args()?;
    let threshold = args.gold.map(|g| g * COPPER_PER_GOLD);
    UserRepo::set_gem_threshold(&state.pool, inv.user_id, threshold).await?;
    let text = match threshold {
        Some(copper) => format!(
            "You'll get a message once {GEM_BUNDLE} gems cost less than {}.",
            format_coins(copper)
        ),
        None => "Gem price alert cleared.".to_string(),
    };
    Ok(Reply::text(text))
}

#[derive(Debug, Deserialize, Validate)]
pub struct PopTrackArgs {
    #[validate(length(min = 1, max = 60))]
    pub world: String,
}

pub async fn poptrack(state: &AppState, inv: &Invocation) -> Result<Reply, CommandError> {
    let args: PopTrackArgs = inv.args()?;
    let Some(entry) = find_cached(state, Catalog::Worlds, &args.world).await? else {
        return Ok(Reply::text(format!("No world named \"{}\" was found.", args.world.trim())));
    };
    let world: World = state.gateway.get(&format!("worlds/{}", entry.id)).await?;
    if !world.population.is_full() {
        return Ok(Reply::text(format!(
            "{} is not full, you can transfer right now!",
            world.name
        )));
    }
    let added = UserRepo::track_world(&state.pool, inv.user_id, world.id).await?;
    let text = if added {
        format!("You'll get a message when {} is no longer full.", world.name)
    } else {
        format!("You're already tracking {}.", world.name)
    };
    Ok(Reply::text(text))
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct RaidLogArgs {
    /// Restrict to one of the user's accounts.
    pub account: Option<String>,
}

pub fn logs_card(encounters: &[Encounter]) -> MessageCard {
    let lines: Vec<String> = encounters
        .iter()
        .map(|e| {
            let outcome = if e.success { "Kill" } else { "Wipe" };
            format!(
                "`{}` [{outcome}]({}) boss {} in {}:{:02}",
                e.date.format("%a %H:%M"),
                e.permalink,
                e.boss_id,
                e.duration_seconds / 60,
                e.duration_seconds % 60
            )
        })
        .collect();
    MessageCard::new("Raid logs this week")
        .description(join_within_limit(&lines))
        .footer(format!("{} encounters", encounters.len()))
}

/// Join whole lines while the result fits a card description, noting how
/// many were left out.
fn join_within_limit(lines: &[String]) -> String {
    // Room kept for the "and N more" line.
    const RESERVE: usize = 32;
    let mut out = String::new();
    let mut used = 0usize;
    for (i, line) in lines.iter().enumerate() {
        let cost = line.chars().count() + usize::from(i > 0);
        let remaining = lines.len() - i;
        let budget = if remaining == 1 { DESCRIPTION_LIMIT } else { DESCRIPTION_LIMIT - RESERVE };
        if used + cost > budget {
            out.push_str(&format!("\n…and {remaining} more"));
            return out;
        }
        if i > 0 {
            out.push('\n');
        }
        out.push_str(line);
        used += cost;
    }
    out
}

/// Encounters involving the user's accounts since the weekly reset.
pub async fn raidlogs(state: &AppState, inv: &Invocation) -> Result<Reply, CommandError> {
    let args: RaidLogArgs = inv.args()?;
    let ring = UserRepo::key_ring(&state.pool, inv.user_id).await?;
    let mut accounts: Vec<String> = ring.account_names().into_iter().map(str::to_string).collect();
    if accounts.is_empty() {
        return Err(tyria_core::error::ApiError::NoCredential.into());
    }
    if let Some(wanted) = args.account.as_deref().map(str::trim) {
        accounts.retain(|a| a.eq_ignore_ascii_case(wanted));
        if accounts.is_empty() {
            return Err(CommandError::Usage(format!(
                "{wanted} is not one of your accounts."
            )));
        }
    }

    let since = last_raid_reset(Utc::now());
    let encounters = EncounterRepo::for_accounts_since(&state.pool, &accounts, since).await?;
    if encounters.is_empty() {
        return Ok(Reply::text("No raid logs were recorded for you this week."));
    }
    Ok(logs_card(&encounters).into())
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn logs_card_formats_duration() {
        let at = Utc.with_ymd_and_hms(2024, 5, 6, 20, 15, 0).unwrap();
        let encounter = Encounter {
            id: 1,
            boss_id: 15438,
            start_date: at,
            date: at,
            players: vec!["Acct.1234".into()],
            permalink: "https://dps.report/abc".into(),
            success: true,
            duration_seconds: 245,
        };
        let card = logs_card(&[encounter]);
        assert_eq!(
            card.description.as_deref(),
            Some("`Mon 20:15` [Kill](https://dps.report/abc) boss 15438 in 4:05")
        );
    }

    #[test]
    fn long_weeks_fit_the_description_limit() {
        let at = Utc.with_ymd_and_hms(2024, 5, 6, 20, 15, 0).unwrap();
        let encounters: Vec<Encounter> = (0..200)
            .map(|i| Encounter {
                id: i,
                boss_id: 15438,
                start_date: at,
                date: at,
                players: vec!["Acct.1234".into()],
                permalink: format!("https://dps.report/{i:04}-20240506-201500_vg"),
                success: i % 2 == 0,
                duration_seconds: 245,
            })
            .collect();

        let card = logs_card(&encounters);
        let description = card.description.unwrap();

        assert!(description.chars().count() <= DESCRIPTION_LIMIT);
        assert!(description.lines().last().unwrap().starts_with("…and "));
        assert_eq!(card.footer.as_deref(), Some("200 encounters"));
    }
}
