//! `dailies` and the calendar rotations: `lwmaps`, `strikes`, `cotm`,
//! `fractals`.

use chrono::{Datelike, Utc};
use serde::Deserialize;
use tyria_core::card::{MessageCard, Reply};
use tyria_core::fractals::{instabilities, known_scales};
use tyria_core::rotations;
use tyria_core::types::Timestamp;
use tyria_db::repositories::StateRepo;
use validator::Validate;

use super::account::wing_names;
use super::{CommandError, Invocation, NoArgs};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize, Validate)]
pub struct DailiesArgs {
    #[serde(default)]
    pub tomorrow: bool,
}

pub async fn dailies(state: &AppState, inv: &Invocation) -> Result<Reply, CommandError> {
    let args: DailiesArgs = inv.args()?;
    match StateRepo::dailies(&state.pool).await? {
        Some(snapshot) => Ok(snapshot.card(args.tomorrow).into()),
        None => Ok(Reply::text(
            "Dailies haven't been compiled yet. Try again after the next daily reset.",
        )),
    }
}

pub fn lw_maps_card(now: Timestamp) -> MessageCard {
    let (s3, s4) = rotations::lw_maps(now);
    MessageCard::new("Living World daily maps")
        .field("Season 3", s3, true)
        .field("Season 4", s4, true)
}

pub fn lw_maps(inv: &Invocation) -> Result<Reply, CommandError> {
    let _: NoArgs = inv.args()?;
    Ok(lw_maps_card(Utc::now()).into())
}

pub fn strikes(inv: &Invocation) -> Result<Reply, CommandError> {
    let _: NoArgs = inv.args()?;
    let now = Utc::now();
    let card = MessageCard::new("Priority strike mission")
        .description(rotations::strike(now))
        .footer(rotations::weekday_name(now.weekday()));
    Ok(card.into())
}

pub async fn cotm(state: &AppState, inv: &Invocation) -> Result<Reply, CommandError> {
    let _: NoArgs = inv.args()?;
    let wings = wing_names(state).await?;
    let current = rotations::call_of_the_mists_wing(Utc::now(), wings.len())
        .and_then(|i| wings.get(i));
    match current {
        Some(wing) => Ok(MessageCard::new("Call of the Mists")
            .description(format!("**{wing}** is under Call of the Mists."))
            .into()),
        None => Ok(Reply::text(
            "The raid rotation is unknown until the reference cache is built.",
        )),
    }
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct FractalArgs {
    #[validate(range(min = 1, max = 100))]
    pub scale: Option<u32>,
}

pub fn fractals_card(scales: &[u32], now: Timestamp) -> MessageCard {
    let mut card = MessageCard::new("Fractal instabilities").footer(now.format("%Y-%m-%d").to_string());
    for &scale in scales {
        let active = instabilities(scale, now);
        if !active.is_empty() {
            card = card.field(format!("Scale {scale}"), active.join("\n"), true);
        }
    }
    card
}

pub fn fractals(inv: &Invocation) -> Result<Reply, CommandError> {
    let args: FractalArgs = inv.args()?;
    let scales = match args.scale {
        Some(scale) => vec![scale],
        None => known_scales(),
    };
    let card = fractals_card(&scales, Utc::now());
    if card.fields.is_empty() {
        return Ok(Reply::text("No instabilities are known for that scale."));
    }
    Ok(card.into())
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn lw_maps_card_has_both_seasons() {
        let now = Utc.with_ymd_and_hms(2020, 5, 30, 12, 0, 0).unwrap();
        let card = lw_maps_card(now);
        assert_eq!(card.fields[0].value, rotations::LW_S3_MAPS[0]);
        assert_eq!(card.fields[1].value, rotations::LW_S4_MAPS[0]);
    }

    #[test]
    fn fractals_card_skips_unknown_scales() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let card = fractals_card(&[3, 100], now);
        assert_eq!(card.fields.len(), 1);
        assert_eq!(card.fields[0].name, "Scale 100");
    }
}
