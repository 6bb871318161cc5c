//! Calendar-driven rotations: living-world maps, strikes, Call of the
//! Mists, and the weekly raid reset.

use chrono::{Datelike, Duration, NaiveDate, NaiveTime, Weekday};

use crate::types::Timestamp;

pub const LW_S3_MAPS: [&str; 6] = [
    "Lake Doric",
    "Draconis Mons",
    "Siren's Landing",
    "Bloodstone Fen",
    "Ember Bay",
    "Bitterfrost Frontier",
];

pub const LW_S4_MAPS: [&str; 6] = [
    "Sandswept Isles",
    "Domain of Kourna",
    "Jahai Bluffs",
    "Thunderhead Peaks",
    "Dragonfall",
    "Domain of Istan",
];

pub const STRIKES: [&str; 5] = [
    "Cold War",
    "Fraenir of Jormag",
    "Shiverpeaks Pass",
    "Voice and Claw of the Fallen",
    "Whisper of Jormag",
];

fn epoch(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default()
}

fn days_since(now: Timestamp, since: NaiveDate) -> i64 {
    (now.date_naive() - since).num_days()
}

/// Living-world season 3 and season 4 daily maps, in that order.
pub fn lw_maps(now: Timestamp) -> (&'static str, &'static str) {
    let idx = days_since(now, epoch(2020, 5, 30)).rem_euclid(6) as usize;
    (LW_S3_MAPS[idx], LW_S4_MAPS[idx])
}

/// Today's priority strike mission.
pub fn strike(now: Timestamp) -> &'static str {
    let idx = days_since(now, epoch(2020, 8, 30)).rem_euclid(STRIKES.len() as i64) as usize;
    STRIKES[idx]
}

/// Zero-based wing index currently under Call of the Mists.
///
/// The boon rotates every two weeks over all wings except the newest.
pub fn call_of_the_mists_wing(now: Timestamp, wings: usize) -> Option<usize> {
    if wings < 2 {
        return None;
    }
    let fortnights = days_since(now, epoch(2019, 1, 21)).div_euclid(14);
    Some(fortnights.rem_euclid(wings as i64 - 1) as usize)
}

/// The weekly raid reset (Monday 07:30 UTC) at or before `at`.
pub fn last_raid_reset(at: Timestamp) -> Timestamp {
    let reset_time = NaiveTime::from_hms_opt(7, 30, 0).unwrap_or_default();
    let date = at.date_naive();
    let days_back = date.weekday().num_days_from_monday() as i64;
    let monday = date - Duration::days(days_back);
    let candidate = monday.and_time(reset_time).and_utc();
    if candidate <= at {
        candidate
    } else {
        candidate - Duration::weeks(1)
    }
}

/// Whether raid clears reported for an account are from the current week.
///
/// The publisher only refreshes `account/raids` when the account changes,
/// so clears are stale if the account was last modified before this
/// week's reset.
pub fn raid_clears_current(last_modified: Timestamp, now: Timestamp) -> bool {
    last_raid_reset(last_modified) >= last_raid_reset(now)
}

/// Weekday name helper used in rotation cards.
pub fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    fn day(y: i32, m: u32, d: u32, h: u32, min: u32) -> Timestamp {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    #[test]
    fn lw_maps_cycle_every_six_days() {
        let start = day(2020, 5, 30, 12, 0);
        assert_eq!(lw_maps(start), (LW_S3_MAPS[0], LW_S4_MAPS[0]));
        assert_eq!(lw_maps(start + Duration::days(6)), lw_maps(start));
        assert_eq!(lw_maps(start + Duration::days(7)), (LW_S3_MAPS[1], LW_S4_MAPS[1]));
    }

    #[test]
    fn strike_cycles() {
        let start = day(2020, 8, 30, 0, 0);
        assert_eq!(strike(start), STRIKES[0]);
        assert_eq!(strike(start + Duration::days(STRIKES.len() as i64)), STRIKES[0]);
        assert_eq!(strike(start + Duration::days(2)), STRIKES[2]);
    }

    #[test]
    fn cotm_changes_every_fortnight() {
        let start = day(2019, 1, 21, 9, 0);
        assert_eq!(call_of_the_mists_wing(start, 7), Some(0));
        assert_eq!(call_of_the_mists_wing(start + Duration::days(13), 7), Some(0));
        assert_eq!(call_of_the_mists_wing(start + Duration::days(14), 7), Some(1));
        assert_eq!(call_of_the_mists_wing(start + Duration::days(14 * 6), 7), Some(0));
        assert_eq!(call_of_the_mists_wing(start, 1), None);
    }

    #[test]
    fn reset_on_monday_after_0730_is_same_day() {
        // 2024-05-06 is a Monday.
        let ts = day(2024, 5, 6, 8, 0);
        assert_eq!(last_raid_reset(ts), day(2024, 5, 6, 7, 30));
    }

    #[test]
    fn monday_before_0730_uses_previous_week() {
        let ts = day(2024, 5, 6, 7, 0);
        assert_eq!(last_raid_reset(ts), day(2024, 4, 29, 7, 30));
    }

    #[test]
    fn sunday_uses_preceding_monday() {
        let ts = day(2024, 5, 12, 23, 0);
        assert_eq!(last_raid_reset(ts), day(2024, 5, 6, 7, 30));
    }

    #[test]
    fn clears_stale_after_reset() {
        let modified = day(2024, 5, 5, 20, 0);
        assert!(raid_clears_current(modified, day(2024, 5, 6, 7, 0)));
        assert!(!raid_clears_current(modified, day(2024, 5, 6, 8, 0)));
    }
}
