//! World boss schedule.
//!
//! The publisher runs world bosses on a fixed UTC rotation. Normal bosses
//! repeat at a fixed interval from a daily start time; hardcore bosses have
//! explicit times of day. The daily timetable is materialised once and
//! walked forward day by day to answer "what's next".

use std::sync::OnceLock;

use chrono::{Duration, FixedOffset, NaiveTime, Offset, TimeZone, Utc};
use serde::Serialize;

use crate::card::MessageCard;
use crate::types::Timestamp;

/// Normal bosses: (name, first spawn hh, mm, interval hours).
const NORMAL_BOSSES: &[(&str, u32, u32, u32)] = &[
    ("Admiral Taidha Covington", 0, 0, 3),
    ("Svanir Shaman Chief", 0, 15, 2),
    ("Megadestroyer", 0, 30, 3),
    ("Fire Elemental", 0, 45, 2),
    ("The Shatterer", 1, 0, 3),
    ("Great Jungle Wurm", 1, 15, 2),
    ("Modniir Ulgoth", 1, 30, 3),
    ("Shadow Behemoth", 1, 45, 2),
    ("Golem Mark II", 2, 0, 3),
    ("Claw of Jormag", 2, 30, 3),
];

/// Hardcore bosses with their explicit UTC times of day.
const HARDCORE_BOSSES: &[(&str, &[(u32, u32)])] = &[
    (
        "Tequatl the Sunless",
        &[(0, 0), (3, 0), (7, 0), (11, 30), (16, 0), (19, 0)],
    ),
    (
        "Triple Trouble",
        &[(1, 0), (4, 0), (8, 0), (12, 30), (17, 0), (20, 0)],
    ),
    (
        "Karka Queen",
        &[(2, 0), (6, 0), (10, 30), (15, 0), (18, 0), (23, 0)],
    ),
];

#[derive(Debug, Clone, PartialEq, Eq)]
struct DailySlot {
    time: NaiveTime,
    name: &'static str,
    hardcore: bool,
}

/// One upcoming boss appearance, expressed in the requested timezone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BossOccurrence {
    pub name: &'static str,
    pub hardcore: bool,
    pub at: chrono::DateTime<FixedOffset>,
}

fn timetable() -> &'static [DailySlot] {
    static TABLE: OnceLock<Vec<DailySlot>> = OnceLock::new();
    TABLE.get_or_init(|| {
        let mut slots = Vec::new();
        for &(name, hour, minute, interval) in NORMAL_BOSSES {
            let mut h = hour;
            while h < 24 {
                if let Some(time) = NaiveTime::from_hms_opt(h, minute, 0) {
                    slots.push(DailySlot {
                        time,
                        name,
                        hardcore: false,
                    });
                }
                h += interval;
            }
        }
        for &(name, times) in HARDCORE_BOSSES {
            for &(h, m) in times {
                if let Some(time) = NaiveTime::from_hms_opt(h, m, 0) {
                    slots.push(DailySlot {
                        time,
                        name,
                        hardcore: true,
                    });
                }
            }
        }
        slots.sort_by(|a, b| a.time.cmp(&b.time).then(a.name.cmp(b.name)));
        slots
    })
}

/// Number of boss slots in one UTC day.
pub fn slots_per_day() -> usize {
    timetable().len()
}

/// Build a fixed offset from a whole-hour timezone, clamped to a valid range.
pub fn offset_for_hours(hours: i32) -> FixedOffset {
    let hours = hours.clamp(-12, 14);
    FixedOffset::east_opt(hours * 3600).unwrap_or_else(|| Utc.fix())
}

/// The next `count` boss appearances strictly after `now`.
pub fn upcoming(now: Timestamp, tz_offset_hours: i32, count: usize) -> Vec<BossOccurrence> {
    let offset = offset_for_hours(tz_offset_hours);
    let table = timetable();
    let mut out = Vec::with_capacity(count);
    if table.is_empty() {
        return out;
    }

    let mut day = now.date_naive();
    while out.len() < count {
        for slot in table {
            let at = day.and_time(slot.time).and_utc();
            if at <= now {
                continue;
            }
            out.push(BossOccurrence {
                name: slot.name,
                hardcore: slot.hardcore,
                at: at.with_timezone(&offset),
            });
            if out.len() == count {
                break;
            }
        }
        day += Duration::days(1);
    }
    out
}

/// Card listing upcoming bosses; hardcore bosses are marked.
pub fn card(occurrences: &[BossOccurrence], tz_offset_hours: i32) -> MessageCard {
    let offset = offset_for_hours(tz_offset_hours);
    let lines: Vec<String> = occurrences
        .iter()
        .map(|b| {
            let marker = if b.hardcore { " (hardcore)" } else { "" };
            format!("`{}` {}{}", b.at.format("%H:%M"), b.name, marker)
        })
        .collect();
    MessageCard::new("Upcoming world bosses")
        .description(lines.join("\n"))
        .footer(format!("Times in UTC{offset}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(h: u32, m: u32) -> Timestamp {
        Utc.with_ymd_and_hms(2024, 5, 6, h, m, 0).unwrap()
    }

    #[test]
    fn timetable_is_sorted_and_complete() {
        let table = timetable();
        assert!(table.windows(2).all(|w| w[0].time <= w[1].time));
        // 2h bosses spawn 12 times a day, 3h bosses 8 times, hardcore 6 each.
        let expected = 4 * 12 + 6 * 8 + 3 * 6;
        assert_eq!(slots_per_day(), expected);
    }

    #[test]
    fn next_after_midnight_is_svanir() {
        let next = upcoming(at(0, 0), 0, 1);
        assert_eq!(next[0].name, "Svanir Shaman Chief");
        assert_eq!(next[0].at.with_timezone(&Utc), at(0, 15));
    }

    #[test]
    fn walks_into_next_day() {
        let next = upcoming(at(23, 50), 0, 3);
        assert_eq!(next.len(), 3);
        assert!(next.iter().all(|b| b.at.with_timezone(&Utc) > at(23, 50)));
        assert_eq!(next[0].at.with_timezone(&Utc).date_naive(), at(0, 0).date_naive().succ_opt().unwrap());
    }

    #[test]
    fn timezone_shifts_display_not_order() {
        let utc = upcoming(at(10, 0), 0, 5);
        let shifted = upcoming(at(10, 0), 2, 5);
        for (a, b) in utc.iter().zip(&shifted) {
            assert_eq!(a.name, b.name);
            assert_eq!(a.at, b.at);
            assert_eq!(b.at.offset().local_minus_utc(), 7200);
        }
    }

    #[test]
    fn large_request_spans_multiple_days() {
        let n = slots_per_day() * 2 + 3;
        let next = upcoming(at(12, 0), 0, n);
        assert_eq!(next.len(), n);
        assert!(next.windows(2).all(|w| w[0].at <= w[1].at));
    }

    #[test]
    fn hardcore_flag_is_set() {
        let next = upcoming(at(11, 20), 0, 3);
        let teq = next.iter().find(|b| b.name == "Tequatl the Sunless").unwrap();
        assert!(teq.hardcore);
    }

    #[test]
    fn card_lists_each_occurrence() {
        let next = upcoming(at(11, 20), 2, 4);
        let card = card(&next, 2);
        assert_eq!(card.description.unwrap().lines().count(), 4);
        assert_eq!(card.footer.as_deref(), Some("Times in UTC+02:00"));
    }

    #[test]
    fn offset_is_clamped() {
        assert_eq!(offset_for_hours(40).local_minus_utc(), 14 * 3600);
        assert_eq!(offset_for_hours(-40).local_minus_utc(), -12 * 3600);
    }
}
