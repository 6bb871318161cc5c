//! Change detection for the scalar markers owned by the build watcher and
//! the daily-reset worker.

use chrono::Datelike;

use crate::types::Timestamp;

/// Outcome of comparing an observed game build with the cached one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildChange {
    /// Same build as last time: nothing to do.
    Unchanged,
    /// Nothing was cached yet. The cache is assumed empty and gets rebuilt,
    /// but nobody is told about an "update".
    FirstSeen { build: i64 },
    /// The game was patched.
    Changed { previous: i64, current: i64 },
}

impl BuildChange {
    pub fn detect(cached: Option<i64>, observed: i64) -> Self {
        match cached {
            None => BuildChange::FirstSeen { build: observed },
            Some(previous) if previous == observed => BuildChange::Unchanged,
            Some(previous) => BuildChange::Changed {
                previous,
                current: observed,
            },
        }
    }

    pub fn needs_rebuild(self) -> bool {
        !matches!(self, BuildChange::Unchanged)
    }

    pub fn should_notify(self) -> bool {
        matches!(self, BuildChange::Changed { .. })
    }

    /// Build number to persist, if any.
    pub fn persist(self) -> Option<i64> {
        match self {
            BuildChange::Unchanged => None,
            BuildChange::FirstSeen { build } => Some(build),
            BuildChange::Changed { current, .. } => Some(current),
        }
    }
}

/// Weekday marker stored for reset detection (0 = Monday).
pub fn weekday_marker(now: Timestamp) -> u32 {
    now.weekday().num_days_from_monday()
}

/// Outcome of comparing the current UTC weekday with the cached one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayChange {
    Unchanged,
    /// No marker stored yet: record it without firing.
    Initialised { weekday: u32 },
    Rolled { weekday: u32 },
}

impl DayChange {
    pub fn detect(cached: Option<u32>, now: Timestamp) -> Self {
        let weekday = weekday_marker(now);
        match cached {
            None => DayChange::Initialised { weekday },
            Some(prev) if prev == weekday => DayChange::Unchanged,
            Some(_) => DayChange::Rolled { weekday },
        }
    }

    pub fn persist(self) -> Option<u32> {
        match self {
            DayChange::Unchanged => None,
            DayChange::Initialised { weekday } | DayChange::Rolled { weekday } => Some(weekday),
        }
    }

    pub fn fires(self) -> bool {
        matches!(self, DayChange::Rolled { .. })
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    #[test]
    fn build_change_triggers_once() {
        // Cached 100, two polls return 101.
        let mut cached = Some(100);
        let mut rebuilds = 0;
        for _ in 0..2 {
            let change = BuildChange::detect(cached, 101);
            if change.needs_rebuild() {
                rebuilds += 1;
            }
            if let Some(b) = change.persist() {
                cached = Some(b);
            }
        }
        assert_eq!(rebuilds, 1);
        assert_eq!(cached, Some(101));
    }

    #[test]
    fn first_build_rebuilds_without_notifying() {
        let change = BuildChange::detect(None, 42);
        assert!(change.needs_rebuild());
        assert!(!change.should_notify());
        assert_eq!(change.persist(), Some(42));
    }

    #[test]
    fn changed_build_notifies() {
        let change = BuildChange::detect(Some(1), 2);
        assert!(change.should_notify());
    }

    #[test]
    fn day_rolls_once_per_transition() {
        let mon = Utc.with_ymd_and_hms(2024, 5, 6, 23, 59, 0).unwrap();
        let tue = Utc.with_ymd_and_hms(2024, 5, 7, 0, 0, 30).unwrap();
        let tue_later = Utc.with_ymd_and_hms(2024, 5, 7, 0, 1, 30).unwrap();

        let mut cached = DayChange::detect(None, mon).persist();
        assert_eq!(cached, Some(0));

        let mut fired = 0;
        for now in [mon, tue, tue_later] {
            let change = DayChange::detect(cached, now);
            if change.fires() {
                fired += 1;
            }
            if let Some(d) = change.persist() {
                cached = Some(d);
            }
        }
        assert_eq!(fired, 1);
    }

    #[test]
    fn initialisation_does_not_fire() {
        let now = Utc.with_ymd_and_hms(2024, 5, 6, 12, 0, 0).unwrap();
        assert!(!DayChange::detect(None, now).fires());
    }
}
