//! Keys of the process-global singletons in `bot_state`.

/// Last observed game build number (`i64`).
pub const LAST_BUILD: &str = "last_build";

/// Titles of the most recently seen news items (`Vec<String>`).
pub const NEWS_TITLES: &str = "news_titles";

/// UTC weekday at the last daily-reset check (`u32`, 0 = Monday).
pub const DAY_MARKER: &str = "day_marker";

/// Compiled dailies for today and tomorrow (`DailiesSnapshot`).
pub const DAILIES: &str = "dailies";

/// Upper bound on remembered news titles.
pub const MAX_NEWS_TITLES: usize = 50;
