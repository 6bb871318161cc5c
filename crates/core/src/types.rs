/// Chat-platform identifiers (users, servers, channels, roles, messages).
///
/// Snowflakes fit in 63 bits, so they are stored as PostgreSQL BIGINT.
pub type Snowflake = i64;

/// Integer identifiers assigned by the game publisher.
pub type GameId = i64;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
