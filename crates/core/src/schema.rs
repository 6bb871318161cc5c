//! Response schema pinning (`X-Schema-Version`).

use chrono::TimeZone;

use crate::types::Timestamp;

/// Header carrying the pinned schema version.
pub const SCHEMA_HEADER: &str = "X-Schema-Version";

/// A schema pin: either a point in time or a literal version string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaVersion {
    Timestamp(Timestamp),
    Literal(String),
}

impl SchemaVersion {
    /// Schema the service is written against.
    pub fn service_default() -> Self {
        SchemaVersion::Timestamp(
            chrono::Utc
                .with_ymd_and_hms(2022, 3, 23, 19, 0, 0)
                .single()
                .unwrap_or_default(),
        )
    }

    /// Header value; timestamps are sent at second precision with a `Z`.
    pub fn header_value(&self) -> String {
        match self {
            SchemaVersion::Timestamp(ts) => ts.format("%Y-%m-%dT%H:%M:%SZ").to_string(),
            SchemaVersion::Literal(v) => v.clone(),
        }
    }
}
