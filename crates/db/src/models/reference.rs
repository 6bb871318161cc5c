//! Rows of the `ref_*` catalog tables.

use serde::Serialize;
use sqlx::types::Json;
use sqlx::FromRow;
use tyria_core::types::GameId;

/// A catalog entry: publisher id, display name (if any), remaining payload.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ReferenceEntry {
    pub id: GameId,
    pub name: Option<String>,
    pub data: Json<serde_json::Value>,
}

/// A document prepared for insertion.
#[derive(Debug, Clone, PartialEq)]
pub struct NewReferenceEntry {
    pub id: GameId,
    pub name: Option<String>,
    pub data: serde_json::Value,
}

impl NewReferenceEntry {
    /// Split a publisher document into key, name and payload.
    ///
    /// The publisher's `id` moves to the key column and is removed from the
    /// payload. Documents without an integer id are rejected.
    pub fn from_document(mut doc: serde_json::Value) -> Option<Self> {
        let obj = doc.as_object_mut()?;
        let id = obj.remove("id")?.as_i64()?;
        let name = obj
            .get("name")
            .and_then(|n| n.as_str())
            .map(str::to_string);
        Some(Self { id, name, data: doc })
    }
}

/// A raid with its nested wings.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct RaidEntry {
    pub id: String,
    pub data: Json<serde_json::Value>,
}
