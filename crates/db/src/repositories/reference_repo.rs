//! Repository for the `ref_*` catalog tables.
//!
//! Table names come from [`Catalog::table`] and are never user input.

use sqlx::types::Json;
use sqlx::PgPool;
use tyria_core::catalog::{Catalog, CatalogIndex};
use tyria_core::types::GameId;

use crate::models::reference::{NewReferenceEntry, RaidEntry, ReferenceEntry};

/// Bulk loading and lookups over cached publisher reference data.
pub struct ReferenceRepo;

impl ReferenceRepo {
    /// Drop and recreate a catalog table, empty.
    pub async fn reset_catalog(pool: &PgPool, catalog: Catalog) -> Result<(), sqlx::Error> {
        let table = catalog.table();
        let mut tx = pool.begin().await?;
        sqlx::query(&format!("DROP TABLE IF EXISTS {table}"))
            .execute(&mut *tx)
            .await?;
        sqlx::query(&format!(
            "CREATE TABLE {table} (id BIGINT PRIMARY KEY, name TEXT, data JSONB NOT NULL)"
        ))
        .execute(&mut *tx)
        .await?;
        tx.commit().await
    }

    /// Insert one block of documents. Duplicate ids within a rebuild keep
    /// the first copy.
    pub async fn insert_block(
        pool: &PgPool,
        catalog: Catalog,
        entries: &[NewReferenceEntry],
    ) -> Result<u64, sqlx::Error> {
        if entries.is_empty() {
            return Ok(0);
        }
        let ids: Vec<GameId> = entries.iter().map(|e| e.id).collect();
        let names: Vec<Option<String>> = entries.iter().map(|e| e.name.clone()).collect();
        let data: Vec<serde_json::Value> = entries.iter().map(|e| e.data.clone()).collect();
        let query = format!(
            "INSERT INTO {} (id, name, data) \
             SELECT * FROM UNNEST($1::bigint[], $2::text[], $3::jsonb[]) \
             ON CONFLICT (id) DO NOTHING",
            catalog.table()
        );
        let result = sqlx::query(&query)
            .bind(&ids)
            .bind(&names)
            .bind(&data)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Create the lookup index a catalog needs after loading.
    pub async fn create_index(pool: &PgPool, catalog: Catalog) -> Result<(), sqlx::Error> {
        let table = catalog.table();
        let statement = match catalog.index() {
            CatalogIndex::None => return Ok(()),
            CatalogIndex::Name => format!(
                "CREATE INDEX IF NOT EXISTS idx_{table}_name \
                 ON {table} (lower(name) text_pattern_ops)"
            ),
            CatalogIndex::OutputItem => format!(
                "CREATE INDEX IF NOT EXISTS idx_{table}_output_item \
                 ON {table} (((data->>'output_item_id')::bigint))"
            ),
        };
        sqlx::query(&statement).execute(pool).await?;
        Ok(())
    }

    /// Case-insensitive prefix search over names.
    pub async fn search_by_name(
        pool: &PgPool,
        catalog: Catalog,
        prefix: &str,
        limit: i64,
    ) -> Result<Vec<ReferenceEntry>, sqlx::Error> {
        let pattern = format!("{}%", escape_like(&prefix.to_lowercase()));
        let query = format!(
            "SELECT id, name, data FROM {} \
             WHERE lower(name) LIKE $1 \
             ORDER BY length(name), name \
             LIMIT $2",
            catalog.table()
        );
        sqlx::query_as::<_, ReferenceEntry>(&query)
            .bind(pattern)
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    pub async fn get_by_ids(
        pool: &PgPool,
        catalog: Catalog,
        ids: &[GameId],
    ) -> Result<Vec<ReferenceEntry>, sqlx::Error> {
        let query = format!(
            "SELECT id, name, data FROM {} WHERE id = ANY($1)",
            catalog.table()
        );
        sqlx::query_as::<_, ReferenceEntry>(&query)
            .bind(ids)
            .fetch_all(pool)
            .await
    }

    /// Drop and recreate the raid table, then insert every raid.
    pub async fn replace_raids(
        pool: &PgPool,
        raids: &[(String, serde_json::Value)],
    ) -> Result<(), sqlx::Error> {
        let mut tx = pool.begin().await?;
        sqlx::query("DROP TABLE IF EXISTS ref_raids")
            .execute(&mut *tx)
            .await?;
        sqlx::query("CREATE TABLE ref_raids (id TEXT PRIMARY KEY, data JSONB NOT NULL)")
            .execute(&mut *tx)
            .await?;
        for (id, data) in raids {
            sqlx::query("INSERT INTO ref_raids (id, data) VALUES ($1, $2) ON CONFLICT DO NOTHING")
                .bind(id)
                .bind(Json(data))
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await
    }

    pub async fn raids(pool: &PgPool) -> Result<Vec<RaidEntry>, sqlx::Error> {
        sqlx::query_as::<_, RaidEntry>("SELECT id, data FROM ref_raids ORDER BY id")
            .fetch_all(pool)
            .await
    }
}

fn escape_like(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
