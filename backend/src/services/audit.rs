//! Deletion history
//!
//! Every soft delete of a product, order or invoice writes one snapshot row
//! in the same transaction as the flag change. Rows are never updated or
//! removed, and restoring a record leaves its history alone.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use shared::{Auditable, EntityType, HistoryEntry};
use sqlx::{PgConnection, PgPool};

use crate::error::AppResult;

/// Filters for listing history
#[derive(Debug, Default, Deserialize)]
pub struct HistoryQuery {
    pub entity_type: Option<EntityType>,
    pub entity_id: Option<i64>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

/// Snapshot `record` into the history table. Call inside the deleting transaction.
pub async fn record_deletion<T: Auditable>(
    conn: &mut PgConnection,
    record: &T,
) -> AppResult<HistoryEntry> {
    let entry = sqlx::query_as::<_, HistoryEntry>(
        r#"
        INSERT INTO history_entries (entity_type, entity_id, snapshot)
        VALUES ($1, $2, $3)
        RETURNING id, entity_type, entity_id, snapshot, deleted_at
        "#,
    )
    .bind(T::ENTITY_TYPE)
    .bind(record.entity_id())
    .bind(record.snapshot())
    .fetch_one(conn)
    .await?;

    tracing::info!(
        entity_type = ?entry.entity_type,
        entity_id = entry.entity_id,
        "Recorded deletion snapshot"
    );

    Ok(entry)
}

/// Read-only access to deletion history
#[derive(Clone)]
pub struct AuditService {
    db: PgPool,
}

impl AuditService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// List history entries, newest first
    pub async fn list(&self, query: HistoryQuery) -> AppResult<Vec<HistoryEntry>> {
        let entries = sqlx::query_as::<_, HistoryEntry>(
            r#"
            SELECT id, entity_type, entity_id, snapshot, deleted_at
            FROM history_entries
            WHERE ($1::history_entity IS NULL OR entity_type = $1)
              AND ($2::BIGINT IS NULL OR entity_id = $2)
              AND ($3::TIMESTAMPTZ IS NULL OR deleted_at >= $3)
              AND ($4::TIMESTAMPTZ IS NULL OR deleted_at < $4)
            ORDER BY deleted_at DESC, id DESC
            "#,
        )
        .bind(query.entity_type)
        .bind(query.entity_id)
        .bind(query.from)
        .bind(query.to)
        .fetch_all(&self.db)
        .await?;

        Ok(entries)
    }
}
