//! Consumption history service
//!
//! Owns persistence of the archival aggregates: the merge-vs-create decision
//! for the `(team_id, name, category)` key, team-scoped listing and CSV
//! export. The merge arithmetic itself lives in `shared::history`.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::{types::Json, FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

use shared::history::merge_history;
use shared::models::SupplyHistory;
use shared::types::{PaginatedResponse, Pagination, PaginationMeta};

use crate::error::{AppError, AppResult};

/// History service for archival records
#[derive(Clone)]
pub struct HistoryService {
    db: PgPool,
}

const HISTORY_COLUMNS: &str = "id, team_id, name, category, unit, total_consumed, average_stock, \
     purchase_locations, last_used_date, first_registered_date, has_reviews, review_count, \
     archived_at, archived_by";

/// Row for history queries; the location set is stored as a JSONB array
#[derive(Debug, FromRow)]
struct HistoryRow {
    id: Uuid,
    team_id: Uuid,
    name: String,
    category: String,
    unit: String,
    total_consumed: i64,
    average_stock: Decimal,
    purchase_locations: Json<BTreeSet<String>>,
    last_used_date: DateTime<Utc>,
    first_registered_date: DateTime<Utc>,
    has_reviews: bool,
    review_count: i64,
    archived_at: DateTime<Utc>,
    archived_by: String,
}

impl From<HistoryRow> for SupplyHistory {
    fn from(row: HistoryRow) -> Self {
        SupplyHistory {
            id: row.id,
            team_id: row.team_id,
            name: row.name,
            category: row.category,
            unit: row.unit,
            total_consumed: row.total_consumed,
            average_stock: row.average_stock,
            purchase_locations: row.purchase_locations.0,
            last_used_date: row.last_used_date,
            first_registered_date: row.first_registered_date,
            has_reviews: row.has_reviews,
            review_count: row.review_count,
            archived_at: row.archived_at,
            archived_by: row.archived_by,
        }
    }
}

/// One line of the CSV export
#[derive(Debug, Serialize)]
struct HistoryExportRow {
    name: String,
    category: String,
    unit: String,
    total_consumed: i64,
    average_stock: Decimal,
    purchase_locations: String,
    last_used_date: DateTime<Utc>,
    first_registered_date: DateTime<Utc>,
    review_count: i64,
    archived_at: DateTime<Utc>,
    archived_by: String,
}

impl HistoryService {
    /// Create a new HistoryService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Merge a fresh archival into the record sharing its key, or create one
    ///
    /// Runs inside the caller's transaction; the existing record is locked so
    /// two concurrent archivals of the same key serialize instead of both
    /// creating. The unique index on the key backstops the create path.
    pub async fn upsert(
        tx: &mut Transaction<'_, Postgres>,
        incoming: SupplyHistory,
    ) -> AppResult<SupplyHistory> {
        let query = format!(
            "SELECT {HISTORY_COLUMNS} FROM supply_histories \
             WHERE team_id = $1 AND name = $2 AND category = $3 \
             LIMIT 1 FOR UPDATE"
        );
        let existing = sqlx::query_as::<_, HistoryRow>(&query)
            .bind(incoming.team_id)
            .bind(&incoming.name)
            .bind(&incoming.category)
            .fetch_optional(&mut **tx)
            .await?
            .map(SupplyHistory::from);

        match existing {
            Some(existing) => {
                let merged = merge_history(&existing, &incoming);
                sqlx::query(
                    r#"
                    UPDATE supply_histories
                    SET total_consumed = $1, average_stock = $2, purchase_locations = $3,
                        last_used_date = $4, has_reviews = $5, review_count = $6,
                        archived_at = $7, archived_by = $8
                    WHERE id = $9
                    "#,
                )
                .bind(merged.total_consumed)
                .bind(merged.average_stock)
                .bind(Json(&merged.purchase_locations))
                .bind(merged.last_used_date)
                .bind(merged.has_reviews)
                .bind(merged.review_count)
                .bind(merged.archived_at)
                .bind(&merged.archived_by)
                .bind(merged.id)
                .execute(&mut **tx)
                .await?;

                Ok(merged)
            }
            None => {
                sqlx::query(
                    r#"
                    INSERT INTO supply_histories (id, team_id, name, category, unit,
                        total_consumed, average_stock, purchase_locations, last_used_date,
                        first_registered_date, has_reviews, review_count, archived_at, archived_by)
                    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
                    "#,
                )
                .bind(incoming.id)
                .bind(incoming.team_id)
                .bind(&incoming.name)
                .bind(&incoming.category)
                .bind(&incoming.unit)
                .bind(incoming.total_consumed)
                .bind(incoming.average_stock)
                .bind(Json(&incoming.purchase_locations))
                .bind(incoming.last_used_date)
                .bind(incoming.first_registered_date)
                .bind(incoming.has_reviews)
                .bind(incoming.review_count)
                .bind(incoming.archived_at)
                .bind(&incoming.archived_by)
                .execute(&mut **tx)
                .await
                .map_err(|e| {
                    let key_conflict = e.as_database_error().and_then(|d| d.constraint())
                        == Some("uq_supply_histories_key");
                    if key_conflict {
                        AppError::DuplicateEntry("supply history".to_string())
                    } else {
                        AppError::DatabaseError(e)
                    }
                })?;

                Ok(incoming)
            }
        }
    }

    /// List a team's history records, most recently archived first
    pub async fn list_histories(
        &self,
        team_id: Uuid,
        pagination: Pagination,
    ) -> AppResult<PaginatedResponse<SupplyHistory>> {
        let total_items = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM supply_histories WHERE team_id = $1",
        )
        .bind(team_id)
        .fetch_one(&self.db)
        .await?;

        let query = format!(
            "SELECT {HISTORY_COLUMNS} FROM supply_histories WHERE team_id = $1 \
             ORDER BY archived_at DESC LIMIT $2 OFFSET $3"
        );
        let rows = sqlx::query_as::<_, HistoryRow>(&query)
            .bind(team_id)
            .bind(i64::from(pagination.per_page.max(1)))
            .bind(pagination.offset() as i64)
            .fetch_all(&self.db)
            .await?;

        Ok(PaginatedResponse {
            data: rows.into_iter().map(SupplyHistory::from).collect(),
            pagination: PaginationMeta::new(&pagination, total_items as u64),
        })
    }

    /// Export a team's history records as CSV
    pub async fn export_csv(&self, team_id: Uuid) -> AppResult<String> {
        let query = format!(
            "SELECT {HISTORY_COLUMNS} FROM supply_histories WHERE team_id = $1 \
             ORDER BY archived_at DESC"
        );
        let rows = sqlx::query_as::<_, HistoryRow>(&query)
            .bind(team_id)
            .fetch_all(&self.db)
            .await?;

        let export: Vec<HistoryExportRow> = rows
            .into_iter()
            .map(SupplyHistory::from)
            .map(|h| HistoryExportRow {
                name: h.name,
                category: h.category,
                unit: h.unit,
                total_consumed: h.total_consumed,
                average_stock: h.average_stock,
                purchase_locations: h
                    .purchase_locations
                    .iter()
                    .cloned()
                    .collect::<Vec<_>>()
                    .join(";"),
                last_used_date: h.last_used_date,
                first_registered_date: h.first_registered_date,
                review_count: h.review_count,
                archived_at: h.archived_at,
                archived_by: h.archived_by,
            })
            .collect();

        Self::write_csv(&export)
    }

    /// Serialize rows as CSV
    fn write_csv<T: Serialize>(data: &[T]) -> AppResult<String> {
        let mut wtr = csv::Writer::from_writer(vec![]);
        for record in data {
            wtr.serialize(record).map_err(|e| {
                AppError::Internal(format!("CSV serialization error: {}", e))
            })?;
        }
        let csv_data = String::from_utf8(
            wtr.into_inner()
                .map_err(|e| AppError::Internal(format!("CSV writer error: {}", e)))?,
        )
        .map_err(|e| AppError::Internal(format!("UTF-8 conversion error: {}", e)))?;
        Ok(csv_data)
    }
}
