//! Archival pipeline: manual archiving and the zero-stock sweep
//!
//! Both paths run the same sequence per supply: lock the row, collect its
//! reviews, build the history record, merge it into the team's history, and
//! flag the supply archived. The sweep processes candidates independently so
//! one failure cannot abort the rest of the batch.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use shared::history::{is_auto_archive_candidate, to_history};
use shared::models::{Review, SupplyHistory, SYSTEM_PRINCIPAL};

use crate::error::{AppError, AppResult};
use crate::services::history::HistoryService;
use crate::services::supply::lock_supply;

/// Archive service for history reconciliation
#[derive(Clone)]
pub struct ArchiveService {
    db: PgPool,
}

/// Result of one auto-archive sweep
#[derive(Debug, Serialize)]
pub struct SweepOutcome {
    pub archived: Vec<Uuid>,
    pub errors: Vec<SweepError>,
}

/// One candidate the sweep could not archive
#[derive(Debug, Serialize)]
pub struct SweepError {
    pub supply_id: Uuid,
    pub error: String,
}

impl ArchiveService {
    /// Create a new ArchiveService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Archive a supply on behalf of a user
    pub async fn archive_supply(
        &self,
        team_id: Uuid,
        supply_id: Uuid,
        archived_by: Uuid,
    ) -> AppResult<SupplyHistory> {
        let mut tx = self.db.begin().await?;

        let supply = lock_supply(&mut tx, supply_id)
            .await?
            .filter(|s| s.team_id == team_id)
            .ok_or_else(|| AppError::NotFound("Supply".to_string()))?;
        if supply.is_archived {
            return Err(AppError::Validation {
                field: "supply".to_string(),
                message: "Supply is already archived".to_string(),
                message_ja: "この備蓄品は既にアーカイブされています".to_string(),
            });
        }

        let reviews = fetch_reviews(&mut tx, supply_id).await?;
        let history = to_history(
            &supply,
            &archived_by.to_string(),
            &reviews,
            Utc::now(),
        );
        let stored = HistoryService::upsert(&mut tx, history).await?;

        sqlx::query("UPDATE supplies SET is_archived = TRUE, updated_at = NOW() WHERE id = $1")
            .bind(supply_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!(supply_id = %supply_id, history_id = %stored.id, "archived supply");

        Ok(stored)
    }

    /// Archive every supply that has sat at zero stock past the threshold
    ///
    /// Scoped to one team when `team_id` is given (the HTTP endpoint), or
    /// all teams for scheduled maintenance. Candidates are processed one at
    /// a time, each in its own transaction; failures are collected and
    /// reported, successes commit individually.
    pub async fn run_auto_archive(
        &self,
        team_id: Option<Uuid>,
        threshold_days: i64,
    ) -> AppResult<SweepOutcome> {
        let now = Utc::now();
        let cutoff = now - chrono::Duration::days(threshold_days);

        let candidate_ids = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT id FROM supplies
            WHERE quantity = 0
              AND is_archived = FALSE
              AND zero_stock_since IS NOT NULL
              AND zero_stock_since < $1
              AND ($2::uuid IS NULL OR team_id = $2)
            ORDER BY zero_stock_since ASC
            "#,
        )
        .bind(cutoff)
        .bind(team_id)
        .fetch_all(&self.db)
        .await?;

        tracing::info!(candidates = candidate_ids.len(), "starting auto-archive sweep");

        let mut archived = Vec::new();
        let mut errors = Vec::new();
        for supply_id in candidate_ids {
            match self.archive_candidate(supply_id, now, threshold_days).await {
                Ok(true) => archived.push(supply_id),
                Ok(false) => {
                    // Gate no longer holds under the row lock; restocked
                    // since the candidate query ran.
                    tracing::debug!(supply_id = %supply_id, "sweep candidate skipped");
                }
                Err(err) => {
                    tracing::warn!(supply_id = %supply_id, error = %err, "sweep candidate failed");
                    errors.push(SweepError {
                        supply_id,
                        error: err.to_string(),
                    });
                }
            }
        }

        tracing::info!(
            archived = archived.len(),
            failed = errors.len(),
            "auto-archive sweep finished"
        );

        Ok(SweepOutcome { archived, errors })
    }

    /// Archive one sweep candidate in its own transaction
    ///
    /// Returns false when the supply no longer qualifies under the lock.
    async fn archive_candidate(
        &self,
        supply_id: Uuid,
        now: DateTime<Utc>,
        threshold_days: i64,
    ) -> AppResult<bool> {
        let mut tx = self.db.begin().await?;

        let Some(supply) = lock_supply(&mut tx, supply_id).await? else {
            return Ok(false);
        };
        if !is_auto_archive_candidate(&supply, now, threshold_days) {
            return Ok(false);
        }

        let reviews = fetch_reviews(&mut tx, supply_id).await?;
        let history = to_history(&supply, SYSTEM_PRINCIPAL, &reviews, now);
        HistoryService::upsert(&mut tx, history).await?;

        sqlx::query("UPDATE supplies SET is_archived = TRUE, updated_at = NOW() WHERE id = $1")
            .bind(supply_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(true)
    }
}

/// Reviews for a supply, read inside the archival transaction
async fn fetch_reviews(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    supply_id: Uuid,
) -> AppResult<Vec<Review>> {
    let rows = sqlx::query_as::<_, (Uuid, Uuid, Uuid, i16, Option<String>, DateTime<Utc>)>(
        r#"
        SELECT id, supply_id, user_id, rating, comment, created_at
        FROM reviews
        WHERE supply_id = $1
        ORDER BY created_at ASC
        "#,
    )
    .bind(supply_id)
    .fetch_all(&mut **tx)
    .await?;

    Ok(rows
        .into_iter()
        .map(|r| Review {
            id: r.0,
            supply_id: r.1,
            user_id: r.2,
            rating: r.3,
            comment: r.4,
            created_at: r.5,
        })
        .collect())
}
