//! Supply management service wrapping the lot-based stock engine
//!
//! The engine itself is pure (see `shared::stock`); this service gives each
//! operation a consistent snapshot by locking the supply row for the duration
//! of the read-modify-write transaction, so concurrent consume/restock
//! requests against the same supply cannot lose each other's lot updates.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::{types::Json, FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;
use validator::Validate;

use shared::models::{Lot, Supply};
use shared::stock::{self, ConsumeOutcome, RestockOutcome};
use shared::validation;

use crate::error::{AppError, AppResult};

/// Supply service for inventory CRUD, consumption and restocking
#[derive(Clone)]
pub struct SupplyService {
    db: PgPool,
}

/// Input for registering a supply
#[derive(Debug, Deserialize, Validate)]
pub struct CreateSupplyInput {
    #[validate(length(min = 1, max = 100, message = "name must be 1-100 characters"))]
    pub name: String,
    #[validate(length(min = 1, max = 50, message = "category must be 1-50 characters"))]
    pub category: String,
    #[validate(length(min = 1, max = 50, message = "unit must be 1-50 characters"))]
    pub unit: String,
    #[validate(length(max = 50, message = "purchase location must be at most 50 characters"))]
    pub purchase_location: Option<String>,
    #[validate(range(min = 0, message = "initial quantity cannot be negative"))]
    pub quantity: i64,
    pub expiry_date: Option<NaiveDate>,
    pub purchase_price: Option<Decimal>,
}

/// Input for a consumption request
#[derive(Debug, Deserialize)]
pub struct ConsumeInput {
    pub quantity: i64,
}

/// Input for a restock request
#[derive(Debug, Deserialize)]
pub struct RestockInput {
    pub quantity: i64,
    /// ISO calendar date (YYYY-MM-DD)
    pub expiry_date: String,
    pub purchase_price: Option<Decimal>,
}

const SUPPLY_COLUMNS: &str = "id, team_id, name, category, unit, purchase_location, quantity, \
     expiry_date, lots, consumption_count, last_consumed_date, zero_stock_since, is_archived, \
     registered_at, updated_at";

/// Row for supply queries; lots are stored as a JSONB array
#[derive(Debug, FromRow)]
pub(crate) struct SupplyRow {
    id: Uuid,
    team_id: Uuid,
    name: String,
    category: String,
    unit: String,
    purchase_location: Option<String>,
    quantity: i64,
    expiry_date: Option<NaiveDate>,
    lots: Json<Vec<Lot>>,
    consumption_count: i64,
    last_consumed_date: Option<DateTime<Utc>>,
    zero_stock_since: Option<DateTime<Utc>>,
    is_archived: bool,
    registered_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<SupplyRow> for Supply {
    fn from(row: SupplyRow) -> Self {
        Supply {
            id: row.id,
            team_id: row.team_id,
            name: row.name,
            category: row.category,
            unit: row.unit,
            purchase_location: row.purchase_location,
            quantity: row.quantity,
            expiry_date: row.expiry_date,
            lots: row.lots.0,
            consumption_count: row.consumption_count,
            last_consumed_date: row.last_consumed_date,
            zero_stock_since: row.zero_stock_since,
            is_archived: row.is_archived,
            registered_at: row.registered_at,
            updated_at: row.updated_at,
        }
    }
}

/// Lock a supply row for a read-modify-write transaction
pub(crate) async fn lock_supply(
    tx: &mut Transaction<'_, Postgres>,
    supply_id: Uuid,
) -> AppResult<Option<Supply>> {
    let query =
        format!("SELECT {SUPPLY_COLUMNS} FROM supplies WHERE id = $1 FOR UPDATE");
    let row = sqlx::query_as::<_, SupplyRow>(&query)
        .bind(supply_id)
        .fetch_optional(&mut **tx)
        .await?;

    Ok(row.map(Supply::from))
}

/// Persist the fields the stock engine touches
pub(crate) async fn persist_stock_fields(
    tx: &mut Transaction<'_, Postgres>,
    supply: &Supply,
) -> AppResult<()> {
    sqlx::query(
        r#"
        UPDATE supplies
        SET quantity = $1, expiry_date = $2, lots = $3, consumption_count = $4,
            last_consumed_date = $5, zero_stock_since = $6, updated_at = NOW()
        WHERE id = $7
        "#,
    )
    .bind(supply.quantity)
    .bind(supply.expiry_date)
    .bind(Json(&supply.lots))
    .bind(supply.consumption_count)
    .bind(supply.last_consumed_date)
    .bind(supply.zero_stock_since)
    .bind(supply.id)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

impl SupplyService {
    /// Create a new SupplyService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Register a new supply item
    pub async fn create_supply(&self, team_id: Uuid, input: CreateSupplyInput) -> AppResult<Supply> {
        input
            .validate()
            .map_err(|e| AppError::ValidationError(e.to_string()))?;
        if let Err(message) = validation::validate_supply_name(&input.name) {
            return Err(AppError::Validation {
                field: "name".to_string(),
                message: message.to_string(),
                message_ja: "名前を入力してください".to_string(),
            });
        }
        if let Some(price) = input.purchase_price {
            if let Err(message) = validation::validate_purchase_price(price) {
                return Err(AppError::Validation {
                    field: "purchase_price".to_string(),
                    message: message.to_string(),
                    message_ja: "購入価格は0以上で指定してください".to_string(),
                });
            }
        }

        let now = Utc::now();

        // An initial quantity with a known expiry date starts as one lot;
        // without a date the record stays in the legacy single-lot shape
        // until the first restock.
        let lots: Vec<Lot> = match (input.quantity, input.expiry_date) {
            (q, Some(date)) if q > 0 => vec![Lot {
                date,
                quantity: q,
                added_at: now,
                purchase_price: input.purchase_price,
            }],
            _ => vec![],
        };

        let query = format!(
            r#"
            INSERT INTO supplies (team_id, name, category, unit, purchase_location,
                                  quantity, expiry_date, lots)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {SUPPLY_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, SupplyRow>(&query)
            .bind(team_id)
            .bind(input.name.trim())
            .bind(input.category.trim())
            .bind(input.unit.trim())
            .bind(&input.purchase_location)
            .bind(input.quantity)
            .bind(input.expiry_date)
            .bind(Json(&lots))
            .fetch_one(&self.db)
            .await?;

        Ok(Supply::from(row))
    }

    /// Get all supplies for a team
    pub async fn list_supplies(
        &self,
        team_id: Uuid,
        include_archived: bool,
    ) -> AppResult<Vec<Supply>> {
        let filter = if include_archived {
            ""
        } else {
            " AND is_archived = FALSE"
        };
        let query = format!(
            "SELECT {SUPPLY_COLUMNS} FROM supplies WHERE team_id = $1{filter} \
             ORDER BY registered_at DESC"
        );
        let rows = sqlx::query_as::<_, SupplyRow>(&query)
            .bind(team_id)
            .fetch_all(&self.db)
            .await?;

        Ok(rows.into_iter().map(Supply::from).collect())
    }

    /// Get a supply by ID
    pub async fn get_supply(&self, team_id: Uuid, supply_id: Uuid) -> AppResult<Supply> {
        let query =
            format!("SELECT {SUPPLY_COLUMNS} FROM supplies WHERE id = $1 AND team_id = $2");
        let row = sqlx::query_as::<_, SupplyRow>(&query)
            .bind(supply_id)
            .bind(team_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Supply".to_string()))?;

        Ok(Supply::from(row))
    }

    /// Consume stock in first-expired-first-out order
    pub async fn consume(
        &self,
        team_id: Uuid,
        supply_id: Uuid,
        input: ConsumeInput,
    ) -> AppResult<(Supply, ConsumeOutcome)> {
        let mut tx = self.db.begin().await?;

        let mut supply = lock_supply(&mut tx, supply_id)
            .await?
            .filter(|s| s.team_id == team_id)
            .ok_or_else(|| AppError::NotFound("Supply".to_string()))?;
        if supply.is_archived {
            return Err(AppError::Validation {
                field: "supply".to_string(),
                message: "Archived supplies cannot be consumed".to_string(),
                message_ja: "アーカイブ済みの備蓄品は消費できません".to_string(),
            });
        }

        let outcome = stock::consume(&mut supply, input.quantity, Utc::now())?;

        persist_stock_fields(&mut tx, &supply).await?;
        tx.commit().await?;

        tracing::info!(
            supply_id = %supply.id,
            requested = outcome.requested,
            fulfilled = outcome.fulfilled,
            remaining = supply.quantity,
            "consumed supply"
        );

        Ok((supply, outcome))
    }

    /// Restock with a new purchased batch
    pub async fn restock(
        &self,
        team_id: Uuid,
        supply_id: Uuid,
        input: RestockInput,
    ) -> AppResult<(Supply, RestockOutcome)> {
        let expiry_date = validation::validate_expiry_date(&input.expiry_date).map_err(|m| {
            AppError::Validation {
                field: "expiry_date".to_string(),
                message: m.to_string(),
                message_ja: "賞味期限はYYYY-MM-DD形式で指定してください".to_string(),
            }
        })?;

        let mut tx = self.db.begin().await?;

        let mut supply = lock_supply(&mut tx, supply_id)
            .await?
            .filter(|s| s.team_id == team_id)
            .ok_or_else(|| AppError::NotFound("Supply".to_string()))?;
        if supply.is_archived {
            return Err(AppError::Validation {
                field: "supply".to_string(),
                message: "Archived supplies cannot be restocked".to_string(),
                message_ja: "アーカイブ済みの備蓄品は補充できません".to_string(),
            });
        }

        let outcome = stock::restock(
            &mut supply,
            input.quantity,
            expiry_date,
            input.purchase_price,
            Utc::now(),
        )?;

        persist_stock_fields(&mut tx, &supply).await?;
        tx.commit().await?;

        tracing::info!(
            supply_id = %supply.id,
            added = outcome.added,
            merged = outcome.merged,
            total = outcome.total,
            "restocked supply"
        );

        Ok((supply, outcome))
    }

    /// Delete a supply and its reviews
    pub async fn delete_supply(&self, team_id: Uuid, supply_id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM supplies WHERE id = $1 AND team_id = $2")
            .bind(supply_id)
            .bind(team_id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Supply".to_string()));
        }

        Ok(())
    }
}
