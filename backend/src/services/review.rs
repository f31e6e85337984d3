//! Supply review service

use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use shared::models::Review;
use shared::validation;

use crate::error::{AppError, AppResult};

/// Review service for supply item feedback
#[derive(Clone)]
pub struct ReviewService {
    db: PgPool,
}

/// Input for adding a review
#[derive(Debug, Deserialize)]
pub struct AddReviewInput {
    pub rating: i16,
    pub comment: Option<String>,
}

type ReviewTuple = (Uuid, Uuid, Uuid, i16, Option<String>, DateTime<Utc>);

fn review_from_tuple(row: ReviewTuple) -> Review {
    Review {
        id: row.0,
        supply_id: row.1,
        user_id: row.2,
        rating: row.3,
        comment: row.4,
        created_at: row.5,
    }
}

impl ReviewService {
    /// Create a new ReviewService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Get reviews for a supply, newest first
    pub async fn list_for_supply(&self, team_id: Uuid, supply_id: Uuid) -> AppResult<Vec<Review>> {
        self.ensure_supply_in_team(team_id, supply_id).await?;

        let rows = sqlx::query_as::<_, ReviewTuple>(
            r#"
            SELECT id, supply_id, user_id, rating, comment, created_at
            FROM reviews
            WHERE supply_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(supply_id)
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(review_from_tuple).collect())
    }

    /// Add a review to a supply
    pub async fn add_review(
        &self,
        team_id: Uuid,
        supply_id: Uuid,
        user_id: Uuid,
        input: AddReviewInput,
    ) -> AppResult<Review> {
        if let Err(message) = validation::validate_rating(input.rating) {
            return Err(AppError::Validation {
                field: "rating".to_string(),
                message: message.to_string(),
                message_ja: "評価は1〜5で指定してください".to_string(),
            });
        }

        self.ensure_supply_in_team(team_id, supply_id).await?;

        let row = sqlx::query_as::<_, ReviewTuple>(
            r#"
            INSERT INTO reviews (supply_id, user_id, rating, comment)
            VALUES ($1, $2, $3, $4)
            RETURNING id, supply_id, user_id, rating, comment, created_at
            "#,
        )
        .bind(supply_id)
        .bind(user_id)
        .bind(input.rating)
        .bind(&input.comment)
        .fetch_one(&self.db)
        .await?;

        Ok(review_from_tuple(row))
    }

    /// Validate the supply exists and belongs to the team
    async fn ensure_supply_in_team(&self, team_id: Uuid, supply_id: Uuid) -> AppResult<()> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM supplies WHERE id = $1 AND team_id = $2)",
        )
        .bind(supply_id)
        .bind(team_id)
        .fetch_one(&self.db)
        .await?;

        if !exists {
            return Err(AppError::NotFound("Supply".to_string()));
        }
        Ok(())
    }
}
