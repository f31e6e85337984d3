//! HTTP handlers for supply review endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use shared::models::Review;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::review::AddReviewInput;
use crate::services::ReviewService;
use crate::AppState;

/// List reviews for a supply
pub async fn list_reviews(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(supply_id): Path<Uuid>,
) -> AppResult<Json<Vec<Review>>> {
    let service = ReviewService::new(state.db);
    let reviews = service
        .list_for_supply(current_user.0.team_id, supply_id)
        .await?;
    Ok(Json(reviews))
}

/// Add a review to a supply
pub async fn add_review(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(supply_id): Path<Uuid>,
    Json(input): Json<AddReviewInput>,
) -> AppResult<Json<Review>> {
    let service = ReviewService::new(state.db);
    let review = service
        .add_review(
            current_user.0.team_id,
            supply_id,
            current_user.0.user_id,
            input,
        )
        .await?;
    Ok(Json(review))
}
