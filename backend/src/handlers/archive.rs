//! HTTP handlers for archival and the maintenance sweep

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use shared::models::SupplyHistory;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::archive::SweepOutcome;
use crate::services::{ArchiveService, TeamService};
use crate::AppState;

/// Archive a supply into the team's history (admin or owner only)
pub async fn archive_supply(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(supply_id): Path<Uuid>,
) -> AppResult<Json<SupplyHistory>> {
    let teams = TeamService::new(state.db.clone());
    teams
        .require_manager(current_user.0.team_id, current_user.0.user_id)
        .await?;

    let service = ArchiveService::new(state.db);
    let history = service
        .archive_supply(current_user.0.team_id, supply_id, current_user.0.user_id)
        .await?;
    state.supply_cache.invalidate(current_user.0.team_id);
    Ok(Json(history))
}

/// Run the zero-stock auto-archive sweep (team owner only)
pub async fn run_auto_archive(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<SweepOutcome>> {
    let teams = TeamService::new(state.db.clone());
    teams
        .require_owner(current_user.0.team_id, current_user.0.user_id)
        .await?;

    let service = ArchiveService::new(state.db);
    let outcome = service
        .run_auto_archive(
            Some(current_user.0.team_id),
            state.config.archive.zero_stock_days,
        )
        .await?;
    state.supply_cache.invalidate(current_user.0.team_id);
    Ok(Json(outcome))
}
