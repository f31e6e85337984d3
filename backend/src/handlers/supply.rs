//! HTTP handlers for supply management endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared::models::Supply;
use shared::stock::ConsumedLot;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::supply::{ConsumeInput, CreateSupplyInput, RestockInput, SupplyService};
use crate::services::TeamService;
use crate::AppState;

/// Query parameters for listing supplies
#[derive(Debug, Deserialize)]
pub struct ListSuppliesQuery {
    #[serde(default)]
    pub include_archived: bool,
}

/// Register a new supply
pub async fn create_supply(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateSupplyInput>,
) -> AppResult<Json<Supply>> {
    let service = SupplyService::new(state.db);
    let supply = service.create_supply(current_user.0.team_id, input).await?;
    state.supply_cache.invalidate(current_user.0.team_id);
    Ok(Json(supply))
}

/// List supplies for the team
///
/// The active list is served from the shared cache when fresh; requests that
/// include archived items always hit the database.
pub async fn list_supplies(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<ListSuppliesQuery>,
) -> AppResult<Json<Vec<Supply>>> {
    let team_id = current_user.0.team_id;

    if !query.include_archived {
        if let Some(cached) = state.supply_cache.get(team_id) {
            return Ok(Json(cached));
        }
    }

    let service = SupplyService::new(state.db);
    let supplies = service.list_supplies(team_id, query.include_archived).await?;

    if !query.include_archived {
        state.supply_cache.put(team_id, supplies.clone());
    }

    Ok(Json(supplies))
}

/// Get a supply by ID
pub async fn get_supply(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(supply_id): Path<Uuid>,
) -> AppResult<Json<Supply>> {
    let service = SupplyService::new(state.db);
    let supply = service.get_supply(current_user.0.team_id, supply_id).await?;
    Ok(Json(supply))
}

/// Consume stock from a supply
pub async fn consume_supply(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(supply_id): Path<Uuid>,
    Json(input): Json<ConsumeInput>,
) -> AppResult<Json<ConsumeResponse>> {
    let service = SupplyService::new(state.db);
    let (supply, outcome) = service
        .consume(current_user.0.team_id, supply_id, input)
        .await?;
    state.supply_cache.invalidate(current_user.0.team_id);

    Ok(Json(ConsumeResponse {
        quantity: supply.quantity,
        consumed: outcome.consumed,
        requested: outcome.requested,
        fulfilled: outcome.fulfilled,
    }))
}

/// Restock a supply with a new purchased batch
pub async fn restock_supply(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(supply_id): Path<Uuid>,
    Json(input): Json<RestockInput>,
) -> AppResult<Json<RestockResponse>> {
    let service = SupplyService::new(state.db);
    let (supply, outcome) = service
        .restock(current_user.0.team_id, supply_id, input)
        .await?;
    state.supply_cache.invalidate(current_user.0.team_id);

    Ok(Json(RestockResponse {
        quantity: supply.quantity,
        added: outcome.added,
        date: outcome.date.to_string(),
        merged: outcome.merged,
    }))
}

/// Delete a supply (admin or owner only)
pub async fn delete_supply(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(supply_id): Path<Uuid>,
) -> AppResult<Json<()>> {
    let teams = TeamService::new(state.db.clone());
    teams
        .require_manager(current_user.0.team_id, current_user.0.user_id)
        .await?;

    let service = SupplyService::new(state.db);
    service
        .delete_supply(current_user.0.team_id, supply_id)
        .await?;
    state.supply_cache.invalidate(current_user.0.team_id);
    Ok(Json(()))
}

/// Response for a consumption request
#[derive(Debug, Serialize)]
pub struct ConsumeResponse {
    /// New total quantity
    pub quantity: i64,
    /// Per-lot breakdown in draw-down order
    pub consumed: Vec<ConsumedLot>,
    pub requested: i64,
    pub fulfilled: i64,
}

/// Response for a restock request
#[derive(Debug, Serialize)]
pub struct RestockResponse {
    /// New total quantity
    pub quantity: i64,
    pub added: i64,
    pub date: String,
    pub merged: bool,
}
