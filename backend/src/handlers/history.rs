//! HTTP handlers for consumption history endpoints

use axum::{
    extract::{Query, State},
    http::header,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;

use shared::models::SupplyHistory;
use shared::types::{PaginatedResponse, Pagination};

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::HistoryService;
use crate::AppState;

/// Query parameters for listing histories
#[derive(Debug, Deserialize)]
pub struct ListHistoriesQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

/// List the team's history records
pub async fn list_histories(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<ListHistoriesQuery>,
) -> AppResult<Json<PaginatedResponse<SupplyHistory>>> {
    let defaults = Pagination::default();
    let pagination = Pagination {
        page: query.page.unwrap_or(defaults.page),
        per_page: query.per_page.unwrap_or(defaults.per_page),
    };

    let service = HistoryService::new(state.db);
    let histories = service
        .list_histories(current_user.0.team_id, pagination)
        .await?;
    Ok(Json(histories))
}

/// Export the team's history records as CSV
pub async fn export_histories(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<impl IntoResponse> {
    let service = HistoryService::new(state.db);
    let csv_data = service.export_csv(current_user.0.team_id).await?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"supply_history.csv\"",
            ),
        ],
        csv_data,
    ))
}
