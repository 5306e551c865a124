use axum::extract::State;

use crate::database::{DatabaseManager, TableCount};
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

/// GET /admin/tables
pub async fn tables(State(state): State<AppState>) -> ApiResult<Vec<TableCount>> {
    Ok(ApiResponse::success(DatabaseManager::table_counts(&state.pool).await?))
}
