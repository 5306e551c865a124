use axum::{extract::State, response::Json};
use serde_json::{json, Value};
use tracing::{error, info};

use crate::database::DatabaseManager;
use crate::error::ApiError;
use crate::state::AppState;

/// POST /admin/migrate - apply embedded migrations in-process
pub async fn migrate(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    info!("Running migrations");

    let report = DatabaseManager::run_migrations(&state.pool).await.map_err(|e| {
        error!("Migration failed: {}", e);
        ApiError::internal_server_error(e.to_string())
    })?;

    Ok(Json(json!({
        "success": true,
        "output": report.output,
        "applied": report.applied,
    })))
}
