use axum::extract::State;

use crate::database::resumen::{resumen, Resumen};
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

/// GET /api/resumen
pub async fn get(State(state): State<AppState>) -> ApiResult<Resumen> {
    Ok(ApiResponse::success(resumen(&state.pool).await?))
}
