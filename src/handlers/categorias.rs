use axum::extract::State;

use crate::database::productos::ProductoRepository;
use crate::middleware::{ApiResponse, ApiResult};
use crate::models::Categoria;
use crate::state::AppState;

/// GET /api/categorias
pub async fn list(State(state): State<AppState>) -> ApiResult<Vec<Categoria>> {
    let categorias = ProductoRepository::new(state.pool.clone()).categorias().await?;
    Ok(ApiResponse::success(categorias))
}
