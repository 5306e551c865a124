// handlers/pedidos.rs - /api/pedidos

use axum::extract::State;
use uuid::Uuid;

use crate::database::pedidos::PedidoRepository;
use crate::middleware::{ApiResponse, ApiResult, CleanPath, ValidatedJson, ValidatedQuery};
use crate::models::{CambioEstado, NuevoPedido, Pagina, Paginacion, Pedido, PedidosQuery};
use crate::state::AppState;

fn repo(state: &AppState) -> PedidoRepository {
    PedidoRepository::new(state.pool.clone())
}

pub async fn list(
    State(state): State<AppState>,
    ValidatedQuery(query): ValidatedQuery<PedidosQuery>,
) -> ApiResult<Pagina<Pedido>> {
    let paginacion = Paginacion::new(query.page, query.limit, state.config.api.default_page_size);
    Ok(ApiResponse::success(repo(&state).list(&query, paginacion).await?))
}

pub async fn get(State(state): State<AppState>, CleanPath(id): CleanPath<Uuid>) -> ApiResult<Pedido> {
    Ok(ApiResponse::success(repo(&state).get(id).await?))
}

/// POST /api/pedidos - totals are recomputed from the items
pub async fn create(
    State(state): State<AppState>,
    ValidatedJson(nuevo): ValidatedJson<NuevoPedido>,
) -> ApiResult<Pedido> {
    Ok(ApiResponse::created(repo(&state).create(&nuevo).await?))
}

/// PATCH /api/pedidos/:id/estado
pub async fn cambiar_estado(
    State(state): State<AppState>,
    CleanPath(id): CleanPath<Uuid>,
    ValidatedJson(cambio): ValidatedJson<CambioEstado>,
) -> ApiResult<Pedido> {
    Ok(ApiResponse::success(repo(&state).cambiar_estado(id, cambio.estado).await?))
}
