// handlers/productos.rs - /api/productos

use axum::extract::State;
use tracing::info;
use uuid::Uuid;

use crate::database::productos::ProductoRepository;
use crate::middleware::{ApiResponse, ApiResult, CleanPath, ValidatedJson, ValidatedQuery};
use crate::models::{
    ActualizarProducto, LoteProductos, NuevoProducto, Pagina, Paginacion, Producto, ProductosQuery,
};
use crate::state::AppState;

fn repo(state: &AppState) -> ProductoRepository {
    ProductoRepository::new(state.pool.clone())
}

/// GET /api/productos
pub async fn list(
    State(state): State<AppState>,
    ValidatedQuery(query): ValidatedQuery<ProductosQuery>,
) -> ApiResult<Pagina<Producto>> {
    let paginacion = Paginacion::new(query.page, query.limit, state.config.api.default_page_size);
    let pagina = repo(&state).list(&query, paginacion).await?;
    Ok(ApiResponse::success(pagina))
}

/// GET /api/productos/:id
pub async fn get(State(state): State<AppState>, CleanPath(id): CleanPath<Uuid>) -> ApiResult<Producto> {
    Ok(ApiResponse::success(repo(&state).get(id).await?))
}

/// GET /api/productos/codigo/:codigo
pub async fn get_by_barcode(
    State(state): State<AppState>,
    CleanPath(codigo): CleanPath<String>,
) -> ApiResult<Producto> {
    Ok(ApiResponse::success(repo(&state).get_by_barcode(&codigo).await?))
}

/// POST /api/productos
pub async fn create(
    State(state): State<AppState>,
    ValidatedJson(nuevo): ValidatedJson<NuevoProducto>,
) -> ApiResult<Producto> {
    let producto = repo(&state).create(&nuevo).await?;
    info!(id = %producto.id, clave = %producto.clave(), "Created producto");
    Ok(ApiResponse::created(producto))
}

/// POST /api/productos/lote
pub async fn create_batch(
    State(state): State<AppState>,
    ValidatedJson(lote): ValidatedJson<LoteProductos>,
) -> ApiResult<Vec<Producto>> {
    let productos = repo(&state).create_batch(&lote.productos).await?;
    info!(count = productos.len(), "Created producto batch");
    Ok(ApiResponse::created(productos))
}

/// PUT /api/productos/:id
pub async fn update(
    State(state): State<AppState>,
    CleanPath(id): CleanPath<Uuid>,
    ValidatedJson(cambios): ValidatedJson<ActualizarProducto>,
) -> ApiResult<Producto> {
    Ok(ApiResponse::success(repo(&state).update(id, &cambios).await?))
}

/// DELETE /api/productos/:id
pub async fn delete(State(state): State<AppState>, CleanPath(id): CleanPath<Uuid>) -> ApiResult<()> {
    repo(&state).delete(id).await?;
    info!(id = %id, "Deleted producto");
    Ok(ApiResponse::no_content())
}
