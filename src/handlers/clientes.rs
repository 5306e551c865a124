// handlers/clientes.rs - /api/clientes

use axum::extract::State;

use crate::database::clientes::ClienteRepository;
use crate::middleware::{ApiResponse, ApiResult, CleanPath, ValidatedJson, ValidatedQuery};
use crate::models::{ActualizarCliente, Cliente, ClienteDetalle, ClientesQuery, NuevoCliente, Pagina, Paginacion};
use crate::state::AppState;

fn repo(state: &AppState) -> ClienteRepository {
    ClienteRepository::new(state.pool.clone())
}

pub async fn list(
    State(state): State<AppState>,
    ValidatedQuery(query): ValidatedQuery<ClientesQuery>,
) -> ApiResult<Pagina<Cliente>> {
    let paginacion = Paginacion::new(query.page, query.limit, state.config.api.default_page_size);
    Ok(ApiResponse::success(repo(&state).list(&query, paginacion).await?))
}

pub async fn get(
    State(state): State<AppState>,
    CleanPath(telefono): CleanPath<String>,
) -> ApiResult<ClienteDetalle> {
    Ok(ApiResponse::success(repo(&state).get(&telefono).await?))
}

pub async fn create(
    State(state): State<AppState>,
    ValidatedJson(nuevo): ValidatedJson<NuevoCliente>,
) -> ApiResult<Cliente> {
    Ok(ApiResponse::created(repo(&state).create(&nuevo).await?))
}

pub async fn update(
    State(state): State<AppState>,
    CleanPath(telefono): CleanPath<String>,
    ValidatedJson(cambios): ValidatedJson<ActualizarCliente>,
) -> ApiResult<Cliente> {
    Ok(ApiResponse::success(repo(&state).rename(&telefono, &cambios.nombre).await?))
}
