use axum::extract::State;

use crate::database::configuracion::ConfiguracionRepository;
use crate::middleware::{ApiResponse, ApiResult, ValidatedJson};
use crate::models::{ActualizarConfiguracion, EntradaConfiguracion, EstadoBot};
use crate::state::AppState;

fn repo(state: &AppState) -> ConfiguracionRepository {
    ConfiguracionRepository::new(state.pool.clone())
}

/// GET /api/configuracion
pub async fn get(State(state): State<AppState>) -> ApiResult<Vec<EntradaConfiguracion>> {
    Ok(ApiResponse::success(repo(&state).all().await?))
}

/// PUT /api/configuracion
pub async fn update(
    State(state): State<AppState>,
    ValidatedJson(ActualizarConfiguracion(valores)): ValidatedJson<ActualizarConfiguracion>,
) -> ApiResult<Vec<EntradaConfiguracion>> {
    Ok(ApiResponse::success(repo(&state).update(&valores).await?))
}

/// GET /api/bot/estado
pub async fn bot_estado(State(state): State<AppState>) -> ApiResult<EstadoBot> {
    Ok(ApiResponse::success(repo(&state).estado_bot().await?))
}

/// POST /api/bot/pausar
pub async fn bot_pausar(State(state): State<AppState>) -> ApiResult<EstadoBot> {
    Ok(ApiResponse::success(repo(&state).set_bot_activo(false).await?))
}

/// POST /api/bot/reanudar
pub async fn bot_reanudar(State(state): State<AppState>) -> ApiResult<EstadoBot> {
    Ok(ApiResponse::success(repo(&state).set_bot_activo(true).await?))
}
