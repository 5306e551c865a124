use axum::extract::State;
use tracing::info;

use crate::auth::hash_password;
use crate::database::usuarios::UsuarioRepository;
use crate::middleware::{ApiResponse, ApiResult, ValidatedJson};
use crate::models::{NuevoAdmin, Rol, Usuario};
use crate::state::AppState;

/// POST /admin/create-admin - 409 when the email is taken
pub async fn create_admin(
    State(state): State<AppState>,
    ValidatedJson(nuevo): ValidatedJson<NuevoAdmin>,
) -> ApiResult<Usuario> {
    let password_hash = hash_password(&nuevo.password)?;
    let usuario = UsuarioRepository::new(state.pool.clone())
        .create(&nuevo.email, &password_hash, &nuevo.nombre, Rol::Admin)
        .await?;

    info!(email = %usuario.email, "Created admin usuario");
    Ok(ApiResponse::created(usuario))
}
