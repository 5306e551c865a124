// handlers/auth.rs - /api/auth

use axum::{extract::State, Extension};
use tracing::{info, warn};

use crate::auth::{generate_jwt, verify_password, AuthError, Claims};
use crate::database::usuarios::UsuarioRepository;
use crate::middleware::{ApiResponse, ApiResult, AuthUser, ValidatedJson};
use crate::models::{Credenciales, Sesion, Usuario};
use crate::state::AppState;

/// POST /api/auth/login
///
/// Unknown emails, inactive accounts and wrong passwords all answer with the
/// same 401.
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(credenciales): ValidatedJson<Credenciales>,
) -> ApiResult<Sesion> {
    let usuario = UsuarioRepository::new(state.pool.clone())
        .find_by_email(&credenciales.email)
        .await?
        .filter(|u| u.activo)
        .ok_or(AuthError::InvalidCredentials)?;

    if let Err(e) = verify_password(&credenciales.password, &usuario.password_hash) {
        warn!(email = %usuario.email, "Rejected login");
        return Err(e.into());
    }

    let security = &state.config.security;
    let token = generate_jwt(&Claims::new(&usuario, security.jwt_expiry_hours), security)?;
    info!(email = %usuario.email, rol = %usuario.rol, "Issued token");

    Ok(ApiResponse::success(Sesion {
        token,
        expires_in: security.jwt_expiry_hours * 3600,
        usuario,
    }))
}

/// GET /api/auth/me
pub async fn me(State(state): State<AppState>, Extension(user): Extension<AuthUser>) -> ApiResult<Usuario> {
    let usuario = UsuarioRepository::new(state.pool.clone()).get(user.id).await?;
    Ok(ApiResponse::success(usuario))
}
