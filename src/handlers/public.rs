// handlers/public.rs - service info and health, no authentication

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde_json::{json, Value};

use crate::database::DatabaseManager;
use crate::state::AppState;

/// GET /
pub async fn root() -> Json<Value> {
    Json(json!({
        "success": true,
        "data": {
            "name": "Tienda Bot API",
            "version": env!("CARGO_PKG_VERSION"),
            "description": "REST backend for a WhatsApp shop bot",
            "endpoints": {
                "productos": "/api/productos[/:id] | /api/productos/codigo/:codigo | /api/productos/lote",
                "categorias": "/api/categorias",
                "clientes": "/api/clientes[/:telefono]",
                "pedidos": "/api/pedidos[/:id] | /api/pedidos/:id/estado",
                "configuracion": "/api/configuracion",
                "bot": "/api/bot/estado | /api/bot/pausar | /api/bot/reanudar",
                "auth": "/api/auth/login | /api/auth/me (bearer)",
                "resumen": "/api/resumen",
                "admin": "/admin/migrate | /admin/create-admin | /admin/tables (x-migration-token)",
                "health": "/health"
            }
        }
    }))
}

/// GET /health - 503 while the database is unreachable
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match DatabaseManager::health_check(&state.pool).await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok"
                }
            })),
        ),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "success": false,
                "error": "database unavailable",
                "data": {
                    "status": "degraded",
                    "timestamp": now,
                    "database_error": e.to_string()
                }
            })),
        ),
    }
}
