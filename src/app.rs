use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    middleware::from_fn_with_state,
    routing::{get, patch, post},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::handlers::{
    admin, auth, categorias, clientes, configuracion, pedidos, productos, public, resumen,
};
use crate::middleware::{
    jwt_auth_middleware, limit_body_size, require_migration_token, sanitize_request,
    with_security_headers,
};
use crate::state::AppState;

/// Full application router.
///
/// Request path: trace → cors → security headers → size guard → sanitize
/// (keys, markup, trim, parameter pollution) → route → validation → handler.
pub fn app(state: AppState) -> Router {
    let limit = state.config.api.max_request_size_bytes;

    let router = Router::new()
        .route("/", get(public::root))
        .route("/health", get(public::health))
        .merge(producto_routes())
        .merge(cliente_routes())
        .merge(pedido_routes())
        .merge(configuracion_routes())
        .merge(auth_routes(state.clone()))
        .merge(admin_routes(state.clone()))
        .layer(DefaultBodyLimit::max(limit))
        .layer(from_fn_with_state(state.clone(), sanitize_request))
        .layer(from_fn_with_state(state.clone(), limit_body_size));

    let router = with_security_headers(router).layer(cors_layer(&state.config.security.cors_origins));

    let router = if state.config.api.enable_request_logging {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    };

    router.with_state(state)
}

fn producto_routes() -> Router<AppState> {
    Router::new()
        .route("/api/productos", get(productos::list).post(productos::create))
        .route("/api/productos/lote", post(productos::create_batch))
        .route("/api/productos/codigo/:codigo", get(productos::get_by_barcode))
        .route(
            "/api/productos/:id",
            get(productos::get).put(productos::update).delete(productos::delete),
        )
        .route("/api/categorias", get(categorias::list))
}

fn cliente_routes() -> Router<AppState> {
    Router::new()
        .route("/api/clientes", get(clientes::list).post(clientes::create))
        .route("/api/clientes/:telefono", get(clientes::get).put(clientes::update))
}

fn pedido_routes() -> Router<AppState> {
    Router::new()
        .route("/api/pedidos", get(pedidos::list).post(pedidos::create))
        .route("/api/pedidos/:id", get(pedidos::get))
        .route("/api/pedidos/:id/estado", patch(pedidos::cambiar_estado))
        .route("/api/resumen", get(resumen::get))
}

fn configuracion_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/configuracion",
            get(configuracion::get).put(configuracion::update),
        )
        .route("/api/bot/estado", get(configuracion::bot_estado))
        .route("/api/bot/pausar", post(configuracion::bot_pausar))
        .route("/api/bot/reanudar", post(configuracion::bot_reanudar))
}

fn auth_routes(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/api/auth/me", get(auth::me))
        .route_layer(from_fn_with_state(state, jwt_auth_middleware));

    Router::new()
        .route("/api/auth/login", post(auth::login))
        .merge(protected)
}

fn admin_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/admin/migrate", post(admin::migrate))
        .route("/admin/create-admin", post(admin::create_admin))
        .route("/admin/tables", get(admin::tables))
        .route_layer(from_fn_with_state(state, require_migration_token))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() || origins.iter().any(|o| o == "*") {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{json_request, read_json, test_state, test_state_with};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::json;
    use tower::ServiceExt;

    #[tokio::test]
    async fn product_without_categoria_is_rejected() {
        let response = app(test_state())
            .oneshot(json_request("POST", "/api/productos", json!({ "nombre": "Pan", "precio": 100 })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = read_json(response).await;
        assert_eq!(body["code"], "VALIDATION_ERROR");
        assert_eq!(body["errors"][0]["field"], "categoria");
    }

    #[tokio::test]
    async fn product_with_both_prices_is_rejected() {
        let response = app(test_state())
            .oneshot(json_request(
                "POST",
                "/api/productos",
                json!({ "nombre": "Pan", "categoria": "Panaderia", "precio": 100, "precio_desde": 90 }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = read_json(response).await;
        assert_eq!(body["errors"][0]["field"], "precio_desde");
    }

    #[tokio::test]
    async fn blank_update_fields_are_rejected_before_the_database() {
        let response = app(test_state())
            .oneshot(json_request(
                "PUT",
                "/api/productos/6f1c2a4e-8d5b-4c1a-9e3f-2b7d9a0c1e55",
                json!({ "nombre": "", "categoria": "" }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = read_json(response).await;
        assert_eq!(body["code"], "VALIDATION_ERROR");
        assert_eq!(body["errors"][0]["field"], "nombre");
        assert_eq!(body["errors"][0]["message"], "cannot be blank");
        assert_eq!(body["errors"][1]["field"], "categoria");
    }

    #[tokio::test]
    async fn stringly_typed_body_scalars_get_field_errors() {
        let response = app(test_state())
            .oneshot(json_request(
                "POST",
                "/api/productos",
                json!({ "nombre": "Pan", "categoria": "Panaderia", "precio": "100", "en_stock": "true" }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = read_json(response).await;
        assert_eq!(body["code"], "VALIDATION_ERROR");
        let fields: Vec<&str> = body["errors"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|e| e["field"].as_str())
            .collect();
        assert_eq!(fields, vec!["precio", "en_stock"]);
    }

    #[tokio::test]
    async fn repeated_whitelisted_scalar_is_named_in_the_error() {
        let request = Request::builder()
            .uri("/api/productos?limit=10&limit=20")
            .body(Body::empty())
            .unwrap();
        let response = app(test_state()).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = read_json(response).await;
        assert_eq!(body["errors"][0]["field"], "limit");
        assert_eq!(body["errors"][0]["message"], "must be given only once");
    }

    #[tokio::test]
    async fn dollar_keys_are_stripped_before_validation() {
        // `$where` disappears, leaving a body without nombre
        let response = app(test_state())
            .oneshot(json_request(
                "POST",
                "/api/clientes",
                json!({ "telefono": "5491155551234", "$where": "1", "datos.nombre": "x" }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = read_json(response).await;
        let fields: Vec<&str> = body["errors"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|e| e["field"].as_str())
            .collect();
        assert_eq!(fields, vec!["nombre"]);
    }

    #[tokio::test]
    async fn admin_routes_require_migration_token() {
        for (method, uri) in [("POST", "/admin/migrate"), ("GET", "/admin/tables"), ("POST", "/admin/create-admin")] {
            let response = app(test_state())
                .oneshot(json_request(method, uri, json!({ "email": "a@b.co", "password": "secreto123", "nombre": "A" })))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::FORBIDDEN, "{} {}", method, uri);
        }

        let request = Request::builder()
            .method("POST")
            .uri("/admin/create-admin")
            .header("x-migration-token", "wrong")
            .body(Body::empty())
            .unwrap();
        let response = app(test_state()).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn correct_token_reaches_validation() {
        let request = Request::builder()
            .method("POST")
            .uri("/admin/create-admin")
            .header("content-type", "application/json")
            .header("x-migration-token", crate::testing::MIGRATION_SECRET)
            .body(Body::from(json!({ "email": "no-es-email", "password": "secreto123", "nombre": "A" }).to_string()))
            .unwrap();
        let response = app(test_state()).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = read_json(response).await;
        assert_eq!(body["errors"][0]["field"], "email");
    }

    #[tokio::test]
    async fn pagination_limit_is_capped() {
        let request = Request::builder()
            .uri("/api/productos?limit=101")
            .body(Body::empty())
            .unwrap();
        let response = app(test_state()).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = read_json(response).await;
        assert_eq!(body["errors"][0]["field"], "limit");
    }

    #[tokio::test]
    async fn duplicate_query_params_collapse_unless_whitelisted() {
        // `q` repeats and collapses to its last value, so only `order` is invalid
        let request = Request::builder()
            .uri("/api/clientes?q=ana&q=luis&order=sideways")
            .body(Body::empty())
            .unwrap();
        let response = app(test_state()).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = read_json(response).await;
        assert_eq!(body["errors"].as_array().unwrap().len(), 1);
        assert_eq!(body["errors"][0]["field"], "order");
    }

    #[tokio::test]
    async fn declared_oversized_body_is_rejected() {
        let mut config = crate::config::AppConfig::development();
        config.api.max_request_size_bytes = 64;
        let request = Request::builder()
            .method("POST")
            .uri("/api/clientes")
            .header("content-type", "application/json")
            .header("content-length", "1000")
            .body(Body::from("x".repeat(1000)))
            .unwrap();
        let response = app(test_state_with(config)).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn streamed_oversized_body_is_rejected() {
        let mut config = crate::config::AppConfig::development();
        config.api.max_request_size_bytes = 64;
        let request = Request::builder()
            .method("POST")
            .uri("/api/clientes")
            .header("content-type", "application/json")
            .body(Body::from(json!({ "nombre": "x".repeat(200) }).to_string()))
            .unwrap();
        let response = app(test_state_with(config)).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn responses_carry_security_headers() {
        let response = app(test_state())
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let headers = response.headers();
        assert_eq!(headers["x-content-type-options"], "nosniff");
        assert_eq!(headers["x-xss-protection"], "0");
        assert!(headers.contains_key("content-security-policy"));
    }

    #[tokio::test]
    async fn me_requires_bearer_token() {
        let response = app(test_state())
            .oneshot(Request::builder().uri("/api/auth/me").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn invalid_estado_is_rejected() {
        let response = app(test_state())
            .oneshot(json_request(
                "PATCH",
                "/api/pedidos/6f1c2a4e-8d5b-4c1a-9e3f-2b7d9a0c1e55/estado",
                json!({ "estado": "PERDIDO" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn malformed_uuid_path_is_rejected() {
        let response = app(test_state())
            .oneshot(Request::builder().uri("/api/pedidos/not-a-uuid").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
