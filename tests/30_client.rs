mod common;

use anyhow::Result;
use rust_decimal::Decimal;
use tienda_bot_api::client::{ApiClient, ClientError};
use tienda_bot_api::models::{NuevoCliente, NuevoProducto};

fn producto(precio: Option<Decimal>, precio_desde: Option<Decimal>) -> NuevoProducto {
    NuevoProducto {
        nombre: "Empanadas x12".into(),
        categoria: "Rotiseria".into(),
        subcategoria: None,
        precio,
        precio_desde,
        unidad: Some("docena".into()),
        en_stock: None,
        codigo_barras: None,
        descripcion: None,
        imagen_url: None,
    }
}

#[tokio::test]
async fn both_prices_never_reach_the_server() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = ApiClient::new(&server.base_url)?;

    let err = client
        .crear_producto(&producto(Some(Decimal::new(9000, 0)), Some(Decimal::new(8000, 0))))
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Validation(_)), "{:?}", err);
    assert_eq!(err.field_errors()[0].field, "precio_desde");
    Ok(())
}

#[tokio::test]
async fn server_errors_are_decoded() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = ApiClient::new(&server.base_url)?.bearer_token("not-a-jwt");

    match client.me().await {
        Err(ClientError::Api { status, code, .. }) => {
            assert_eq!(status, 401);
            assert!(!code.is_empty());
        }
        other => panic!("expected 401 API error, got {:?}", other),
    }
    Ok(())
}

#[tokio::test]
async fn wrong_admin_token_is_forbidden() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = ApiClient::new(&server.base_url)?.admin_token("wrong");

    match client.tables().await {
        Err(ClientError::Api { status, .. }) => assert_eq!(status, 403),
        other => panic!("expected 403 API error, got {:?}", other),
    }
    Ok(())
}

#[tokio::test]
async fn invalid_phone_is_caught_locally() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = ApiClient::new(&server.base_url)?;

    let err = client
        .crear_cliente(&NuevoCliente {
            telefono: "123".into(),
            nombre: "Ana".into(),
        })
        .await
        .unwrap_err();
    assert_eq!(err.field_errors()[0].field, "telefono");
    Ok(())
}

#[tokio::test]
async fn health_surfaces_degraded_status() -> Result<()> {
    let server = common::ensure_server().await?;
    let (status, body) = ApiClient::new(&server.base_url)?.health().await?;
    assert_eq!(status.as_u16(), 503);
    assert_eq!(body["data"]["status"], "degraded");
    Ok(())
}
