//! Runs against a real Postgres when `TIENDA_TEST_DATABASE_URL` (or
//! `DATABASE_URL`) is set; every test returns early otherwise.

mod common;

use anyhow::Result;
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};

async fn post(client: &Client, url: String, body: Value) -> Result<(StatusCode, Value)> {
    let res = client.post(url).json(&body).send().await?;
    let status = res.status();
    Ok((status, res.json().await?))
}

async fn get(client: &Client, url: String) -> Result<(StatusCode, Value)> {
    let res = client.get(url).send().await?;
    let status = res.status();
    Ok((status, res.json().await?))
}

fn producto(barcode: &str) -> Value {
    json!({
        "nombre": format!("Yerba {}", barcode),
        "categoria": "Almacen",
        "precio": 3500,
        "codigo_barras": barcode
    })
}

#[tokio::test]
async fn delivered_order_credits_the_customer_once() -> Result<()> {
    let Some(server) = common::ensure_db_server().await? else {
        return Ok(());
    };
    let client = Client::new();
    let telefono = common::unique_phone();

    let (status, body) = post(
        &client,
        server.url("/api/pedidos"),
        json!({
            "cliente_telefono": telefono,
            "cliente_nombre": "Marta",
            "items": [
                { "nombre": "Pan", "cantidad": 2, "precio_unitario": 1250.5 },
                { "nombre": "Leche", "cantidad": 3, "precio_unitario": 900 }
            ]
        }),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    let pedido = &body["data"];
    assert_eq!(pedido["estado"], "PENDIENTE");
    assert_eq!(pedido["total"], json!(5201.0));
    let id = pedido["id"].as_str().unwrap().to_string();

    let estado_url = server.url(&format!("/api/pedidos/{}/estado", id));
    let res = client.patch(&estado_url).json(&json!({ "estado": "ENTREGADO" })).send().await?;
    assert_eq!(res.status(), StatusCode::OK);

    let (status, body) = get(&client, server.url(&format!("/api/clientes/{}", telefono))).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["nombre"], "Marta");
    assert_eq!(body["data"]["total_pedidos"], 1);
    assert_eq!(body["data"]["total_gastado"], json!(5201.0));

    // ENTREGADO is terminal
    let res = client.patch(&estado_url).json(&json!({ "estado": "CANCELADO" })).send().await?;
    assert_eq!(res.status(), StatusCode::CONFLICT);
    let body: Value = res.json().await?;
    assert_eq!(body["code"], "CONFLICT");

    let (_, body) = get(&client, server.url(&format!("/api/clientes/{}", telefono))).await?;
    assert_eq!(body["data"]["total_pedidos"], 1);
    Ok(())
}

#[tokio::test]
async fn order_upserts_customer_and_blank_name_keeps_it() -> Result<()> {
    let Some(server) = common::ensure_db_server().await? else {
        return Ok(());
    };
    let client = Client::new();
    let telefono = common::unique_phone();
    let item = json!([{ "nombre": "Pan", "cantidad": 1, "precio_unitario": 100 }]);

    let (status, body) = post(
        &client,
        server.url("/api/pedidos"),
        json!({ "cliente_telefono": telefono, "cliente_nombre": "Ruben", "items": item }),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED, "{}", body);

    let (status, body) = post(
        &client,
        server.url("/api/pedidos"),
        json!({ "cliente_telefono": telefono, "cliente_nombre": "", "direccion": "", "items": item }),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body["data"]["cliente_nombre"], "Ruben");
    assert_eq!(body["data"]["direccion"], Value::Null);

    let (status, body) = get(&client, server.url(&format!("/api/clientes/{}", telefono))).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["nombre"], "Ruben");
    assert_eq!(body["data"]["total_pedidos"], 0);
    assert_eq!(body["data"]["pedidos_recientes"].as_array().unwrap().len(), 2);
    Ok(())
}

#[tokio::test]
async fn day_bounds_include_todays_orders() -> Result<()> {
    let Some(server) = common::ensure_db_server().await? else {
        return Ok(());
    };
    let client = Client::new();
    let telefono = common::unique_phone();

    let (status, _) = post(
        &client,
        server.url("/api/pedidos"),
        json!({
            "cliente_telefono": telefono,
            "items": [{ "nombre": "Pan", "cantidad": 1, "precio_unitario": 100 }]
        }),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED);

    let hoy = chrono::Utc::now().date_naive().format("%Y-%m-%d").to_string();
    let (status, body) = get(
        &client,
        server.url(&format!("/api/pedidos?telefono={}&desde={}&hasta={}", telefono, hoy, hoy)),
    )
    .await?;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"]["total"], 1);
    Ok(())
}

#[tokio::test]
async fn setting_precio_desde_clears_precio() -> Result<()> {
    let Some(server) = common::ensure_db_server().await? else {
        return Ok(());
    };
    let client = Client::new();

    let (status, body) = post(
        &client,
        server.url("/api/productos"),
        producto(&common::unique_barcode()),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    let id = body["data"]["id"].as_str().unwrap().to_string();

    let res = client
        .put(server.url(&format!("/api/productos/{}", id)))
        .json(&json!({ "precio_desde": 3000, "subcategoria": "" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await?;
    assert_eq!(body["data"]["precio_desde"], json!(3000.0));
    assert!(body["data"].get("precio").is_none());

    let (_, body) = get(&client, server.url(&format!("/api/productos/{}", id))).await?;
    assert_eq!(body["data"]["precio_desde"], json!(3000.0));
    assert!(body["data"].get("precio").is_none());
    Ok(())
}

#[tokio::test]
async fn duplicate_barcode_is_a_conflict() -> Result<()> {
    let Some(server) = common::ensure_db_server().await? else {
        return Ok(());
    };
    let client = Client::new();
    let barcode = common::unique_barcode();

    let (status, _) = post(&client, server.url("/api/productos"), producto(&barcode)).await?;
    assert_eq!(status, StatusCode::CREATED);

    // Stored upper-cased, so a lower-cased copy still collides
    let (status, body) = post(
        &client,
        server.url("/api/productos"),
        producto(&barcode.to_ascii_lowercase()),
    )
    .await?;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "CONFLICT");

    // A blank barcode is stored as NULL and never collides
    for _ in 0..2 {
        let (status, body) = post(&client, server.url("/api/productos"), producto("")).await?;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        assert_eq!(body["data"]["codigo_barras"], Value::Null);
    }
    Ok(())
}

#[tokio::test]
async fn failed_batch_inserts_nothing() -> Result<()> {
    let Some(server) = common::ensure_db_server().await? else {
        return Ok(());
    };
    let client = Client::new();
    let first = common::unique_barcode();
    let repeated = common::unique_barcode();

    let (status, _) = post(
        &client,
        server.url("/api/productos/lote"),
        json!({ "productos": [producto(&first), producto(&repeated), producto(&repeated)] }),
    )
    .await?;
    assert_eq!(status, StatusCode::CONFLICT);

    for barcode in [&first, &repeated] {
        let (status, _) = get(&client, server.url(&format!("/api/productos/codigo/{}", barcode))).await?;
        assert_eq!(status, StatusCode::NOT_FOUND, "{}", barcode);
    }
    Ok(())
}
