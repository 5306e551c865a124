//! Typed HTTP client for the API.
//!
//! Request payloads are checked locally with the same rules the server runs,
//! so an invalid product or order fails before anything is sent. There is no
//! caching and nothing is retried.

mod error;

pub use error::ClientError;

use std::time::Duration;

use reqwest::{Method, RequestBuilder, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;
use url::Url;
use uuid::Uuid;

use crate::database::{resumen::Resumen, MigrationReport, TableCount};
use crate::middleware::admin::MIGRATION_TOKEN_HEADER;
use crate::models::{
    ActualizarCliente, ActualizarConfiguracion, ActualizarProducto, CambioEstado, Categoria, Cliente,
    ClienteDetalle, ClientesQuery, Credenciales, EntradaConfiguracion, EstadoBot, EstadoPedido,
    LoteProductos, NuevoAdmin, NuevoCliente, NuevoPedido, NuevoProducto, Pagina, Pedido, PedidosQuery,
    Producto, ProductosQuery, Sesion, Usuario,
};
use crate::sanitize::query_to_value;
use crate::validation::RequestRules;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    code: String,
    #[serde(default)]
    errors: Vec<crate::validation::FieldError>,
}

/// Run the server-side rules against `payload` before sending it
fn check_locally<T: Serialize + RequestRules>(payload: &T) -> Result<Value, ClientError> {
    let value = serde_json::to_value(payload)?;
    let errors = T::check(&value);
    if errors.is_empty() {
        Ok(value)
    } else {
        Err(ClientError::Validation(errors))
    }
}

/// Flatten a query struct into `key=value` pairs; lists repeat their key
fn query_pairs<T: Serialize>(query: &T) -> Result<Vec<(String, String)>, ClientError> {
    let Value::Object(map) = serde_json::to_value(query)? else {
        return Ok(Vec::new());
    };

    let mut pairs = Vec::new();
    for (key, value) in map {
        match value {
            Value::Null => {}
            Value::String(s) => pairs.push((key, s)),
            Value::Array(items) => {
                for item in items {
                    match item {
                        Value::String(s) => pairs.push((key.clone(), s)),
                        other => pairs.push((key.clone(), other.to_string())),
                    }
                }
            }
            other => pairs.push((key, other.to_string())),
        }
    }
    Ok(pairs)
}

fn checked_query<T: Serialize + RequestRules>(query: &T) -> Result<Vec<(String, String)>, ClientError> {
    let pairs = query_pairs(query)?;
    let errors = T::check(&query_to_value(&pairs));
    if errors.is_empty() {
        Ok(pairs)
    } else {
        Err(ClientError::Validation(errors))
    }
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: Url,
    admin_token: Option<String>,
    bearer_token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: Url::parse(base_url)?,
            admin_token: None,
            bearer_token: None,
        })
    }

    /// Value sent as `x-migration-token` on `/admin/*` calls
    pub fn admin_token(mut self, token: impl Into<String>) -> Self {
        self.admin_token = Some(token.into());
        self
    }

    pub fn bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn url(&self, segments: &[&str]) -> Result<Url, ClientError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ClientError::InvalidBaseUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, segments: &[&str]) -> Result<RequestBuilder, ClientError> {
        let url = self.url(segments)?;
        debug!(%method, %url, "API request");
        let mut builder = self.client.request(method, url);
        if let Some(token) = &self.bearer_token {
            builder = builder.bearer_auth(token);
        }
        Ok(builder)
    }

    fn admin_request(&self, method: Method, segments: &[&str]) -> Result<RequestBuilder, ClientError> {
        let token = self
            .admin_token
            .as_deref()
            .ok_or(ClientError::MissingCredential("migration token"))?;
        Ok(self.request(method, segments)?.header(MIGRATION_TOKEN_HEADER, token))
    }

    async fn send_raw(builder: RequestBuilder) -> Result<reqwest::Response, ClientError> {
        let response = builder.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        let body: ErrorBody = serde_json::from_str(&text).unwrap_or_default();
        Err(ClientError::Api {
            status: status.as_u16(),
            code: body.code,
            message: if body.message.is_empty() { text } else { body.message },
            errors: body.errors,
        })
    }

    /// Send and unwrap the `{success, data}` envelope
    async fn send<T: DeserializeOwned>(builder: RequestBuilder) -> Result<T, ClientError> {
        let envelope: Envelope<T> = Self::send_raw(builder).await?.json().await?;
        Ok(envelope.data)
    }

    /// `GET /health`. A degraded server answers 503 with a body, which is
    /// returned rather than treated as an error.
    pub async fn health(&self) -> Result<(StatusCode, Value), ClientError> {
        let response = self.request(Method::GET, &["health"])?.send().await?;
        let status = response.status();
        Ok((status, response.json().await?))
    }

    // Productos

    pub async fn productos(&self, query: &ProductosQuery) -> Result<Pagina<Producto>, ClientError> {
        let pairs = checked_query(query)?;
        Self::send(self.request(Method::GET, &["api", "productos"])?.query(&pairs)).await
    }

    pub async fn producto(&self, id: Uuid) -> Result<Producto, ClientError> {
        Self::send(self.request(Method::GET, &["api", "productos", &id.to_string()])?).await
    }

    pub async fn producto_por_codigo(&self, codigo: &str) -> Result<Producto, ClientError> {
        Self::send(self.request(Method::GET, &["api", "productos", "codigo", codigo])?).await
    }

    pub async fn crear_producto(&self, nuevo: &NuevoProducto) -> Result<Producto, ClientError> {
        let body = check_locally(nuevo)?;
        Self::send(self.request(Method::POST, &["api", "productos"])?.json(&body)).await
    }

    pub async fn crear_productos(&self, lote: &LoteProductos) -> Result<Vec<Producto>, ClientError> {
        let body = check_locally(lote)?;
        Self::send(self.request(Method::POST, &["api", "productos", "lote"])?.json(&body)).await
    }

    pub async fn actualizar_producto(
        &self,
        id: Uuid,
        cambios: &ActualizarProducto,
    ) -> Result<Producto, ClientError> {
        let body = check_locally(cambios)?;
        Self::send(
            self.request(Method::PUT, &["api", "productos", &id.to_string()])?
                .json(&body),
        )
        .await
    }

    pub async fn eliminar_producto(&self, id: Uuid) -> Result<(), ClientError> {
        Self::send_raw(self.request(Method::DELETE, &["api", "productos", &id.to_string()])?).await?;
        Ok(())
    }

    pub async fn categorias(&self) -> Result<Vec<Categoria>, ClientError> {
        Self::send(self.request(Method::GET, &["api", "categorias"])?).await
    }

    // Clientes

    pub async fn clientes(&self, query: &ClientesQuery) -> Result<Pagina<Cliente>, ClientError> {
        let pairs = checked_query(query)?;
        Self::send(self.request(Method::GET, &["api", "clientes"])?.query(&pairs)).await
    }

    pub async fn cliente(&self, telefono: &str) -> Result<ClienteDetalle, ClientError> {
        Self::send(self.request(Method::GET, &["api", "clientes", telefono])?).await
    }

    pub async fn crear_cliente(&self, nuevo: &NuevoCliente) -> Result<Cliente, ClientError> {
        let body = check_locally(nuevo)?;
        Self::send(self.request(Method::POST, &["api", "clientes"])?.json(&body)).await
    }

    pub async fn renombrar_cliente(&self, telefono: &str, nombre: &str) -> Result<Cliente, ClientError> {
        let body = check_locally(&ActualizarCliente {
            nombre: nombre.to_string(),
        })?;
        Self::send(self.request(Method::PUT, &["api", "clientes", telefono])?.json(&body)).await
    }

    // Pedidos

    pub async fn pedidos(&self, query: &PedidosQuery) -> Result<Pagina<Pedido>, ClientError> {
        let pairs = checked_query(query)?;
        Self::send(self.request(Method::GET, &["api", "pedidos"])?.query(&pairs)).await
    }

    pub async fn pedido(&self, id: Uuid) -> Result<Pedido, ClientError> {
        Self::send(self.request(Method::GET, &["api", "pedidos", &id.to_string()])?).await
    }

    pub async fn crear_pedido(&self, nuevo: &NuevoPedido) -> Result<Pedido, ClientError> {
        let body = check_locally(nuevo)?;
        Self::send(self.request(Method::POST, &["api", "pedidos"])?.json(&body)).await
    }

    pub async fn cambiar_estado(&self, id: Uuid, estado: EstadoPedido) -> Result<Pedido, ClientError> {
        let body = check_locally(&CambioEstado { estado })?;
        Self::send(
            self.request(Method::PATCH, &["api", "pedidos", &id.to_string(), "estado"])?
                .json(&body),
        )
        .await
    }

    // Configuracion y bot

    pub async fn configuracion(&self) -> Result<Vec<EntradaConfiguracion>, ClientError> {
        Self::send(self.request(Method::GET, &["api", "configuracion"])?).await
    }

    pub async fn actualizar_configuracion(
        &self,
        valores: &ActualizarConfiguracion,
    ) -> Result<Vec<EntradaConfiguracion>, ClientError> {
        let body = check_locally(valores)?;
        Self::send(self.request(Method::PUT, &["api", "configuracion"])?.json(&body)).await
    }

    pub async fn estado_bot(&self) -> Result<EstadoBot, ClientError> {
        Self::send(self.request(Method::GET, &["api", "bot", "estado"])?).await
    }

    pub async fn pausar_bot(&self) -> Result<EstadoBot, ClientError> {
        Self::send(self.request(Method::POST, &["api", "bot", "pausar"])?).await
    }

    pub async fn reanudar_bot(&self) -> Result<EstadoBot, ClientError> {
        Self::send(self.request(Method::POST, &["api", "bot", "reanudar"])?).await
    }

    // Auth y resumen

    pub async fn login(&self, credenciales: &Credenciales) -> Result<Sesion, ClientError> {
        let body = check_locally(credenciales)?;
        Self::send(self.request(Method::POST, &["api", "auth", "login"])?.json(&body)).await
    }

    pub async fn me(&self) -> Result<Usuario, ClientError> {
        if self.bearer_token.is_none() {
            return Err(ClientError::MissingCredential("bearer token"));
        }
        Self::send(self.request(Method::GET, &["api", "auth", "me"])?).await
    }

    pub async fn resumen(&self) -> Result<Resumen, ClientError> {
        Self::send(self.request(Method::GET, &["api", "resumen"])?).await
    }

    // Admin

    pub async fn migrate(&self) -> Result<MigrationReport, ClientError> {
        let response = Self::send_raw(self.admin_request(Method::POST, &["admin", "migrate"])?).await?;
        Ok(response.json().await?)
    }

    pub async fn tables(&self) -> Result<Vec<TableCount>, ClientError> {
        Self::send(self.admin_request(Method::GET, &["admin", "tables"])?).await
    }

    pub async fn crear_admin(&self, nuevo: &NuevoAdmin) -> Result<Usuario, ClientError> {
        let body = check_locally(nuevo)?;
        Self::send(self.admin_request(Method::POST, &["admin", "create-admin"])?.json(&body)).await
    }
}
