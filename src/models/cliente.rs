use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::Pedido;
use crate::validation::{self, Chain, RequestRules, Source};

pub const SORT_FIELDS: &[&str] = &["nombre", "total_pedidos", "total_gastado", "fecha_registro"];

/// Customer keyed by phone number (digits only)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Cliente {
    pub telefono: String,
    pub nombre: String,
    pub total_pedidos: i32,
    pub total_gastado: Decimal,
    pub fecha_registro: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A customer with their most recent orders (items omitted)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClienteDetalle {
    #[serde(flatten)]
    pub cliente: Cliente,
    pub pedidos_recientes: Vec<Pedido>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NuevoCliente {
    pub telefono: String,
    pub nombre: String,
}

impl RequestRules for NuevoCliente {
    fn chains() -> Vec<Chain> {
        vec![
            Chain::field("telefono").phone(),
            Chain::field("nombre").length(1, 100),
        ]
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActualizarCliente {
    pub nombre: String,
}

impl RequestRules for ActualizarCliente {
    fn chains() -> Vec<Chain> {
        vec![Chain::field("nombre").length(1, 100)]
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientesQuery {
    #[serde(default, deserialize_with = "validation::de::opt_u32")]
    pub page: Option<u32>,
    #[serde(default, deserialize_with = "validation::de::opt_u32")]
    pub limit: Option<u32>,
    #[serde(default)]
    pub sort: Option<String>,
    #[serde(default)]
    pub order: Option<String>,
    #[serde(default)]
    pub q: Option<String>,
}

impl RequestRules for ClientesQuery {
    const SOURCE: Source = Source::Query;

    fn chains() -> Vec<Chain> {
        let mut chains = validation::pagination();
        chains.extend(validation::sort_by(SORT_FIELDS));
        chains.push(Chain::field("q").optional().length(1, 100));
        chains
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn new_client_requires_valid_phone() {
        let errors = NuevoCliente::check(&json!({ "telefono": "123", "nombre": "Ana" }));
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "telefono");
        assert!(NuevoCliente::check(&json!({ "telefono": "+54 9 11 5555-1234", "nombre": "Ana" })).is_empty());
    }

    #[test]
    fn list_sort_whitelist() {
        assert!(ClientesQuery::check(&json!({ "sort": "total_gastado", "order": "desc" })).is_empty());
        assert_eq!(ClientesQuery::check(&json!({ "sort": "telefono; DROP TABLE clientes" })).len(), 1);
    }
}
