use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

use crate::validation::{self, Chain, FieldError, RequestRules, Source};

pub const SORT_FIELDS: &[&str] = &["created_at", "total", "estado"];
pub const MAX_ITEMS: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EstadoPedido {
    Pendiente,
    Confirmado,
    EnPreparacion,
    Enviado,
    Entregado,
    Cancelado,
}

impl EstadoPedido {
    pub const NOMBRES: &'static [&'static str] = &[
        "PENDIENTE",
        "CONFIRMADO",
        "EN_PREPARACION",
        "ENVIADO",
        "ENTREGADO",
        "CANCELADO",
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EstadoPedido::Pendiente => "PENDIENTE",
            EstadoPedido::Confirmado => "CONFIRMADO",
            EstadoPedido::EnPreparacion => "EN_PREPARACION",
            EstadoPedido::Enviado => "ENVIADO",
            EstadoPedido::Entregado => "ENTREGADO",
            EstadoPedido::Cancelado => "CANCELADO",
        }
    }

    /// Delivered and cancelled orders are closed
    pub fn is_terminal(&self) -> bool {
        matches!(self, EstadoPedido::Entregado | EstadoPedido::Cancelado)
    }

    pub fn can_transition_to(&self, next: EstadoPedido) -> bool {
        !self.is_terminal() && *self != next
    }
}

impl fmt::Display for EstadoPedido {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EstadoPedido {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDIENTE" => Ok(EstadoPedido::Pendiente),
            "CONFIRMADO" => Ok(EstadoPedido::Confirmado),
            "EN_PREPARACION" => Ok(EstadoPedido::EnPreparacion),
            "ENVIADO" => Ok(EstadoPedido::Enviado),
            "ENTREGADO" => Ok(EstadoPedido::Entregado),
            "CANCELADO" => Ok(EstadoPedido::Cancelado),
            other => Err(format!("unknown estado '{}'", other)),
        }
    }
}

/// Line item snapshot captured when the order was placed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct ItemPedido {
    pub id: Uuid,
    pub pedido_id: Uuid,
    pub producto_id: Option<Uuid>,
    pub nombre: String,
    pub cantidad: i32,
    pub precio_unitario: Decimal,
    pub subtotal: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pedido {
    pub id: Uuid,
    pub cliente_telefono: String,
    pub cliente_nombre: String,
    pub estado: EstadoPedido,
    pub total: Decimal,
    pub direccion: Option<String>,
    pub notas: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub items: Vec<ItemPedido>,
}

#[derive(Debug, Clone, FromRow)]
pub struct PedidoRow {
    pub id: Uuid,
    pub cliente_telefono: String,
    pub cliente_nombre: String,
    pub estado: String,
    pub total: Decimal,
    pub direccion: Option<String>,
    pub notas: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PedidoRow {
    pub fn into_pedido(self, items: Vec<ItemPedido>) -> Result<Pedido, String> {
        Ok(Pedido {
            id: self.id,
            cliente_telefono: self.cliente_telefono,
            cliente_nombre: self.cliente_nombre,
            estado: self.estado.parse()?,
            total: self.total,
            direccion: self.direccion,
            notas: self.notas,
            created_at: self.created_at,
            updated_at: self.updated_at,
            items,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NuevoItem {
    #[serde(default)]
    pub producto_id: Option<Uuid>,
    pub nombre: String,
    pub cantidad: i32,
    pub precio_unitario: Decimal,
}

impl NuevoItem {
    pub fn subtotal(&self) -> Decimal {
        self.precio_unitario * Decimal::from(self.cantidad)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NuevoPedido {
    pub cliente_telefono: String,
    #[serde(default, deserialize_with = "validation::de::blank_as_none")]
    pub cliente_nombre: Option<String>,
    #[serde(default, deserialize_with = "validation::de::blank_as_none")]
    pub direccion: Option<String>,
    #[serde(default, deserialize_with = "validation::de::blank_as_none")]
    pub notas: Option<String>,
    pub items: Vec<NuevoItem>,
}

impl NuevoPedido {
    pub fn total(&self) -> Decimal {
        self.items.iter().map(NuevoItem::subtotal).sum()
    }
}

fn is_uuid(value: &Value) -> bool {
    value.as_str().map(|s| Uuid::parse_str(s).is_ok()).unwrap_or(false)
}

impl RequestRules for NuevoPedido {
    fn chains() -> Vec<Chain> {
        vec![
            Chain::field("cliente_telefono").phone(),
            Chain::field("cliente_nombre").nullable().length(1, 100),
            Chain::field("direccion").nullable().length(1, 300),
            Chain::field("notas").nullable().length(1, 1000),
            Chain::field("items").array(1, MAX_ITEMS).each(vec![
                Chain::field("producto_id").optional().custom(is_uuid, "must be a UUID"),
                Chain::field("nombre").length(1, 200),
                Chain::field("cantidad").integer(1, 10_000),
                Chain::field("precio_unitario").range(0.0, 100_000_000.0),
            ]),
        ]
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CambioEstado {
    pub estado: EstadoPedido,
}

impl RequestRules for CambioEstado {
    fn chains() -> Vec<Chain> {
        vec![Chain::field("estado").one_of(EstadoPedido::NOMBRES)]
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PedidosQuery {
    #[serde(default, deserialize_with = "validation::de::opt_u32")]
    pub page: Option<u32>,
    #[serde(default, deserialize_with = "validation::de::opt_u32")]
    pub limit: Option<u32>,
    #[serde(default)]
    pub sort: Option<String>,
    #[serde(default)]
    pub order: Option<String>,
    #[serde(default, deserialize_with = "validation::de::one_or_many")]
    pub estado: Vec<String>,
    #[serde(default)]
    pub desde: Option<String>,
    #[serde(default)]
    pub hasta: Option<String>,
    #[serde(default)]
    pub telefono: Option<String>,
}

impl RequestRules for PedidosQuery {
    const SOURCE: Source = Source::Query;

    fn chains() -> Vec<Chain> {
        let mut chains = validation::pagination();
        chains.extend(validation::sort_by(SORT_FIELDS));
        chains.push(Chain::field("desde").optional().date());
        chains.push(Chain::field("hasta").optional().date());
        chains.push(Chain::field("telefono").optional().phone());
        chains
    }

    fn cross_field(input: &Value) -> Vec<FieldError> {
        let values: Vec<&Value> = match input.get("estado") {
            Some(Value::Array(items)) => items.iter().collect(),
            Some(v) => vec![v],
            None => Vec::new(),
        };
        values
            .into_iter()
            .filter(|v| v.as_str().map(|s| s.parse::<EstadoPedido>().is_err()).unwrap_or(true))
            .map(|v| {
                FieldError::new(
                    "estado",
                    format!("must be one of: {}", EstadoPedido::NOMBRES.join(", ")),
                    v.clone(),
                )
            })
            .collect()
    }
}
