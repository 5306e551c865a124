use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

use crate::validation::{self, Chain, FieldError, RequestRules, Source};

pub const PRECIO_MAX: f64 = 100_000_000.0;
pub const UNIDAD_DEFAULT: &str = "unidad";
pub const SORT_FIELDS: &[&str] = &["nombre", "categoria", "precio", "created_at"];

/// Price of a product: a fixed amount or a "starting from" amount, never both.
///
/// Serialized flattened into the product as either `precio` or `precio_desde`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Precio {
    #[serde(rename = "precio")]
    Fijo(Decimal),
    #[serde(rename = "precio_desde")]
    Desde(Decimal),
}

impl Precio {
    pub fn monto(&self) -> Decimal {
        match self {
            Precio::Fijo(m) | Precio::Desde(m) => *m,
        }
    }

    /// `(precio, precio_desde)` column values
    pub fn columns(&self) -> (Option<Decimal>, Option<Decimal>) {
        match self {
            Precio::Fijo(m) => (Some(*m), None),
            Precio::Desde(m) => (None, Some(*m)),
        }
    }

    pub fn from_columns(precio: Option<Decimal>, precio_desde: Option<Decimal>) -> Option<Self> {
        match (precio, precio_desde) {
            (Some(m), None) => Some(Precio::Fijo(m)),
            (None, Some(m)) => Some(Precio::Desde(m)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Producto {
    pub id: Uuid,
    pub nombre: String,
    pub categoria: String,
    pub subcategoria: Option<String>,
    #[serde(flatten)]
    pub precio: Precio,
    pub unidad: String,
    pub en_stock: bool,
    pub codigo_barras: Option<String>,
    pub descripcion: Option<String>,
    pub imagen_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Producto {
    pub fn clave(&self) -> ClaveProducto {
        ClaveProducto {
            categoria: self.categoria.clone(),
            subcategoria: self.subcategoria.clone(),
            nombre: self.nombre.clone(),
        }
    }
}

/// Row shape of `productos`; both price columns are nullable
#[derive(Debug, Clone, FromRow)]
pub struct ProductoRow {
    pub id: Uuid,
    pub nombre: String,
    pub categoria: String,
    pub subcategoria: Option<String>,
    pub precio: Option<Decimal>,
    pub precio_desde: Option<Decimal>,
    pub unidad: String,
    pub en_stock: bool,
    pub codigo_barras: Option<String>,
    pub descripcion: Option<String>,
    pub imagen_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<ProductoRow> for Producto {
    type Error = String;

    fn try_from(row: ProductoRow) -> Result<Self, Self::Error> {
        let precio = Precio::from_columns(row.precio, row.precio_desde)
            .ok_or_else(|| format!("producto {} must have exactly one of precio/precio_desde", row.id))?;

        Ok(Self {
            id: row.id,
            nombre: row.nombre,
            categoria: row.categoria,
            subcategoria: row.subcategoria,
            precio,
            unidad: row.unidad,
            en_stock: row.en_stock,
            codigo_barras: row.codigo_barras,
            descripcion: row.descripcion,
            imagen_url: row.imagen_url,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Client-side product key: `categoria::subcategoria::nombre`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClaveProducto {
    pub categoria: String,
    pub subcategoria: Option<String>,
    pub nombre: String,
}

impl fmt::Display for ClaveProducto {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}::{}::{}",
            self.categoria,
            self.subcategoria.as_deref().unwrap_or(""),
            self.nombre
        )
    }
}

impl FromStr for ClaveProducto {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split("::").collect();
        let [categoria, subcategoria, nombre] = parts.as_slice() else {
            return Err(format!("expected categoria::subcategoria::nombre, got '{}'", s));
        };
        if categoria.is_empty() || nombre.is_empty() {
            return Err(format!("categoria and nombre cannot be empty in '{}'", s));
        }
        Ok(Self {
            categoria: categoria.to_string(),
            subcategoria: (!subcategoria.is_empty()).then(|| subcategoria.to_string()),
            nombre: nombre.to_string(),
        })
    }
}

fn is_barcode(value: &Value) -> bool {
    value
        .as_str()
        .map(|s| (4..=64).contains(&s.len()) && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '-'))
        .unwrap_or(false)
}

fn present(input: &Value, key: &str) -> bool {
    !matches!(input.get(key), None | Some(Value::Null))
}

fn field_chains(required: bool) -> Vec<Chain> {
    let req = |chain: Chain| if required { chain } else { chain.optional() };
    vec![
        req(Chain::field("nombre")).length(1, 200),
        req(Chain::field("categoria")).length(1, 100),
        Chain::field("subcategoria").nullable().length(1, 100),
        Chain::field("precio").optional().range(0.0, PRECIO_MAX),
        Chain::field("precio_desde").optional().range(0.0, PRECIO_MAX),
        Chain::field("unidad").nullable().length(1, 30),
        Chain::field("en_stock").optional().boolean(),
        Chain::field("codigo_barras")
            .nullable()
            .custom(is_barcode, "must be 4-64 letters, digits or dashes"),
        Chain::field("descripcion").nullable().length(1, 2000),
        Chain::field("imagen_url").nullable().url(),
    ]
}

fn both_prices_error(input: &Value) -> Option<FieldError> {
    (present(input, "precio") && present(input, "precio_desde")).then(|| {
        FieldError::new(
            "precio_desde",
            "precio and precio_desde are mutually exclusive",
            input.get("precio_desde").cloned().unwrap_or(Value::Null),
        )
    })
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NuevoProducto {
    pub nombre: String,
    pub categoria: String,
    #[serde(default, deserialize_with = "validation::de::blank_as_none")]
    pub subcategoria: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precio: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precio_desde: Option<Decimal>,
    #[serde(default, deserialize_with = "validation::de::blank_as_none")]
    pub unidad: Option<String>,
    #[serde(default)]
    pub en_stock: Option<bool>,
    #[serde(default, deserialize_with = "validation::de::blank_as_none")]
    pub codigo_barras: Option<String>,
    #[serde(default, deserialize_with = "validation::de::blank_as_none")]
    pub descripcion: Option<String>,
    #[serde(default, deserialize_with = "validation::de::blank_as_none")]
    pub imagen_url: Option<String>,
}

impl NuevoProducto {
    /// The price variant; `None` only if validation was skipped
    pub fn precio(&self) -> Option<Precio> {
        Precio::from_columns(self.precio, self.precio_desde)
    }
}

impl RequestRules for NuevoProducto {
    fn chains() -> Vec<Chain> {
        field_chains(true)
    }

    fn cross_field(input: &Value) -> Vec<FieldError> {
        if let Some(err) = both_prices_error(input) {
            return vec![err];
        }
        if !present(input, "precio") && !present(input, "precio_desde") {
            return vec![FieldError::new(
                "precio",
                "one of precio or precio_desde is required",
                Value::Null,
            )];
        }
        Vec::new()
    }
}

/// Batch create body: `{ "productos": [...] }`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoteProductos {
    pub productos: Vec<NuevoProducto>,
}

impl RequestRules for LoteProductos {
    fn chains() -> Vec<Chain> {
        vec![Chain::field("productos").array(1, 100).each(field_chains(true))]
    }

    fn cross_field(input: &Value) -> Vec<FieldError> {
        let Some(items) = input.get("productos").and_then(Value::as_array) else {
            return Vec::new();
        };
        items
            .iter()
            .enumerate()
            .flat_map(|(i, item)| {
                NuevoProducto::cross_field(item).into_iter().map(move |mut e| {
                    e.field = format!("productos[{}].{}", i, e.field);
                    e
                })
            })
            .collect()
    }
}

/// Partial update; setting one price field clears the other
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActualizarProducto {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nombre: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub categoria: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "validation::de::blank_as_none"
    )]
    pub subcategoria: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precio: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precio_desde: Option<Decimal>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "validation::de::blank_as_none"
    )]
    pub unidad: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub en_stock: Option<bool>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "validation::de::blank_as_none"
    )]
    pub codigo_barras: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "validation::de::blank_as_none"
    )]
    pub descripcion: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "validation::de::blank_as_none"
    )]
    pub imagen_url: Option<String>,
}

impl ActualizarProducto {
    pub fn precio(&self) -> Option<Precio> {
        Precio::from_columns(self.precio, self.precio_desde)
    }
}

impl RequestRules for ActualizarProducto {
    fn chains() -> Vec<Chain> {
        field_chains(false)
    }

    fn cross_field(input: &Value) -> Vec<FieldError> {
        both_prices_error(input).into_iter().collect()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductosQuery {
    #[serde(default, deserialize_with = "validation::de::opt_u32")]
    pub page: Option<u32>,
    #[serde(default, deserialize_with = "validation::de::opt_u32")]
    pub limit: Option<u32>,
    #[serde(default)]
    pub sort: Option<String>,
    #[serde(default)]
    pub order: Option<String>,
    #[serde(default, deserialize_with = "validation::de::one_or_many")]
    pub categoria: Vec<String>,
    #[serde(default)]
    pub subcategoria: Option<String>,
    #[serde(default, deserialize_with = "validation::de::opt_bool")]
    pub en_stock: Option<bool>,
    #[serde(default)]
    pub q: Option<String>,
}

impl RequestRules for ProductosQuery {
    const SOURCE: Source = Source::Query;

    fn chains() -> Vec<Chain> {
        let mut chains = validation::pagination();
        chains.extend(validation::sort_by(SORT_FIELDS));
        chains.push(Chain::field("subcategoria").optional().length(1, 100));
        chains.push(Chain::field("en_stock").optional().boolean());
        chains.push(Chain::field("q").optional().length(1, 100));
        chains
    }

    fn cross_field(input: &Value) -> Vec<FieldError> {
        // categoria may repeat, so each value is checked separately
        let values: Vec<&Value> = match input.get("categoria") {
            Some(Value::Array(items)) => items.iter().collect(),
            Some(v) => vec![v],
            None => Vec::new(),
        };
        values
            .into_iter()
            .filter(|v| {
                v.as_str()
                    .map(|s| !(1..=100).contains(&s.chars().count()))
                    .unwrap_or(true)
            })
            .map(|v| FieldError::new("categoria", "must be between 1 and 100 characters", v.clone()))
            .collect()
    }
}

/// Barcodes are matched case-insensitively and stored upper-cased
pub fn normalize_barcode(s: &str) -> String {
    s.trim().to_ascii_uppercase()
}
