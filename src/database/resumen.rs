use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use super::DatabaseError;
use crate::models::EstadoPedido;

/// Dashboard counters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resumen {
    pub productos: i64,
    pub clientes: i64,
    pub pedidos_por_estado: BTreeMap<String, i64>,
    pub ingresos: Decimal,
}

impl Resumen {
    /// Every estado is present, zero when no order has it
    fn from_counts(productos: i64, clientes: i64, por_estado: Vec<(String, i64)>, ingresos: Decimal) -> Self {
        let mut pedidos_por_estado: BTreeMap<String, i64> = EstadoPedido::NOMBRES
            .iter()
            .map(|nombre| (nombre.to_string(), 0))
            .collect();
        pedidos_por_estado.extend(por_estado);
        Self {
            productos,
            clientes,
            pedidos_por_estado,
            ingresos,
        }
    }
}

pub async fn resumen(pool: &PgPool) -> Result<Resumen, DatabaseError> {
    let (productos, clientes, ingresos): (i64, i64, Decimal) = sqlx::query_as(
        r#"
        SELECT
            (SELECT COUNT(*) FROM productos),
            (SELECT COUNT(*) FROM clientes),
            (SELECT COALESCE(SUM(total), 0) FROM pedidos WHERE estado = 'ENTREGADO')
        "#,
    )
    .fetch_one(pool)
    .await?;

    let por_estado: Vec<(String, i64)> =
        sqlx::query_as("SELECT estado, COUNT(*) FROM pedidos GROUP BY estado")
            .fetch_all(pool)
            .await?;

    Ok(Resumen::from_counts(productos, clientes, por_estado, ingresos))
}
