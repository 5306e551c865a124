use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::debug;

use super::{like_pattern, pedidos, DatabaseError};
use crate::models::{
    sort_direction, Cliente, ClienteDetalle, ClientesQuery, NuevoCliente, Pagina, Paginacion,
};
use crate::validation::checks::normalize_phone;

const COLUMNS: &str = "telefono, nombre, total_pedidos, total_gastado, fecha_registro, updated_at";
const PEDIDOS_RECIENTES: i64 = 10;

fn sort_column(sort: Option<&str>) -> &'static str {
    match sort {
        Some("total_pedidos") => "total_pedidos",
        Some("total_gastado") => "total_gastado",
        Some("fecha_registro") => "fecha_registro",
        _ => "nombre",
    }
}

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, query: &ClientesQuery) {
    qb.push(" WHERE TRUE");
    if let Some(q) = query.q.as_deref().filter(|q| !q.is_empty()) {
        let pattern = like_pattern(q);
        qb.push(" AND (nombre ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR telefono LIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

pub struct ClienteRepository {
    pool: PgPool,
}

impl ClienteRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(
        &self,
        query: &ClientesQuery,
        paginacion: Paginacion,
    ) -> Result<Pagina<Cliente>, DatabaseError> {
        let mut count = QueryBuilder::new("SELECT COUNT(*) FROM clientes");
        push_filters(&mut count, query);
        let total: i64 = count.build_query_scalar::<i64>().fetch_one(&self.pool).await?;

        let mut select = QueryBuilder::new(format!("SELECT {} FROM clientes", COLUMNS));
        push_filters(&mut select, query);
        select
            .push(format!(
                " ORDER BY {} {}, telefono",
                sort_column(query.sort.as_deref()),
                sort_direction(query.order.as_deref())
            ))
            .push(" LIMIT ")
            .push_bind(i64::from(paginacion.limit))
            .push(" OFFSET ")
            .push_bind(paginacion.offset());

        debug!(sql = select.sql(), "Listing clientes");
        let items: Vec<Cliente> = select.build_query_as::<Cliente>().fetch_all(&self.pool).await?;
        Ok(paginacion.pagina(items, total))
    }

    pub async fn get(&self, telefono: &str) -> Result<ClienteDetalle, DatabaseError> {
        let telefono = normalize_phone(telefono);
        let sql = format!("SELECT {} FROM clientes WHERE telefono = $1", COLUMNS);
        let cliente: Cliente = sqlx::query_as(&sql)
            .bind(&telefono)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("Cliente {} not found", telefono)))?;

        let pedidos_recientes = pedidos::recientes(&self.pool, &telefono, PEDIDOS_RECIENTES).await?;
        Ok(ClienteDetalle {
            cliente,
            pedidos_recientes,
        })
    }

    /// Duplicate phone numbers surface as `DatabaseError::Conflict`
    pub async fn create(&self, nuevo: &NuevoCliente) -> Result<Cliente, DatabaseError> {
        let sql = format!(
            "INSERT INTO clientes (telefono, nombre) VALUES ($1, $2) RETURNING {}",
            COLUMNS
        );
        Ok(sqlx::query_as(&sql)
            .bind(normalize_phone(&nuevo.telefono))
            .bind(&nuevo.nombre)
            .fetch_one(&self.pool)
            .await?)
    }

    pub async fn rename(&self, telefono: &str, nombre: &str) -> Result<Cliente, DatabaseError> {
        let telefono = normalize_phone(telefono);
        let sql = format!(
            "UPDATE clientes SET nombre = $2, updated_at = NOW() WHERE telefono = $1 RETURNING {}",
            COLUMNS
        );
        sqlx::query_as(&sql)
            .bind(&telefono)
            .bind(nombre)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("Cliente {} not found", telefono)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_sort_falls_back_to_name() {
        assert_eq!(sort_column(Some("total_gastado")), "total_gastado");
        assert_eq!(sort_column(None), "nombre");
    }

    #[test]
    fn search_matches_name_or_phone() {
        let query = ClientesQuery {
            q: Some("ana".into()),
            ..Default::default()
        };
        let mut qb = QueryBuilder::new("SELECT COUNT(*) FROM clientes");
        push_filters(&mut qb, &query);
        assert_eq!(
            qb.sql(),
            "SELECT COUNT(*) FROM clientes WHERE TRUE AND (nombre ILIKE $1 OR telefono LIKE $2)"
        );
    }
}
