use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use sqlx::{PgExecutor, PgPool, Postgres, QueryBuilder};
use tracing::{debug, info};
use uuid::Uuid;

use super::DatabaseError;
use crate::models::pedido::PedidoRow;
use crate::models::{
    sort_direction, EstadoPedido, ItemPedido, NuevoPedido, Pagina, Paginacion, Pedido, PedidosQuery,
};
use crate::validation::checks::normalize_phone;

pub(super) const COLUMNS: &str =
    "id, cliente_telefono, cliente_nombre, estado, total, direccion, notas, created_at, updated_at";

const ITEM_COLUMNS: &str = "id, pedido_id, producto_id, nombre, cantidad, precio_unitario, subtotal";

fn sort_column(sort: Option<&str>) -> &'static str {
    match sort {
        Some("total") => "total",
        Some("estado") => "estado",
        _ => "created_at",
    }
}

/// Newest first unless an order was asked for
fn direction(order: Option<&str>) -> &'static str {
    match order {
        None => "DESC",
        some => sort_direction(some),
    }
}

/// A `desde`/`hasta` value: an exact instant or a whole calendar day
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Bound {
    Instant(DateTime<Utc>),
    Day(NaiveDate),
}

impl Bound {
    fn parse(value: &str) -> Option<Self> {
        if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
            return Some(Bound::Instant(ts.with_timezone(&Utc)));
        }
        NaiveDate::parse_from_str(value, "%Y-%m-%d").ok().map(Bound::Day)
    }

    /// `created_at` condition for a lower bound
    fn lower(self) -> (&'static str, DateTime<Utc>) {
        match self {
            Bound::Instant(ts) => (" AND created_at >= ", ts),
            Bound::Day(date) => (" AND created_at >= ", midnight(date)),
        }
    }

    /// `created_at` condition for an upper bound; a day includes all of it
    fn upper(self) -> Option<(&'static str, DateTime<Utc>)> {
        match self {
            Bound::Instant(ts) => Some((" AND created_at <= ", ts)),
            Bound::Day(date) => Some((" AND created_at < ", midnight(date.succ_opt()?))),
        }
    }
}

fn midnight(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, query: &PedidosQuery) {
    qb.push(" WHERE TRUE");
    if !query.estado.is_empty() {
        qb.push(" AND estado = ANY(").push_bind(query.estado.clone()).push(")");
    }
    if let Some((op, bound)) = query.desde.as_deref().and_then(Bound::parse).map(Bound::lower) {
        qb.push(op).push_bind(bound);
    }
    if let Some((op, bound)) = query.hasta.as_deref().and_then(Bound::parse).and_then(Bound::upper) {
        qb.push(op).push_bind(bound);
    }
    if let Some(telefono) = &query.telefono {
        qb.push(" AND cliente_telefono = ").push_bind(normalize_phone(telefono));
    }
}

fn into_pedido(row: PedidoRow, items: Vec<ItemPedido>) -> Result<Pedido, DatabaseError> {
    row.into_pedido(items).map_err(DatabaseError::Corrupt)
}

/// Most recent order headers of one customer
pub(super) async fn recientes<'e, E>(
    executor: E,
    telefono: &str,
    limit: i64,
) -> Result<Vec<Pedido>, DatabaseError>
where
    E: PgExecutor<'e>,
{
    let sql = format!(
        "SELECT {} FROM pedidos WHERE cliente_telefono = $1 ORDER BY created_at DESC LIMIT $2",
        COLUMNS
    );
    let rows: Vec<PedidoRow> = sqlx::query_as(&sql)
        .bind(telefono)
        .bind(limit)
        .fetch_all(executor)
        .await?;
    rows.into_iter().map(|row| into_pedido(row, Vec::new())).collect()
}

async fn items_of<'e, E>(executor: E, pedido_id: Uuid) -> Result<Vec<ItemPedido>, DatabaseError>
where
    E: PgExecutor<'e>,
{
    let sql = format!(
        "SELECT {} FROM items_pedido WHERE pedido_id = $1 ORDER BY nombre, id",
        ITEM_COLUMNS
    );
    Ok(sqlx::query_as(&sql).bind(pedido_id).fetch_all(executor).await?)
}

pub struct PedidoRepository {
    pool: PgPool,
}

impl PedidoRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Order headers; items are only loaded by `get`
    pub async fn list(
        &self,
        query: &PedidosQuery,
        paginacion: Paginacion,
    ) -> Result<Pagina<Pedido>, DatabaseError> {
        let mut count = QueryBuilder::new("SELECT COUNT(*) FROM pedidos");
        push_filters(&mut count, query);
        let total: i64 = count.build_query_scalar::<i64>().fetch_one(&self.pool).await?;

        let mut select = QueryBuilder::new(format!("SELECT {} FROM pedidos", COLUMNS));
        push_filters(&mut select, query);
        select
            .push(format!(
                " ORDER BY {} {}, id",
                sort_column(query.sort.as_deref()),
                direction(query.order.as_deref())
            ))
            .push(" LIMIT ")
            .push_bind(i64::from(paginacion.limit))
            .push(" OFFSET ")
            .push_bind(paginacion.offset());

        debug!(sql = select.sql(), "Listing pedidos");
        let rows: Vec<PedidoRow> = select.build_query_as::<PedidoRow>().fetch_all(&self.pool).await?;
        let items = rows
            .into_iter()
            .map(|row| into_pedido(row, Vec::new()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(paginacion.pagina(items, total))
    }

    pub async fn get(&self, id: Uuid) -> Result<Pedido, DatabaseError> {
        let sql = format!("SELECT {} FROM pedidos WHERE id = $1", COLUMNS);
        let row: PedidoRow = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("Pedido {} not found", id)))?;
        let items = items_of(&self.pool, id).await?;
        into_pedido(row, items)
    }

    /// Upsert the customer, then insert the order and its items, all in one
    /// transaction. Subtotals and total are computed here, never taken from
    /// the caller.
    pub async fn create(&self, nuevo: &NuevoPedido) -> Result<Pedido, DatabaseError> {
        let telefono = normalize_phone(&nuevo.cliente_telefono);
        let mut tx = self.pool.begin().await?;

        let cliente_nombre: String = sqlx::query_scalar(
            r#"
            INSERT INTO clientes (telefono, nombre)
            VALUES ($1, COALESCE($2::text, $1))
            ON CONFLICT (telefono) DO UPDATE
                SET nombre = COALESCE($2::text, clientes.nombre), updated_at = NOW()
            RETURNING nombre
            "#,
        )
        .bind(&telefono)
        .bind(&nuevo.cliente_nombre)
        .fetch_one(&mut *tx)
        .await?;

        let pedido_id = Uuid::new_v4();
        let sql = format!(
            r#"
            INSERT INTO pedidos (id, cliente_telefono, cliente_nombre, estado, total, direccion, notas)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            COLUMNS
        );
        let row: PedidoRow = sqlx::query_as(&sql)
            .bind(pedido_id)
            .bind(&telefono)
            .bind(&cliente_nombre)
            .bind(EstadoPedido::Pendiente.as_str())
            .bind(nuevo.total())
            .bind(&nuevo.direccion)
            .bind(&nuevo.notas)
            .fetch_one(&mut *tx)
            .await?;

        let insert_item = format!(
            "INSERT INTO items_pedido ({}) VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {}",
            ITEM_COLUMNS, ITEM_COLUMNS
        );
        let mut items = Vec::with_capacity(nuevo.items.len());
        for item in &nuevo.items {
            let created: ItemPedido = sqlx::query_as(&insert_item)
                .bind(Uuid::new_v4())
                .bind(pedido_id)
                .bind(item.producto_id)
                .bind(&item.nombre)
                .bind(item.cantidad)
                .bind(item.precio_unitario)
                .bind(item.subtotal())
                .fetch_one(&mut *tx)
                .await?;
            items.push(created);
        }

        tx.commit().await?;
        info!(pedido = %pedido_id, telefono = %telefono, "Created pedido");
        into_pedido(row, items)
    }

    /// Move an order to a new estado. The row is locked for the duration;
    /// reaching ENTREGADO credits the customer's totals in the same
    /// transaction.
    pub async fn cambiar_estado(&self, id: Uuid, nuevo: EstadoPedido) -> Result<Pedido, DatabaseError> {
        let mut tx = self.pool.begin().await?;

        let select = format!("SELECT {} FROM pedidos WHERE id = $1 FOR UPDATE", COLUMNS);
        let current: PedidoRow = sqlx::query_as(&select)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("Pedido {} not found", id)))?;

        let actual: EstadoPedido = current.estado.parse().map_err(DatabaseError::Corrupt)?;
        if !actual.can_transition_to(nuevo) {
            return Err(DatabaseError::InvalidState(format!(
                "Pedido {} cannot change from {} to {}",
                id, actual, nuevo
            )));
        }

        let update = format!(
            "UPDATE pedidos SET estado = $2, updated_at = NOW() WHERE id = $1 RETURNING {}",
            COLUMNS
        );
        let row: PedidoRow = sqlx::query_as(&update)
            .bind(id)
            .bind(nuevo.as_str())
            .fetch_one(&mut *tx)
            .await?;

        if nuevo == EstadoPedido::Entregado {
            sqlx::query(
                r#"
                UPDATE clientes
                SET total_pedidos = total_pedidos + 1,
                    total_gastado = total_gastado + $2,
                    updated_at = NOW()
                WHERE telefono = $1
                "#,
            )
            .bind(&row.cliente_telefono)
            .bind(row.total)
            .execute(&mut *tx)
            .await?;
        }

        let items = items_of(&mut *tx, id).await?;
        tx.commit().await?;

        info!(pedido = %id, from = %actual, to = %nuevo, "Changed pedido estado");
        into_pedido(row, items)
    }
}
