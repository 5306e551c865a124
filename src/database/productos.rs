use sqlx::{PgExecutor, PgPool, Postgres, QueryBuilder};
use tracing::debug;
use uuid::Uuid;

use super::{like_pattern, DatabaseError};
use crate::models::producto::{normalize_barcode, ProductoRow, UNIDAD_DEFAULT};
use crate::models::{
    sort_direction, ActualizarProducto, Categoria, NuevoProducto, Pagina, Paginacion, Producto,
    ProductosQuery,
};

const COLUMNS: &str = "id, nombre, categoria, subcategoria, precio, precio_desde, unidad, en_stock, \
                       codigo_barras, descripcion, imagen_url, created_at, updated_at";

fn into_producto(row: ProductoRow) -> Result<Producto, DatabaseError> {
    Producto::try_from(row).map_err(DatabaseError::Corrupt)
}

fn sort_column(sort: Option<&str>) -> &'static str {
    match sort {
        Some("categoria") => "categoria",
        Some("precio") => "COALESCE(precio, precio_desde)",
        Some("created_at") => "created_at",
        _ => "nombre",
    }
}

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, query: &ProductosQuery) {
    qb.push(" WHERE TRUE");
    if !query.categoria.is_empty() {
        qb.push(" AND categoria = ANY(")
            .push_bind(query.categoria.clone())
            .push(")");
    }
    if let Some(sub) = &query.subcategoria {
        qb.push(" AND subcategoria = ").push_bind(sub.clone());
    }
    if let Some(en_stock) = query.en_stock {
        qb.push(" AND en_stock = ").push_bind(en_stock);
    }
    if let Some(q) = query.q.as_deref().filter(|q| !q.is_empty()) {
        qb.push(" AND nombre ILIKE ").push_bind(like_pattern(q));
    }
}

pub struct ProductoRepository {
    pool: PgPool,
}

impl ProductoRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(
        &self,
        query: &ProductosQuery,
        paginacion: Paginacion,
    ) -> Result<Pagina<Producto>, DatabaseError> {
        let mut count = QueryBuilder::new("SELECT COUNT(*) FROM productos");
        push_filters(&mut count, query);
        let total: i64 = count.build_query_scalar::<i64>().fetch_one(&self.pool).await?;

        let mut select = QueryBuilder::new(format!("SELECT {} FROM productos", COLUMNS));
        push_filters(&mut select, query);
        select
            .push(format!(
                " ORDER BY {} {}, id",
                sort_column(query.sort.as_deref()),
                sort_direction(query.order.as_deref())
            ))
            .push(" LIMIT ")
            .push_bind(i64::from(paginacion.limit))
            .push(" OFFSET ")
            .push_bind(paginacion.offset());

        debug!(sql = select.sql(), "Listing productos");
        let rows: Vec<ProductoRow> = select.build_query_as::<ProductoRow>().fetch_all(&self.pool).await?;
        let items = rows.into_iter().map(into_producto).collect::<Result<Vec<_>, _>>()?;
        Ok(paginacion.pagina(items, total))
    }

    pub async fn get(&self, id: Uuid) -> Result<Producto, DatabaseError> {
        let sql = format!("SELECT {} FROM productos WHERE id = $1", COLUMNS);
        let row: Option<ProductoRow> = sqlx::query_as(&sql).bind(id).fetch_optional(&self.pool).await?;
        row.map(into_producto)
            .unwrap_or_else(|| Err(DatabaseError::NotFound(format!("Producto {} not found", id))))
    }

    pub async fn get_by_barcode(&self, codigo: &str) -> Result<Producto, DatabaseError> {
        let codigo = normalize_barcode(codigo);
        let sql = format!("SELECT {} FROM productos WHERE codigo_barras = $1", COLUMNS);
        let row: Option<ProductoRow> = sqlx::query_as(&sql)
            .bind(&codigo)
            .fetch_optional(&self.pool)
            .await?;
        row.map(into_producto).unwrap_or_else(|| {
            Err(DatabaseError::NotFound(format!(
                "Producto with codigo_barras {} not found",
                codigo
            )))
        })
    }

    pub async fn create(&self, nuevo: &NuevoProducto) -> Result<Producto, DatabaseError> {
        insert(&self.pool, nuevo).await
    }

    /// All-or-nothing batch insert
    pub async fn create_batch(&self, productos: &[NuevoProducto]) -> Result<Vec<Producto>, DatabaseError> {
        let mut tx = self.pool.begin().await?;
        let mut created = Vec::with_capacity(productos.len());
        for nuevo in productos {
            created.push(insert(&mut *tx, nuevo).await?);
        }
        tx.commit().await?;
        Ok(created)
    }

    /// Partial update. Writing one price column clears the other so the row
    /// keeps exactly one price.
    pub async fn update(&self, id: Uuid, cambios: &ActualizarProducto) -> Result<Producto, DatabaseError> {
        let sql = format!(
            r#"
            UPDATE productos SET
                nombre = COALESCE($2, nombre),
                categoria = COALESCE($3, categoria),
                subcategoria = COALESCE($4, subcategoria),
                precio = CASE
                    WHEN $5::numeric IS NOT NULL THEN $5::numeric
                    WHEN $6::numeric IS NOT NULL THEN NULL
                    ELSE precio END,
                precio_desde = CASE
                    WHEN $6::numeric IS NOT NULL THEN $6::numeric
                    WHEN $5::numeric IS NOT NULL THEN NULL
                    ELSE precio_desde END,
                unidad = COALESCE($7, unidad),
                en_stock = COALESCE($8, en_stock),
                codigo_barras = COALESCE($9, codigo_barras),
                descripcion = COALESCE($10, descripcion),
                imagen_url = COALESCE($11, imagen_url),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            COLUMNS
        );

        let row: Option<ProductoRow> = sqlx::query_as(&sql)
            .bind(id)
            .bind(&cambios.nombre)
            .bind(&cambios.categoria)
            .bind(&cambios.subcategoria)
            .bind(cambios.precio)
            .bind(cambios.precio_desde)
            .bind(&cambios.unidad)
            .bind(cambios.en_stock)
            .bind(cambios.codigo_barras.as_deref().map(normalize_barcode))
            .bind(&cambios.descripcion)
            .bind(&cambios.imagen_url)
            .fetch_optional(&self.pool)
            .await?;

        row.map(into_producto)
            .unwrap_or_else(|| Err(DatabaseError::NotFound(format!("Producto {} not found", id))))
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), DatabaseError> {
        let result = sqlx::query("DELETE FROM productos WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!("Producto {} not found", id)));
        }
        Ok(())
    }

    pub async fn categorias(&self) -> Result<Vec<Categoria>, DatabaseError> {
        let rows: Vec<(String, Option<String>, i64)> = sqlx::query_as(
            r#"
            SELECT categoria, subcategoria, COUNT(*)
            FROM productos
            GROUP BY categoria, subcategoria
            ORDER BY categoria, subcategoria NULLS FIRST
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(Categoria::agrupar(rows))
    }
}

async fn insert<'e, E>(executor: E, nuevo: &NuevoProducto) -> Result<Producto, DatabaseError>
where
    E: PgExecutor<'e>,
{
    let precio = nuevo.precio().ok_or_else(|| {
        DatabaseError::InvalidState("exactly one of precio or precio_desde is required".to_string())
    })?;
    let (precio, precio_desde) = precio.columns();

    let sql = format!(
        r#"
        INSERT INTO productos
            (id, nombre, categoria, subcategoria, precio, precio_desde, unidad, en_stock,
             codigo_barras, descripcion, imagen_url)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        RETURNING {}
        "#,
        COLUMNS
    );

    let row: ProductoRow = sqlx::query_as(&sql)
        .bind(Uuid::new_v4())
        .bind(&nuevo.nombre)
        .bind(&nuevo.categoria)
        .bind(&nuevo.subcategoria)
        .bind(precio)
        .bind(precio_desde)
        .bind(nuevo.unidad.as_deref().unwrap_or(UNIDAD_DEFAULT))
        .bind(nuevo.en_stock.unwrap_or(true))
        .bind(nuevo.codigo_barras.as_deref().map(normalize_barcode))
        .bind(&nuevo.descripcion)
        .bind(&nuevo.imagen_url)
        .fetch_one(executor)
        .await?;

    into_producto(row)
}
