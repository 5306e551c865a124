use sqlx::PgPool;
use uuid::Uuid;

use super::DatabaseError;
use crate::models::usuario::UsuarioRow;
use crate::models::{Rol, Usuario};

const COLUMNS: &str = "id, email, password_hash, nombre, rol, activo, created_at";

fn into_usuario(row: UsuarioRow) -> Result<Usuario, DatabaseError> {
    Usuario::try_from(row).map_err(DatabaseError::Corrupt)
}

pub struct UsuarioRepository {
    pool: PgPool,
}

impl UsuarioRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Emails are stored lower-cased; a taken email is a `Conflict`
    pub async fn create(
        &self,
        email: &str,
        password_hash: &str,
        nombre: &str,
        rol: Rol,
    ) -> Result<Usuario, DatabaseError> {
        let sql = format!(
            "INSERT INTO usuarios (id, email, password_hash, nombre, rol) VALUES ($1, $2, $3, $4, $5) RETURNING {}",
            COLUMNS
        );
        let row: UsuarioRow = sqlx::query_as(&sql)
            .bind(Uuid::new_v4())
            .bind(email.trim().to_lowercase())
            .bind(password_hash)
            .bind(nombre)
            .bind(rol.as_str())
            .fetch_one(&self.pool)
            .await?;
        into_usuario(row)
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<Usuario>, DatabaseError> {
        let sql = format!("SELECT {} FROM usuarios WHERE email = $1", COLUMNS);
        let row: Option<UsuarioRow> = sqlx::query_as(&sql)
            .bind(email.trim().to_lowercase())
            .fetch_optional(&self.pool)
            .await?;
        row.map(into_usuario).transpose()
    }

    pub async fn get(&self, id: Uuid) -> Result<Usuario, DatabaseError> {
        let sql = format!("SELECT {} FROM usuarios WHERE id = $1", COLUMNS);
        let row: Option<UsuarioRow> = sqlx::query_as(&sql).bind(id).fetch_optional(&self.pool).await?;
        row.map(into_usuario)
            .unwrap_or_else(|| Err(DatabaseError::NotFound(format!("Usuario {} not found", id))))
    }
}
