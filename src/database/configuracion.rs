use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use sqlx::{PgExecutor, PgPool};
use tracing::info;

use super::DatabaseError;
use crate::models::configuracion::BOT_ACTIVO;
use crate::models::{EntradaConfiguracion, EstadoBot};

pub struct ConfiguracionRepository {
    pool: PgPool,
}

async fn upsert<'e, E>(executor: E, clave: &str, valor: &Value) -> Result<EntradaConfiguracion, DatabaseError>
where
    E: PgExecutor<'e>,
{
    Ok(sqlx::query_as(
        r#"
        INSERT INTO configuracion (clave, valor) VALUES ($1, $2)
        ON CONFLICT (clave) DO UPDATE SET valor = EXCLUDED.valor, updated_at = NOW()
        RETURNING clave, valor, updated_at
        "#,
    )
    .bind(clave)
    .bind(valor)
    .fetch_one(executor)
    .await?)
}

impl ConfiguracionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn all(&self) -> Result<Vec<EntradaConfiguracion>, DatabaseError> {
        Ok(
            sqlx::query_as("SELECT clave, valor, updated_at FROM configuracion ORDER BY clave")
                .fetch_all(&self.pool)
                .await?,
        )
    }

    /// Write every key or none
    pub async fn update(&self, valores: &Map<String, Value>) -> Result<Vec<EntradaConfiguracion>, DatabaseError> {
        let mut tx = self.pool.begin().await?;
        let mut entradas = Vec::with_capacity(valores.len());
        for (clave, valor) in valores {
            entradas.push(upsert(&mut *tx, clave, valor).await?);
        }
        tx.commit().await?;
        Ok(entradas)
    }

    /// A missing switch means the bot is running
    pub async fn estado_bot(&self) -> Result<EstadoBot, DatabaseError> {
        let row: Option<(Value, DateTime<Utc>)> =
            sqlx::query_as("SELECT valor, updated_at FROM configuracion WHERE clave = $1")
                .bind(BOT_ACTIVO)
                .fetch_optional(&self.pool)
                .await?;

        Ok(match row {
            Some((valor, updated_at)) => EstadoBot {
                activo: valor.as_bool().unwrap_or(true),
                updated_at: Some(updated_at),
            },
            None => EstadoBot {
                activo: true,
                updated_at: None,
            },
        })
    }

    pub async fn set_bot_activo(&self, activo: bool) -> Result<EstadoBot, DatabaseError> {
        let entrada = upsert(&self.pool, BOT_ACTIVO, &Value::Bool(activo)).await?;
        info!(activo, "Bot switch changed");
        Ok(EstadoBot {
            activo,
            updated_at: Some(entrada.updated_at),
        })
    }
}
