use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::validation::{Chain, RequestRules};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Rol {
    Admin,
    Operator,
    Viewer,
}

impl Rol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Rol::Admin => "ADMIN",
            Rol::Operator => "OPERATOR",
            Rol::Viewer => "VIEWER",
        }
    }
}

impl fmt::Display for Rol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Rol {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ADMIN" => Ok(Rol::Admin),
            "OPERATOR" => Ok(Rol::Operator),
            "VIEWER" => Ok(Rol::Viewer),
            other => Err(format!("unknown rol '{}'", other)),
        }
    }
}

/// Operator account. The password hash never leaves the server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Usuario {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub nombre: String,
    pub rol: Rol,
    pub activo: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct UsuarioRow {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub nombre: String,
    pub rol: String,
    pub activo: bool,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<UsuarioRow> for Usuario {
    type Error = String;

    fn try_from(row: UsuarioRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            email: row.email,
            password_hash: row.password_hash,
            nombre: row.nombre,
            rol: row.rol.parse()?,
            activo: row.activo,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NuevoAdmin {
    pub email: String,
    pub password: String,
    pub nombre: String,
}

impl RequestRules for NuevoAdmin {
    fn chains() -> Vec<Chain> {
        vec![
            Chain::field("email").email(),
            Chain::field("password").password(),
            Chain::field("nombre").length(1, 100),
        ]
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credenciales {
    pub email: String,
    pub password: String,
}

impl RequestRules for Credenciales {
    fn chains() -> Vec<Chain> {
        vec![
            Chain::field("email").email(),
            Chain::field("password").length(1, 128),
        ]
    }
}

/// Successful login: bearer token plus the account it belongs to
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sesion {
    pub token: String,
    pub expires_in: u64,
    pub usuario: Usuario,
}
