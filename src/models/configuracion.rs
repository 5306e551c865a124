use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::FromRow;

use crate::validation::{Chain, FieldError, RequestRules};

/// Reserved key holding the bot on/off switch
pub const BOT_ACTIVO: &str = "bot_activo";
pub const MAX_KEYS: usize = 50;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct EntradaConfiguracion {
    pub clave: String,
    pub valor: Value,
    pub updated_at: DateTime<Utc>,
}

/// Body of `PUT /api/configuracion`: key -> JSON value
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActualizarConfiguracion(pub Map<String, Value>);

fn is_valid_key(key: &str) -> bool {
    (1..=64).contains(&key.len())
        && key
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

impl RequestRules for ActualizarConfiguracion {
    fn chains() -> Vec<Chain> {
        Vec::new()
    }

    fn cross_field(input: &Value) -> Vec<FieldError> {
        let Some(map) = input.as_object() else {
            return vec![FieldError::new("body", "must be an object", input.clone())];
        };
        if map.is_empty() || map.len() > MAX_KEYS {
            return vec![FieldError::new(
                "body",
                format!("must contain between 1 and {} keys", MAX_KEYS),
                Value::Null,
            )];
        }

        let mut errors = Vec::new();
        for (key, value) in map {
            if !is_valid_key(key) {
                errors.push(FieldError::new(
                    key.clone(),
                    "key must be 1-64 characters of a-z, 0-9 or _",
                    Value::String(key.clone()),
                ));
            } else if key == BOT_ACTIVO && !value.is_boolean() {
                errors.push(FieldError::new(key.clone(), "must be a boolean", value.clone()));
            }
        }
        errors
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstadoBot {
    pub activo: bool,
    pub updated_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn keys_are_restricted() {
        assert!(ActualizarConfiguracion::check(&json!({ "mensaje_bienvenida": "Hola!" })).is_empty());

        let errors = ActualizarConfiguracion::check(&json!({ "Mensaje-Bienvenida": "Hola!" }));
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "Mensaje-Bienvenida");
    }

    #[test]
    fn bot_switch_must_be_boolean() {
        assert!(ActualizarConfiguracion::check(&json!({ "bot_activo": false })).is_empty());
        assert_eq!(ActualizarConfiguracion::check(&json!({ "bot_activo": "no" })).len(), 1);
    }

    #[test]
    fn empty_or_non_object_bodies_are_rejected() {
        assert_eq!(ActualizarConfiguracion::check(&json!({}))[0].field, "body");
        assert_eq!(ActualizarConfiguracion::check(&json!([1, 2]))[0].field, "body");
    }
}
