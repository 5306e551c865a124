//! Declarative request validation.
//!
//! A [`Chain`] names one field (dotted paths reach into nested objects) and
//! carries an ordered list of [`Rule`]s. Chains run against the raw JSON value
//! of a body or query string; every failing field contributes one
//! [`FieldError`] and the caller rejects the whole request if any exist.
//!
//! JSON bodies are checked strictly: a number must be a JSON number and a
//! boolean a JSON bool, since that is what the typed payload will accept.
//! Query strings only carry strings, so their rules coerce `"2"` and `"true"`.

pub mod checks;
pub mod de;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ApiError;

/// One rejected field: `{field, message, value}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
    #[serde(default)]
    pub value: Value,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>, value: Value) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            value,
        }
    }
}

/// Where the validated value came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Body,
    Query,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Presence {
    Required,
    Optional,
    Nullable,
}

#[derive(Debug, Clone)]
pub enum Rule {
    Email,
    Password,
    Phone,
    Length { min: usize, max: usize },
    Range { min: f64, max: f64 },
    Integer { min: i64, max: i64 },
    OneOf(&'static [&'static str]),
    Date,
    Url,
    Boolean,
    Array { min: usize, max: usize },
    Custom {
        check: fn(&Value) -> bool,
        message: &'static str,
    },
}

impl Rule {
    /// Returns the failure message, if any
    fn apply(&self, value: &Value, source: Source) -> Option<String> {
        match self {
            Rule::Email => match value.as_str() {
                Some(s) if checks::is_email(s) => None,
                _ => Some("must be a valid email address".to_string()),
            },
            Rule::Password => match value.as_str() {
                Some(s) if checks::is_password(s) => None,
                _ => Some(
                    "must be 8-128 characters and contain at least one letter and one digit".to_string(),
                ),
            },
            Rule::Phone => match value.as_str() {
                Some(s) if checks::is_phone(s) => None,
                _ => Some("must be a phone number with 8 to 15 digits".to_string()),
            },
            Rule::Length { min, max } => match value.as_str() {
                Some(s) => {
                    let len = s.chars().count();
                    if len < *min || len > *max {
                        Some(format!("must be between {} and {} characters", min, max))
                    } else {
                        None
                    }
                }
                None => Some("must be a string".to_string()),
            },
            Rule::Range { min, max } => match number(value, source) {
                Some(n) if n >= *min && n <= *max => None,
                Some(_) => Some(format!("must be between {} and {}", min, max)),
                None => Some("must be a number".to_string()),
            },
            Rule::Integer { min, max } => match integer(value, source) {
                Some(n) if n >= *min && n <= *max => None,
                Some(_) => Some(format!("must be an integer between {} and {}", min, max)),
                None => Some("must be an integer".to_string()),
            },
            Rule::OneOf(allowed) => match value.as_str() {
                Some(s) if allowed.contains(&s) => None,
                _ => Some(format!("must be one of: {}", allowed.join(", "))),
            },
            Rule::Date => match value.as_str() {
                Some(s) if checks::is_date(s) => None,
                _ => Some("must be an ISO-8601 date".to_string()),
            },
            Rule::Url => match value.as_str() {
                Some(s) if checks::is_http_url(s) => None,
                _ => Some("must be a valid http(s) URL".to_string()),
            },
            Rule::Boolean => match value {
                Value::Bool(_) => None,
                Value::String(s) if source == Source::Query && (s == "true" || s == "false") => None,
                _ => Some("must be a boolean".to_string()),
            },
            Rule::Array { min, max } => match value.as_array() {
                Some(items) if items.len() >= *min && items.len() <= *max => None,
                Some(_) => Some(format!("must contain between {} and {} items", min, max)),
                None => Some("must be an array".to_string()),
            },
            Rule::Custom { check, message } => {
                if check(value) {
                    None
                } else {
                    Some((*message).to_string())
                }
            }
        }
    }
}

fn number(value: &Value, source: Source) -> Option<f64> {
    match source {
        Source::Body => value.as_f64(),
        Source::Query => checks::as_f64(value),
    }
}

fn integer(value: &Value, source: Source) -> Option<i64> {
    match source {
        Source::Body => value.as_i64(),
        Source::Query => checks::as_i64(value),
    }
}

/// Validation chain for a single field
#[derive(Debug, Clone)]
pub struct Chain {
    field: String,
    presence: Presence,
    rules: Vec<Rule>,
    each: Vec<Chain>,
}

impl Chain {
    pub fn field(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            presence: Presence::Required,
            rules: Vec::new(),
            each: Vec::new(),
        }
    }

    /// Absent and null values skip the rules. A blank string is an error,
    /// since it would otherwise reach the payload as `Some("")`.
    pub fn optional(mut self) -> Self {
        self.presence = Presence::Optional;
        self
    }

    /// Absent, null and blank values all mean "no value". The payload field
    /// must deserialize with `de::blank_as_none` to agree.
    pub fn nullable(mut self) -> Self {
        self.presence = Presence::Nullable;
        self
    }

    pub fn rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn email(self) -> Self {
        self.rule(Rule::Email)
    }

    pub fn password(self) -> Self {
        self.rule(Rule::Password)
    }

    pub fn phone(self) -> Self {
        self.rule(Rule::Phone)
    }

    pub fn length(self, min: usize, max: usize) -> Self {
        self.rule(Rule::Length { min, max })
    }

    pub fn range(self, min: f64, max: f64) -> Self {
        self.rule(Rule::Range { min, max })
    }

    pub fn integer(self, min: i64, max: i64) -> Self {
        self.rule(Rule::Integer { min, max })
    }

    pub fn one_of(self, allowed: &'static [&'static str]) -> Self {
        self.rule(Rule::OneOf(allowed))
    }

    pub fn date(self) -> Self {
        self.rule(Rule::Date)
    }

    pub fn url(self) -> Self {
        self.rule(Rule::Url)
    }

    pub fn boolean(self) -> Self {
        self.rule(Rule::Boolean)
    }

    pub fn array(self, min: usize, max: usize) -> Self {
        self.rule(Rule::Array { min, max })
    }

    pub fn custom(self, check: fn(&Value) -> bool, message: &'static str) -> Self {
        self.rule(Rule::Custom { check, message })
    }

    /// Chains applied to every element of an array field
    pub fn each(mut self, chains: Vec<Chain>) -> Self {
        self.each = chains;
        self
    }

    fn run(&self, input: &Value, source: Source, prefix: &str, errors: &mut Vec<FieldError>) {
        let path = if prefix.is_empty() {
            self.field.clone()
        } else {
            format!("{}.{}", prefix, self.field)
        };

        let value = lookup(input, &self.field);
        let blank = matches!(value, Some(Value::String(s)) if s.trim().is_empty());
        let absent = matches!(value, None | Some(Value::Null));

        match self.presence {
            Presence::Required if absent || blank => {
                let value = value.cloned().unwrap_or(Value::Null);
                errors.push(FieldError::new(path, "is required", value));
                return;
            }
            Presence::Optional if absent => return,
            Presence::Optional if blank => {
                let value = value.cloned().unwrap_or(Value::Null);
                errors.push(FieldError::new(path, "cannot be blank", value));
                return;
            }
            Presence::Nullable if absent || blank => return,
            _ => {}
        }

        let Some(value) = value else { return };

        // Whitelisted query keys may repeat, but a scalar field takes one value
        let takes_list = self.rules.iter().any(|r| matches!(r, Rule::Array { .. }));
        if source == Source::Query && value.is_array() && !takes_list {
            errors.push(FieldError::new(path, "must be given only once", value.clone()));
            return;
        }

        // First failing rule wins for the field
        for rule in &self.rules {
            if let Some(message) = rule.apply(value, source) {
                errors.push(FieldError::new(path, message, value.clone()));
                return;
            }
        }

        if self.each.is_empty() {
            return;
        }
        if let Some(items) = value.as_array() {
            for (i, item) in items.iter().enumerate() {
                let item_prefix = format!("{}[{}]", path, i);
                for chain in &self.each {
                    chain.run(item, source, &item_prefix, errors);
                }
            }
        }
    }
}

fn lookup<'a>(input: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(input, |current, key| current.get(key))
}

/// Run every chain against a JSON body and collect the failures
pub fn validate(chains: &[Chain], input: &Value) -> Vec<FieldError> {
    validate_from(Source::Body, chains, input)
}

pub fn validate_from(source: Source, chains: &[Chain], input: &Value) -> Vec<FieldError> {
    let mut errors = Vec::new();
    for chain in chains {
        chain.run(input, source, "", &mut errors);
    }
    errors
}

/// Terminal step: reject with 400 if any chain failed
pub fn ensure_valid(errors: Vec<FieldError>) -> Result<(), ApiError> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(ApiError::validation(errors))
    }
}

/// Field rules for a request type, run before its payload is deserialized
pub trait RequestRules {
    /// Query-string types override this to `Source::Query`
    const SOURCE: Source = Source::Body;

    fn chains() -> Vec<Chain>;

    /// Rules spanning more than one field
    fn cross_field(_input: &Value) -> Vec<FieldError> {
        Vec::new()
    }

    fn check(input: &Value) -> Vec<FieldError> {
        let mut errors = validate_from(Self::SOURCE, &Self::chains(), input);
        errors.extend(Self::cross_field(input));
        errors
    }
}

pub const SORT_ORDERS: &[&str] = &["asc", "desc"];

/// `page` >= 1 and `limit` in 1..=100, both optional
pub fn pagination() -> Vec<Chain> {
    vec![
        Chain::field("page").optional().integer(1, i64::from(i32::MAX)),
        Chain::field("limit").optional().integer(1, 100),
    ]
}

/// `sort` restricted to a whitelist, `order` to asc/desc
pub fn sort_by(fields: &'static [&'static str]) -> Vec<Chain> {
    vec![
        Chain::field("sort").optional().one_of(fields),
        Chain::field("order").optional().one_of(SORT_ORDERS),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(errors: &[FieldError]) -> Vec<&str> {
        errors.iter().map(|e| e.field.as_str()).collect()
    }

    #[test]
    fn required_field_missing() {
        let chains = vec![Chain::field("categoria").length(1, 100)];
        let errors = validate(&chains, &json!({ "nombre": "Pan" }));
        assert_eq!(fields(&errors), vec!["categoria"]);
        assert_eq!(errors[0].message, "is required");
        assert_eq!(errors[0].value, Value::Null);
    }

    #[test]
    fn optional_field_skips_only_when_absent() {
        let chains = vec![Chain::field("nombre").optional().length(1, 100)];
        assert!(validate(&chains, &json!({})).is_empty());
        assert!(validate(&chains, &json!({ "nombre": null })).is_empty());

        let errors = validate(&chains, &json!({ "nombre": "" }));
        assert_eq!(fields(&errors), vec!["nombre"]);
        assert_eq!(errors[0].message, "cannot be blank");
        assert_eq!(validate(&chains, &json!({ "nombre": "  " }))[0].message, "cannot be blank");
    }

    #[test]
    fn nullable_field_treats_blank_as_absent() {
        let chains = vec![Chain::field("subcategoria").nullable().length(1, 100)];
        assert!(validate(&chains, &json!({})).is_empty());
        assert!(validate(&chains, &json!({ "subcategoria": "" })).is_empty());
        assert!(validate(&chains, &json!({ "subcategoria": "   " })).is_empty());
        assert_eq!(
            fields(&validate(&chains, &json!({ "subcategoria": "x".repeat(101) }))),
            vec!["subcategoria"]
        );
    }

    #[test]
    fn required_field_rejects_blank() {
        let chains = vec![Chain::field("nombre").length(1, 100)];
        let errors = validate(&chains, &json!({ "nombre": "  " }));
        assert_eq!(errors[0].message, "is required");
    }

    #[test]
    fn body_scalars_must_carry_their_json_type() {
        let chains = vec![
            Chain::field("precio").range(0.0, 1000.0),
            Chain::field("cantidad").integer(1, 10),
            Chain::field("en_stock").boolean(),
        ];
        assert!(validate(&chains, &json!({ "precio": 9.5, "cantidad": 2, "en_stock": true })).is_empty());

        let errors = validate(&chains, &json!({ "precio": "9.5", "cantidad": "2", "en_stock": "true" }));
        assert_eq!(fields(&errors), vec!["precio", "cantidad", "en_stock"]);
        assert_eq!(errors[0].message, "must be a number");
        assert_eq!(errors[1].message, "must be an integer");
        assert_eq!(errors[2].message, "must be a boolean");

        let errors = validate(&chains, &json!({ "precio": 1, "cantidad": 1.5, "en_stock": false }));
        assert_eq!(fields(&errors), vec!["cantidad"]);
    }

    #[test]
    fn query_scalars_are_coerced_from_strings() {
        let chains = vec![
            Chain::field("limit").integer(1, 100),
            Chain::field("en_stock").boolean(),
        ];
        let input = json!({ "limit": "20", "en_stock": "true" });
        assert!(validate_from(Source::Query, &chains, &input).is_empty());
    }

    #[test]
    fn repeated_query_scalar_is_rejected_clearly() {
        let errors = validate_from(Source::Query, &pagination(), &json!({ "limit": ["10", "20"] }));
        assert_eq!(fields(&errors), vec!["limit"]);
        assert_eq!(errors[0].message, "must be given only once");
    }

    #[test]
    fn collects_errors_from_every_field() {
        let chains = vec![
            Chain::field("email").email(),
            Chain::field("password").password(),
            Chain::field("rol").one_of(&["ADMIN", "OPERATOR", "VIEWER"]),
        ];
        let errors = validate(
            &chains,
            &json!({ "email": "nope", "password": "short", "rol": "ROOT" }),
        );
        assert_eq!(fields(&errors), vec!["email", "password", "rol"]);
        assert_eq!(errors[2].value, json!("ROOT"));
    }

    #[test]
    fn pagination_limit_bounds() {
        let chains = pagination();
        let query = |input: Value| validate_from(Source::Query, &chains, &input);
        assert!(query(json!({ "limit": "100" })).is_empty());
        assert!(query(json!({ "limit": 100 })).is_empty());

        let errors = query(json!({ "limit": "101" }));
        assert_eq!(fields(&errors), vec!["limit"]);

        let errors = query(json!({ "page": "0", "limit": "0" }));
        assert_eq!(fields(&errors), vec!["page", "limit"]);
    }

    #[test]
    fn sort_whitelist() {
        let chains = sort_by(&["nombre", "precio"]);
        assert!(validate(&chains, &json!({ "sort": "precio", "order": "desc" })).is_empty());

        let errors = validate(&chains, &json!({ "sort": "password_hash", "order": "sideways" }));
        assert_eq!(fields(&errors), vec!["sort", "order"]);
    }

    #[test]
    fn nested_array_elements_report_indexed_paths() {
        let chains = vec![Chain::field("items").array(1, 5).each(vec![
            Chain::field("nombre").length(1, 50),
            Chain::field("cantidad").integer(1, 1000),
        ])];

        let errors = validate(
            &chains,
            &json!({ "items": [ { "nombre": "Pan", "cantidad": 2 }, { "cantidad": 0 } ] }),
        );
        assert_eq!(fields(&errors), vec!["items[1].nombre", "items[1].cantidad"]);

        let errors = validate(&chains, &json!({ "items": [] }));
        assert_eq!(fields(&errors), vec!["items"]);
    }

    #[test]
    fn dotted_paths_reach_nested_objects() {
        let chains = vec![Chain::field("contacto.telefono").phone()];
        assert!(validate(&chains, &json!({ "contacto": { "telefono": "+54 9 11 5555-1234" } })).is_empty());
        let errors = validate(&chains, &json!({ "contacto": { "telefono": "12" } }));
        assert_eq!(fields(&errors), vec!["contacto.telefono"]);
    }

    #[test]
    fn first_failing_rule_wins() {
        let chains = vec![Chain::field("nombre").length(1, 3).one_of(&["a"])];
        let errors = validate(&chains, &json!({ "nombre": "toolong" }));
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, "must be between 1 and 3 characters");
    }

    #[test]
    fn ensure_valid_rejects_with_400() {
        let err = ensure_valid(vec![FieldError::new("x", "bad", json!(1))]).unwrap_err();
        assert_eq!(err.status(), axum::http::StatusCode::BAD_REQUEST);
        assert!(ensure_valid(Vec::new()).is_ok());
    }
}
