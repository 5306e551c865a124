//! Scalar predicates behind the validation rules.

use chrono::{DateTime, NaiveDate};
use serde_json::Value;

pub fn is_email(s: &str) -> bool {
    if s.len() > 254 || s.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = s.rsplit_once('@') else {
        return false;
    };
    if local.is_empty() || local.len() > 64 || local.contains('@') {
        return false;
    }

    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 {
        return false;
    }
    let labels_ok = labels.iter().all(|label| {
        !label.is_empty()
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
    });
    let tld_ok = labels
        .last()
        .map(|tld| tld.len() >= 2 && tld.chars().all(|c| c.is_ascii_alphabetic()))
        .unwrap_or(false);

    labels_ok && tld_ok
}

pub fn is_password(s: &str) -> bool {
    let len = s.chars().count();
    (8..=128).contains(&len)
        && s.chars().any(|c| c.is_alphabetic())
        && s.chars().any(|c| c.is_ascii_digit())
}

/// Digits only, after dropping separators and an optional leading `+`
pub fn normalize_phone(s: &str) -> String {
    s.trim()
        .trim_start_matches('+')
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '(' | ')'))
        .collect()
}

pub fn is_phone(s: &str) -> bool {
    let trimmed = s.trim();
    if trimmed.matches('+').count() > 1 || (trimmed.contains('+') && !trimmed.starts_with('+')) {
        return false;
    }
    let digits = normalize_phone(trimmed);
    (8..=15).contains(&digits.len()) && digits.chars().all(|c| c.is_ascii_digit())
}

pub fn is_date(s: &str) -> bool {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok() || DateTime::parse_from_rfc3339(s).is_ok()
}

pub fn is_http_url(s: &str) -> bool {
    match url::Url::parse(s) {
        Ok(u) => matches!(u.scheme(), "http" | "https") && u.host().is_some(),
        Err(_) => false,
    }
}

/// Numbers or numeric strings (query values arrive as strings)
pub fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        _ => None,
    }
}

pub fn as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn emails() {
        assert!(is_email("ana@tienda.com.ar"));
        assert!(is_email("ops+bot@example.io"));
        assert!(!is_email("ana@localhost"));
        assert!(!is_email("ana @tienda.com"));
        assert!(!is_email("@tienda.com"));
        assert!(!is_email("ana@tienda.c0m"));
        assert!(!is_email("ana@-tienda.com"));
    }

    #[test]
    fn passwords() {
        assert!(is_password("secreto123"));
        assert!(!is_password("12345678"));
        assert!(!is_password("abcdefgh"));
        assert!(!is_password("ab1"));
    }

    #[test]
    fn phones() {
        assert!(is_phone("+5491155551234"));
        assert!(is_phone("11 5555-1234"));
        assert!(is_phone("(011) 5555 1234"));
        assert!(!is_phone("1234567"));
        assert!(!is_phone("54+91155551234"));
        assert!(!is_phone("+54911555512345678"));
        assert!(!is_phone("+54911abc1234"));
        assert_eq!(normalize_phone("+54 9 11 5555-1234"), "5491155551234");
    }

    #[test]
    fn dates() {
        assert!(is_date("2024-03-01"));
        assert!(is_date("2024-03-01T10:00:00Z"));
        assert!(!is_date("2024-13-01"));
        assert!(!is_date("01/03/2024"));
    }

    #[test]
    fn urls() {
        assert!(is_http_url("https://cdn.example.com/img/pan.jpg"));
        assert!(!is_http_url("ftp://example.com/file"));
        assert!(!is_http_url("javascript:alert(1)"));
        assert!(!is_http_url("not a url"));
    }

    #[test]
    fn numeric_coercion() {
        assert_eq!(as_i64(&json!("42")), Some(42));
        assert_eq!(as_i64(&json!(4.5)), None);
        assert_eq!(as_f64(&json!("4.5")), Some(4.5));
        assert_eq!(as_f64(&json!("NaN")), None);
        assert_eq!(as_f64(&json!(true)), None);
    }
}
