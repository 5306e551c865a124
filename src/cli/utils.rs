use serde::Serialize;
use serde_json::{json, Value};

use crate::cli::OutputFormat;
use crate::models::Pagina;

/// Output a success message in the appropriate format
pub fn output_success(
    output_format: OutputFormat,
    message: &str,
    data: Option<Value>,
) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = json!({
                "success": true,
                "message": message
            });

            if let (Some(Value::Object(extra)), Value::Object(target)) = (data, &mut response) {
                target.extend(extra);
            }

            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            println!("✓ {}", message);
        }
    }
    Ok(())
}

/// Print a single record: pretty JSON, or `key: value` lines for text
pub fn output_record<T: Serialize>(output_format: OutputFormat, record: &T) -> anyhow::Result<()> {
    let value = serde_json::to_value(record)?;
    match output_format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&value)?),
        OutputFormat::Text => match &value {
            Value::Object(map) => {
                for (key, field) in map {
                    println!("{}: {}", key, display_value(field));
                }
            }
            other => println!("{}", display_value(other)),
        },
    }
    Ok(())
}

/// Print one page of a listing. Text output is one line per item built by
/// `line`, followed by the page position.
pub fn output_page<T, F>(
    output_format: OutputFormat,
    pagina: &Pagina<T>,
    empty_message: &str,
    line: F,
) -> anyhow::Result<()>
where
    T: Serialize,
    F: Fn(&T) -> String,
{
    match output_format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(pagina)?),
        OutputFormat::Text => {
            if pagina.items.is_empty() {
                println!("{}", empty_message);
                return Ok(());
            }
            for item in &pagina.items {
                println!("{}", line(item));
            }
            println!("-- page {} ({} per page, {} total)", pagina.page, pagina.limit, pagina.total);
        }
    }
    Ok(())
}

/// Strings print bare, null prints as `-`, everything else as compact JSON
pub fn display_value(value: &Value) -> String {
    match value {
        Value::Null => "-".to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn values_display_without_quotes() {
        assert_eq!(display_value(&json!("Pan")), "Pan");
        assert_eq!(display_value(&Value::Null), "-");
        assert_eq!(display_value(&json!({ "fijo": "100" })), r#"{"fijo":"100"}"#);
    }
}
