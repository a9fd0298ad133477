use serde::Serialize;
use serde_json::{json, Value};

use crate::cli::OutputFormat;
use crate::error::FetchError;

/// Print any serializable value as JSON or YAML
pub fn output_structured<T: Serialize>(output_format: OutputFormat, value: &T) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Yaml => print!("{}", serde_yaml::to_string(value)?),
        _ => println!("{}", serde_json::to_string_pretty(value)?),
    }
    Ok(())
}

/// Output a success message in the appropriate format
pub fn output_success(output_format: OutputFormat, message: &str, data: Option<Value>) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Text => {
            println!("✓ {}", message);
        }
        _ => {
            let mut response = json!({
                "success": true,
                "message": message
            });
            if let (Some(Value::Object(extra)), Some(object)) = (data, response.as_object_mut()) {
                object.extend(extra);
            }
            output_structured(output_format, &response)?;
        }
    }
    Ok(())
}

/// Output an error message in the appropriate format
pub fn output_error(output_format: OutputFormat, message: &str, error_code: Option<&str>) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Text => {
            eprintln!("Error: {}", message);
        }
        _ => {
            let mut response = json!({
                "success": false,
                "error": message
            });
            if let Some(code) = error_code {
                response["error_code"] = json!(code);
            }
            output_structured(output_format, &response)?;
        }
    }
    Ok(())
}

/// Message and code for a failed command. Fetch errors show their user-facing
/// message, never the server detail.
pub fn describe_error(err: &anyhow::Error) -> (String, Option<&'static str>) {
    match err.downcast_ref::<FetchError>() {
        Some(fetch) => (fetch.user_message().to_string(), Some(fetch.error_code())),
        None => (err.to_string(), None),
    }
}

/// Report a failed command; `verbose` prints the full error chain in text mode
pub fn report_error(output_format: OutputFormat, err: &anyhow::Error, verbose: bool) -> anyhow::Result<()> {
    if verbose && output_format == OutputFormat::Text {
        eprintln!("Error: {err:?}");
        return Ok(());
    }
    let (message, code) = describe_error(err);
    output_error(output_format, &message, code)
}

/// Left-aligned plain text table; empty cells render as `-`
pub fn render_table(columns: &[&str], rows: &[Vec<Option<String>>]) -> String {
    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|row| {
            row.iter()
                .map(|cell| cell.clone().unwrap_or_else(|| "-".to_string()))
                .collect()
        })
        .collect();

    let widths: Vec<usize> = columns
        .iter()
        .enumerate()
        .map(|(i, header)| {
            cells
                .iter()
                .filter_map(|row| row.get(i))
                .map(|cell| cell.chars().count())
                .chain(std::iter::once(header.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let line = |values: Vec<&str>| -> String {
        values
            .iter()
            .zip(&widths)
            .map(|(value, width)| format!("{:<width$}", value, width = *width))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut out = Vec::with_capacity(cells.len() + 2);
    out.push(line(columns.to_vec()));
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    out.push(line(rule.iter().map(String::as_str).collect()));
    for row in &cells {
        out.push(line(row.iter().map(String::as_str).collect()));
    }
    out.join("\n")
}

/// Parse `key=value` pairs given on the command line
pub fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => Ok((key.trim().to_string(), value.to_string())),
        _ => Err(format!("expected key=value, got '{}'", raw)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_pads_columns() {
        let table = render_table(
            &["id", "name"],
            &[
                vec![Some("1".into()), Some("Acme".into())],
                vec![Some("22".into()), None],
            ],
        );
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines[0], "id  name");
        assert_eq!(lines[1], "--  ----");
        assert_eq!(lines[2], "1   Acme");
        assert_eq!(lines[3], "22  -");
    }

    #[test]
    fn fetch_errors_are_described_by_code() {
        let err = anyhow::Error::from(FetchError::Forbidden("role admin required".into()));
        let (message, code) = describe_error(&err);
        assert_eq!(code, Some("FORBIDDEN"));
        assert_eq!(message, "You do not have permission to view this data.");
        assert!(!message.contains("admin"));

        let other = anyhow::anyhow!("Pages start at 1");
        assert_eq!(describe_error(&other), ("Pages start at 1".to_string(), None));
    }

    #[test]
    fn key_value_parsing() {
        assert_eq!(parse_key_value("status=active"), Ok(("status".into(), "active".into())));
        assert_eq!(parse_key_value("search="), Ok(("search".into(), String::new())));
        assert!(parse_key_value("status").is_err());
        assert!(parse_key_value("=x").is_err());
    }
}
