//! Rendering of command results.

use anyhow::Result;
use serde_json::Value;

use crate::cli::OutputFormat;

/// Render a command result in the requested format.
pub fn render(format: OutputFormat, value: &Value) -> Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(value)?),
        OutputFormat::Text => Ok(text(value)),
        OutputFormat::Yaml => {
            let mut lines = Vec::new();
            render_yaml(value, 0, &mut lines);
            Ok(lines.join("\n"))
        }
        OutputFormat::Table => Ok(render_table(value).unwrap_or_else(|| text(value))),
    }
}

fn text(value: &Value) -> String {
    let mut lines = Vec::new();
    render_text(value, "", &mut lines);
    lines.join("\n")
}

/// Objects become `key: value` lines (nested keys joined with `.`), arrays one
/// line per item, scalars their plain value.
fn render_text(value: &Value, path: &str, lines: &mut Vec<String>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                let child_path = if path.is_empty() {
                    key.clone()
                } else {
                    format!("{path}.{key}")
                };
                render_text(child, &child_path, lines);
            }
        }
        Value::Array(items) if items.iter().all(is_scalar) => {
            for item in items {
                push_line(lines, path, &scalar(item));
            }
        }
        Value::Array(items) => {
            for (index, item) in items.iter().enumerate() {
                let child_path = if path.is_empty() {
                    index.to_string()
                } else {
                    format!("{path}.{index}")
                };
                render_text(item, &child_path, lines);
            }
        }
        _ => push_line(lines, path, &scalar(value)),
    }
}

fn push_line(lines: &mut Vec<String>, path: &str, text: &str) {
    if path.is_empty() {
        lines.push(text.to_owned());
    } else {
        lines.push(format!("{path}: {text}"));
    }
}

fn is_scalar(value: &Value) -> bool {
    !matches!(value, Value::Object(_) | Value::Array(_))
}

fn is_empty_collection(value: &Value) -> bool {
    match value {
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

fn scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "-".to_owned(),
        other => other.to_string(),
    }
}

// ---------------------------------------------------------------------------
// YAML
// ---------------------------------------------------------------------------

/// Block-style YAML. Sequences under a mapping key are not indented, list
/// items that are mappings start on the `- ` line.
fn render_yaml(value: &Value, indent: usize, lines: &mut Vec<String>) {
    let pad = " ".repeat(indent);
    match value {
        Value::Object(map) if !map.is_empty() => {
            for (key, child) in map {
                let key = yaml_scalar(&Value::String(key.clone()));
                if is_scalar(child) || is_empty_collection(child) {
                    lines.push(format!("{pad}{key}: {}", yaml_scalar(child)));
                } else {
                    lines.push(format!("{pad}{key}:"));
                    let child_indent = if child.is_array() {
                        indent
                    } else {
                        indent + 2
                    };
                    render_yaml(child, child_indent, lines);
                }
            }
        }
        Value::Array(items) if !items.is_empty() => {
            for item in items {
                let mut item_lines = Vec::new();
                render_yaml(item, indent + 2, &mut item_lines);
                let mut item_lines = item_lines.into_iter();
                if let Some(first) = item_lines.next() {
                    lines.push(format!("{pad}- {}", first.trim_start()));
                }
                lines.extend(item_lines);
            }
        }
        _ => lines.push(format!("{pad}{}", yaml_scalar(value))),
    }
}

/// Strings stay plain only when YAML cannot read them as anything else;
/// otherwise they are double-quoted with JSON escaping, which YAML accepts.
fn yaml_scalar(value: &Value) -> String {
    match value {
        Value::Null => "null".to_owned(),
        Value::Object(_) => "{}".to_owned(),
        Value::Array(_) => "[]".to_owned(),
        Value::String(s) if is_plain_yaml(s) => s.clone(),
        other => other.to_string(),
    }
}

fn is_plain_yaml(s: &str) -> bool {
    const RESERVED: [&str; 9] = [
        "true", "false", "null", "yes", "no", "on", "off", "y", "n",
    ];

    let Some(first) = s.chars().next() else {
        return false;
    };
    first.is_ascii_alphanumeric()
        && s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '/'))
        && s.parse::<f64>().is_err()
        && !RESERVED.iter().any(|word| s.eq_ignore_ascii_case(word))
}

// ---------------------------------------------------------------------------
// Table
// ---------------------------------------------------------------------------

/// Columns for an array of objects, `None` for any other shape.
///
/// Columns follow the order in which keys first appear; nested values are
/// shown as compact JSON.
fn render_table(value: &Value) -> Option<String> {
    let Value::Array(items) = value else {
        return None;
    };
    let rows = items
        .iter()
        .map(Value::as_object)
        .collect::<Option<Vec<_>>>()?;
    if rows.is_empty() {
        return None;
    }

    let mut headers: Vec<&str> = Vec::new();
    for row in &rows {
        for key in row.keys() {
            if !headers.contains(&key.as_str()) {
                headers.push(key);
            }
        }
    }

    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|row| {
            headers
                .iter()
                .map(|header| match row.get(*header) {
                    None | Some(Value::Null) => String::new(),
                    Some(Value::String(s)) => s.clone(),
                    Some(other) => other.to_string(),
                })
                .collect()
        })
        .collect();

    let widths: Vec<usize> = headers
        .iter()
        .enumerate()
        .map(|(i, header)| {
            cells
                .iter()
                .map(|row| row[i].chars().count())
                .chain(std::iter::once(header.chars().count()))
                .max()
                .unwrap_or_default()
        })
        .collect();

    let line = |values: Vec<String>| {
        values
            .iter()
            .zip(&widths)
            .map(|(value, &width)| format!("{value:<width$}"))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_owned()
    };

    let mut lines = vec![
        line(headers.iter().map(|h| (*h).to_owned()).collect()),
        line(widths.iter().map(|w| "-".repeat(*w)).collect()),
    ];
    lines.extend(cells.into_iter().map(line));
    Some(lines.join("\n"))
}
