//! Terminal output for records, schema and session details

use colored::Colorize;
use prettytable::{format, Cell, Row, Table};
use serde_json::Value;

use crate::store::{AgentRecord, DbRecord, DocRecord, SessionState, UploadedDocument};

pub fn print_agent(record: &AgentRecord) {
    println!("{}", record.response);
}

pub fn print_doc(record: &DocRecord) {
    println!("{}", record.response);
}

/// Answer first, then the generated SQL and the raw result.
pub fn print_db(record: &DbRecord) {
    println!("{}", record.natural_language_response);
    if let Some(sql) = record.sql_query.as_deref().filter(|s| !s.trim().is_empty()) {
        println!("\n{} {}", "SQL:".bold(), sql.cyan());
    }
    match &record.raw_response {
        None | Some(Value::Null) => {}
        Some(raw) => match result_table(raw) {
            Some(table) => {
                println!();
                table.printstd();
            }
            None => println!("{} {}", "Raw:".bold(), value_text(raw).dimmed()),
        },
    }
}

pub fn print_schema(schema: &Value) {
    match schema {
        Value::String(text) => println!("{}", text),
        other => match result_table(other) {
            Some(table) => table.printstd(),
            None => println!(
                "{}",
                serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string())
            ),
        },
    }
}

pub fn print_uploaded(docs: &[UploadedDocument]) {
    if docs.is_empty() {
        println!("{}", "No documents uploaded in this session.".yellow());
        return;
    }

    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_BORDERS_ONLY);
    table.add_row(prettytable::row![
        "Filename".bold(),
        "Role".bold(),
        "Uploaded".bold()
    ]);
    for doc in docs {
        table.add_row(prettytable::row![
            doc.filename.cyan(),
            doc.role.as_deref().unwrap_or("-"),
            doc.uploaded_at.as_deref().unwrap_or("-")
        ]);
    }
    table.printstd();
}

/// Session summary. Claims are shown as decoded, never verified.
pub fn print_session(session: &SessionState) {
    if !session.is_authenticated() {
        println!("{}", "Not logged in.".yellow());
        return;
    }

    let user = session.current_user();
    let id = user
        .and_then(|claims| claims.user_id())
        .unwrap_or_else(|| "-".to_string());
    let expires = user
        .and_then(|claims| claims.expires_at())
        .map(|at| at.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| "never".to_string());

    println!("User:    {}", id.cyan());
    println!("Role:    {}", session.role().unwrap_or("-").green());
    println!("Expires: {}", expires);
}

/// Build a table from a tabular JSON result.
///
/// Accepts `{"columns": [...], "rows": [[...]]}`, an array of objects, or an
/// array of arrays. Anything else yields `None`.
pub fn result_table(value: &Value) -> Option<Table> {
    let (headers, rows): (Vec<String>, Vec<Vec<String>>) = match value {
        Value::Object(map) => {
            let columns = map.get("columns")?.as_array()?;
            let rows = map.get("rows")?.as_array()?;
            let headers = columns.iter().map(value_text).collect();
            let rows = rows
                .iter()
                .map(|row| match row {
                    Value::Array(cells) => cells.iter().map(value_text).collect(),
                    other => vec![value_text(other)],
                })
                .collect();
            (headers, rows)
        }
        Value::Array(items) if !items.is_empty() && items.iter().all(Value::is_object) => {
            let mut headers: Vec<String> = Vec::new();
            for item in items {
                for key in item.as_object()?.keys() {
                    if !headers.contains(key) {
                        headers.push(key.clone());
                    }
                }
            }
            let rows = items
                .iter()
                .map(|item| {
                    headers
                        .iter()
                        .map(|h| item.get(h).map(value_text).unwrap_or_default())
                        .collect()
                })
                .collect();
            (headers, rows)
        }
        Value::Array(items) if !items.is_empty() && items.iter().all(Value::is_array) => {
            let rows = items
                .iter()
                .filter_map(Value::as_array)
                .map(|cells| cells.iter().map(value_text).collect())
                .collect();
            (Vec::new(), rows)
        }
        _ => return None,
    };

    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_BORDERS_ONLY);
    if !headers.is_empty() {
        table.set_titles(Row::new(
            headers.iter().map(|h| Cell::new(h).style_spec("b")).collect(),
        ));
    }
    for row in rows {
        table.add_row(Row::new(row.iter().map(|c| Cell::new(c)).collect()));
    }
    Some(table)
}

/// Strings unquoted, null as empty, everything else as compact JSON.
fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
