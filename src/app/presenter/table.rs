use crate::domain::model::{ResultTable, IP, RATING};
use serde_json::Value;

fn format_cell(column: &str, value: &Value) -> String {
    match (column, value.as_f64()) {
        (IP, Some(x)) => return format!("{:.1}", x),
        (RATING, Some(x)) => return format!("{:.2}", x),
        _ => {}
    }

    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) if n.is_f64() => {
            let x = n.as_f64().unwrap_or_default();
            if x.fract() == 0.0 {
                format!("{:.0}", x)
            } else {
                format!("{:.3}", x)
            }
        }
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Plain-text table: header, then one line per row. Numbers are right-aligned.
pub fn render_table(table: &ResultTable) -> String {
    let columns = table.columns();
    let cells: Vec<Vec<String>> = table
        .rows()
        .iter()
        .map(|row| {
            columns
                .iter()
                .zip(row)
                .map(|(column, value)| format_cell(column, value))
                .collect()
        })
        .collect();

    let numeric: Vec<bool> = (0..columns.len())
        .map(|i| table.rows().iter().all(|row| row[i].is_number()))
        .collect();

    let widths: Vec<usize> = columns
        .iter()
        .enumerate()
        .map(|(i, column)| {
            cells
                .iter()
                .map(|row| row[i].chars().count())
                .chain(std::iter::once(column.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let line = |values: Vec<&str>| -> String {
        values
            .iter()
            .enumerate()
            .map(|(i, v)| {
                if numeric[i] {
                    format!("{:>width$}", v, width = widths[i])
                } else {
                    format!("{:<width$}", v, width = widths[i])
                }
            })
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut out = vec![line(columns.iter().map(String::as_str).collect())];
    if cells.is_empty() {
        out.push("(no rows)".to_string());
    }
    for row in &cells {
        out.push(line(row.iter().map(String::as_str).collect()));
    }
    out.join("\n")
}
