use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

/// Format output as tables using the tabled crate.
///
/// Grids render as a matrix, nested metric objects get their own table, and
/// everything else is a Field/Value listing.
pub fn print_table(value: &Value) {
    match value {
        Value::Object(map) => match map.get("result") {
            Some(result) => {
                print_section(None, result);
                print_envelope_notes(map);
            }
            None => print_section(None, value),
        },
        Value::Array(arr) => print_array_table(arr),
        _ => println!("{}", value),
    }
}

fn print_section(title: Option<&str>, value: &Value) {
    let Value::Object(map) = value else {
        println!("{}", format_value(value));
        return;
    };
    if let Some(title) = title {
        println!("\n{title}");
    }
    if map.contains_key("matrix") {
        println!("{}", grid_table(map));
        return;
    }

    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    let mut nested = Vec::new();
    let mut has_fields = false;
    for (key, val) in map {
        match val {
            Value::Object(_) => nested.push((key, val)),
            Value::Array(items) if items.first().is_some_and(Value::is_object) => nested.push((key, val)),
            _ => {
                builder.push_record([key.as_str(), &format_value(val)]);
                has_fields = true;
            }
        }
    }
    if has_fields {
        println!("{}", Table::from(builder));
    }
    for (key, val) in nested {
        match val {
            Value::Array(items) => {
                println!("\n{key}");
                print_array_table(items);
            }
            _ => print_section(Some(key), val),
        }
    }
}

/// Rows are variable 1 (price), columns variable 2 (rent).
fn grid_table(grid: &Map<String, Value>) -> Table {
    let empty = Vec::new();
    let rows = grid.get("variable1Values").and_then(Value::as_array).unwrap_or(&empty);
    let cols = grid.get("variable2Values").and_then(Value::as_array).unwrap_or(&empty);
    let matrix = grid.get("matrix").and_then(Value::as_array).unwrap_or(&empty);
    let corner = format!(
        "{} \\ {}",
        grid.get("variable1Name").map(format_value).unwrap_or_default(),
        grid.get("variable2Name").map(format_value).unwrap_or_default()
    );

    let mut builder = Builder::default();
    let mut header = vec![corner];
    header.extend(cols.iter().map(format_value));
    builder.push_record(header);
    for (row_value, row) in rows.iter().zip(matrix) {
        let mut record = vec![format_value(row_value)];
        if let Value::Array(cells) = row {
            record.extend(cells.iter().map(format_value));
        }
        builder.push_record(record);
    }
    Table::from(builder)
}

fn print_envelope_notes(envelope: &Map<String, Value>) {
    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings.iter().filter_map(Value::as_str) {
                println!("  - {}", w);
            }
        }
    }
    if let Some(Value::String(meth)) = envelope.get("methodology") {
        println!("\nMethodology: {}", meth);
    }
}

fn print_array_table(arr: &[Value]) {
    if arr.is_empty() {
        println!("(empty)");
        return;
    }

    if let Some(Value::Object(first)) = arr.first() {
        let headers: Vec<String> = first.keys().cloned().collect();
        let mut builder = Builder::default();
        builder.push_record(&headers);
        for item in arr {
            if let Value::Object(map) = item {
                let row: Vec<String> = headers
                    .iter()
                    .map(|h| map.get(h.as_str()).map(format_value).unwrap_or_default())
                    .collect();
                builder.push_record(row);
            }
        }
        println!("{}", Table::from(builder));
    } else {
        for item in arr {
            println!("{}", format_value(item));
        }
    }
}

fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "-".to_string(),
        Value::Array(arr) => arr.iter().map(format_value).collect::<Vec<_>>().join(", "),
        Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}
