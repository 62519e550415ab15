use serde_json::{Map, Value};
use std::io::{self, Write};

/// Write output as CSV to stdout.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let _ = write_csv(stdout.lock(), value);
}

fn write_csv<W: Write>(out: W, value: &Value) -> csv::Result<()> {
    let mut wtr = csv::WriterBuilder::new().flexible(true).from_writer(out);
    let body = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    match body {
        Value::Object(map) if map.contains_key("matrix") => write_grid(&mut wtr, map)?,
        Value::Object(map) => {
            wtr.write_record(["field", "value"])?;
            write_fields(&mut wtr, "", map)?;
        }
        Value::Array(arr) => write_array(&mut wtr, arr)?,
        _ => wtr.write_record([format_csv_value(body)])?,
    }
    wtr.flush()?;
    Ok(())
}

/// Nested objects flatten to dotted field names, e.g. `financialMetrics.irr`.
fn write_fields<W: Write>(wtr: &mut csv::Writer<W>, prefix: &str, map: &Map<String, Value>) -> csv::Result<()> {
    for (key, val) in map {
        let name = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        match val {
            Value::Object(inner) => write_fields(wtr, &name, inner)?,
            _ => wtr.write_record([name.as_str(), &format_csv_value(val)])?,
        }
    }
    Ok(())
}

fn write_grid<W: Write>(wtr: &mut csv::Writer<W>, grid: &Map<String, Value>) -> csv::Result<()> {
    let empty = Vec::new();
    let rows = grid.get("variable1Values").and_then(Value::as_array).unwrap_or(&empty);
    let cols = grid.get("variable2Values").and_then(Value::as_array).unwrap_or(&empty);
    let matrix = grid.get("matrix").and_then(Value::as_array).unwrap_or(&empty);

    let mut header = vec![grid.get("variable1Name").map(format_csv_value).unwrap_or_default()];
    header.extend(cols.iter().map(format_csv_value));
    wtr.write_record(&header)?;
    for (row_value, row) in rows.iter().zip(matrix) {
        let mut record = vec![format_csv_value(row_value)];
        if let Value::Array(cells) = row {
            record.extend(cells.iter().map(format_csv_value));
        }
        wtr.write_record(&record)?;
    }
    Ok(())
}

fn write_array<W: Write>(wtr: &mut csv::Writer<W>, arr: &[Value]) -> csv::Result<()> {
    if let Some(Value::Object(first)) = arr.first() {
        let headers: Vec<&str> = first.keys().map(|k| k.as_str()).collect();
        wtr.write_record(&headers)?;
        for item in arr {
            if let Value::Object(map) = item {
                let row: Vec<String> = headers
                    .iter()
                    .map(|h| map.get(*h).map(format_csv_value).unwrap_or_default())
                    .collect();
                wtr.write_record(&row)?;
            }
        }
    } else {
        for item in arr {
            wtr.write_record([format_csv_value(item)])?;
        }
    }
    Ok(())
}

fn format_csv_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn render(value: &Value) -> String {
        let mut buf = Vec::new();
        write_csv(&mut buf, value).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_nested_fields_flatten() {
        let v = json!({"result": {"financialMetrics": {"irr": "12.5"}, "dealInput": {"purchasePrice": "100"}}});
        let out = render(&v);
        assert!(out.contains("financialMetrics.irr,12.5"));
        assert!(out.contains("dealInput.purchasePrice,100"));
    }

    #[test]
    fn test_grid_rows() {
        let v = json!({"result": {
            "variable1Name": "Price Change (%)",
            "variable1Values": ["-5", "0"],
            "variable2Values": ["0", "5"],
            "matrix": [["1", "2"], ["3", "4"]],
        }});
        let out = render(&v);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "Price Change (%),0,5");
        assert_eq!(lines[1], "-5,1,2");
        assert_eq!(lines[2], "0,3,4");
    }
}
