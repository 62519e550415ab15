use serde_json::Value;

/// Headline field per command, most specific first.
const PRIORITY_KEYS: [&str; 7] = [
    "grade",
    "irr",
    "previewIrr",
    "baseCaseValue",
    "goingInCapRate",
    "furthestStep",
    "units",
];

/// Print just the headline value.
///
/// Looks through the envelope's `result` and then one level of nested
/// objects (e.g. `financialMetrics`) for a priority key before falling
/// back to the first field.
pub fn print_minimal(value: &Value) {
    println!("{}", minimal_line(value));
}

fn minimal_line(value: &Value) -> String {
    let result_obj = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    let Value::Object(map) = result_obj else {
        return format_minimal(result_obj);
    };

    let nested = map.values().filter_map(|v| v.as_object());
    for scope in std::iter::once(map).chain(nested) {
        for key in PRIORITY_KEYS {
            if let Some(val) = scope.get(key).filter(|v| !v.is_null()) {
                return format_minimal(val);
            }
        }
    }

    match map.iter().next() {
        Some((key, val)) => format!("{}: {}", key, format_minimal(val)),
        None => String::new(),
    }
}

fn format_minimal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
