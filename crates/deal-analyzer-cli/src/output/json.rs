use serde_json::Value;
use std::io::{self, Write};

/// Pretty-print JSON to stdout. Decimals arrive as strings and are printed untouched.
pub fn print_json(value: &Value) {
    let stdout = io::stdout();
    if let Err(e) = write_json(stdout.lock(), value) {
        eprintln!("JSON output error: {}", e);
    }
}

fn write_json<W: Write>(mut out: W, value: &Value) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut out, value)?;
    writeln!(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decimal_strings_preserved() {
        let mut buf = Vec::new();
        write_json(&mut buf, &json!({"irr": "14.2500"})).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("\"14.2500\""));
        assert!(text.ends_with("}\n"));
    }
}
