use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};

/// Read a JSON file and deserialise into a typed struct.
pub fn read_json<T: DeserializeOwned>(path: &str) -> Result<T, Box<dyn std::error::Error>> {
    let resolved = resolve_path(path)?;
    let contents = fs::read_to_string(&resolved)
        .map_err(|e| format!("Failed to read '{}': {}", resolved.display(), e))?;
    let value: T = serde_json::from_str(&contents)
        .map_err(|e| format!("Failed to parse '{}': {}", resolved.display(), e))?;
    Ok(value)
}

/// Read a whole text file (CSV rent rolls and the like).
pub fn read_text(path: &str) -> Result<String, Box<dyn std::error::Error>> {
    let resolved = resolve_path(path)?;
    Ok(fs::read_to_string(&resolved)
        .map_err(|e| format!("Failed to read '{}': {}", resolved.display(), e))?)
}

/// Absolute path to an existing regular file.
fn resolve_path(path: &str) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let p = Path::new(path);
    let resolved = if p.is_absolute() {
        p.to_path_buf()
    } else {
        std::env::current_dir()?.join(p)
    };

    if !resolved.exists() {
        return Err(format!("File not found: {}", resolved.display()).into());
    }
    if !resolved.is_file() {
        return Err(format!("Not a file: {}", resolved.display()).into());
    }

    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use deal_analyzer_core::deal::DealDraft;

    #[test]
    fn test_read_json_fragment() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("step.json");
        fs::write(&path, r#"{"propertyType":"retail","numberOfUnits":2}"#).unwrap();
        let draft: DealDraft = read_json(path.to_str().unwrap()).unwrap();
        assert_eq!(draft.number_of_units, Some(2));
    }

    #[test]
    fn test_missing_file() {
        let err = read_text("/definitely/not/here.csv").unwrap_err();
        assert!(err.to_string().starts_with("File not found"));
    }
}
