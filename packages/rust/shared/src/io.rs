//! JSON file helpers used at the pipeline boundary.
//!
//! Output is pretty-printed with two-space indentation and a trailing
//! newline, so identical values always produce identical bytes.

use std::path::Path;

use serde::Serialize;
use tracing::debug;

use crate::error::{LivingDocError, Result};

/// Read and parse a JSON file.
///
/// A missing or unreadable file is a [`LivingDocError::FileIo`]; content that
/// is not JSON is a [`LivingDocError::InvalidInput`].
pub fn read_json(path: &Path) -> Result<serde_json::Value> {
    let content = std::fs::read_to_string(path).map_err(|e| LivingDocError::io(path, e))?;

    let value = serde_json::from_str(&content).map_err(|e| {
        LivingDocError::invalid_input(format!("malformed JSON in '{}': {e}", path.display()))
    })?;

    debug!(path = %path.display(), bytes = content.len(), "read JSON file");
    Ok(value)
}

/// Serialize a value to the canonical on-disk JSON text.
pub fn to_json_string<T: Serialize>(data: &T) -> Result<String> {
    let mut json = serde_json::to_string_pretty(data)
        .map_err(|e| LivingDocError::invalid_input(format!("JSON serialization failed: {e}")))?;
    json.push('\n');
    Ok(json)
}

/// Write a value as JSON, creating parent directories as needed.
pub fn write_json<T: Serialize>(path: &Path, data: &T) -> Result<()> {
    let json = to_json_string(data)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| LivingDocError::io(parent, e))?;
    }

    std::fs::write(path, json).map_err(|e| LivingDocError::io(path, e))?;
    debug!(path = %path.display(), "wrote JSON file");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("living-doc-io-test-{}", uuid::Uuid::now_v7()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn write_then_read() {
        let dir = temp_dir();
        let path = dir.join("nested").join("out.json");
        let value = serde_json::json!({ "b": 1, "a": [true, null] });

        write_json(&path, &value).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.ends_with("}\n"));
        assert!(text.contains("  \"a\""));

        let back = read_json(&path).unwrap();
        assert_eq!(back, value);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = read_json(Path::new("/nonexistent/input.json")).unwrap_err();
        assert_eq!(err.exit_code(), 5);
    }

    #[test]
    fn malformed_json_is_invalid_input() {
        let dir = temp_dir();
        let path = dir.join("bad.json");
        std::fs::write(&path, "{invalid json").unwrap();

        let err = read_json(&path).unwrap_err();
        assert!(matches!(err, LivingDocError::InvalidInput { .. }));
        assert!(err.to_string().contains("malformed JSON"));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn serialization_is_stable() {
        let value = serde_json::json!({ "z": "last", "a": { "y": 2, "x": 1 } });
        assert_eq!(to_json_string(&value).unwrap(), to_json_string(&value).unwrap());
    }
}
