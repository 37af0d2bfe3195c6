//! Read-only access to locally persisted preferences.

use std::path::Path;

use serde_json::{Map, Value};
use tracing::debug;

use crate::error::PreferenceError;

/// Key holding the display title of the item the upload was made for.
pub const TITLE_KEY: &str = "title";

/// Read access to a key-value preference store.
pub trait PreferenceRead: Send + Sync {
    fn get_string(&self, key: &str, default: &str) -> String;

    fn get_bool(&self, key: &str, default: bool) -> bool;
}

/// Preference store backed by a flat JSON object.
#[derive(Debug, Clone, Default)]
pub struct JsonKvStore {
    values: Map<String, Value>,
}

impl JsonKvStore {
    /// Load a store from `path`. A missing file yields an empty store.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, PreferenceError> {
        let path = path.as_ref();
        let shown = path.display().to_string();

        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %shown, "No preference file, using defaults");
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(PreferenceError::Io {
                    path: shown,
                    source,
                })
            }
        };

        let value: Value =
            serde_json::from_str(&contents).map_err(|source| PreferenceError::Parse {
                path: shown.clone(),
                source,
            })?;

        match value {
            Value::Object(values) => Ok(Self { values }),
            _ => Err(PreferenceError::NotAnObject { path: shown }),
        }
    }

    /// Set a value, replacing any previous one.
    #[must_use]
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.values.insert(key.to_string(), value.into());
        self
    }
}

impl PreferenceRead for JsonKvStore {
    fn get_string(&self, key: &str, default: &str) -> String {
        match self.values.get(key) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Null) | None => default.to_string(),
            Some(other) => other.to_string(),
        }
    }

    fn get_bool(&self, key: &str, default: bool) -> bool {
        match self.values.get(key) {
            Some(Value::Bool(b)) => *b,
            Some(Value::String(s)) => s.parse().unwrap_or(default),
            _ => default,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_missing_file_is_empty_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonKvStore::load(dir.path().join("absent.json")).unwrap();
        assert_eq!(store.get_string(TITLE_KEY, "none"), "none");
        assert!(store.get_bool("flag", true));
    }

    #[test]
    fn test_load_reads_values() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"title": "Tour Eiffel", "flag": false, "count": 3, "text_flag": "false"}}"#
        )
        .unwrap();

        let store = JsonKvStore::load(file.path()).unwrap();
        assert_eq!(store.get_string(TITLE_KEY, ""), "Tour Eiffel");
        assert_eq!(store.get_string("count", ""), "3");
        assert!(!store.get_bool("flag", true));
        assert!(!store.get_bool("text_flag", true));
        assert!(store.get_bool("count", true));
    }

    #[test]
    fn test_load_rejects_non_object() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[1, 2]").unwrap();

        let err = JsonKvStore::load(file.path()).unwrap_err();
        assert!(matches!(err, PreferenceError::NotAnObject { .. }));
    }

    #[test]
    fn test_load_rejects_invalid_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{not json").unwrap();

        let err = JsonKvStore::load(file.path()).unwrap_err();
        assert!(matches!(err, PreferenceError::Parse { .. }));
    }
}
