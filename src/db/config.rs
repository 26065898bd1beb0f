//! Store configuration.

use std::env;
use std::path::PathBuf;

/// Storage backend configuration.
///
/// When both `mongo_uri` and `mongo_db` are set the document database is
/// probed first; the JSON-file store under `data_dir` is the fallback.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Document database connection string, if any.
    pub mongo_uri: Option<String>,

    /// Database name to open on the document database.
    pub mongo_db: Option<String>,

    /// Directory holding the JSON-file fallback collections.
    pub data_dir: PathBuf,

    /// Server selection timeout for the connectivity probe, in milliseconds.
    pub selection_timeout_ms: u64,
}

impl StoreConfig {
    /// Create configuration from environment variables.
    ///
    /// - `MONGODB_URI`: document database connection string (optional)
    /// - `MONGODB_DB`: database name (optional)
    /// - `DATA_DIR`: JSON fallback directory (default: `./data`)
    /// - `MONGODB_SELECTION_TIMEOUT_MS`: probe timeout (default: 2000)
    pub fn from_env() -> Self {
        Self {
            mongo_uri: env::var("MONGODB_URI").ok(),
            mongo_db: env::var("MONGODB_DB").ok(),
            data_dir: env::var("DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./data")),
            selection_timeout_ms: env::var("MONGODB_SELECTION_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(2000),
        }
    }

    /// File-store-only configuration for development and tests.
    pub fn development() -> Self {
        Self {
            mongo_uri: None,
            mongo_db: None,
            data_dir: PathBuf::from("./data"),
            selection_timeout_ms: 2000,
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::development()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn from_env_reads_overrides() {
        unsafe {
            env::set_var("MONGODB_URI", "mongodb://localhost:27017");
            env::set_var("MONGODB_DB", "classtrack_test");
            env::set_var("DATA_DIR", "/tmp/classtrack-data");
            env::set_var("MONGODB_SELECTION_TIMEOUT_MS", "500");
        }

        let config = StoreConfig::from_env();
        assert_eq!(config.mongo_uri.as_deref(), Some("mongodb://localhost:27017"));
        assert_eq!(config.mongo_db.as_deref(), Some("classtrack_test"));
        assert_eq!(config.data_dir, PathBuf::from("/tmp/classtrack-data"));
        assert_eq!(config.selection_timeout_ms, 500);

        unsafe {
            env::remove_var("MONGODB_URI");
            env::remove_var("MONGODB_DB");
            env::remove_var("DATA_DIR");
            env::remove_var("MONGODB_SELECTION_TIMEOUT_MS");
        }
    }

    #[test]
    #[serial]
    fn from_env_falls_back_to_defaults() {
        unsafe {
            env::remove_var("MONGODB_URI");
            env::remove_var("MONGODB_DB");
            env::remove_var("DATA_DIR");
            env::set_var("MONGODB_SELECTION_TIMEOUT_MS", "not-a-number");
        }

        let config = StoreConfig::from_env();
        assert!(config.mongo_uri.is_none());
        assert!(config.mongo_db.is_none());
        assert_eq!(config.data_dir, PathBuf::from("./data"));
        assert_eq!(config.selection_timeout_ms, 2000);

        unsafe {
            env::remove_var("MONGODB_SELECTION_TIMEOUT_MS");
        }
    }
}
