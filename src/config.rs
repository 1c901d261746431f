use crate::source::{DEFAULT_FETCH_ENDPOINT, DEFAULT_FETCH_TIMEOUT};
use crate::splitter::DEFAULT_CHUNK_SIZE;
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

/// Used when `DATA_DIR` is not set
pub const DEFAULT_DATA_DIR: &str = "/tmp/teamsgpt";

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

/// Settings read from the environment
#[derive(Clone)]
pub struct AppConfig {
    /// Secret app tokens are signed with
    pub app_secret: Option<String>,
    pub data_dir: PathBuf,
    pub fetch_endpoint: String,
    pub fetch_timeout: Duration,
    pub chunk_size: usize,
    pub keep_separator: bool,
}

impl AppConfig {
    /// Build config from environment variables (call `load_dotenv()` first).
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from any key lookup; empty values count as unset
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        Self {
            app_secret: get("APP_SECRET"),
            data_dir: get("DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR)),
            fetch_endpoint: get("RAGCLARIFY_FETCH_ENDPOINT")
                .unwrap_or_else(|| DEFAULT_FETCH_ENDPOINT.to_string()),
            fetch_timeout: Duration::from_secs(parse_or(
                "RAGCLARIFY_FETCH_TIMEOUT_SECS",
                get("RAGCLARIFY_FETCH_TIMEOUT_SECS"),
                DEFAULT_FETCH_TIMEOUT.as_secs(),
            )),
            chunk_size: parse_or(
                "RAGCLARIFY_CHUNK_SIZE",
                get("RAGCLARIFY_CHUNK_SIZE"),
                DEFAULT_CHUNK_SIZE,
            ),
            keep_separator: get("RAGCLARIFY_KEEP_SEPARATOR")
                .and_then(|value| {
                    let parsed = parse_bool(&value);
                    if parsed.is_none() {
                        warn!(key = "RAGCLARIFY_KEEP_SEPARATOR", %value, "Ignoring invalid boolean");
                    }
                    parsed
                })
                .unwrap_or(true),
        }
    }

    /// Data directory, or a subdirectory of it, created if missing
    pub fn data_dir(&self, subpath: Option<&str>) -> std::io::Result<PathBuf> {
        let dir = match subpath {
            Some(sub) => self.data_dir.join(sub),
            None => self.data_dir.clone(),
        };
        std::fs::create_dir_all(&dir)?;
        Ok(dir)
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("app_secret", &self.app_secret.as_ref().map(|_| "<redacted>"))
            .field("data_dir", &self.data_dir)
            .field("fetch_endpoint", &self.fetch_endpoint)
            .field("fetch_timeout", &self.fetch_timeout)
            .field("chunk_size", &self.chunk_size)
            .field("keep_separator", &self.keep_separator)
            .finish()
    }
}

fn parse_or<T: std::str::FromStr>(key: &str, value: Option<String>, default: T) -> T {
    match value {
        Some(value) => match value.trim().parse() {
            Ok(parsed) => parsed,
            Err(_) => {
                warn!(key, %value, "Ignoring invalid number");
                default
            }
        },
        None => default,
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod config_tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> AppConfig {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]);
        assert_eq!(config.app_secret, None);
        assert_eq!(config.data_dir, PathBuf::from("/tmp/teamsgpt"));
        assert_eq!(config.fetch_endpoint, "https://r.jina.ai");
        assert_eq!(config.fetch_timeout, Duration::from_secs(60));
        assert_eq!(config.chunk_size, 4096);
        assert!(config.keep_separator);
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("APP_SECRET", "s3cret"),
            ("DATA_DIR", "/srv/data"),
            ("RAGCLARIFY_FETCH_ENDPOINT", "http://localhost:3000"),
            ("RAGCLARIFY_FETCH_TIMEOUT_SECS", "5"),
            ("RAGCLARIFY_CHUNK_SIZE", "1024"),
            ("RAGCLARIFY_KEEP_SEPARATOR", "off"),
        ]);
        assert_eq!(config.app_secret.as_deref(), Some("s3cret"));
        assert_eq!(config.data_dir, PathBuf::from("/srv/data"));
        assert_eq!(config.fetch_endpoint, "http://localhost:3000");
        assert_eq!(config.fetch_timeout, Duration::from_secs(5));
        assert_eq!(config.chunk_size, 1024);
        assert!(!config.keep_separator);
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let config = config_from(&[
            ("APP_SECRET", "  "),
            ("RAGCLARIFY_CHUNK_SIZE", "big"),
            ("RAGCLARIFY_KEEP_SEPARATOR", "maybe"),
        ]);
        assert_eq!(config.app_secret, None);
        assert_eq!(config.chunk_size, 4096);
        assert!(config.keep_separator);
    }

    #[test]
    fn test_data_dir_created() {
        let root = tempfile::tempdir().unwrap();
        let config = config_from(&[("DATA_DIR", root.path().to_str().unwrap())]);

        let dir = config.data_dir(Some("ragclarify")).unwrap();
        assert!(dir.is_dir());
        assert_eq!(dir, root.path().join("ragclarify"));
    }

    #[test]
    fn test_debug_redacts_secret() {
        let config = config_from(&[("APP_SECRET", "s3cret")]);
        assert!(!format!("{:?}", config).contains("s3cret"));
    }
}
