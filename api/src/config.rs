use std::env;
use std::path::PathBuf;
use std::str::FromStr;

const DEFAULT_DATABASE_URL: &str = "sqlite:./storefront.db?mode=rwc";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub acquire_timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub port: u16,
    /// Optional JSON seed for the document store
    pub documents_path: Option<PathBuf>,
    pub environment: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the config from any key lookup; unset keys take their defaults
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let database = DatabaseConfig {
            url: lookup("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            max_connections: parse_or_default(
                &lookup,
                "DB_MAX_CONNECTIONS",
                DEFAULT_MAX_CONNECTIONS,
            ),
            acquire_timeout_secs: parse_or_default(
                &lookup,
                "DB_ACQUIRE_TIMEOUT_SECS",
                DEFAULT_ACQUIRE_TIMEOUT_SECS,
            ),
        };

        Self {
            database,
            port: parse_or_default(&lookup, "PORT", DEFAULT_PORT),
            documents_path: lookup("DOCUMENTS_PATH")
                .filter(|p| !p.trim().is_empty())
                .map(PathBuf::from),
            environment: lookup("ENVIRONMENT").unwrap_or_else(|| "development".to_string()),
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("0.0.0.0:{}", self.port)
    }
}

fn parse_or_default<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr + std::fmt::Display + Copy,
{
    match lookup(key) {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %raw, default = %default, "invalid config value, using default");
            default
        }),
    }
}

#[cfg(test)]
mod tests {
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
        assert_eq!(config.database.url, DEFAULT_DATABASE_URL);
        assert_eq!(config.database.max_connections, 5);
        assert_eq!(config.database.acquire_timeout_secs, 30);
        assert_eq!(config.port, 8080);
        assert_eq!(config.documents_path, None);
        assert_eq!(config.environment, "development");
        assert_eq!(config.bind_addr(), "0.0.0.0:8080");
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("DATABASE_URL", "sqlite::memory:"),
            ("PORT", "9000"),
            ("DB_MAX_CONNECTIONS", " 12 "),
            ("DB_ACQUIRE_TIMEOUT_SECS", "3"),
            ("DOCUMENTS_PATH", "/srv/documents.json"),
            ("ENVIRONMENT", "production"),
        ]);
        assert_eq!(config.database.url, "sqlite::memory:");
        assert_eq!(config.port, 9000);
        assert_eq!(config.database.max_connections, 12);
        assert_eq!(config.database.acquire_timeout_secs, 3);
        assert_eq!(
            config.documents_path,
            Some(PathBuf::from("/srv/documents.json"))
        );
        assert_eq!(config.environment, "production");
    }

    #[test]
    fn test_invalid_numbers_fall_back_to_defaults() {
        let config = config_from(&[("PORT", "eighty"), ("DB_MAX_CONNECTIONS", "-1")]);
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.database.max_connections, DEFAULT_MAX_CONNECTIONS);
    }

    #[test]
    fn test_blank_documents_path_is_ignored() {
        let config = config_from(&[("DOCUMENTS_PATH", "  ")]);
        assert_eq!(config.documents_path, None);
    }
}
