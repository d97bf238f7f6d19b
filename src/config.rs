use std::net::SocketAddr;

use anyhow::Context;

use crate::records::pagination::{clamp_page_size, DEFAULT_PAGE_SIZE};

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// `None` selects the in-memory record store.
    pub database: Option<DatabaseConfig>,
    pub host: String,
    pub port: u16,
    pub page_size: u32,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary variable source.
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let database = get("DATABASE_URL")
            .filter(|v| !v.trim().is_empty())
            .map(|url| DatabaseConfig {
                url,
                max_connections: get("DATABASE_MAX_CONNECTIONS")
                    .and_then(|v| v.parse::<u32>().ok())
                    .unwrap_or(10),
            });
        let port = match get("APP_PORT") {
            Some(v) => v.parse::<u16>().with_context(|| format!("APP_PORT={v}"))?,
            None => 8080,
        };
        let page_size = get("RECORDS_PAGE_SIZE")
            .and_then(|v| v.parse::<u32>().ok())
            .map(clamp_page_size)
            .unwrap_or(DEFAULT_PAGE_SIZE);

        Ok(Self {
            database,
            host: get("APP_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port,
            page_size,
        })
    }

    pub fn listen_addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid listen address {}:{}", self.host, self.port))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> anyhow::Result<AppConfig> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|k| map.get(k).cloned())
    }

    #[test]
    fn defaults_without_env() {
        let cfg = config(&[]).unwrap();
        assert!(cfg.database.is_none());
        assert_eq!(cfg.host, "0.0.0.0");
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.page_size, DEFAULT_PAGE_SIZE);
        assert_eq!(cfg.listen_addr().unwrap().port(), 8080);
    }

    #[test]
    fn reads_database_and_clamps_page_size() {
        let cfg = config(&[
            ("DATABASE_URL", "postgres://u:p@localhost/records"),
            ("DATABASE_MAX_CONNECTIONS", "4"),
            ("RECORDS_PAGE_SIZE", "5000"),
            ("APP_PORT", "9090"),
        ])
        .unwrap();
        let db = cfg.database.unwrap();
        assert_eq!(db.url, "postgres://u:p@localhost/records");
        assert_eq!(db.max_connections, 4);
        assert_eq!(cfg.page_size, 100);
        assert_eq!(cfg.port, 9090);
    }

    #[test]
    fn rejects_bad_port() {
        assert!(config(&[("APP_PORT", "http")]).is_err());
    }
}
