use crate::error::{IndexerError, IndexerResult};
use std::env;
use std::str::FromStr;
use std::time::Duration;

pub struct Config {
    pub mongo_uri: String,
    pub db_name: String,
    pub collection: String,
    pub tzkt_url: String,
    pub page_size: usize,
    /// Upper bound on pages requested by one fetch; 0 disables the bound.
    pub max_pages: usize,
    pub http_timeout: Duration,
    pub sync_cron: String,
    pub sync_timeout: Duration,
    pub api_addr: String,
    pub default_limit: i64,
    pub max_limit: i64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mongo_uri: "mongodb://localhost:27017".to_string(),
            db_name: "tezos".to_string(),
            collection: "delegations".to_string(),
            tzkt_url: "https://api.tzkt.io/v1/operations/delegations".to_string(),
            page_size: 1000,
            max_pages: 1000,
            http_timeout: Duration::from_secs(30),
            sync_cron: "0 0 * * * *".to_string(),
            sync_timeout: Duration::from_secs(600),
            api_addr: "0.0.0.0:8080".to_string(),
            default_limit: 10,
            max_limit: 100,
        }
    }
}

impl Config {
    pub fn from_env() -> IndexerResult<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> IndexerResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let config = Self {
            mongo_uri: lookup("MONGO_URI")
                .ok_or_else(|| IndexerError::Config("MONGO_URI must be set".to_string()))?,
            db_name: lookup("DB_NAME").unwrap_or(defaults.db_name),
            collection: lookup("DELEGATIONS_COLLECTION").unwrap_or(defaults.collection),
            tzkt_url: lookup("TZKT_URL").unwrap_or(defaults.tzkt_url),
            page_size: parse_or(&lookup, "TZKT_PAGE_SIZE", defaults.page_size)?,
            max_pages: parse_or(&lookup, "TZKT_MAX_PAGES", defaults.max_pages)?,
            http_timeout: Duration::from_secs(parse_or(
                &lookup,
                "TZKT_TIMEOUT_SECS",
                defaults.http_timeout.as_secs(),
            )?),
            sync_cron: lookup("SYNC_CRON").unwrap_or(defaults.sync_cron),
            sync_timeout: Duration::from_secs(parse_or(
                &lookup,
                "SYNC_TIMEOUT_SECS",
                defaults.sync_timeout.as_secs(),
            )?),
            api_addr: lookup("API_ADDR").unwrap_or(defaults.api_addr),
            default_limit: parse_or(&lookup, "API_DEFAULT_LIMIT", defaults.default_limit)?,
            max_limit: parse_or(&lookup, "API_MAX_LIMIT", defaults.max_limit)?,
        };

        if config.max_limit < 0 || config.default_limit < 0 {
            return Err(IndexerError::Config(
                "API limits must not be negative".to_string(),
            ));
        }
        if config.default_limit > config.max_limit {
            return Err(IndexerError::Config(format!(
                "API_DEFAULT_LIMIT ({}) exceeds API_MAX_LIMIT ({})",
                config.default_limit, config.max_limit
            )));
        }

        Ok(config)
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> IndexerResult<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| IndexerError::Config(format!("{} has invalid value {:?}", key, raw))),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn applies_defaults() {
        let config = Config::from_lookup(lookup_from(&[("MONGO_URI", "mongodb://db:27017")]))
            .unwrap();
        assert_eq!(config.mongo_uri, "mongodb://db:27017");
        assert_eq!(config.collection, "delegations");
        assert_eq!(config.page_size, 1000);
        assert_eq!(config.sync_cron, "0 0 * * * *");
        assert_eq!(config.default_limit, 10);
        assert_eq!(config.max_limit, 100);
    }

    #[test]
    fn requires_mongo_uri() {
        let err = Config::from_lookup(lookup_from(&[])).err().unwrap();
        assert!(matches!(err, IndexerError::Config(_)));
    }

    #[test]
    fn rejects_malformed_numbers() {
        let err = Config::from_lookup(lookup_from(&[
            ("MONGO_URI", "mongodb://db:27017"),
            ("TZKT_PAGE_SIZE", "lots"),
        ]))
        .err()
        .unwrap();
        assert!(err.to_string().contains("TZKT_PAGE_SIZE"));
    }

    #[test]
    fn rejects_default_limit_above_max() {
        let result = Config::from_lookup(lookup_from(&[
            ("MONGO_URI", "mongodb://db:27017"),
            ("API_DEFAULT_LIMIT", "50"),
            ("API_MAX_LIMIT", "20"),
        ]));
        assert!(result.is_err());
    }

    #[test]
    fn reads_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            ("MONGO_URI", "mongodb://db:27017"),
            ("TZKT_PAGE_SIZE", "250"),
            ("TZKT_TIMEOUT_SECS", "5"),
            ("SYNC_CRON", "0 */5 * * * *"),
        ]))
        .unwrap();
        assert_eq!(config.page_size, 250);
        assert_eq!(config.http_timeout, Duration::from_secs(5));
        assert_eq!(config.sync_cron, "0 */5 * * * *");
    }
}
