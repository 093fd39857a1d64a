use anyhow::{Context, Result};
use std::env;
use std::net::{IpAddr, SocketAddr};

use crate::models::UserId;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub log_filter: String,
    /// Empty means any origin.
    pub cors_allowed_origins: Vec<String>,
    pub seed_sample_data: bool,
    pub default_user_id: UserId,
    pub default_instructor_id: UserId,
    pub max_page_size: i32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: IpAddr::from([0, 0, 0, 0]),
            port: 8081,
            log_filter: "course_platform=info,tower_http=info".into(),
            cors_allowed_origins: Vec::new(),
            seed_sample_data: true,
            default_user_id: 1,
            default_instructor_id: 1,
            max_page_size: 100,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup; unset keys keep their
    /// defaults, malformed ones are errors.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Config::default();

        let host = match lookup("SERVER_HOST") {
            Some(v) => v.parse().context("Failed to parse SERVER_HOST")?,
            None => defaults.host,
        };
        let port = match lookup("PORT") {
            Some(v) => v.parse().context("Failed to parse PORT")?,
            None => defaults.port,
        };
        let seed_sample_data = match lookup("SEED_SAMPLE_DATA") {
            Some(v) => parse_bool(&v).context("Failed to parse SEED_SAMPLE_DATA")?,
            None => defaults.seed_sample_data,
        };
        let default_user_id = match lookup("DEFAULT_USER_ID") {
            Some(v) => v.parse().context("Failed to parse DEFAULT_USER_ID")?,
            None => defaults.default_user_id,
        };
        let default_instructor_id = match lookup("DEFAULT_INSTRUCTOR_ID") {
            Some(v) => v.parse().context("Failed to parse DEFAULT_INSTRUCTOR_ID")?,
            None => defaults.default_instructor_id,
        };
        let max_page_size: i32 = match lookup("MAX_PAGE_SIZE") {
            Some(v) => v.parse().context("Failed to parse MAX_PAGE_SIZE")?,
            None => defaults.max_page_size,
        };
        if max_page_size < 1 {
            anyhow::bail!("MAX_PAGE_SIZE must be at least 1");
        }

        let cors_allowed_origins = lookup("CORS_ALLOWED_ORIGINS")
            .map(|v| {
                v.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();

        Ok(Config {
            host,
            port,
            log_filter: lookup("RUST_LOG").unwrap_or(defaults.log_filter),
            cors_allowed_origins,
            seed_sample_data,
            default_user_id,
            default_instructor_id,
            max_page_size,
        })
    }

    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

fn parse_bool(v: &str) -> Result<bool> {
    match v.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => anyhow::bail!("expected a boolean, got {:?}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(pairs: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|k| vars.get(k).cloned())
    }

    #[test]
    fn defaults_when_unset() {
        let cfg = load(&[]).unwrap();
        assert_eq!(cfg.addr().to_string(), "0.0.0.0:8081");
        assert!(cfg.seed_sample_data);
        assert!(cfg.cors_allowed_origins.is_empty());
        assert_eq!(cfg.max_page_size, 100);
    }

    #[test]
    fn reads_overrides() {
        let cfg = load(&[
            ("PORT", "9000"),
            ("SEED_SAMPLE_DATA", "off"),
            ("CORS_ALLOWED_ORIGINS", "http://localhost:5300, https://localhost:7164,"),
            ("DEFAULT_USER_ID", "42"),
            ("RUST_LOG", "debug"),
        ])
        .unwrap();
        assert_eq!(cfg.port, 9000);
        assert!(!cfg.seed_sample_data);
        assert_eq!(
            cfg.cors_allowed_origins,
            vec!["http://localhost:5300", "https://localhost:7164"]
        );
        assert_eq!(cfg.default_user_id, 42);
        assert_eq!(cfg.log_filter, "debug");
    }

    #[test]
    fn malformed_values_fail() {
        assert!(load(&[("PORT", "eighty")]).is_err());
        assert!(load(&[("SEED_SAMPLE_DATA", "maybe")]).is_err());
        assert!(load(&[("MAX_PAGE_SIZE", "0")]).is_err());
    }
}
