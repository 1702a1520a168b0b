//! Process configuration read from the environment.

use std::net::SocketAddr;

use anyhow::{Context, anyhow};

use boardwise_observability::LogFormat;

const DEV_JWT_SECRET: &str = "dev-secret";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub bind_addr: SocketAddr,
    pub jwt_secret: String,
    /// Answer 404 for both unknown and inaccessible resources.
    pub conceal_resource_existence: bool,
    pub log_format: LogFormat,
    pub database_url: Option<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            jwt_secret: DEV_JWT_SECRET.to_string(),
            conceal_resource_existence: true,
            log_format: LogFormat::Json,
            database_url: None,
        }
    }
}

impl ApiConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup; unset keys keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let mut config = Self::default();

        if let Some(addr) = lookup("BOARDWISE_BIND_ADDR") {
            config.bind_addr = addr
                .parse()
                .with_context(|| format!("BOARDWISE_BIND_ADDR is not a socket address: {addr}"))?;
        }
        if let Some(secret) = lookup("JWT_SECRET") {
            if secret.is_empty() {
                return Err(anyhow!("JWT_SECRET must not be empty"));
            }
            config.jwt_secret = secret;
        }
        if let Some(flag) = lookup("BOARDWISE_CONCEAL_RESOURCE_EXISTENCE") {
            config.conceal_resource_existence = parse_bool(&flag).context("BOARDWISE_CONCEAL_RESOURCE_EXISTENCE")?;
        }
        if let Some(format) = lookup("BOARDWISE_LOG_FORMAT") {
            config.log_format = format
                .parse()
                .map_err(|e: String| anyhow!("BOARDWISE_LOG_FORMAT: {e}"))?;
        }
        config.database_url = lookup("DATABASE_URL").filter(|url| !url.is_empty());

        Ok(config)
    }

    pub fn uses_dev_secret(&self) -> bool {
        self.jwt_secret == DEV_JWT_SECRET
    }
}

fn parse_bool(value: &str) -> anyhow::Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        other => Err(anyhow!("expected true or false, got '{other}'")),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let config = ApiConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, ApiConfig::default());
        assert!(config.uses_dev_secret());
        assert!(config.conceal_resource_existence);
    }

    #[test]
    fn reads_every_key() {
        let config = ApiConfig::from_lookup(lookup(&[
            ("BOARDWISE_BIND_ADDR", "127.0.0.1:9000"),
            ("JWT_SECRET", "s3cret"),
            ("BOARDWISE_CONCEAL_RESOURCE_EXISTENCE", "false"),
            ("BOARDWISE_LOG_FORMAT", "pretty"),
            ("DATABASE_URL", "postgres://localhost/boardwise"),
        ]))
        .unwrap();

        assert_eq!(config.bind_addr, "127.0.0.1:9000".parse().unwrap());
        assert_eq!(config.jwt_secret, "s3cret");
        assert!(!config.uses_dev_secret());
        assert!(!config.conceal_resource_existence);
        assert_eq!(config.log_format, LogFormat::Pretty);
        assert_eq!(
            config.database_url.as_deref(),
            Some("postgres://localhost/boardwise")
        );
    }

    #[test]
    fn invalid_values_fail() {
        assert!(ApiConfig::from_lookup(lookup(&[("BOARDWISE_BIND_ADDR", "nowhere")])).is_err());
        assert!(ApiConfig::from_lookup(lookup(&[("JWT_SECRET", "")])).is_err());
        assert!(
            ApiConfig::from_lookup(lookup(&[("BOARDWISE_CONCEAL_RESOURCE_EXISTENCE", "maybe")]))
                .is_err()
        );
        assert!(ApiConfig::from_lookup(lookup(&[("BOARDWISE_LOG_FORMAT", "xml")])).is_err());
    }
}
