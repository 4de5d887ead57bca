use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Duration;

/// Placeholder JWT secrets that should never reach production.
pub const PLACEHOLDER_SECRETS: &[&str] = &["change-me-to-a-random-string", "dev-secret-change-me"];

#[derive(Debug, Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub db_path: PathBuf,
    pub jwt_secret: String,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
    pub category_writes_require_auth: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from any key lookup; `from_env` passes the process
    /// environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let host = var("NEWSROOM_HOST", "0.0.0.0");
        let port: u16 = var("NEWSROOM_PORT", "8000")
            .parse()
            .context("NEWSROOM_PORT must be a port number")?;
        let addr: SocketAddr = format!("{}:{}", host, port)
            .parse()
            .with_context(|| format!("invalid listen address {}:{}", host, port))?;

        let access_minutes: i64 = var("NEWSROOM_ACCESS_TOKEN_MINUTES", "5")
            .parse()
            .context("NEWSROOM_ACCESS_TOKEN_MINUTES must be an integer")?;
        let refresh_hours: i64 = var("NEWSROOM_REFRESH_TOKEN_HOURS", "24")
            .parse()
            .context("NEWSROOM_REFRESH_TOKEN_HOURS must be an integer")?;
        if access_minutes <= 0 || refresh_hours <= 0 {
            anyhow::bail!("token lifetimes must be positive");
        }

        let category_writes_require_auth =
            parse_bool(&var("NEWSROOM_CATEGORY_WRITES_REQUIRE_AUTH", "false"))
                .context("NEWSROOM_CATEGORY_WRITES_REQUIRE_AUTH must be true or false")?;

        Ok(Self {
            addr,
            db_path: var("NEWSROOM_DB_PATH", "newsroom.db").into(),
            jwt_secret: var("NEWSROOM_JWT_SECRET", "dev-secret-change-me"),
            access_ttl: Duration::minutes(access_minutes),
            refresh_ttl: Duration::hours(refresh_hours),
            category_writes_require_auth,
        })
    }

    pub fn uses_placeholder_secret(&self) -> bool {
        self.jwt_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&self.jwt_secret.as_str())
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(pairs: &[(&str, &str)]) -> Result<Config> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn defaults() {
        let cfg = config(&[]).unwrap();
        assert_eq!(cfg.addr, "0.0.0.0:8000".parse().unwrap());
        assert_eq!(cfg.db_path, PathBuf::from("newsroom.db"));
        assert_eq!(cfg.access_ttl, Duration::minutes(5));
        assert_eq!(cfg.refresh_ttl, Duration::hours(24));
        assert!(!cfg.category_writes_require_auth);
        assert!(cfg.uses_placeholder_secret());
    }

    #[test]
    fn overrides() {
        let cfg = config(&[
            ("NEWSROOM_HOST", "127.0.0.1"),
            ("NEWSROOM_PORT", "9100"),
            ("NEWSROOM_JWT_SECRET", "s3cret"),
            ("NEWSROOM_ACCESS_TOKEN_MINUTES", "15"),
            ("NEWSROOM_CATEGORY_WRITES_REQUIRE_AUTH", "yes"),
        ])
        .unwrap();
        assert_eq!(cfg.addr, "127.0.0.1:9100".parse().unwrap());
        assert_eq!(cfg.access_ttl, Duration::minutes(15));
        assert!(cfg.category_writes_require_auth);
        assert!(!cfg.uses_placeholder_secret());
    }

    #[test]
    fn rejects_garbage() {
        assert!(config(&[("NEWSROOM_PORT", "http")]).is_err());
        assert!(config(&[("NEWSROOM_ACCESS_TOKEN_MINUTES", "0")]).is_err());
        assert!(config(&[("NEWSROOM_CATEGORY_WRITES_REQUIRE_AUTH", "maybe")]).is_err());
    }
}
