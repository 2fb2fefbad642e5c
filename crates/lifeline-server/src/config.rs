use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};

/// Placeholder JWT secrets that MUST NOT be used.
const PLACEHOLDER_SECRETS: &[&str] = &["change-me-to-a-random-string", "dev-secret-change-me"];

/// Server settings, read from `LIFELINE_*` environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub db_path: PathBuf,
    pub media_dir: PathBuf,
    pub jwt_secret: String,
    pub token_days: i64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let jwt_secret = lookup("LIFELINE_JWT_SECRET").unwrap_or_default();
        if jwt_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str()) {
            bail!("LIFELINE_JWT_SECRET is unset or still a placeholder");
        }

        let host = get("LIFELINE_HOST", "0.0.0.0");
        let port: u16 = get("LIFELINE_PORT", "8000")
            .parse()
            .context("LIFELINE_PORT must be a port number")?;
        let addr = format!("{}:{}", host, port)
            .parse()
            .with_context(|| format!("invalid bind address {}:{}", host, port))?;

        let token_days: i64 = get("LIFELINE_TOKEN_DAYS", "30")
            .parse()
            .context("LIFELINE_TOKEN_DAYS must be an integer")?;

        Ok(Self {
            addr,
            db_path: get("LIFELINE_DB_PATH", "lifeline.db").into(),
            media_dir: get("LIFELINE_MEDIA_DIR", "./media").into(),
            jwt_secret,
            token_days,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[("LIFELINE_JWT_SECRET", "a-real-secret")]).unwrap();
        assert_eq!(config.addr.port(), 8000);
        assert_eq!(config.db_path, PathBuf::from("lifeline.db"));
        assert_eq!(config.token_days, 30);
    }

    #[test]
    fn test_rejects_placeholder_secret() {
        assert!(load(&[]).is_err());
        assert!(load(&[("LIFELINE_JWT_SECRET", "dev-secret-change-me")]).is_err());
    }

    #[test]
    fn test_rejects_bad_port() {
        let result = load(&[
            ("LIFELINE_JWT_SECRET", "a-real-secret"),
            ("LIFELINE_PORT", "eighty"),
        ]);
        assert!(result.is_err());
    }
}
