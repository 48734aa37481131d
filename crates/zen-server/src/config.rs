use std::path::PathBuf;

use anyhow::{Context, Result, bail};

/// Placeholder secrets that MUST NOT be used.
const PLACEHOLDER_SECRETS: &[&str] = &[
    "zen_social_secret",
    "change-me-to-a-random-string",
    "dev-secret-change-me",
];

const MIN_SECRET_BYTES: usize = 32;

pub struct Config {
    pub jwt_secret: String,
    pub db_path: PathBuf,
    pub host: String,
    pub port: u16,
    pub token_ttl_hours: i64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from any key lookup. Refuses to start without a real signing key.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let jwt_secret = lookup("ZEN_JWT_SECRET").unwrap_or_default();
        if jwt_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str()) {
            bail!("ZEN_JWT_SECRET is unset or still a placeholder");
        }
        if jwt_secret.len() < MIN_SECRET_BYTES {
            bail!("ZEN_JWT_SECRET must be at least {} bytes", MIN_SECRET_BYTES);
        }

        let db_path = lookup("ZEN_DB_PATH").unwrap_or_else(|| "zen_social.db".into()).into();
        let host = lookup("ZEN_HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port = lookup("ZEN_PORT")
            .unwrap_or_else(|| "3000".into())
            .parse()
            .context("ZEN_PORT must be a port number")?;
        let token_ttl_hours: i64 = lookup("ZEN_TOKEN_TTL_HOURS")
            .unwrap_or_else(|| zen_api::token::DEFAULT_TTL_HOURS.to_string())
            .parse()
            .context("ZEN_TOKEN_TTL_HOURS must be a whole number of hours")?;
        if token_ttl_hours <= 0 {
            bail!("ZEN_TOKEN_TTL_HOURS must be positive");
        }

        Ok(Self {
            jwt_secret,
            db_path,
            host,
            port,
            token_ttl_hours,
        })
    }
}
