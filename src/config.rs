use std::{fmt::Display, str::FromStr, time::Duration};

use anyhow::{anyhow, Context};
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub backend_url: String,
    pub public_url: String,
    pub request_timeout: Duration,
    pub session_minutes: i64,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        if dotenv::dotenv().is_err() {
            info!("No .env file found, reading the process environment only");
        }

        Ok(Self {
            port: try_load("PORT", "8080")?,
            backend_url: try_load("BACKEND_URL", "http://localhost:3000")?,
            public_url: try_load("PUBLIC_URL", "http://localhost:8080")?,
            request_timeout: Duration::from_secs(try_load("REQUEST_TIMEOUT_SECS", "10")?),
            session_minutes: try_load("SESSION_MINUTES", "60")?,
        })
    }
}

fn try_load<T: FromStr>(key: &str, default: &str) -> anyhow::Result<T>
where
    T::Err: Display,
{
    let raw = dotenv::var(key).unwrap_or_else(|_| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });

    raw.parse()
        .map_err(|e| {
            warn!("Invalid {key} value: {e}");
            anyhow!("{e}")
        })
        .with_context(|| format!("environment variable {key}={raw:?} is misconfigured"))
}
