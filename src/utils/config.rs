use anyhow::{anyhow, bail, Result};
use std::env;
use std::time::Duration;
use url::Url;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8080/api";
pub const DEFAULT_STATUS_POLL_SECS: u64 = 5;

#[derive(Debug, Clone)]
pub struct Config {
    pub api_base_url: Url,
    pub status_poll_interval: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let raw_url = lookup("CDC_API_BASE_URL").unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());
        let api_base_url = Url::parse(&raw_url)
            .map_err(|e| anyhow!("CDC_API_BASE_URL is not a valid URL ({}): {}", raw_url, e))?;
        if !matches!(api_base_url.scheme(), "http" | "https") {
            bail!("CDC_API_BASE_URL must use http or https, got {}", api_base_url.scheme());
        }

        let poll_secs = match lookup("CDC_STATUS_POLL_SECS") {
            Some(value) => value
                .trim()
                .parse::<u64>()
                .map_err(|_| anyhow!("CDC_STATUS_POLL_SECS must be a whole number of seconds"))?,
            None => DEFAULT_STATUS_POLL_SECS,
        };
        if !(5..=10).contains(&poll_secs) {
            bail!("CDC_STATUS_POLL_SECS must be between 5 and 10, got {}", poll_secs);
        }

        Ok(Config {
            api_base_url,
            status_poll_interval: Duration::from_secs(poll_secs),
        })
    }
}
