use std::{fmt::Display, net::SocketAddr, path::PathBuf, str::FromStr, time::Duration};

use anyhow::{Context, Result};

const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:8000";
const DEFAULT_MEDIA_ROOT: &str = "media";
const DEFAULT_PAGE_SIZE: u32 = 10;
const DEFAULT_INDEX_CACHE_SECONDS: u64 = 20;
const DEFAULT_MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub secret_key: String,
    pub bind_address: SocketAddr,
    pub media_root: PathBuf,
    pub page_size: u32,
    pub index_cache_ttl: Duration,
    pub max_upload_bytes: usize,
}

impl Config {
    /// Reads the configuration from the process environment.
    /// Call `dotenvy::dotenv()` first to pick up a `.env` file.
    pub fn from_env() -> Result<Self> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
        let secret_key = std::env::var("SECRET_KEY").context("SECRET_KEY must be set")?;
        let media_root = std::env::var("MEDIA_ROOT").unwrap_or_else(|_| DEFAULT_MEDIA_ROOT.into());
        let cache_seconds = env_or("INDEX_CACHE_SECONDS", DEFAULT_INDEX_CACHE_SECONDS)?;
        Ok(Self {
            database_url,
            secret_key,
            bind_address: env_or("BIND_ADDRESS", DEFAULT_BIND_ADDRESS.parse::<SocketAddr>()?)?,
            media_root: PathBuf::from(media_root),
            page_size: env_or("PAGE_SIZE", DEFAULT_PAGE_SIZE)?,
            index_cache_ttl: Duration::from_secs(cache_seconds),
            max_upload_bytes: env_or("MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?,
        })
    }
}

fn env_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    match std::env::var(key) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid value {:?} for {}: {}", value, key, e)),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_variable_uses_default() {
        let value: u32 = env_or("YATUBE_TEST_SURELY_UNSET", 7).unwrap();
        assert_eq!(value, 7);
    }

    #[test]
    fn invalid_number_is_an_error() {
        std::env::set_var("YATUBE_TEST_BAD_PAGE_SIZE", "ten");
        let result: Result<u32> = env_or("YATUBE_TEST_BAD_PAGE_SIZE", 10);
        assert!(result.is_err());
    }
}
