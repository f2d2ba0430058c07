use std::time::Duration;

use anyhow::{Context, Result};

const DEFAULT_API_BASE_URL: &str = "http://localhost:8000/api/v1";

/// Console configuration loaded from environment variables.
/// Every setting has a default; malformed numbers fail startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the remote CV API, e.g. `http://localhost:8000/api/v1`.
    pub api_base_url: String,
    pub port: u16,
    pub rust_log: String,
    /// Sessions live in Redis when set, in process memory otherwise.
    pub redis_url: Option<String>,
    pub session_ttl: Duration,
    /// Rows per page in the CV and user lists.
    pub page_size: usize,
    pub http_timeout: Duration,
    pub cookie_secure: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            api_base_url: std::env::var("API_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_API_BASE_URL.to_string()),
            port: parse_env("PORT", 3000)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            redis_url: std::env::var("REDIS_URL").ok().filter(|v| !v.trim().is_empty()),
            session_ttl: Duration::from_secs(parse_env("SESSION_TTL_SECS", 1800)?),
            page_size: parse_env::<usize>("PAGE_SIZE", 5)?.max(1),
            http_timeout: Duration::from_secs(parse_env("HTTP_TIMEOUT_SECS", 30)?),
            cookie_secure: parse_env("COOKIE_SECURE", false)?,
        })
    }
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("Environment variable '{key}' has an invalid value '{raw}'")),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
pub fn test_config(api_base_url: &str) -> Config {
    Config {
        api_base_url: api_base_url.to_string(),
        port: 0,
        rust_log: "debug".to_string(),
        redis_url: None,
        session_ttl: Duration::from_secs(60),
        page_size: 5,
        http_timeout: Duration::from_secs(5),
        cookie_secure: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_env_uses_default_when_unset() {
        let value: u16 = parse_env("CV_CONSOLE_TEST_UNSET_PORT", 4242).unwrap();
        assert_eq!(value, 4242);
    }

    #[test]
    fn test_parse_env_rejects_garbage() {
        std::env::set_var("CV_CONSOLE_TEST_BAD_PAGE_SIZE", "five");
        let result: Result<usize> = parse_env("CV_CONSOLE_TEST_BAD_PAGE_SIZE", 5);
        assert!(result.is_err());
        std::env::remove_var("CV_CONSOLE_TEST_BAD_PAGE_SIZE");
    }
}
