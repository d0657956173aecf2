//! Environment-driven configuration

use std::{env, fmt::Display, path::PathBuf, str::FromStr, time::Duration};

use tracing::info;

use crate::error::ConfigError;

pub const DEFAULT_API_URL: &str = "https://vibe-bites-backend.onrender.com/api";
const DEFAULT_CART_DIR: &str = ".vibe-cart";
const DEFAULT_PORT: u16 = 8000;
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone)]
pub struct Config {
    /// Backend API base URL
    pub api_url: String,

    /// Bearer token of the logged-in shopper, if any
    pub session_token: Option<String>,

    /// Directory holding the durable cart record
    pub cart_dir: PathBuf,

    /// Port of the local cart service
    pub port: u16,

    /// Timeout applied to every backend request
    pub http_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self::new(DEFAULT_API_URL)
    }
}

impl Config {
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            session_token: None,
            cart_dir: PathBuf::from(DEFAULT_CART_DIR),
            port: DEFAULT_PORT,
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
        }
    }

    pub fn with_session_token(mut self, token: impl Into<String>) -> Self {
        self.session_token = Some(token.into());
        self
    }

    pub fn with_cart_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cart_dir = dir.into();
        self
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let api_url = lookup("VIBE_API_URL").unwrap_or_else(|| {
            info!("VIBE_API_URL not set, using default: {DEFAULT_API_URL}");
            DEFAULT_API_URL.to_string()
        });

        let session_token = lookup("VIBE_SESSION_TOKEN").filter(|t| !t.trim().is_empty());
        if session_token.is_none() {
            info!("VIBE_SESSION_TOKEN not set, cart sync is anonymous and checkout is disabled");
        }

        let cart_dir = lookup("VIBE_CART_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CART_DIR));

        let port = try_load(&lookup, "VIBE_PORT", DEFAULT_PORT)?;
        let timeout_secs = try_load(&lookup, "VIBE_HTTP_TIMEOUT_SECS", DEFAULT_HTTP_TIMEOUT_SECS)?;

        Ok(Self {
            api_url,
            session_token,
            cart_dir,
            port,
            http_timeout: Duration::from_secs(timeout_secs),
        })
    }
}

fn try_load<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError>
where
    T: FromStr + Display,
    T::Err: Display,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            value: raw.clone(),
            reason: e.to_string(),
        }),
        None => {
            info!("{key} not set, using default: {default}");
            Ok(default)
        }
    }
}
