/// Configuration management for the client
///
/// This module loads configuration from environment variables and provides
/// a type-safe configuration struct.
///
/// # Environment Variables
///
/// - `API_BASE_URL`: Base URL of the remote API (required)
/// - `API_TIMEOUT_MS`: Request timeout in milliseconds (default: 10000)
///
/// # Example
///
/// ```no_run
/// use taskdeck_client::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Talking to {}", config.base_url);
/// # Ok(())
/// # }
/// ```

use std::env;
use std::time::Duration;

/// Default request timeout in milliseconds
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

/// Client configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the remote API, e.g. `https://api.taskdeck.app`
    pub base_url: String,

    /// Timeout applied to every HTTP request
    ///
    /// There is no per-request override; a request that exceeds this bound
    /// fails like any other network error.
    pub timeout: Duration,
}

impl Config {
    /// Creates a configuration with the default timeout
    pub fn new(base_url: impl Into<String>) -> Self {
        Config {
            base_url: base_url.into(),
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
        }
    }

    /// Loads configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `API_BASE_URL` is missing
    /// - `API_TIMEOUT_MS` is present but not a number
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if present (for development)
        dotenvy::dotenv().ok();

        let base_url = env::var("API_BASE_URL")
            .map_err(|_| anyhow::anyhow!("API_BASE_URL environment variable is required"))?;

        let timeout_ms = env::var("API_TIMEOUT_MS")
            .unwrap_or_else(|_| DEFAULT_TIMEOUT_MS.to_string())
            .parse::<u64>()?;

        Ok(Config {
            base_url,
            timeout: Duration::from_millis(timeout_ms),
        })
    }
}
