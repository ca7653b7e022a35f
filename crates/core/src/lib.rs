pub mod analysis;
pub mod cache;
pub mod domain;
pub mod error;
pub mod ingest;
pub mod scoring;

mod numeric;

pub use analysis::analyzer::Analyzer;
pub use error::{AnalyzeError, Result};

pub mod config {
    use anyhow::Context;
    use std::str::FromStr;
    use std::time::Duration;

    const DEFAULT_PORT: u16 = 8000;
    const DEFAULT_MARKET_DATA_BASE_URL: &str = "https://query2.finance.yahoo.com";
    const DEFAULT_MARKET_DATA_SESSION_URL: &str = "https://fc.yahoo.com";
    const DEFAULT_SEARCH_BASE_URL: &str = "https://query2.finance.yahoo.com";
    const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 10;
    // A single attempt: failures surface immediately.
    const DEFAULT_UPSTREAM_ATTEMPTS: u32 = 1;

    #[derive(Debug, Clone)]
    pub struct Settings {
        pub port: u16,
        pub sentry_dsn: Option<String>,
        pub market_data_base_url: String,
        pub market_data_session_url: String,
        pub search_base_url: String,
        pub upstream_timeout: Duration,
        pub upstream_attempts: u32,
        pub lookup_cache_capacity: usize,
    }

    impl Default for Settings {
        fn default() -> Self {
            Self {
                port: DEFAULT_PORT,
                sentry_dsn: None,
                market_data_base_url: DEFAULT_MARKET_DATA_BASE_URL.to_string(),
                market_data_session_url: DEFAULT_MARKET_DATA_SESSION_URL.to_string(),
                search_base_url: DEFAULT_SEARCH_BASE_URL.to_string(),
                upstream_timeout: Duration::from_secs(DEFAULT_UPSTREAM_TIMEOUT_SECS),
                upstream_attempts: DEFAULT_UPSTREAM_ATTEMPTS,
                lookup_cache_capacity: crate::cache::DEFAULT_CAPACITY,
            }
        }
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            let defaults = Self::default();
            let attempts: u32 = parse_var("UPSTREAM_ATTEMPTS", defaults.upstream_attempts)?;
            anyhow::ensure!(attempts >= 1, "UPSTREAM_ATTEMPTS must be at least 1");

            Ok(Self {
                port: parse_var("PORT", defaults.port)?,
                sentry_dsn: std::env::var("SENTRY_DSN").ok().filter(|s| !s.is_empty()),
                market_data_base_url: string_var(
                    "MARKET_DATA_BASE_URL",
                    defaults.market_data_base_url,
                ),
                market_data_session_url: string_var(
                    "MARKET_DATA_SESSION_URL",
                    defaults.market_data_session_url,
                ),
                search_base_url: string_var("SEARCH_BASE_URL", defaults.search_base_url),
                upstream_timeout: Duration::from_secs(parse_var(
                    "UPSTREAM_TIMEOUT_SECS",
                    DEFAULT_UPSTREAM_TIMEOUT_SECS,
                )?),
                upstream_attempts: attempts,
                lookup_cache_capacity: parse_var(
                    "LOOKUP_CACHE_CAPACITY",
                    defaults.lookup_cache_capacity,
                )?,
            })
        }
    }

    fn string_var(key: &str, default: String) -> String {
        std::env::var(key)
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(default)
    }

    fn parse_var<T>(key: &str, default: T) -> anyhow::Result<T>
    where
        T: FromStr,
        T::Err: std::error::Error + Send + Sync + 'static,
    {
        match std::env::var(key) {
            Ok(raw) if !raw.trim().is_empty() => raw
                .trim()
                .parse::<T>()
                .with_context(|| format!("{key} is not valid: {raw}")),
            _ => Ok(default),
        }
    }
}
