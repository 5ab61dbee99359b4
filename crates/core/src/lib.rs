pub mod attachments;
pub mod context;
pub mod domain;
pub mod history;
pub mod market_data;
pub mod navigation;
pub mod suggest;
pub mod synth;

pub mod config {
    use crate::history::session::{SessionOptions, DEFAULT_DRILLDOWN_LATENCY, DEFAULT_LATENCY};
    use anyhow::Context;
    use std::time::Duration;

    pub const DEFAULT_SESSION_IDLE_TTL_SECS: u64 = 30 * 60;

    #[derive(Debug, Clone)]
    pub struct Settings {
        pub twelve_data_api_key: Option<String>,
        pub twelve_data_base_url: Option<String>,
        pub twelve_data_timeout_secs: Option<u64>,
        pub simulated_latency: Duration,
        pub drilldown_latency: Duration,
        /// API sessions untouched for this long are torn down.
        pub session_idle_ttl: Duration,
        pub sentry_dsn: Option<String>,
        pub port: u16,
    }

    impl Default for Settings {
        fn default() -> Self {
            Self {
                twelve_data_api_key: None,
                twelve_data_base_url: None,
                twelve_data_timeout_secs: None,
                simulated_latency: DEFAULT_LATENCY,
                drilldown_latency: DEFAULT_DRILLDOWN_LATENCY,
                session_idle_ttl: Duration::from_secs(DEFAULT_SESSION_IDLE_TTL_SECS),
                sentry_dsn: None,
                port: 3000,
            }
        }
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            let defaults = Self::default();
            Ok(Self {
                twelve_data_api_key: non_empty_var("TWELVE_DATA_API_KEY"),
                twelve_data_base_url: non_empty_var("TWELVE_DATA_BASE_URL"),
                twelve_data_timeout_secs: parse_var("TWELVE_DATA_TIMEOUT_SECS")?,
                simulated_latency: parse_var("SIMULATED_LATENCY_MS")?
                    .map(Duration::from_millis)
                    .unwrap_or(defaults.simulated_latency),
                drilldown_latency: parse_var("DRILLDOWN_LATENCY_MS")?
                    .map(Duration::from_millis)
                    .unwrap_or(defaults.drilldown_latency),
                session_idle_ttl: parse_var("SESSION_IDLE_TTL_SECS")?
                    .map(Duration::from_secs)
                    .unwrap_or(defaults.session_idle_ttl),
                sentry_dsn: non_empty_var("SENTRY_DSN"),
                port: parse_var("PORT")?.unwrap_or(defaults.port),
            })
        }

        pub fn require_twelve_data_api_key(&self) -> anyhow::Result<&str> {
            self.twelve_data_api_key
                .as_deref()
                .context("TWELVE_DATA_API_KEY is required")
        }

        pub fn session_options(&self) -> SessionOptions {
            SessionOptions {
                latency: self.simulated_latency,
                drilldown_latency: self.drilldown_latency,
                seed: None,
            }
        }
    }

    fn non_empty_var(key: &str) -> Option<String> {
        std::env::var(key).ok().filter(|v| !v.trim().is_empty())
    }

    fn parse_var<T>(key: &str) -> anyhow::Result<Option<T>>
    where
        T: std::str::FromStr,
        T::Err: std::error::Error + Send + Sync + 'static,
    {
        non_empty_var(key)
            .map(|v| {
                v.trim()
                    .parse::<T>()
                    .with_context(|| format!("{key} must be a valid number (got {v:?})"))
            })
            .transpose()
    }
}
