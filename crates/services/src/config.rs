use std::env;
use std::time::Duration;

pub const DEFAULT_NODE_URL: &str = "http://localhost:9009";
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1000);
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Connection and pacing settings for a validation session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidationConfig {
    pub node_url: String,
    pub api_key: Option<String>,
    pub poll_interval: Duration,
    pub request_timeout: Duration,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            node_url: DEFAULT_NODE_URL.into(),
            api_key: None,
            poll_interval: DEFAULT_POLL_INTERVAL,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl ValidationConfig {
    /// Read `IDENA_NODE_URL`, `IDENA_API_KEY`, `IDENA_POLL_INTERVAL_MS` and
    /// `IDENA_HTTP_TIMEOUT_SECS`, falling back to defaults for anything unset or unparsable.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let node_url = lookup("IDENA_NODE_URL")
            .filter(|value| !value.trim().is_empty())
            .unwrap_or(defaults.node_url);
        let api_key = lookup("IDENA_API_KEY").filter(|value| !value.trim().is_empty());
        let poll_interval = lookup("IDENA_POLL_INTERVAL_MS")
            .and_then(|value| value.trim().parse::<u64>().ok())
            .filter(|millis| *millis > 0)
            .map_or(defaults.poll_interval, Duration::from_millis);
        let request_timeout = lookup("IDENA_HTTP_TIMEOUT_SECS")
            .and_then(|value| value.trim().parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map_or(defaults.request_timeout, Duration::from_secs);
        Self {
            node_url,
            api_key,
            poll_interval,
            request_timeout,
        }
    }
}
