use std::time::Duration;

use crate::retry::RetryPolicy;

/// Base URL of the Janky deployment builds are triggered on.
pub const DEFAULT_JANKY_URL: &str = "https://janky.githubapp.com";
/// How often the status endpoint is polled.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);
/// Overall budget for waiting on a build.
pub const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_secs(5 * 60 * 60);
/// Per-request timeout for the underlying HTTP client.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Settings for the status poll loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    pub interval: Duration,
    pub timeout: Duration,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            timeout: DEFAULT_POLL_TIMEOUT,
        }
    }
}

/// JankyConfig holds everything a run needs besides the caller's inputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JankyConfig {
    // base_url is the Janky host, without a trailing `/api`.
    pub base_url: String,
    pub poll: PollSettings,
    pub retry: RetryPolicy,
    pub request_timeout: Duration,
}

impl Default for JankyConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_JANKY_URL.to_string(),
            poll: PollSettings::default(),
            retry: RetryPolicy::default(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl JankyConfig {
    /// Builds a config from the defaults, overridden by environment variables.
    ///
    /// Recognised variables:
    /// - `JANKY_URL`: base URL of the Janky host
    /// - `JANKY_POLL_INTERVAL`: seconds between status polls
    /// - `JANKY_POLL_TIMEOUT`: seconds before giving up on the build
    /// - `JANKY_HTTP_RETRY_MAX`: retries per HTTP request
    ///
    /// Unset, empty or unparseable values fall back to the defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(url) = lookup("JANKY_URL").filter(|v| !v.trim().is_empty()) {
            config.base_url = url.trim().to_string();
        }
        if let Some(secs) = lookup("JANKY_POLL_INTERVAL").and_then(|v| parse_secs(&v)) {
            config.poll.interval = secs;
        }
        if let Some(secs) = lookup("JANKY_POLL_TIMEOUT").and_then(|v| parse_secs(&v)) {
            config.poll.timeout = secs;
        }
        if let Some(retries) = lookup("JANKY_HTTP_RETRY_MAX").and_then(|v| v.trim().parse().ok())
        {
            config.retry.max_retries = retries;
        }

        config
    }
}

fn parse_secs(value: &str) -> Option<Duration> {
    value
        .trim()
        .parse::<u64>()
        .ok()
        .filter(|secs| *secs > 0)
        .map(Duration::from_secs)
}
