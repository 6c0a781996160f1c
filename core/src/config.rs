//! Client configuration.

use std::time::Duration;

/// Address of the deployed classification server.
pub const DEFAULT_BASE_URL: &str = "http://100.28.103.38:5000";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Settings fixed when a `Classifier` is constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL of the classification server, without the endpoint path.
    pub base_url: String,
    pub connect_timeout: Duration,
    /// Time allowed for the response to arrive and be read.
    pub read_timeout: Duration,
    /// Time allowed to send the request body.
    pub write_timeout: Duration,
    /// Emit request metadata and response bodies at `debug` level.
    pub log_bodies: bool,
    /// Re-attempt a request once when the connection could not be made.
    pub retry_on_connection_failure: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            connect_timeout: DEFAULT_TIMEOUT,
            read_timeout: DEFAULT_TIMEOUT,
            write_timeout: DEFAULT_TIMEOUT,
            log_bodies: true,
            retry_on_connection_failure: true,
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
            ..Self::default()
        }
    }

    /// Defaults overlaid with `KNOT_API_URL`, `KNOT_TIMEOUT_SECS`,
    /// `KNOT_LOG_BODIES` and `KNOT_RETRY_ON_CONNECTION_FAILURE`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let timeout = lookup("KNOT_TIMEOUT_SECS")
            .and_then(|s| s.trim().parse().ok())
            .map(Duration::from_secs);

        Self {
            base_url: lookup("KNOT_API_URL").unwrap_or(defaults.base_url),
            connect_timeout: timeout.unwrap_or(defaults.connect_timeout),
            read_timeout: timeout.unwrap_or(defaults.read_timeout),
            write_timeout: timeout.unwrap_or(defaults.write_timeout),
            log_bodies: lookup("KNOT_LOG_BODIES")
                .and_then(|s| parse_flag(&s))
                .unwrap_or(defaults.log_bodies),
            retry_on_connection_failure: lookup("KNOT_RETRY_ON_CONNECTION_FAILURE")
                .and_then(|s| parse_flag(&s))
                .unwrap_or(defaults.retry_on_connection_failure),
        }
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
