// crates/core/src/config.rs
//! Dashboard endpoint and timing configuration.

use std::time::Duration;

pub const ENV_API_URL: &str = "JOB_DASHBOARD_API_URL";
pub const ENV_WS_URL: &str = "JOB_DASHBOARD_WS_URL";
pub const ENV_RECONNECT_DELAY_MS: &str = "JOB_DASHBOARD_RECONNECT_DELAY_MS";
pub const ENV_CONNECT_TIMEOUT_MS: &str = "JOB_DASHBOARD_CONNECT_TIMEOUT_MS";
pub const ENV_REQUEST_TIMEOUT_MS: &str = "JOB_DASHBOARD_REQUEST_TIMEOUT_MS";

const DEFAULT_API_URL: &str = "http://localhost:8000";
const DEFAULT_WS_URL: &str = "ws://localhost:8000";

/// Configuration for one dashboard session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardConfig {
    /// Base REST URL. The snapshot is read from `{api_url}/jobs`.
    pub api_url: String,
    /// Base stream URL. Updates arrive on `{ws_url}/ws`.
    pub ws_url: String,
    /// Constant delay between a stream close and the next connect attempt.
    pub reconnect_delay: Duration,
    /// Upper bound on a single stream connect attempt.
    pub connect_timeout: Duration,
    /// Upper bound on a single REST request.
    pub request_timeout: Duration,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.into(),
            ws_url: DEFAULT_WS_URL.into(),
            reconnect_delay: Duration::from_secs(3),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(10),
        }
    }
}

impl DashboardConfig {
    /// Defaults overridden by `JOB_DASHBOARD_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an explicit variable source.
    ///
    /// When only the API URL is overridden the stream URL follows it
    /// (`http` → `ws`, `https` → `wss`).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let api_url = lookup(ENV_API_URL).filter(|v| !v.trim().is_empty());
        let ws_url = lookup(ENV_WS_URL)
            .filter(|v| !v.trim().is_empty())
            .or_else(|| api_url.as_deref().map(ws_url_for));

        Self {
            api_url: api_url.unwrap_or(defaults.api_url),
            ws_url: ws_url.unwrap_or(defaults.ws_url),
            reconnect_delay: millis(&lookup, ENV_RECONNECT_DELAY_MS)
                .unwrap_or(defaults.reconnect_delay),
            connect_timeout: millis(&lookup, ENV_CONNECT_TIMEOUT_MS)
                .unwrap_or(defaults.connect_timeout),
            request_timeout: millis(&lookup, ENV_REQUEST_TIMEOUT_MS)
                .unwrap_or(defaults.request_timeout),
        }
    }

    pub fn jobs_url(&self) -> String {
        format!("{}/jobs", self.api_url.trim_end_matches('/'))
    }

    pub fn stream_url(&self) -> String {
        format!("{}/ws", self.ws_url.trim_end_matches('/'))
    }
}

/// Derive a WebSocket base URL from an HTTP one.
pub fn ws_url_for(api_url: &str) -> String {
    if let Some(rest) = api_url.strip_prefix("https://") {
        format!("wss://{rest}")
    } else if let Some(rest) = api_url.strip_prefix("http://") {
        format!("ws://{rest}")
    } else {
        api_url.to_owned()
    }
}

fn millis(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<Duration> {
    let raw = lookup(key)?;
    match raw.trim().parse::<u64>() {
        Ok(ms) => Some(Duration::from_millis(ms)),
        Err(_) => {
            tracing::warn!(key, value = %raw, "ignoring non-numeric duration, using default");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_point_at_local_backend() {
        let config = DashboardConfig::from_lookup(|_| None);
        assert_eq!(config, DashboardConfig::default());
        assert_eq!(config.jobs_url(), "http://localhost:8000/jobs");
        assert_eq!(config.stream_url(), "ws://localhost:8000/ws");
        assert_eq!(config.reconnect_delay, Duration::from_secs(3));
    }

    #[test]
    fn test_env_overrides() {
        let config = DashboardConfig::from_lookup(lookup_from(&[
            (ENV_API_URL, "https://jobs.internal/"),
            (ENV_WS_URL, "wss://stream.internal"),
            (ENV_RECONNECT_DELAY_MS, "500"),
            (ENV_CONNECT_TIMEOUT_MS, "250"),
            (ENV_REQUEST_TIMEOUT_MS, "1500"),
        ]));
        assert_eq!(config.jobs_url(), "https://jobs.internal/jobs");
        assert_eq!(config.stream_url(), "wss://stream.internal/ws");
        assert_eq!(config.reconnect_delay, Duration::from_millis(500));
        assert_eq!(config.request_timeout, Duration::from_millis(1500));
        assert_eq!(config.connect_timeout, Duration::from_millis(250));
    }

    #[test]
    fn test_stream_url_follows_api_url() {
        let config = DashboardConfig::from_lookup(lookup_from(&[(
            ENV_API_URL,
            "https://jobs.internal:9000",
        )]));
        assert_eq!(config.stream_url(), "wss://jobs.internal:9000/ws");

        let config =
            DashboardConfig::from_lookup(lookup_from(&[(ENV_API_URL, "http://10.0.0.5:8000")]));
        assert_eq!(config.stream_url(), "ws://10.0.0.5:8000/ws");
    }

    #[test]
    fn test_invalid_duration_falls_back_to_default() {
        let config =
            DashboardConfig::from_lookup(lookup_from(&[(ENV_RECONNECT_DELAY_MS, "soon")]));
        assert_eq!(config.reconnect_delay, Duration::from_secs(3));
    }

    #[test]
    fn test_blank_url_is_ignored() {
        let config = DashboardConfig::from_lookup(lookup_from(&[(ENV_API_URL, "  ")]));
        assert_eq!(config.api_url, "http://localhost:8000");
        assert_eq!(config.ws_url, "ws://localhost:8000");
    }
}
