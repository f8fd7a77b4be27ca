//! Client-wide defaults.

use std::time::Duration;

use crate::http::CachePolicy;

/// Timeout applied when neither the client nor the endpoint sets one.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(100);

/// Environment variable overriding `ClientConfig::default_timeout`, in seconds.
pub const ENV_TIMEOUT_SECS: &str = "ENDPOINT_TIMEOUT_SECS";

/// Environment variable overriding `ClientConfig::cache_policy`.
pub const ENV_CACHE_POLICY: &str = "ENDPOINT_CACHE_POLICY";

/// Defaults for every request an `ApiClient` builds. Endpoint overrides win.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub default_timeout: Duration,
    pub cache_policy: CachePolicy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            default_timeout: DEFAULT_TIMEOUT,
            cache_policy: CachePolicy::default(),
        }
    }
}

impl ClientConfig {
    /// Defaults overlaid with `ENDPOINT_TIMEOUT_SECS` and
    /// `ENDPOINT_CACHE_POLICY`. Unparsable values are logged and ignored.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(raw) = lookup(ENV_TIMEOUT_SECS) {
            match raw.trim().parse::<u64>() {
                Ok(secs) => config.default_timeout = Duration::from_secs(secs),
                Err(e) => tracing::warn!(var = ENV_TIMEOUT_SECS, value = %raw, error = %e, "ignoring invalid timeout"),
            }
        }

        if let Some(raw) = lookup(ENV_CACHE_POLICY) {
            match parse_cache_policy(&raw) {
                Some(policy) => config.cache_policy = policy,
                None => tracing::warn!(var = ENV_CACHE_POLICY, value = %raw, "ignoring unknown cache policy"),
            }
        }

        config
    }
}

fn parse_cache_policy(raw: &str) -> Option<CachePolicy> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "default" => Some(CachePolicy::UseProtocolPolicy),
        "reload" => Some(CachePolicy::ReloadIgnoringCache),
        "cache-else-load" => Some(CachePolicy::ReturnCacheElseLoad),
        "cache-only" => Some(CachePolicy::ReturnCacheOnly),
        _ => None,
    }
}
