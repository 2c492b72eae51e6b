//! Client configuration.
//!
//! # Design
//! `Config` is the merged, opaque result of defaults, environment and the
//! per-client builder calls. Environment values are read once by
//! `Config::from_env`; builder calls on top of it always win.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use tracing::warn;

use crate::headers::Headers;

pub const ENV_BASE_URL: &str = "POTION_BASE_URL";
pub const ENV_RESPONSE_HANDLING: &str = "POTION_RESPONSE_HANDLING";

/// How a completed exchange is represented to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseHandling {
    /// Every response is `Outcome::Ok`; only transport failures are errors.
    #[default]
    ConnError,
    /// Responses with status 400 and above become `Outcome::StatusError`.
    StatusError,
    /// Responses come back bare, as `Outcome::Bare`.
    NoTuple,
}

impl ResponseHandling {
    pub const fn as_str(self) -> &'static str {
        match self {
            ResponseHandling::ConnError => "conn_error",
            ResponseHandling::StatusError => "status_error",
            ResponseHandling::NoTuple => "no_tuple",
        }
    }
}

impl fmt::Display for ResponseHandling {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown response handling method: {0}")]
pub struct UnknownResponseHandling(String);

impl FromStr for ResponseHandling {
    type Err = UnknownResponseHandling;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "conn_error" => Ok(ResponseHandling::ConnError),
            "status_error" => Ok(ResponseHandling::StatusError),
            "no_tuple" => Ok(ResponseHandling::NoTuple),
            other => Err(UnknownResponseHandling(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Prefix joined to every request URL.
    pub base_url: Option<String>,
    /// Headers added after the caller's headers on every request.
    pub request_headers: Headers,
    pub response_handling: ResponseHandling,
}

impl Config {
    /// Defaults overlaid with `POTION_BASE_URL` and `POTION_RESPONSE_HANDLING`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Config::default();
        if let Some(base_url) = lookup(ENV_BASE_URL).filter(|value| !value.is_empty()) {
            config.base_url = Some(base_url);
        }
        if let Some(raw) = lookup(ENV_RESPONSE_HANDLING) {
            match raw.parse() {
                Ok(handling) => config.response_handling = handling,
                Err(err) => warn!(%err, "ignoring {}", ENV_RESPONSE_HANDLING),
            }
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn default_handling_is_conn_error() {
        assert_eq!(Config::default().response_handling, ResponseHandling::ConnError);
    }

    #[test]
    fn handling_parses_snake_case_names() {
        assert_eq!("status_error".parse(), Ok(ResponseHandling::StatusError));
        assert_eq!("no_tuple".parse(), Ok(ResponseHandling::NoTuple));
        assert!("strict".parse::<ResponseHandling>().is_err());
    }

    #[test]
    fn handling_deserializes_from_json() {
        let config: Config =
            serde_json::from_str(r#"{"base_url":"api.local","response_handling":"status_error"}"#)
                .unwrap();
        assert_eq!(config.base_url.as_deref(), Some("api.local"));
        assert_eq!(config.response_handling, ResponseHandling::StatusError);
        assert!(config.request_headers.is_empty());
    }

    #[test]
    fn request_headers_deserialize_as_pairs() {
        let config: Config = serde_json::from_str(
            r#"{"request_headers":[["User-Agent","potion"],["X-Trace","a"],["X-Trace","b"]]}"#,
        )
        .unwrap();
        assert_eq!(
            config.request_headers,
            Headers::from(vec![("User-Agent", "potion"), ("X-Trace", "a"), ("X-Trace", "b")])
        );
        assert_eq!(config.response_handling, ResponseHandling::ConnError);
    }

    #[test]
    fn env_overlay_reads_known_keys() {
        let config = Config::from_lookup(lookup(&[
            (ENV_BASE_URL, "https://api.example.com"),
            (ENV_RESPONSE_HANDLING, "no_tuple"),
        ]));
        assert_eq!(config.base_url.as_deref(), Some("https://api.example.com"));
        assert_eq!(config.response_handling, ResponseHandling::NoTuple);
    }

    #[test]
    fn env_overlay_ignores_bad_handling() {
        let config = Config::from_lookup(lookup(&[(ENV_RESPONSE_HANDLING, "bogus")]));
        assert_eq!(config.response_handling, ResponseHandling::ConnError);
        assert!(config.base_url.is_none());
    }
}
