use std::env;
use std::str::FromStr;

use tracing::warn;

/// Runtime settings, read from `GATESH_*` environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Prompt shown before every input line.
    pub prompt: String,
    /// Echo requests sent by `ping`.
    pub ping_count: u32,
    /// Payload size in bytes for `ping`.
    pub ping_packet_size: u32,
    /// Lines kept in the line editor's history.
    pub history_limit: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            prompt: "gatesh: ".to_string(),
            ping_count: 4,
            ping_packet_size: 64,
            history_limit: 500,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a config from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            prompt: lookup("GATESH_PROMPT").unwrap_or(defaults.prompt),
            ping_count: parse_or(&lookup, "GATESH_PING_COUNT", defaults.ping_count),
            ping_packet_size: parse_or(&lookup, "GATESH_PING_SIZE", defaults.ping_packet_size),
            history_limit: parse_or(&lookup, "GATESH_HISTORY", defaults.history_limit),
        }
    }
}

fn parse_or<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T {
    match lookup(key) {
        Some(raw) => match raw.trim().parse() {
            Ok(value) => value,
            Err(_) => {
                warn!(key, value = %raw, "ignoring unparseable setting");
                default
            }
        },
        None => default,
    }
}
