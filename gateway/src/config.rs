//! Gateway configuration.
//!
//! All process-global bounds live here as one immutable value handed to the
//! executor at the call site. Production code uses [`GatewayConfig::default`];
//! deployments can override individual bounds from a TOML document, and
//! tests substitute tighter ones without touching the defaults.

use std::time::Duration;

use serde::Deserialize;

use crate::policy::PolicyTable;

const DEFAULT_TIMEOUT_MS: u64 = 30_000;
const DEFAULT_MAX_OUTPUT_BYTES: usize = 5 * 1024 * 1024;
const DEFAULT_TAIL_LIMIT: usize = 4_000;

#[derive(Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    /// Wall-clock bound on one execution; the child is killed on expiry.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Combined stdout+stderr byte budget. Exceeding it fails the call; it
    /// is never silent truncation.
    #[serde(default = "default_max_output_bytes")]
    pub max_output_bytes: usize,

    /// Size of the trailing window of combined output returned to the
    /// caller, in characters.
    #[serde(default = "default_tail_limit")]
    pub tail_limit: usize,

    /// The command allowlist consulted before every spawn.
    #[serde(default)]
    pub policy: PolicyTable,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_TIMEOUT_MS,
            max_output_bytes: DEFAULT_MAX_OUTPUT_BYTES,
            tail_limit: DEFAULT_TAIL_LIMIT,
            policy: PolicyTable::default(),
        }
    }
}

impl GatewayConfig {
    /// Parse a config from a TOML document. Unset fields keep their
    /// defaults; unknown fields are an error.
    pub fn from_toml_str(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

fn default_max_output_bytes() -> usize {
    DEFAULT_MAX_OUTPUT_BYTES
}

fn default_tail_limit() -> usize {
    DEFAULT_TAIL_LIMIT
}
