//! Minimal environment construction for spawned commands.
//!
//! The environment handed to a child process is built up from an explicit
//! allowlist of variable names, never derived from the host environment by
//! subtraction. Anything not named here - credentials, tokens, proxy
//! settings - is invisible to the child by construction.

use std::collections::HashMap;

use crate::policy::COMMAND_METACHARACTERS;

/// The only host variables a spawned command may observe.
pub const ENV_ALLOWLIST: [&str; 5] = ["PATH", "HOME", "USER", "LANG", "PWD"];

/// Build a fresh sanitized environment for one execution.
///
/// Variables that are unset on the host, or empty once sanitized, are
/// omitted rather than passed through as empty strings.
pub fn create_env() -> HashMap<String, String> {
    ENV_ALLOWLIST
        .iter()
        .filter_map(|name| {
            let value = std::env::var(name).ok()?;
            let sanitized = sanitize_value(&value);
            if sanitized.is_empty() {
                None
            } else {
                Some((name.to_string(), sanitized))
            }
        })
        .collect()
}

/// Values are stripped of the same characters the policy validator vetoes
/// in command text, plus control characters.
fn sanitize_value(value: &str) -> String {
    value
        .chars()
        .filter(|c| !COMMAND_METACHARACTERS.contains(c) && !c.is_control())
        .collect()
}
