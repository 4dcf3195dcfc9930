//! Default-deny command policy.
//!
//! Every command string an agent wants to run is judged here before any
//! process is spawned. The decision is a pure function of the command text:
//! no filesystem access, no environment reads, no state carried between
//! calls. Stages run in a fixed order and the first rejection is final:
//!
//! 1. metacharacter veto - closes the general injection class
//! 2. allowlist match - the command must fit a known tool/subcommand rule
//! 3. privilege-escalation veto - `sudo`, `su`, chmod-with-mode
//! 4. path-traversal veto - `..`, `/etc/`, `/root/`
//!
//! The vetoes in 3 and 4 run even for allowlisted commands: a matched tool
//! can still smuggle dangerous arguments past its pattern.

use std::sync::LazyLock;

use regex_lite::Regex;
use serde::Deserialize;

/// Characters that reject a command outright, allowlisted or not.
pub const COMMAND_METACHARACTERS: &[char] = &[
    ';', '&', '|', '`', '$', '(', ')', '{', '}', '>', '<', '\\', '~', '*', '[', ']', '!',
];

/// Argument tokens for bare tools must stay inside this shape. Shell
/// metacharacters are already gone by the time this is consulted, so the
/// class only has to keep arguments looking like flags, names, and paths.
#[allow(clippy::expect_used)]
static SAFE_ARG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^[A-Za-z0-9@%+=:,./'"_-]+$"#).expect("safe-arg pattern is valid")
});

/// Matches a chmod mode argument, numeric (`755`) or symbolic (`u+x`).
#[allow(clippy::expect_used)]
static CHMOD_MODE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:[0-7]{3,4}|[ugoa]*[+-=][rwxXst]+)$").expect("chmod-mode pattern is valid")
});

/// Outcome of validating one command string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyDecision {
    pub allowed: bool,
    /// Human-readable rejection reason, suitable for verbatim display.
    pub reason: Option<String>,
}

impl PolicyDecision {
    fn allow() -> Self {
        Self {
            allowed: true,
            reason: None,
        }
    }

    fn deny(reason: impl Into<String>) -> Self {
        Self {
            allowed: false,
            reason: Some(reason.into()),
        }
    }
}

/// Shape constraint on the arguments that follow a rule's program (and
/// subcommand, if it has one).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ArgShape {
    /// No arguments at all.
    None,
    /// Every argument token must match the content-safe class.
    #[default]
    Safe,
}

/// One allowlist entry: a program, the closed set of subcommands it may be
/// invoked with, and the shape its remaining arguments must take.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ToolRule {
    pub program: String,
    /// Empty means the program takes no subcommand.
    #[serde(default)]
    pub subcommands: Vec<String>,
    #[serde(default)]
    pub arg_shape: ArgShape,
}

impl ToolRule {
    fn with_subcommands(program: &str, subcommands: &[&str]) -> Self {
        Self {
            program: program.to_string(),
            subcommands: subcommands.iter().map(|s| s.to_string()).collect(),
            arg_shape: ArgShape::Safe,
        }
    }

    fn bare(program: &str, arg_shape: ArgShape) -> Self {
        Self {
            program: program.to_string(),
            subcommands: Vec::new(),
            arg_shape,
        }
    }

    /// Whether the whitespace-split `tokens` of a command fit this rule.
    pub fn matches(&self, tokens: &[&str]) -> bool {
        let Some((program, rest)) = tokens.split_first() else {
            return false;
        };
        if *program != self.program {
            return false;
        }

        let args = if self.subcommands.is_empty() {
            rest
        } else {
            match rest.split_first() {
                Some((sub, args)) if self.subcommands.iter().any(|s| s == sub) => args,
                _ => return false,
            }
        };

        match self.arg_shape {
            ArgShape::None => args.is_empty(),
            ArgShape::Safe => args.iter().all(|arg| SAFE_ARG.is_match(arg)),
        }
    }
}

/// The enumerable allowlist. Deserializable so a deployment can supply its
/// own table; [`PolicyTable::default`] is the built-in policy.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PolicyTable {
    pub rules: Vec<ToolRule>,
}

impl Default for PolicyTable {
    fn default() -> Self {
        const PACKAGE_MANAGER_SUBCOMMANDS: &[&str] =
            &["install", "test", "run", "build", "start"];
        Self {
            rules: vec![
                ToolRule::with_subcommands(
                    "git",
                    &[
                        "status", "log", "diff", "show", "branch", "checkout", "add", "commit",
                        "push", "pull", "fetch",
                    ],
                ),
                ToolRule::with_subcommands("npm", PACKAGE_MANAGER_SUBCOMMANDS),
                ToolRule::with_subcommands("yarn", PACKAGE_MANAGER_SUBCOMMANDS),
                ToolRule::with_subcommands("pnpm", PACKAGE_MANAGER_SUBCOMMANDS),
                ToolRule::with_subcommands(
                    "cargo",
                    &["build", "check", "test", "run", "fmt", "clippy"],
                ),
                ToolRule::bare("ls", ArgShape::Safe),
                ToolRule::bare("pwd", ArgShape::None),
                ToolRule::bare("echo", ArgShape::Safe),
                ToolRule::bare("cat", ArgShape::Safe),
            ],
        }
    }
}

impl PolicyTable {
    /// Decide whether `command` may execute. Pure and total.
    pub fn decide(&self, command: &str) -> PolicyDecision {
        if let Some(c) = command
            .chars()
            .find(|c| COMMAND_METACHARACTERS.contains(c))
        {
            return PolicyDecision::deny(format!("shell metacharacter `{c}` is not allowed"));
        }

        let tokens: Vec<&str> = command.split_whitespace().collect();
        if !self.rules.iter().any(|rule| rule.matches(&tokens)) {
            return PolicyDecision::deny("command is not on the allowlist");
        }

        if let Some(reason) = privilege_escalation_reason(command, &tokens) {
            return PolicyDecision::deny(reason);
        }

        for needle in ["..", "/etc/", "/root/"] {
            if command.contains(needle) {
                return PolicyDecision::deny(format!(
                    "path traversal pattern `{needle}` is not allowed"
                ));
            }
        }

        PolicyDecision::allow()
    }
}

fn privilege_escalation_reason(command: &str, tokens: &[&str]) -> Option<String> {
    if command.contains("sudo") {
        return Some("privilege escalation via `sudo` is not allowed".to_string());
    }
    if tokens.contains(&"su") {
        return Some("privilege escalation via `su` is not allowed".to_string());
    }
    if let Some(pos) = tokens.iter().position(|t| *t == "chmod")
        && tokens[pos + 1..].iter().any(|t| CHMOD_MODE.is_match(t))
    {
        return Some("changing file permissions with `chmod` is not allowed".to_string());
    }
    None
}
