use thiserror::Error;

pub type Result<T> = std::result::Result<T, GatewayErr>;

#[derive(Error, Debug)]
pub enum GatewayErr {
    /// The policy validator denied the command before any process was
    /// spawned. Terminal for the request: retrying the identical string
    /// yields the identical decision. The display form carries the literal
    /// command and the reason so callers can surface both verbatim.
    #[error("command not allowed: `{command}`: {reason}")]
    CommandRejected { command: String, reason: String },

    /// Spawn error, non-zero exit, timeout, or output-budget overflow. The
    /// sub-cases are deliberately not distinguished beyond the message
    /// text, and the message has already been through the redactor.
    #[error("command failed: {0}")]
    ExecutionFailed(String),
}
