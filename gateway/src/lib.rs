//! Root of the `aep-gateway` library.
//!
//! The one place in the system where agent-supplied input crosses into the
//! operating system. A command string goes through the policy validator,
//! then (if allowed) the sandboxed executor, and everything that comes back
//! out passes the redactor first.

// Prevent accidental direct writes to stdout/stderr in library code. All
// user-visible output must go through the tracing stack.
#![deny(clippy::print_stdout, clippy::print_stderr)]

pub mod config;
pub mod error;
pub mod exec;
pub mod exec_env;
pub mod policy;
pub mod redact;

pub use config::GatewayConfig;
pub use error::GatewayErr;
pub use error::Result;
pub use exec::ExecutionResult;
pub use exec::execute;
pub use policy::PolicyDecision;
pub use policy::PolicyTable;
pub use policy::ToolRule;
pub use redact::redact;
