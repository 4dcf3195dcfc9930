//! Spawns one approved command with bounded resources.
//!
//! Validation strictly precedes spawning: a denied command never reaches
//! the process table. Approved commands run with the workspace root as
//! their working directory, the sanitized environment (nothing inherited),
//! stdin closed, and hard wall-clock/output budgets from [`GatewayConfig`].

use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::time::Duration;
use std::time::Instant;

use tokio::io::AsyncRead;
use tokio::io::AsyncReadExt;
use tokio::io::BufReader;
use tokio::process::Command;

use crate::config::GatewayConfig;
use crate::error::GatewayErr;
use crate::error::Result;
use crate::exec_env::create_env;
use crate::redact::redact;

/// Bounded, redacted output of one successful execution.
#[derive(Debug)]
pub struct ExecutionResult {
    /// Trailing window of stdout plus a labeled `[stderr]` block, at most
    /// `tail_limit` characters.
    pub output: String,
    /// Whether earlier output was discarded to fit the window.
    pub truncated: bool,
    pub duration: Duration,
}

/// Validate `command` and, if allowed, run it under `workspace_root`.
///
/// Fails with [`GatewayErr::CommandRejected`] on policy denial and
/// [`GatewayErr::ExecutionFailed`] on spawn error, non-zero exit, timeout,
/// or output-budget overflow. Every failure message crosses the redactor
/// before it is surfaced.
pub async fn execute(
    workspace_root: &Path,
    command: &str,
    config: &GatewayConfig,
) -> Result<ExecutionResult> {
    let decision = config.policy.decide(command);
    if !decision.allowed {
        let reason = decision
            .reason
            .unwrap_or_else(|| "not allowed".to_string());
        tracing::warn!("rejected command `{command}`: {reason}");
        return Err(GatewayErr::CommandRejected {
            command: command.to_string(),
            reason,
        });
    }

    // Metacharacters are gone by now, so this split is over plain words and
    // quoted fragments; the argv is handed to the OS without a shell.
    let argv = shlex::split(command)
        .ok_or_else(|| execution_failed("command could not be split into arguments"))?;
    let Some((program, args)) = argv.split_first() else {
        return Err(execution_failed("command is empty"));
    };

    tracing::debug!(
        "spawning `{program}` with {} arg(s) in {}",
        args.len(),
        workspace_root.display()
    );

    let start = Instant::now();
    let mut child = Command::new(program)
        .args(args)
        .current_dir(workspace_root)
        .env_clear()
        .envs(create_env())
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| execution_failed(&e.to_string()))?;

    let stdout_reader = child
        .stdout
        .take()
        .ok_or_else(|| execution_failed("stdout pipe was unexpectedly not available"))?;
    let stderr_reader = child
        .stderr
        .take()
        .ok_or_else(|| execution_failed("stderr pipe was unexpectedly not available"))?;

    // One byte budget shared across both streams.
    let used = Arc::new(AtomicUsize::new(0));
    let stdout_handle = tokio::spawn(read_capped(
        BufReader::new(stdout_reader),
        Arc::clone(&used),
        config.max_output_bytes,
    ));
    let stderr_handle = tokio::spawn(read_capped(
        BufReader::new(stderr_reader),
        Arc::clone(&used),
        config.max_output_bytes,
    ));

    let exit_status = match tokio::time::timeout(config.timeout(), child.wait()).await {
        Ok(Ok(exit_status)) => exit_status,
        Ok(Err(e)) => return Err(execution_failed(&e.to_string())),
        Err(_) => {
            child
                .start_kill()
                .map_err(|e| execution_failed(&e.to_string()))?;
            tracing::warn!("command timed out after {}ms: `{command}`", config.timeout_ms);
            return Err(execution_failed(&format!(
                "command timed out after {}ms",
                config.timeout_ms
            )));
        }
    };

    let stdout = stdout_handle
        .await
        .map_err(|e| execution_failed(&e.to_string()))?
        .map_err(|e| execution_failed(&e.to_string()))?;
    let stderr = stderr_handle
        .await
        .map_err(|e| execution_failed(&e.to_string()))?
        .map_err(|e| execution_failed(&e.to_string()))?;

    if stdout.exceeded || stderr.exceeded {
        tracing::warn!("command output exceeded {} bytes", config.max_output_bytes);
        return Err(execution_failed(&format!(
            "command output exceeded {} bytes",
            config.max_output_bytes
        )));
    }

    let stdout_text = String::from_utf8_lossy(&stdout.bytes);
    let stderr_text = String::from_utf8_lossy(&stderr.bytes);

    if !exit_status.success() {
        let code = exit_status.code().unwrap_or(-1);
        let (stderr_tail, _) = tail_chars(&redact(&stderr_text), config.tail_limit);
        let message = if stderr_tail.is_empty() {
            format!("command exited with code {code}")
        } else {
            format!("command exited with code {code}: {stderr_tail}")
        };
        return Err(GatewayErr::ExecutionFailed(message));
    }

    let mut combined = stdout_text.into_owned();
    if !stderr_text.is_empty() {
        combined.push_str("\n[stderr]\n");
        combined.push_str(&redact(&stderr_text));
    }
    let (output, truncated) = tail_chars(&combined, config.tail_limit);

    Ok(ExecutionResult {
        output,
        truncated,
        duration: start.elapsed(),
    })
}

fn execution_failed(message: &str) -> GatewayErr {
    GatewayErr::ExecutionFailed(redact(message))
}

struct CappedStream {
    bytes: Vec<u8>,
    exceeded: bool,
}

/// Reads one stream to EOF, buffering only while the shared budget holds.
/// Once the budget is blown the stream keeps draining so the child is not
/// blocked on a full pipe, but nothing further is kept.
async fn read_capped<R: AsyncRead + Unpin + Send + 'static>(
    mut reader: R,
    used: Arc<AtomicUsize>,
    budget: usize,
) -> std::io::Result<CappedStream> {
    let mut bytes = Vec::with_capacity(budget.min(8 * 1024));
    let mut tmp = [0u8; 8192];
    let mut exceeded = false;

    loop {
        let n = reader.read(&mut tmp).await?;
        if n == 0 {
            break;
        }
        if !exceeded {
            let total = used.fetch_add(n, Ordering::Relaxed) + n;
            if total > budget {
                exceeded = true;
            } else {
                bytes.extend_from_slice(&tmp[..n]);
            }
        }
    }

    Ok(CappedStream { bytes, exceeded })
}

/// Trailing window of at most `limit` characters.
fn tail_chars(text: &str, limit: usize) -> (String, bool) {
    let total = text.chars().count();
    if total <= limit {
        return (text.to_string(), false);
    }
    let start = text
        .char_indices()
        .nth(total - limit)
        .map(|(idx, _)| idx)
        .unwrap_or(0);
    (text[start..].to_string(), true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn tail_window_keeps_the_end() {
        let (out, truncated) = tail_chars("abcdef", 4);
        assert_eq!(out, "cdef");
        assert!(truncated);

        let (out, truncated) = tail_chars("abc", 4);
        assert_eq!(out, "abc");
        assert!(!truncated);
    }

    #[test]
    fn tail_window_respects_char_boundaries() {
        let (out, truncated) = tail_chars("héllo wörld", 5);
        assert_eq!(out, "wörld");
        assert!(truncated);
    }
}
