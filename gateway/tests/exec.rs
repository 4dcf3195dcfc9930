#![allow(clippy::unwrap_used)]

use std::time::Duration;
use std::time::Instant;

use aep_gateway::GatewayConfig;
use aep_gateway::GatewayErr;
use aep_gateway::execute;
use pretty_assertions::assert_eq;
use tempfile::TempDir;

/// Config whose policy additionally allows the given bare programs, so the
/// suite can exercise bounds with tools the production table leaves out.
fn config_allowing(programs: &[&str]) -> GatewayConfig {
    let extra = programs
        .iter()
        .map(|p| format!("[[policy.rules]]\nprogram = \"{p}\"\n"))
        .collect::<String>();
    let mut cfg = GatewayConfig::from_toml_str(&extra).unwrap();
    let mut policy = aep_gateway::PolicyTable::default();
    policy.rules.append(&mut cfg.policy.rules);
    cfg.policy = policy;
    cfg
}

#[tokio::test]
async fn runs_an_allowlisted_command_in_the_workspace() {
    let workspace = TempDir::new().unwrap();
    let result = execute(workspace.path(), "echo hello", &GatewayConfig::default())
        .await
        .unwrap();
    assert_eq!(result.output, "hello\n");
    assert!(!result.truncated);
}

#[tokio::test]
async fn working_directory_is_the_workspace_root() {
    let workspace = TempDir::new().unwrap();
    let result = execute(workspace.path(), "pwd", &GatewayConfig::default())
        .await
        .unwrap();
    let expected = workspace.path().canonicalize().unwrap();
    assert_eq!(result.output.trim_end(), expected.to_str().unwrap());
}

#[tokio::test]
async fn denied_commands_fail_without_spawning() {
    let workspace = TempDir::new().unwrap();
    let err = execute(workspace.path(), "curl http://evil", &GatewayConfig::default())
        .await
        .unwrap_err();
    match err {
        GatewayErr::CommandRejected { command, reason } => {
            assert_eq!(command, "curl http://evil");
            assert_eq!(reason, "command is not on the allowlist");
        }
        other => panic!("expected CommandRejected, got {other:?}"),
    }
}

#[tokio::test]
async fn nonzero_exit_surfaces_a_redacted_failure() {
    let workspace = TempDir::new().unwrap();
    let err = execute(
        workspace.path(),
        "cat /no-such-file-for-gateway-test",
        &GatewayConfig::default(),
    )
    .await
    .unwrap_err();
    match err {
        GatewayErr::ExecutionFailed(message) => {
            assert!(message.contains("exited with code"), "message: {message}");
            assert!(
                !message.contains("/no-such-file-for-gateway-test"),
                "path leaked into: {message}"
            );
        }
        other => panic!("expected ExecutionFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn timeout_kills_the_child_and_fails() {
    let workspace = TempDir::new().unwrap();
    let mut cfg = config_allowing(&["sleep"]);
    cfg.timeout_ms = 500;

    let start = Instant::now();
    let err = execute(workspace.path(), "sleep 10", &cfg).await.unwrap_err();
    let elapsed = start.elapsed();

    match err {
        GatewayErr::ExecutionFailed(message) => {
            assert!(message.contains("timed out"), "message: {message}");
        }
        other => panic!("expected ExecutionFailed, got {other:?}"),
    }
    assert!(
        elapsed < Duration::from_secs(5),
        "timeout took {elapsed:?}, expected bounded overhead over 500ms"
    );
}

#[tokio::test]
async fn output_over_budget_is_a_failure_not_truncation() {
    let workspace = TempDir::new().unwrap();
    let mut cfg = GatewayConfig::default();
    cfg.max_output_bytes = 1024;

    let big = "a".repeat(4096);
    let err = execute(workspace.path(), &format!("echo {big}"), &cfg)
        .await
        .unwrap_err();
    match err {
        GatewayErr::ExecutionFailed(message) => {
            assert!(message.contains("exceeded"), "message: {message}");
        }
        other => panic!("expected ExecutionFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn long_output_returns_only_the_trailing_window() {
    let workspace = TempDir::new().unwrap();
    let mut cfg = GatewayConfig::default();
    cfg.tail_limit = 10;

    let result = execute(
        workspace.path(),
        &format!("echo {}", "x".repeat(100)),
        &cfg,
    )
    .await
    .unwrap();
    assert!(result.truncated);
    assert_eq!(result.output.chars().count(), 10);
    assert!(result.output.ends_with("x\n"));
}

#[tokio::test]
async fn host_environment_does_not_leak_into_children() {
    // SAFETY: test-only mutation of this process's environment.
    unsafe {
        std::env::set_var("AEP_GATEWAY_TEST_TOKEN", "super-secret");
    }
    let workspace = TempDir::new().unwrap();
    let result = execute(workspace.path(), "env", &config_allowing(&["env"]))
        .await
        .unwrap();
    assert!(
        !result.output.contains("AEP_GATEWAY_TEST_TOKEN"),
        "secret leaked: {}",
        result.output
    );
    assert!(result.output.contains("PATH="), "PATH missing: {}", result.output);
}
