//! Headless front end for the gateway: validate and run one command, or
//! apply one annotation-edit batch, then exit.

mod cli;

use std::path::Path;

use anyhow::Context;
pub use cli::Cli;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use aep_apply_edits::apply_edits;
use aep_gateway::GatewayConfig;
use aep_gateway::execute;

pub async fn run_main(cli: Cli) -> anyhow::Result<()> {
    let default_level = "error";
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .or_else(|_| EnvFilter::try_new(default_level))
                .unwrap_or_default(),
        )
        .with_writer(std::io::stderr)
        .try_init();

    let Cli {
        workspace_root,
        config,
        timeout_seconds,
        edit,
        note,
        command,
    } = cli;

    let mut gateway_config = match config {
        Some(path) => {
            let contents = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config {}", path.display()))?;
            GatewayConfig::from_toml_str(&contents)
                .with_context(|| format!("failed to parse config {}", path.display()))?
        }
        None => GatewayConfig::default(),
    };
    if let Some(seconds) = timeout_seconds {
        gateway_config.timeout_ms = seconds.saturating_mul(1_000);
    }
    debug!("gateway config: {gateway_config:?}");

    if !edit.is_empty() {
        let files: Vec<&Path> = edit.iter().map(|p| p.as_path()).collect();
        let confirmation =
            apply_edits(&workspace_root, &files, note.as_deref().unwrap_or_default()).await;
        println!("{confirmation}");
        return Ok(());
    }

    let Some(command) = command else {
        anyhow::bail!("nothing to do: pass a command, or --edit with --note");
    };

    match execute(&workspace_root, &command, &gateway_config).await {
        Ok(result) => {
            println!("{}", result.output);
            if result.truncated {
                debug!("output truncated to the trailing window");
            }
            Ok(())
        }
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    }
}
