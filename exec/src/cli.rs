use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(version)]
pub struct Cli {
    /// Workspace root that commands run in and edit paths resolve against.
    #[arg(long = "cd", short = 'C', value_name = "DIR", default_value = ".")]
    pub workspace_root: PathBuf,

    /// Load gateway bounds and the command allowlist from a TOML file.
    #[arg(long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Override the execution timeout.
    #[arg(long = "timeout-seconds", value_name = "SECONDS")]
    pub timeout_seconds: Option<u64>,

    /// Apply an annotation edit to these files instead of running a command.
    #[arg(long = "edit", value_name = "FILE", num_args = 1..)]
    pub edit: Vec<PathBuf>,

    /// Note to embed in the annotation marker (with --edit).
    #[arg(long = "note", value_name = "TEXT", requires = "edit")]
    pub note: Option<String>,

    /// Command to validate and execute.
    pub command: Option<String>,
}
