//! sentiflow CLI: one subcommand per pipeline stage.
//!
//! Each stage is meant to be invoked as its own process by an external DAG
//! runner; `sentiflow run` chains them for local use.

mod commands;

use clap::Parser;
use sentiflow_core::logging::init_logging;
use std::path::PathBuf;

/// Tweet sentiment pipeline: ingest, clean, vectorize, train, evaluate, register
#[derive(Parser, Debug)]
#[command(name = "sentiflow", version, about, long_about = None)]
struct Cli {
    /// Workspace directory (artifacts are written below it)
    #[arg(short, long, default_value = ".")]
    workspace: PathBuf,

    /// Parameters file [default: <workspace>/params.yaml]
    #[arg(short, long)]
    params: Option<PathBuf>,

    /// Configuration file path [default: <workspace>/sentiflow.toml]
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
enum Commands {
    /// Load the raw dataset, keep two classes and split train/test
    Ingest,
    /// Normalize the text column of both splits
    Preprocess,
    /// Fit the bag-of-words vocabulary and write count matrices
    Featurize,
    /// Fit the logistic regression classifier
    Train,
    /// Score the model on the test split and log the run
    Evaluate,
    /// Register the evaluated model and move it to the target stage
    Register,
    /// Run every stage in order
    Run {
        /// Also register the model after evaluation
        #[arg(long)]
        register: bool,
    },
}

impl Commands {
    /// Whether the command talks to the tracking server.
    fn needs_tracking(&self) -> bool {
        matches!(self, Self::Evaluate | Self::Register | Self::Run { .. })
    }
}

fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let workspace = cli
        .workspace
        .canonicalize()
        .map_err(|e| anyhow::anyhow!("Workspace {}: {}", cli.workspace.display(), e))?;

    let config = sentiflow_core::load_config(&workspace, cli.config.as_deref())
        .map_err(|e| anyhow::anyhow!("Configuration error: {}", e))?;

    let log_dir = config
        .logging
        .file
        .then(|| workspace.join(&config.logging.log_dir));
    let _log_guard = init_logging(cli.verbose, cli.quiet, log_dir.as_deref());

    let params_path = cli
        .params
        .clone()
        .unwrap_or_else(|| workspace.join("params.yaml"));

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(commands::handle_command(
        cli.command,
        &workspace,
        params_path,
        config,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_stage_subcommand() {
        let cli = Cli::try_parse_from(["sentiflow", "-w", "/tmp/ws", "-vv", "train"]).unwrap();
        assert_eq!(cli.command, Commands::Train);
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.workspace, PathBuf::from("/tmp/ws"));
        assert!(cli.params.is_none());
        assert!(!cli.command.needs_tracking());
    }

    #[test]
    fn test_parse_run_with_register() {
        let cli = Cli::try_parse_from([
            "sentiflow",
            "--params",
            "p.yaml",
            "run",
            "--register",
        ])
        .unwrap();
        assert_eq!(cli.command, Commands::Run { register: true });
        assert_eq!(cli.params, Some(PathBuf::from("p.yaml")));
        assert!(cli.command.needs_tracking());
    }

    #[test]
    fn test_subcommand_required() {
        assert!(Cli::try_parse_from(["sentiflow"]).is_err());
    }
}
