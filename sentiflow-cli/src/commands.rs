//! Subcommand handlers.

use crate::Commands;
use sentiflow_core::PipelineConfig;
use sentiflow_ml::stages::{
    feature_engineering, ingestion, model_evaluation, model_registration, model_training,
    preprocessing,
};
use sentiflow_ml::{StageContext, TracingObserver, TrackingStore, open_store, run_all};
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub async fn handle_command(
    command: Commands,
    workspace: &Path,
    params_path: PathBuf,
    config: PipelineConfig,
) -> anyhow::Result<()> {
    // Missing credentials abort before any stage work starts.
    let store = if command.needs_tracking() {
        let credentials = config
            .tracking
            .credentials()
            .map_err(|e| anyhow::anyhow!("Tracking credentials: {}", e))?;
        Some(open_store(&config.tracking, credentials, workspace)?)
    } else {
        None
    };

    let ctx = StageContext::new(workspace, params_path, config, Arc::new(TracingObserver));
    tracing::debug!(workspace = %workspace.display(), command = ?command, "Starting");

    match command {
        Commands::Ingest => {
            let summary = ingestion::run(&ctx).await?;
            println!(
                "Split {} rows into {} train / {} test",
                summary.train_rows + summary.test_rows,
                summary.train_rows,
                summary.test_rows
            );
        }
        Commands::Preprocess => {
            preprocessing::run(&ctx).await?;
            println!(
                "Normalized text written to {}",
                ctx.layout.train_processed.display()
            );
        }
        Commands::Featurize => {
            let vocabulary = feature_engineering::run(&ctx).await?;
            println!("Vocabulary size: {vocabulary}");
        }
        Commands::Train => {
            model_training::run(&ctx).await?;
            println!("Model saved to {}", ctx.layout.model.display());
        }
        Commands::Evaluate => {
            let store = tracking_store(store)?;
            let outcome = model_evaluation::run(&ctx, store.as_ref()).await?;
            for (name, value) in outcome.metrics.entries() {
                println!("{name:>10}: {value:.4}");
            }
            println!("Run: {}", outcome.run.run_id);
        }
        Commands::Register => {
            let store = tracking_store(store)?;
            let registered = model_registration::run(&ctx, store.as_ref()).await?;
            println!(
                "Registered {} version {} ({})",
                registered.name, registered.version, registered.stage
            );
        }
        Commands::Run { register } => {
            let store = tracking_store(store)?;
            let report = run_all(&ctx, store.as_ref(), register).await?;
            println!(
                "{} train / {} test rows, {} features",
                report.ingestion.train_rows, report.ingestion.test_rows, report.vocabulary_size
            );
            for (name, value) in report.metrics.entries() {
                println!("{name:>10}: {value:.4}");
            }
            println!("Run: {}", report.run.run_id);
            if let Some(registered) = report.registered {
                println!(
                    "Registered {} version {} ({})",
                    registered.name, registered.version, registered.stage
                );
            }
        }
    }
    Ok(())
}

fn tracking_store(
    store: Option<Box<dyn TrackingStore>>,
) -> anyhow::Result<Box<dyn TrackingStore>> {
    store.ok_or_else(|| anyhow::anyhow!("tracking store not configured"))
}
