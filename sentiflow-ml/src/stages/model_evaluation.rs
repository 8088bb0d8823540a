//! Stage 5: score the model on the test split and record a tracking run.

use crate::data::DataTable;
use crate::error::{MlError, StageError, StageResultExt};
use crate::eval::{ClassificationMetrics, evaluate_model};
use crate::stages::{Stage, StageContext};
use crate::tracking::{RunHandle, RunStatus, TrackingStore};
use crate::training::{Classifier, LogisticRegression, TrainingData, load_model};
use sentiflow_core::persistence;
use serde::{Deserialize, Serialize};
use std::path::Path;

const STAGE: Stage = Stage::ModelEvaluation;

/// Artifact path the model is logged under inside a run.
pub const MODEL_ARTIFACT_PATH: &str = "model";

/// Contents of `experiment_info.json`: where the logged model lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExperimentInfo {
    pub run_id: String,
    pub model_path: String,
}

impl ExperimentInfo {
    pub fn load(path: &Path) -> Result<Self, MlError> {
        Ok(persistence::load_json(path)?)
    }

    pub fn save(&self, path: &Path) -> Result<(), MlError> {
        persistence::atomic_write_json(path, self)?;
        Ok(())
    }
}

/// What evaluation produced.
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationOutcome {
    pub metrics: ClassificationMetrics,
    pub run: RunHandle,
}

pub async fn run(
    ctx: &StageContext,
    store: &dyn TrackingStore,
) -> Result<EvaluationOutcome, StageError> {
    ctx.observe(STAGE, async {
        let layout = &ctx.layout;
        let model = load_model(&layout.model).in_stage(STAGE, "load_model")?;
        let table = DataTable::read_csv(&layout.test_bow)
            .await
            .in_stage(STAGE, "load_data")?;
        let data = TrainingData::from_table(&table).in_stage(STAGE, "load_data")?;

        let metrics = evaluate_model(&model, &data).in_stage(STAGE, "evaluate_model")?;
        ctx.step(
            STAGE,
            &format!(
                "accuracy {:.4}, precision {:.4}, recall {:.4}, auc {:.4} on {} rows",
                metrics.accuracy,
                metrics.precision,
                metrics.recall,
                metrics.auc,
                data.len()
            ),
        );
        let experiment = &ctx.config.tracking.experiment_name;
        let run = store
            .start_run(experiment)
            .await
            .in_stage(STAGE, "start_run")?;
        ctx.step(
            STAGE,
            &format!(
                "Started {} run {} in experiment {experiment}",
                store.backend(),
                run.run_id
            ),
        );

        match record_run(ctx, store, &run, &model, &metrics).await {
            Ok(()) => {
                store
                    .end_run(&run, RunStatus::Finished)
                    .await
                    .in_stage(STAGE, "end_run")?;
            }
            Err(err) => {
                // The run is closed as failed; the original error still wins.
                if let Err(end_err) = store.end_run(&run, RunStatus::Failed).await {
                    tracing::warn!(
                        run_id = %run.run_id,
                        error = %end_err,
                        "Could not mark run as failed"
                    );
                }
                discard_outputs(ctx);
                return Err(err);
            }
        }
        Ok(EvaluationOutcome { metrics, run })
    })
    .await
}

async fn record_run(
    ctx: &StageContext,
    store: &dyn TrackingStore,
    run: &RunHandle,
    model: &LogisticRegression,
    metrics: &ClassificationMetrics,
) -> Result<(), StageError> {
    let layout = &ctx.layout;
    store
        .log_metrics(run, &metrics.entries())
        .await
        .in_stage(STAGE, "log_metrics")?;
    store
        .log_params(run, &model.params())
        .await
        .in_stage(STAGE, "log_params")?;
    store
        .log_model(run, &layout.model, MODEL_ARTIFACT_PATH)
        .await
        .in_stage(STAGE, "log_model")?;

    persistence::atomic_write_json(&layout.metrics, metrics).in_stage(STAGE, "save_metrics")?;
    ctx.artifact(STAGE, &layout.metrics);

    let info = ExperimentInfo {
        run_id: run.run_id.clone(),
        model_path: MODEL_ARTIFACT_PATH.to_string(),
    };
    info.save(&layout.experiment_info)
        .in_stage(STAGE, "save_model_info")?;
    ctx.artifact(STAGE, &layout.experiment_info);

    store
        .log_artifact(run, &layout.metrics)
        .await
        .in_stage(STAGE, "log_artifact")?;
    Ok(())
}

/// Remove the reports of a run that did not finish, so a failed stage leaves
/// no metrics or model info behind.
fn discard_outputs(ctx: &StageContext) {
    for path in [&ctx.layout.metrics, &ctx.layout.experiment_info] {
        match std::fs::remove_file(path) {
            Ok(()) => tracing::debug!(path = %path.display(), "Removed output of failed run"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(path = %path.display(), error = %e, "Could not remove output"),
        }
    }
}
