//! Sequential driver for the whole pipeline.

use crate::error::StageError;
use crate::eval::ClassificationMetrics;
use crate::stages::ingestion::IngestionSummary;
use crate::stages::model_registration::RegisteredVersion;
use crate::stages::{
    StageContext, feature_engineering, ingestion, model_evaluation, model_registration,
    model_training, preprocessing,
};
use crate::tracking::{RunHandle, TrackingStore};

/// What a full run produced.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineReport {
    pub ingestion: IngestionSummary,
    pub vocabulary_size: usize,
    pub metrics: ClassificationMetrics,
    pub run: RunHandle,
    pub registered: Option<RegisteredVersion>,
}

/// Run every stage in order, stopping at the first failure.
///
/// Registration only runs when `register` is set.
pub async fn run_all(
    ctx: &StageContext,
    store: &dyn TrackingStore,
    register: bool,
) -> Result<PipelineReport, StageError> {
    let ingestion = ingestion::run(ctx).await?;
    preprocessing::run(ctx).await?;
    let vocabulary_size = feature_engineering::run(ctx).await?;
    model_training::run(ctx).await?;
    let evaluation = model_evaluation::run(ctx, store).await?;
    let registered = if register {
        Some(model_registration::run(ctx, store).await?)
    } else {
        None
    };

    Ok(PipelineReport {
        ingestion,
        vocabulary_size,
        metrics: evaluation.metrics,
        run: evaluation.run,
        registered,
    })
}
