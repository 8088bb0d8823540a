//! Stage 1: fetch the raw dataset, keep two classes and split it.

use crate::data::{DataTable, DatasetSource, LabelMapping, filter_sentiments, train_test_split};
use crate::error::{StageError, StageResultExt};
use crate::stages::{Stage, StageContext};
use std::path::Path;

const STAGE: Stage = Stage::DataIngestion;

/// Row counts written by the stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestionSummary {
    pub train_rows: usize,
    pub test_rows: usize,
}

pub async fn run(ctx: &StageContext) -> Result<IngestionSummary, StageError> {
    ctx.observe(STAGE, async {
        let params = ctx.load_params(STAGE)?;
        let test_size = params.data_ingestion.test_size;

        let source = DatasetSource::parse(&ctx.config.ingestion.source, ctx.workspace());
        let raw = source.load().await.in_stage(STAGE, "load_data")?;
        ctx.step(
            STAGE,
            &format!("Loaded {} rows from {}", raw.row_count(), source.location()),
        );

        let mapping = LabelMapping::from_config(&ctx.config.ingestion);
        let filtered = filter_sentiments(raw, &mapping).in_stage(STAGE, "preprocess_data")?;
        ctx.step(
            STAGE,
            &format!(
                "Kept {} rows labelled {} or {}",
                filtered.row_count(),
                mapping.positive,
                mapping.negative
            ),
        );

        let (train, test) = train_test_split(filtered, test_size, ctx.config.ingestion.seed)
            .in_stage(STAGE, "train_test_split")?;

        save(ctx, &train, &ctx.layout.train_raw)?;
        save(ctx, &test, &ctx.layout.test_raw)?;
        ctx.step(
            STAGE,
            &format!(
                "Split into {} train and {} test rows (test_size = {test_size})",
                train.row_count(),
                test.row_count()
            ),
        );

        Ok(IngestionSummary {
            train_rows: train.row_count(),
            test_rows: test.row_count(),
        })
    })
    .await
}

fn save(ctx: &StageContext, table: &DataTable, path: &Path) -> Result<(), StageError> {
    table.write_csv(path).in_stage(STAGE, "save_data")?;
    ctx.artifact(STAGE, path);
    Ok(())
}
