//! Stage 2: normalize the text column of both raw splits.

use crate::data::DataTable;
use crate::error::{StageError, StageResultExt};
use crate::preprocess::{TextPipeline, blank_short_texts};
use crate::stages::{Stage, StageContext};
use std::path::Path;

const STAGE: Stage = Stage::Preprocessing;

/// Texts with fewer tokens than this are blanked when short-text removal is on.
pub const MIN_TOKENS: usize = 3;

pub async fn run(ctx: &StageContext) -> Result<(), StageError> {
    ctx.observe(STAGE, async {
        let layout = &ctx.layout;
        let mut train = DataTable::read_csv(&layout.train_raw)
            .await
            .in_stage(STAGE, "load_data")?;
        let mut test = DataTable::read_csv(&layout.test_raw)
            .await
            .in_stage(STAGE, "load_data")?;

        let pipeline = TextPipeline::standard();
        normalize(ctx, &pipeline, &mut train, "train")?;
        normalize(ctx, &pipeline, &mut test, "test")?;

        save(ctx, &train, &layout.train_processed)?;
        save(ctx, &test, &layout.test_processed)?;
        Ok(())
    })
    .await
}

fn normalize(
    ctx: &StageContext,
    pipeline: &TextPipeline,
    table: &mut DataTable,
    split: &str,
) -> Result<(), StageError> {
    let column = &ctx.config.ingestion.text_column;
    pipeline
        .normalize_column(table, column)
        .in_stage(STAGE, "normalize_text")?;

    if ctx.config.preprocessing.drop_short_texts {
        let blanked = blank_short_texts(table, column, MIN_TOKENS)
            .in_stage(STAGE, "remove_small_sentences")?;
        ctx.step(
            STAGE,
            &format!("Blanked {blanked} {split} texts shorter than {MIN_TOKENS} tokens"),
        );
    }
    ctx.step(
        STAGE,
        &format!("Normalized {} {split} texts", table.row_count()),
    );
    Ok(())
}

fn save(ctx: &StageContext, table: &DataTable, path: &Path) -> Result<(), StageError> {
    table.write_csv(path).in_stage(STAGE, "save_data")?;
    ctx.artifact(STAGE, path);
    Ok(())
}
