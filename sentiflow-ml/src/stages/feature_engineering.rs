//! Stage 3: bag-of-words features for both splits.

use crate::data::DataTable;
use crate::error::{StageError, StageResultExt};
use crate::features::{CountVectorizer, Vectorizer, apply_bow};
use crate::stages::{Stage, StageContext};

const STAGE: Stage = Stage::FeatureEngineering;

/// Returns the fitted vocabulary size.
pub async fn run(ctx: &StageContext) -> Result<usize, StageError> {
    ctx.observe(STAGE, async {
        let params = ctx.load_params(STAGE)?;
        let max_features = params.feature_engineering.max_features;

        let layout = &ctx.layout;
        let train = DataTable::read_csv(&layout.train_processed)
            .await
            .in_stage(STAGE, "load_data")?;
        let test = DataTable::read_csv(&layout.test_processed)
            .await
            .in_stage(STAGE, "load_data")?;

        let ingestion = &ctx.config.ingestion;
        let mut vectorizer = CountVectorizer::new(Some(max_features));
        let (train_bow, test_bow) = apply_bow(
            &mut vectorizer,
            &train,
            &test,
            &ingestion.text_column,
            &ingestion.label_column,
        )
        .in_stage(STAGE, "apply_bow")?;
        let vocabulary = vectorizer.vocabulary_size();
        ctx.step(
            STAGE,
            &format!("Fitted vocabulary of {vocabulary} tokens (max_features = {max_features})"),
        );

        for (table, path) in [(&train_bow, &layout.train_bow), (&test_bow, &layout.test_bow)] {
            table.write_csv(path).in_stage(STAGE, "save_data")?;
            ctx.artifact(STAGE, path);
        }
        Ok(vocabulary)
    })
    .await
}
