//! Stage 4: fit the classifier on the training features.

use crate::data::DataTable;
use crate::error::{StageError, StageResultExt};
use crate::stages::{Stage, StageContext};
use crate::training::{Classifier, LogisticRegression, TrainingData, save_model};

const STAGE: Stage = Stage::ModelTraining;

pub async fn run(ctx: &StageContext) -> Result<LogisticRegression, StageError> {
    ctx.observe(STAGE, async {
        let params = ctx.load_params(STAGE)?;

        let table = DataTable::read_csv(&ctx.layout.train_bow)
            .await
            .in_stage(STAGE, "load_data")?;
        let data = TrainingData::from_table(&table).in_stage(STAGE, "load_data")?;
        ctx.step(
            STAGE,
            &format!(
                "Training on {} rows x {} features",
                data.len(),
                data.x.ncols()
            ),
        );

        let mut model = LogisticRegression::new(params.model_building);
        model.fit(&data.x, &data.y).in_stage(STAGE, "train_model")?;
        if let Some(weights) = model.weights() {
            ctx.step(
                STAGE,
                &format!(
                    "Solver finished after {} iterations (converged: {})",
                    weights.n_iter, weights.converged
                ),
            );
        }

        save_model(&model, &ctx.layout.model).in_stage(STAGE, "save_model")?;
        ctx.artifact(STAGE, &ctx.layout.model);
        Ok(model)
    })
    .await
}
