//! Stage 6: register the evaluated model and move it to its stage.

use crate::error::{StageError, StageResultExt};
use crate::stages::model_evaluation::ExperimentInfo;
use crate::stages::{Stage, StageContext};
use crate::tracking::{ModelUri, TrackingStore};

const STAGE: Stage = Stage::ModelRegistration;

/// The registry entry created by the stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisteredVersion {
    pub name: String,
    pub version: String,
    pub stage: String,
}

pub async fn run(
    ctx: &StageContext,
    store: &dyn TrackingStore,
) -> Result<RegisteredVersion, StageError> {
    ctx.observe(STAGE, async {
        let info = ExperimentInfo::load(&ctx.layout.experiment_info)
            .in_stage(STAGE, "load_model_info")?;
        let model_uri = ModelUri::new(info.run_id, info.model_path).to_string();

        let registry = &ctx.config.registry;
        let version = store
            .register_model(&model_uri, &registry.model_name)
            .await
            .in_stage(STAGE, "register_model")?;
        ctx.step(
            STAGE,
            &format!(
                "Registered {model_uri} as {} version {version}",
                registry.model_name
            ),
        );

        store
            .transition_stage(&registry.model_name, &version, &registry.stage)
            .await
            .in_stage(STAGE, "transition_stage")?;
        ctx.step(
            STAGE,
            &format!(
                "{} version {version} transitioned to {}",
                registry.model_name, registry.stage
            ),
        );

        Ok(RegisteredVersion {
            name: registry.model_name.clone(),
            version,
            stage: registry.stage.clone(),
        })
    })
    .await
}
