//! # sentiflow-ml: the stages of the sentiflow pipeline
//!
//! A linear pipeline for binary tweet sentiment:
//!
//! 1. **Ingestion** ([`stages::ingestion`]): load the raw CSV, keep two
//!    classes, split train/test with a fixed seed.
//! 2. **Preprocessing** ([`stages::preprocessing`]): the fixed text
//!    normalization chain of [`preprocess::TextPipeline`].
//! 3. **Feature engineering** ([`stages::feature_engineering`]): bag-of-words
//!    counts fitted on the training split.
//! 4. **Training** ([`stages::model_training`]): logistic regression.
//! 5. **Evaluation** ([`stages::model_evaluation`]): metrics plus a tracking run.
//! 6. **Registration** ([`stages::model_registration`]): optional promotion in
//!    the model registry.
//!
//! Stages communicate only through files laid out by [`ArtifactLayout`].

pub mod artifacts;
pub mod data;
pub mod error;
pub mod eval;
pub mod features;
pub mod observer;
pub mod pipeline;
pub mod preprocess;
pub mod stages;
pub mod tracking;
pub mod training;

pub use artifacts::ArtifactLayout;
pub use error::{MlError, StageError, StageResultExt};
pub use observer::{RecordingObserver, StageEvent, StageObserver, TracingObserver};
pub use pipeline::{PipelineReport, run_all};
pub use stages::{Stage, StageContext};
pub use tracking::{TrackingStore, open_store};
