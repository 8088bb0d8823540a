//! End-to-end tests: every stage over a small dataset with the local tracker.

use std::path::Path;
use std::sync::Arc;

use pretty_assertions::assert_eq;
use sentiflow_core::config::{PipelineConfig, TrackingBackend};
use sentiflow_ml::data::{DataTable, LabelMapping, filter_sentiments, train_test_split};
use sentiflow_ml::stages::model_evaluation::ExperimentInfo;
use sentiflow_ml::stages::{
    feature_engineering, ingestion, model_evaluation, model_registration, model_training,
    preprocessing,
};
use sentiflow_ml::tracking::{LocalTrackingStore, RunStatus, open_store};
use sentiflow_ml::{MlError, RecordingObserver, Stage, StageContext, StageEvent, run_all};

const DATASET: &str = "\
tweet_id,sentiment,content
1,happiness,\"Had the BEST day at the beach with friends!! http://t.co/abc\"
2,happiness,\"so happy and excited, love this sunny weather :)\"
3,happiness,\"Loving the new song, great vibes all day\"
4,happiness,\"Celebrating with family tonight, feeling great and happy\"
5,happiness,\"What a wonderful morning, love you all #happy\"
6,sadness,feeling so sad and lonely tonight...
7,sadness,\"I miss my friends, this is awful and sad\"
8,sadness,\"Crying all day, worst news ever\"
9,sadness,\"so tired and depressed, nothing works\"
10,sadness,lost my dog today. heartbroken and sad
";

const PARAMS: &str = "\
data_ingestion:
  test_size: 0.2
feature_engineering:
  max_features: 50
model_building:
  c: 1.0
  max_iter: 200
";

fn has_both_classes(table: &DataTable) -> bool {
    let labels = table.column("sentiment").unwrap();
    labels.contains(&"0") && labels.contains(&"1")
}

fn split(dataset: &str, seed: u64) -> (DataTable, DataTable) {
    let table = DataTable::from_csv_str(dataset).unwrap();
    let filtered = filter_sentiments(table, &LabelMapping::default()).unwrap();
    train_test_split(filtered, 0.2, seed).unwrap()
}

fn workspace(dir: &Path, dataset: &str) -> (StageContext, Arc<RecordingObserver>) {
    std::fs::write(dir.join("tweets.csv"), dataset).unwrap();
    std::fs::write(dir.join("params.yaml"), PARAMS).unwrap();

    let mut config = PipelineConfig::default();
    config.ingestion.source = "tweets.csv".into();
    config.tracking.backend = TrackingBackend::Local;

    let observer = Arc::new(RecordingObserver::new());
    let ctx = StageContext::new(dir, dir.join("params.yaml"), config, observer.clone());
    (ctx, observer)
}

#[tokio::test]
async fn test_full_pipeline_with_local_tracker() {
    let dir = tempfile::tempdir().unwrap();
    let (ctx, observer) = workspace(dir.path(), DATASET);
    let store = open_store(&ctx.config.tracking, None, dir.path()).unwrap();

    let report = run_all(&ctx, store.as_ref(), true).await.unwrap();

    assert_eq!(report.ingestion.train_rows, 8);
    assert_eq!(report.ingestion.test_rows, 2);
    assert!(report.vocabulary_size > 0 && report.vocabulary_size <= 50);

    let layout = &ctx.layout;
    for path in [
        &layout.train_raw,
        &layout.test_raw,
        &layout.train_processed,
        &layout.test_processed,
        &layout.train_bow,
        &layout.test_bow,
        &layout.model,
        &layout.metrics,
        &layout.experiment_info,
    ] {
        assert!(path.exists(), "missing artifact {}", path.display());
    }

    // metrics.json holds exactly the four scores.
    let metrics: serde_json::Map<String, serde_json::Value> =
        serde_json::from_str(&std::fs::read_to_string(&layout.metrics).unwrap()).unwrap();
    let mut keys: Vec<&str> = metrics.keys().map(String::as_str).collect();
    keys.sort_unstable();
    assert_eq!(keys, vec!["accuracy", "auc", "precision", "recall"]);
    for value in metrics.values() {
        let v = value.as_f64().unwrap();
        assert!((0.0..=1.0).contains(&v));
    }

    let info = ExperimentInfo::load(&layout.experiment_info).unwrap();
    assert_eq!(info.run_id, report.run.run_id);
    assert_eq!(info.model_path, "model");

    let registered = report.registered.unwrap();
    assert_eq!(registered.name, "my_model");
    assert_eq!(registered.version, "1");
    assert_eq!(registered.stage, "Staging");

    let local = LocalTrackingStore::new(dir.path().join("mlruns"));
    let run = local.load_run(&report.run).unwrap();
    assert_eq!(run.status, RunStatus::Finished);
    assert_eq!(run.metrics.len(), 4);
    assert_eq!(run.params["solver"], "lbfgs");
    let logged: Vec<&str> = run.artifacts.iter().map(|a| a.path.as_str()).collect();
    assert!(logged.contains(&"model/model.json"));
    assert!(logged.contains(&"metrics.json"));

    let registry = local.load_registry().unwrap();
    assert_eq!(registry.latest_version("my_model").unwrap().stage, "Staging");

    let events = observer.events();
    for stage in Stage::ALL {
        assert!(events.contains(&StageEvent::Started(stage)), "{stage} never started");
        assert!(events.contains(&StageEvent::Completed(stage)), "{stage} never completed");
    }
    assert!(!events.iter().any(|e| matches!(e, StageEvent::Failed { .. })));
}

#[test]
fn test_default_seed_mixes_classes() {
    let seed = PipelineConfig::default().ingestion.seed;
    assert_eq!(seed, 42);
    let (train, test) = split(DATASET, seed);
    assert!(has_both_classes(&train));
    assert!(has_both_classes(&test));
}

#[tokio::test]
async fn test_single_class_test_split_fails_evaluation() {
    let dir = tempfile::tempdir().unwrap();
    let (mut ctx, observer) = workspace(dir.path(), DATASET);
    ctx.config.ingestion.seed = (0..1000)
        .find(|&seed| {
            let (train, test) = split(DATASET, seed);
            has_both_classes(&train) && !has_both_classes(&test)
        })
        .unwrap();
    let store = LocalTrackingStore::new(dir.path().join("mlruns"));

    let err = run_all(&ctx, &store, true).await.unwrap_err();
    assert_eq!(err.stage, Stage::ModelEvaluation);
    assert_eq!(err.function, "evaluate_model");
    match &err.source {
        MlError::Evaluation(message) => assert!(message.contains("one class"), "{message}"),
        other => panic!("unexpected error: {other}"),
    }

    // Nothing was tracked or reported for the undefined score.
    assert!(!ctx.layout.metrics.exists());
    assert!(!dir.path().join("mlruns").exists());
    assert!(
        !observer
            .events()
            .contains(&StageEvent::Started(Stage::ModelRegistration))
    );
}

#[tokio::test]
async fn test_stages_run_individually_and_share_vocabulary() {
    let dir = tempfile::tempdir().unwrap();
    let (ctx, observer) = workspace(dir.path(), DATASET);

    ingestion::run(&ctx).await.unwrap();
    preprocessing::run(&ctx).await.unwrap();
    let vocabulary = feature_engineering::run(&ctx).await.unwrap();

    let train = DataTable::read_csv(&ctx.layout.train_bow).await.unwrap();
    let test = DataTable::read_csv(&ctx.layout.test_bow).await.unwrap();
    assert_eq!(train.column_count(), vocabulary + 1);
    assert_eq!(test.columns, train.columns);
    assert_eq!(train.columns.last().map(String::as_str), Some("label"));
    assert_eq!(train.columns[0], "0");

    // Normalized text is lowercase with punctuation gone.
    let processed = DataTable::read_csv(&ctx.layout.train_processed).await.unwrap();
    for text in processed.column("content").unwrap() {
        assert_eq!(text, text.to_lowercase());
        assert!(!text.contains("  "));
        assert!(!text.chars().any(|c| c.is_ascii_punctuation()));
    }

    let model = model_training::run(&ctx).await.unwrap();
    assert!(model.is_fitted());
    assert!(!observer.artifacts().is_empty());
}

#[tokio::test]
async fn test_ingestion_keeps_only_configured_classes() {
    let dataset = format!(
        "{DATASET}11,neutral,just another day\n12,worry,exams tomorrow\n13,love,my cat\n"
    );
    let dir = tempfile::tempdir().unwrap();
    let (ctx, _observer) = workspace(dir.path(), &dataset);

    let summary = ingestion::run(&ctx).await.unwrap();
    assert_eq!(summary.train_rows + summary.test_rows, 10);
    assert_eq!(summary.test_rows, 2);

    let train = DataTable::read_csv(&ctx.layout.train_raw).await.unwrap();
    let test = DataTable::read_csv(&ctx.layout.test_raw).await.unwrap();
    assert_eq!(train.columns, vec!["sentiment", "content"]);
    for table in [&train, &test] {
        assert!(
            table
                .column("sentiment")
                .unwrap()
                .iter()
                .all(|l| *l == "0" || *l == "1")
        );
    }
}

#[tokio::test]
async fn test_ingestion_is_deterministic() {
    let dir = tempfile::tempdir().unwrap();
    let (ctx, _observer) = workspace(dir.path(), DATASET);

    ingestion::run(&ctx).await.unwrap();
    let first = std::fs::read_to_string(&ctx.layout.test_raw).unwrap();
    ingestion::run(&ctx).await.unwrap();
    let second = std::fs::read_to_string(&ctx.layout.test_raw).unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_evaluation_without_model_fails_before_tracking() {
    let dir = tempfile::tempdir().unwrap();
    let (ctx, observer) = workspace(dir.path(), DATASET);
    let store = LocalTrackingStore::new(dir.path().join("mlruns"));

    let err = model_evaluation::run(&ctx, &store).await.unwrap_err();
    assert_eq!(err.stage, Stage::ModelEvaluation);
    assert_eq!(err.function, "load_model");
    assert!(matches!(err.source, MlError::Io(_)));
    assert!(!ctx.layout.metrics.exists());
    assert!(!dir.path().join("mlruns").exists());

    assert!(observer.events().iter().any(|e| matches!(
        e,
        StageEvent::Failed {
            stage: Stage::ModelEvaluation,
            function: "load_model",
            ..
        }
    )));
}

#[tokio::test]
async fn test_registration_without_experiment_info_fails() {
    let dir = tempfile::tempdir().unwrap();
    let (ctx, _observer) = workspace(dir.path(), DATASET);
    let store = LocalTrackingStore::new(dir.path().join("mlruns"));

    let err = model_registration::run(&ctx, &store).await.unwrap_err();
    assert_eq!(err.function, "load_model_info");
}

#[tokio::test]
async fn test_missing_params_aborts_ingestion() {
    let dir = tempfile::tempdir().unwrap();
    let (ctx, _observer) = workspace(dir.path(), DATASET);
    std::fs::remove_file(dir.path().join("params.yaml")).unwrap();

    let err = ingestion::run(&ctx).await.unwrap_err();
    assert_eq!(err.function, "load_params");
    assert!(!ctx.layout.train_raw.exists());
}

#[tokio::test]
async fn test_short_text_removal_is_opt_in() {
    let dir = tempfile::tempdir().unwrap();
    let (mut ctx, observer) = workspace(dir.path(), DATASET);
    ctx.config.preprocessing.drop_short_texts = true;

    ingestion::run(&ctx).await.unwrap();
    preprocessing::run(&ctx).await.unwrap();

    let processed = DataTable::read_csv(&ctx.layout.train_processed).await.unwrap();
    for text in processed.column("content").unwrap() {
        assert!(text.is_empty() || text.split_whitespace().count() >= 3);
    }
    assert!(
        observer
            .steps(Stage::Preprocessing)
            .iter()
            .any(|s| s.starts_with("Blanked"))
    );
}
