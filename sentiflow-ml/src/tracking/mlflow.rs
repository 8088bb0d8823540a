//! MLflow REST client.
//!
//! Talks to an MLflow tracking server (such as DagsHub's) over
//! `/api/2.0/mlflow/*` for runs and the model registry, and over
//! `/api/2.0/mlflow-artifacts/*` for artifact uploads. Calls are never
//! retried; a non-2xx response becomes a tracking error carrying the status
//! and the server's message.

use crate::error::MlError;
use crate::tracking::{
    MLMODEL_FILE, ModelDescriptor, ModelUri, RunHandle, RunStatus, TrackingStore,
};
use async_trait::async_trait;
use reqwest::{Client, Method, StatusCode};
use sentiflow_core::config::TrackingCredentials;
use serde::Deserialize;
use serde_json::{Value, json};
use std::path::Path;
use std::time::Duration;

const API_PREFIX: &str = "api/2.0/mlflow";
const ARTIFACTS_PREFIX: &str = "api/2.0/mlflow-artifacts/artifacts";

/// Error body returned by MLflow on failure.
#[derive(Debug, Default, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    error_code: String,
    #[serde(default)]
    message: String,
}

#[derive(Debug)]
enum CallError {
    Transport(reqwest::Error),
    Api {
        endpoint: String,
        status: StatusCode,
        error_code: String,
        message: String,
    },
}

impl From<CallError> for MlError {
    fn from(err: CallError) -> Self {
        match err {
            CallError::Transport(e) => MlError::Http(e),
            CallError::Api {
                endpoint,
                status,
                error_code,
                message,
            } => MlError::tracking(format!(
                "{endpoint} returned HTTP {status} {error_code}: {message}"
            )),
        }
    }
}

impl CallError {
    fn error_code(&self) -> Option<&str> {
        match self {
            Self::Api { error_code, .. } => Some(error_code),
            Self::Transport(_) => None,
        }
    }
}

/// Tracking store backed by an MLflow server.
#[derive(Debug, Clone)]
pub struct MlflowTrackingStore {
    client: Client,
    base_url: String,
    credentials: Option<TrackingCredentials>,
}

impl MlflowTrackingStore {
    pub fn new(
        tracking_uri: &str,
        credentials: Option<TrackingCredentials>,
    ) -> Result<Self, MlError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .user_agent(concat!("sentiflow/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            base_url: tracking_uri.trim_end_matches('/').to_string(),
            credentials,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, url: String) -> reqwest::RequestBuilder {
        let builder = self.client.request(method, url);
        match &self.credentials {
            Some(c) => builder.basic_auth(&c.username, Some(&c.password)),
            None => builder,
        }
    }

    async fn execute(
        &self,
        endpoint: &str,
        builder: reqwest::RequestBuilder,
    ) -> Result<Value, CallError> {
        let response = builder.send().await.map_err(CallError::Transport)?;
        let status = response.status();
        let body = response.text().await.map_err(CallError::Transport)?;
        if !status.is_success() {
            let parsed: ApiErrorBody = serde_json::from_str(&body).unwrap_or_else(|_| ApiErrorBody {
                message: body.clone(),
                ..Default::default()
            });
            return Err(CallError::Api {
                endpoint: endpoint.to_string(),
                status,
                error_code: parsed.error_code,
                message: parsed.message,
            });
        }
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&body).unwrap_or(Value::Null))
    }

    async fn post(&self, endpoint: &str, payload: Value) -> Result<Value, CallError> {
        let url = format!("{}/{API_PREFIX}/{endpoint}", self.base_url);
        self.execute(endpoint, self.request(Method::POST, url).json(&payload))
            .await
    }

    async fn get(&self, endpoint: &str, query: &[(&str, &str)]) -> Result<Value, CallError> {
        let url = format!("{}/{API_PREFIX}/{endpoint}", self.base_url);
        self.execute(endpoint, self.request(Method::GET, url).query(query))
            .await
    }

    async fn experiment_id(&self, name: &str) -> Result<String, MlError> {
        match self
            .get("experiments/get-by-name", &[("experiment_name", name)])
            .await
        {
            Ok(body) => string_at(&body, &["experiment", "experiment_id"]),
            Err(err) if err.error_code() == Some("RESOURCE_DOES_NOT_EXIST") => {
                tracing::info!(experiment = name, "Creating MLflow experiment");
                let body = self
                    .post("experiments/create", json!({ "name": name }))
                    .await?;
                string_at(&body, &["experiment_id"])
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn upload(&self, run: &RunHandle, file: &Path, dest: &str) -> Result<(), MlError> {
        let bytes = tokio::fs::read(file).await.map_err(|e| {
            MlError::Io(std::io::Error::new(
                e.kind(),
                format!("failed to read artifact {}: {e}", file.display()),
            ))
        })?;
        self.put_artifact(run, dest, bytes).await
    }

    async fn put_artifact(
        &self,
        run: &RunHandle,
        dest: &str,
        bytes: Vec<u8>,
    ) -> Result<(), MlError> {
        let url = format!(
            "{}/{ARTIFACTS_PREFIX}/{}/{}/artifacts/{dest}",
            self.base_url, run.experiment_id, run.run_id
        );
        tracing::debug!(artifact = dest, bytes = bytes.len(), "Uploading artifact");
        self.execute("mlflow-artifacts", self.request(Method::PUT, url).body(bytes))
            .await?;
        Ok(())
    }
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Read a string (or number) nested under `path` in a response body.
fn string_at(body: &Value, path: &[&str]) -> Result<String, MlError> {
    let value = path.iter().try_fold(body, |v, key| v.get(key));
    match value {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(Value::Number(n)) => Ok(n.to_string()),
        _ => Err(MlError::tracking(format!(
            "unexpected response, missing {}",
            path.join(".")
        ))),
    }
}

fn file_name(path: &Path) -> Result<String, MlError> {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| MlError::invalid_input(format!("{} has no file name", path.display())))
}

#[async_trait]
impl TrackingStore for MlflowTrackingStore {
    fn backend(&self) -> &'static str {
        "mlflow"
    }

    async fn start_run(&self, experiment: &str) -> Result<RunHandle, MlError> {
        let experiment_id = self.experiment_id(experiment).await?;
        let body = self
            .post(
                "runs/create",
                json!({ "experiment_id": experiment_id, "start_time": now_millis() }),
            )
            .await?;
        let run_id = string_at(&body, &["run", "info", "run_id"])?;
        Ok(RunHandle {
            run_id,
            experiment_id,
        })
    }

    async fn log_metric(&self, run: &RunHandle, key: &str, value: f64) -> Result<(), MlError> {
        self.post(
            "runs/log-metric",
            json!({
                "run_id": run.run_id,
                "key": key,
                "value": value,
                "timestamp": now_millis(),
                "step": 0,
            }),
        )
        .await?;
        Ok(())
    }

    async fn log_param(&self, run: &RunHandle, key: &str, value: &str) -> Result<(), MlError> {
        self.post(
            "runs/log-parameter",
            json!({ "run_id": run.run_id, "key": key, "value": value }),
        )
        .await?;
        Ok(())
    }

    async fn log_model(
        &self,
        run: &RunHandle,
        model_file: &Path,
        artifact_path: &str,
    ) -> Result<(), MlError> {
        let dir = artifact_path.trim_matches('/');
        let model_name = file_name(model_file)?;
        self.upload(run, model_file, &format!("{dir}/{model_name}"))
            .await?;
        let descriptor = ModelDescriptor::new(run, dir, &model_name);
        self.put_artifact(run, &format!("{dir}/{MLMODEL_FILE}"), descriptor.to_bytes()?)
            .await
    }

    async fn log_artifact(&self, run: &RunHandle, file: &Path) -> Result<(), MlError> {
        self.upload(run, file, &file_name(file)?).await
    }

    async fn end_run(&self, run: &RunHandle, status: RunStatus) -> Result<(), MlError> {
        self.post(
            "runs/update",
            json!({
                "run_id": run.run_id,
                "status": status.as_str(),
                "end_time": now_millis(),
            }),
        )
        .await?;
        Ok(())
    }

    async fn register_model(&self, model_uri: &str, name: &str) -> Result<String, MlError> {
        let uri = ModelUri::parse(model_uri)?;
        match self
            .post("registered-models/create", json!({ "name": name }))
            .await
        {
            Ok(_) => tracing::info!(model = name, "Created registered model"),
            Err(err) if err.error_code() == Some("RESOURCE_ALREADY_EXISTS") => {
                tracing::debug!(model = name, "Registered model already exists");
            }
            Err(err) => return Err(err.into()),
        }

        let body = self
            .post(
                "model-versions/create",
                json!({ "name": name, "source": model_uri, "run_id": uri.run_id }),
            )
            .await?;
        string_at(&body, &["model_version", "version"])
    }

    async fn transition_stage(
        &self,
        name: &str,
        version: &str,
        stage: &str,
    ) -> Result<(), MlError> {
        self.post(
            "model-versions/transition-stage",
            json!({
                "name": name,
                "version": version,
                "stage": stage,
                "archive_existing_versions": false,
            }),
        )
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_at() {
        let body = json!({ "run": { "info": { "run_id": "abc" } }, "n": { "v": 3 } });
        assert_eq!(string_at(&body, &["run", "info", "run_id"]).unwrap(), "abc");
        assert_eq!(string_at(&body, &["n", "v"]).unwrap(), "3");
        assert!(string_at(&body, &["run", "missing"]).is_err());
    }

    #[test]
    fn test_base_url_trimmed() {
        let store = MlflowTrackingStore::new("https://example.com/repo.mlflow/", None).unwrap();
        assert_eq!(store.base_url(), "https://example.com/repo.mlflow");
    }

    #[test]
    fn test_api_error_maps_to_tracking_error() {
        let err: MlError = CallError::Api {
            endpoint: "runs/create".into(),
            status: StatusCode::FORBIDDEN,
            error_code: "PERMISSION_DENIED".into(),
            message: "no access".into(),
        }
        .into();
        let text = err.to_string();
        assert!(text.contains("403"));
        assert!(text.contains("PERMISSION_DENIED"));
        assert!(text.contains("no access"));
    }
}
