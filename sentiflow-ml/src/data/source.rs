//! Where the raw dataset is read from.

use crate::data::table::DataTable;
use crate::error::MlError;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Location of the raw CSV.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatasetSource {
    Url(String),
    Path(PathBuf),
}

impl DatasetSource {
    /// Interpret a configured source string. `http://` and `https://` are
    /// URLs; anything else is a path, resolved against `workspace` when
    /// relative.
    pub fn parse(source: &str, workspace: &Path) -> Self {
        let trimmed = source.trim();
        if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            Self::Url(trimmed.to_string())
        } else {
            let path = PathBuf::from(trimmed);
            if path.is_absolute() {
                Self::Path(path)
            } else {
                Self::Path(workspace.join(path))
            }
        }
    }

    pub fn location(&self) -> String {
        match self {
            Self::Url(url) => url.clone(),
            Self::Path(path) => path.display().to_string(),
        }
    }

    /// Fetch and parse the dataset.
    pub async fn load(&self) -> Result<DataTable, MlError> {
        let text = match self {
            Self::Url(url) => fetch_text(url).await?,
            Self::Path(path) => tokio::fs::read_to_string(path).await.map_err(|e| {
                MlError::Io(std::io::Error::new(
                    e.kind(),
                    format!("failed to read {}: {e}", path.display()),
                ))
            })?,
        };
        DataTable::from_csv_str(&text)
            .map_err(|e| MlError::dataset(format!("{}: {e}", self.location())))
    }
}

async fn fetch_text(url: &str) -> Result<String, MlError> {
    let client = reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(10))
        .user_agent(concat!("sentiflow/", env!("CARGO_PKG_VERSION")))
        .build()?;

    tracing::debug!(url, "Downloading dataset");
    let response = client.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(MlError::dataset(format!(
            "dataset download from {url} returned status {status}"
        )));
    }
    Ok(response.text().await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_source() {
        let ws = Path::new("/work");
        assert_eq!(
            DatasetSource::parse("https://example.com/tweets.csv", ws),
            DatasetSource::Url("https://example.com/tweets.csv".into())
        );
        assert_eq!(
            DatasetSource::parse("data/external/tweets.csv", ws),
            DatasetSource::Path(PathBuf::from("/work/data/external/tweets.csv"))
        );
        assert_eq!(
            DatasetSource::parse("/abs/tweets.csv", ws),
            DatasetSource::Path(PathBuf::from("/abs/tweets.csv"))
        );
    }

    #[tokio::test]
    async fn test_load_from_path() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("tweets.csv");
        std::fs::write(&path, "tweet_id,sentiment,content\n1,happiness,yay\n").unwrap();

        let table = DatasetSource::Path(path).load().await.unwrap();
        assert_eq!(table.row_count(), 1);

        let missing = DatasetSource::Path(dir.path().join("nope.csv")).load().await;
        assert!(missing.is_err());
    }
}
