//! Artifact persistence: atomic writes and JSON load/save.
//!
//! Every stage output goes through [`atomic_write`], so a stage that aborts
//! halfway never leaves a truncated artifact behind for the next stage.

use std::io;
use std::path::{Path, PathBuf};

/// Atomically write raw bytes to a file.
///
/// Writes to a `.tmp` sibling, then renames onto the target path.
/// Creates parent directories if they don't exist.
pub fn atomic_write(path: &Path, data: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let tmp = tmp_path(path);
    std::fs::write(&tmp, data)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}

/// Atomically write pretty-printed JSON (four-space indent) to a file.
pub fn atomic_write_json<T: serde::Serialize>(path: &Path, data: &T) -> io::Result<()> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    data.serialize(&mut ser).map_err(io::Error::other)?;
    buf.push(b'\n');
    atomic_write(path, &buf)
}

/// Load and deserialize a JSON artifact that must exist.
///
/// A missing file is `ErrorKind::NotFound`; malformed JSON is `ErrorKind::InvalidData`.
pub fn load_json<T: serde::de::DeserializeOwned>(path: &Path) -> io::Result<T> {
    let data = std::fs::read_to_string(path).map_err(|e| {
        io::Error::new(e.kind(), format!("failed to read {}: {e}", path.display()))
    })?;
    serde_json::from_str(&data).map_err(|e| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!("malformed JSON in {}: {e}", path.display()),
        )
    })
}

/// Load JSON that may legitimately be absent (registries, run indexes).
pub fn load_json_opt<T: serde::de::DeserializeOwned>(path: &Path) -> io::Result<Option<T>> {
    if !path.exists() {
        return Ok(None);
    }
    load_json(path).map(Some)
}

// `model.json` -> `model.json.tmp`, keeping the original extension visible.
fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};
    use tempfile::TempDir;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct ModelInfo {
        run_id: String,
        model_path: String,
    }

    #[test]
    fn test_atomic_write_json_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("experiment_info.json");

        let info = ModelInfo {
            run_id: "abc123".into(),
            model_path: "model".into(),
        };

        atomic_write_json(&path, &info).unwrap();
        let loaded: ModelInfo = load_json(&path).unwrap();
        assert_eq!(loaded, info);

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("    \"run_id\": \"abc123\""));
    }

    #[test]
    fn test_atomic_write_creates_parent_dirs() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data").join("raw").join("train_raw.csv");

        atomic_write(&path, b"content,sentiment\n").unwrap();
        assert!(path.exists());
        assert!(!dir.path().join("data/raw/train_raw.csv.tmp").exists());
    }

    #[test]
    fn test_load_json_missing_is_not_found() {
        let dir = TempDir::new().unwrap();
        let err = load_json::<ModelInfo>(&dir.path().join("nope.json")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);

        let opt: Option<ModelInfo> = load_json_opt(&dir.path().join("nope.json")).unwrap();
        assert!(opt.is_none());
    }

    #[test]
    fn test_load_json_malformed() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{ not json").unwrap();
        let err = load_json::<ModelInfo>(&path).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }
}
