//! JSON output files.

use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::Serialize;
use thiserror::Error;
use tracing::debug;

/// Output writer errors.
#[derive(Debug, Error)]
pub enum WriteError {
    /// Creating the output directory failed.
    #[error("failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Writing a file failed.
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Encoding the document failed.
    #[error("failed to encode {path}: {source}")]
    Encode {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Result type for writer operations.
pub type Result<T> = std::result::Result<T, WriteError>;

/// Writes documents into one output directory.
#[derive(Debug, Clone)]
pub struct OutputWriter {
    output_dir: PathBuf,
}

impl OutputWriter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Create the output directory if absent.
    pub fn ensure_dir(&self) -> Result<()> {
        if !self.output_dir.is_dir() {
            debug!(dir = %self.output_dir.display(), "creating output directory");
            fs::create_dir_all(&self.output_dir).map_err(|source| WriteError::CreateDir {
                path: self.output_dir.clone(),
                source,
            })?;
        }
        Ok(())
    }

    /// Write `value` as pretty JSON to `file_name`, replacing any previous
    /// contents. Returns the written path.
    pub fn write<T: Serialize + ?Sized>(&self, file_name: &str, value: &T) -> Result<PathBuf> {
        self.ensure_dir()?;

        let path = self.output_dir.join(file_name);
        let mut json = serde_json::to_string_pretty(value).map_err(|source| WriteError::Encode {
            path: path.clone(),
            source,
        })?;
        json.push('\n');

        fs::write(&path, json).map_err(|source| WriteError::Write {
            path: path.clone(),
            source,
        })?;

        debug!(path = %path.display(), "wrote file");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_creates_missing_directory() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("nested").join("static-json");
        let writer = OutputWriter::new(&out);

        let path = writer.write("site-data.json", &json!({ "a": 1 })).unwrap();

        assert!(out.is_dir());
        assert_eq!(fs::read_to_string(path).unwrap(), "{\n  \"a\": 1\n}\n");
    }

    #[test]
    fn test_overwrite_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let writer = OutputWriter::new(dir.path());
        let doc = json!({ "pages": {}, "translations": { "k": "v" } });

        let first = writer.write("site-data.json", &doc).unwrap();
        let before = fs::read(&first).unwrap();
        let second = writer.write("site-data.json", &doc).unwrap();

        assert_eq!(first, second);
        assert_eq!(before, fs::read(&second).unwrap());
    }

    #[test]
    fn test_directory_blocked_by_file() {
        let dir = TempDir::new().unwrap();
        let blocked = dir.path().join("out");
        fs::write(&blocked, "not a dir").unwrap();

        let err = OutputWriter::new(&blocked)
            .write("site-data.json", &json!({}))
            .unwrap_err();
        assert!(matches!(err, WriteError::CreateDir { .. }));
    }
}
