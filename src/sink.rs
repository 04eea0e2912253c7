//! Output storage for rendered statements.
//!
//! A sink stores one artifact per key. Writes fully replace whatever was
//! stored under the key before; nothing is read back or compared.

use crate::config::OutputConfig;
use crate::error::{StatementError, StatementResult};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Check that `key` can name a file directly inside the output directory.
///
/// The key is used as-is, so it must be non-blank, must not be `.` or `..`,
/// and must not contain path separators or NUL.
pub fn validate_key(key: &str) -> StatementResult<()> {
    if key.trim().is_empty() {
        return Err(StatementError::invalid_input("customer name is empty"));
    }

    if key == "." || key == ".." {
        return Err(StatementError::invalid_input(format!(
            "customer name '{key}' is not a valid file name"
        )));
    }

    if key.chars().any(|c| matches!(c, '/' | '\\' | '\0')) {
        return Err(StatementError::invalid_input(format!(
            "customer name '{}' contains a path separator or NUL",
            key.escape_debug()
        )));
    }

    Ok(())
}

/// Destination for rendered statements
#[async_trait]
pub trait OutputSink: Send + Sync {
    /// Create or replace the artifact stored under `key`, returning its location
    async fn write(&self, key: &str, content: &str) -> StatementResult<PathBuf>;
}

/// Writes `{directory}/{key}.{extension}` files.
#[derive(Debug, Clone)]
pub struct FileSink {
    directory: PathBuf,
    extension: String,
}

impl FileSink {
    /// Create the sink, creating `directory` if needed. An existing
    /// directory is fine.
    pub fn new(directory: impl Into<PathBuf>, extension: impl Into<String>) -> StatementResult<Self> {
        let directory = directory.into();
        std::fs::create_dir_all(&directory).map_err(|e| StatementError::io(&directory, e))?;

        tracing::debug!("Output directory ready: {}", directory.display());
        Ok(Self {
            directory,
            extension: extension.into(),
        })
    }

    /// Create the sink described by an [`OutputConfig`]
    pub fn from_config(config: &OutputConfig) -> StatementResult<Self> {
        Self::new(config.directory.clone(), config.extension.clone())
    }

    /// The output directory
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Path a given key is written to
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.directory.join(format!("{key}.{}", self.extension))
    }
}

#[async_trait]
impl OutputSink for FileSink {
    async fn write(&self, key: &str, content: &str) -> StatementResult<PathBuf> {
        validate_key(key)?;

        let path = self.path_for(key);
        tokio::fs::write(&path, content)
            .await
            .map_err(|e| StatementError::io(&path, e))?;

        tracing::debug!("Wrote {} bytes to {}", content.len(), path.display());
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::assert_ok;

    #[test]
    fn test_validate_key() {
        assert_ok!(validate_key("BigCo"));
        assert_ok!(validate_key("Acme Theatre Ltd."));
        assert_ok!(validate_key("Société Générale"));

        for bad in ["", "  ", ".", "..", "a/b", "a\\b", "nul\0byte"] {
            assert!(
                matches!(validate_key(bad), Err(StatementError::InvalidInput { .. })),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_directory_creation_is_idempotent() {
        let root = tempfile::tempdir().unwrap();
        let directory = root.path().join("nested").join("statements");

        assert_ok!(FileSink::new(&directory, "json"));
        assert!(directory.is_dir());
        assert_ok!(FileSink::new(&directory, "json"));
    }

    #[test]
    fn test_directory_creation_failure() {
        let root = tempfile::tempdir().unwrap();
        let file = root.path().join("occupied");
        std::fs::write(&file, "not a directory").unwrap();

        let result = FileSink::new(&file, "json");
        assert!(matches!(result, Err(StatementError::Io { .. })));
    }

    #[tokio::test]
    async fn test_write_creates_file() {
        let root = tempfile::tempdir().unwrap();
        let sink = FileSink::new(root.path(), "xml").unwrap();

        let path = sink.write("BigCo", "<statement/>").await.unwrap();
        assert_eq!(path, root.path().join("BigCo.xml"));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "<statement/>");
    }

    #[tokio::test]
    async fn test_write_overwrites() {
        let root = tempfile::tempdir().unwrap();
        let sink = FileSink::new(root.path(), "json").unwrap();

        sink.write("BigCo", "a much longer first statement").await.unwrap();
        let path = sink.write("BigCo", "second").await.unwrap();

        assert_eq!(std::fs::read_to_string(path).unwrap(), "second");
        assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn test_write_rejects_unsafe_key() {
        let root = tempfile::tempdir().unwrap();
        let sink = FileSink::new(root.path().join("out"), "json").unwrap();

        let result = sink.write("../outside", "content").await;
        assert!(matches!(result, Err(StatementError::InvalidInput { .. })));
        assert!(!root.path().join("outside.json").exists());
    }
}
