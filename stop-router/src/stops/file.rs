//! Stop list loaded from a JSON file.

use std::path::{Path, PathBuf};

use crate::domain::Stop;

use super::error::StopSourceError;

/// A JSON file holding an array of `{id, lat, lon, name}` records.
#[derive(Debug, Clone)]
pub struct StopFile {
    path: PathBuf,
}

impl StopFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn load(&self) -> Result<Vec<Stop>, StopSourceError> {
        let contents = tokio::fs::read(&self.path)
            .await
            .map_err(|source| StopSourceError::Io {
                path: self.path.clone(),
                source,
            })?;

        serde_json::from_slice(&contents).map_err(|e| StopSourceError::Json {
            message: format!("{}: {}", self.path.display(), e),
        })
    }
}
