//! Saving and loading workflow state documents.
//!
//! JSON is the readable format kept next to the strategy; bincode is the
//! compact one. Both check the schema major version before decoding the
//! full document.

use super::error::StoreError;
use super::{WorkflowState, SCHEMA_VERSION};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::debug;

#[derive(Deserialize)]
struct VersionHeader {
    schema_version: String,
}

fn major(version: &str) -> &str {
    version.split('.').next().unwrap_or(version)
}

fn check_version(found: &str) -> Result<(), StoreError> {
    if major(found) == major(SCHEMA_VERSION) {
        Ok(())
    } else {
        Err(StoreError::UnsupportedVersion {
            found: found.to_string(),
            supported: SCHEMA_VERSION.to_string(),
        })
    }
}

impl WorkflowState {
    /// Serialize to pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, StoreError> {
        serde_json::to_string_pretty(self).map_err(|e| StoreError::SerializationFailed(e.to_string()))
    }

    /// Deserialize from JSON, rejecting incompatible schema versions.
    pub fn from_json(json: &str) -> Result<Self, StoreError> {
        let header: VersionHeader =
            serde_json::from_str(json).map_err(|e| StoreError::DeserializationFailed(e.to_string()))?;
        check_version(&header.schema_version)?;
        let state: Self =
            serde_json::from_str(json).map_err(|e| StoreError::DeserializationFailed(e.to_string()))?;
        state.validate()?;
        Ok(state)
    }

    /// Serialize to bincode.
    pub fn to_binary(&self) -> Result<Vec<u8>, StoreError> {
        bincode::serialize(self).map_err(|e| StoreError::SerializationFailed(e.to_string()))
    }

    /// Deserialize from bincode, rejecting incompatible schema versions.
    pub fn from_binary(bytes: &[u8]) -> Result<Self, StoreError> {
        // schema_version is the leading field, so the header decodes from a prefix.
        let header: VersionHeader =
            bincode::deserialize(bytes).map_err(|e| StoreError::DeserializationFailed(e.to_string()))?;
        check_version(&header.schema_version)?;
        let state: Self =
            bincode::deserialize(bytes).map_err(|e| StoreError::DeserializationFailed(e.to_string()))?;
        state.validate()?;
        Ok(state)
    }

    /// Write the whole document as JSON: temp file first, then rename.
    ///
    /// The temp file is always `<path>.tmp`, so at most one writer may save
    /// to a given path at a time.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), StoreError> {
        let path = path.as_ref();
        let json = self.to_json()?;

        let mut temp_path = path.as_os_str().to_owned();
        temp_path.push(".tmp");

        fs::write(&temp_path, json).map_err(|source| StoreError::Io {
            path: Path::new(&temp_path).display().to_string(),
            source,
        })?;
        fs::rename(&temp_path, path).map_err(|source| StoreError::Io {
            path: path.display().to_string(),
            source,
        })?;

        debug!(path = %path.display(), phase = %self.current_phase(), "saved workflow state");
        Ok(())
    }

    /// Read a document written by [`save`](Self::save).
    pub fn load(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|source| StoreError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let state = Self::from_json(&json)?;
        debug!(path = %path.display(), phase = %state.current_phase(), "loaded workflow state");
        Ok(state)
    }
}
