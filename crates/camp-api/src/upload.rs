use std::path::{Path, PathBuf};

use bson::oid::ObjectId;

use crate::error::ApiError;

/// Writes bootcamp photos into the upload directory.
#[derive(Debug, Clone)]
pub struct PhotoStore {
    dir: PathBuf,
}

impl PhotoStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Store `bytes` as `photo_<bootcamp id><ext>` and return the file name.
    pub async fn save(
        &self,
        bootcamp: &ObjectId,
        original_name: &str,
        bytes: &[u8],
    ) -> Result<String, ApiError> {
        let name = photo_name(bootcamp, original_name);
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| ApiError::Upstream(format!("{}: {e}", self.dir.display())))?;
        let path = self.dir.join(&name);
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| ApiError::Upstream(format!("{}: {e}", path.display())))?;
        tracing::info!(path = %path.display(), size = bytes.len(), "stored photo");
        Ok(name)
    }
}

/// Only an alphanumeric extension survives from the client's file name.
pub(crate) fn photo_name(bootcamp: &ObjectId, original_name: &str) -> String {
    let ext = Path::new(original_name)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty() && e.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|e| format!(".{}", e.to_ascii_lowercase()))
        .unwrap_or_default();
    format!("photo_{}{ext}", bootcamp.to_hex())
}
