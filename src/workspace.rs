use crate::consts::DESCRIPTOR_FILE_NAME;
use std::path::{Path, PathBuf};

/// A scratch directory owned by one tool call.
#[derive(Debug)]
pub struct Workspace {
    path: PathBuf,
    keep: bool,
}

impl Workspace {
    /// Creates `{millis}-{nonce}` under `root`.
    pub async fn create(root: &Path, keep: bool) -> std::io::Result<Self> {
        let millis = chrono::Utc::now().timestamp_millis();
        let nonce = uuid::Uuid::new_v4().simple().to_string();
        let path = root.join(format!("{millis}-{}", &nonce[..8]));

        tokio::fs::create_dir_all(&path).await?;

        tracing::debug!(path = %path.display(), "Created workspace.");

        Ok(Self { path, keep })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Where a downloaded code package goes.
    pub fn artifact_path(&self) -> PathBuf {
        let millis = chrono::Utc::now().timestamp_millis();
        self.path.join(format!("code-{millis}.zip"))
    }

    pub fn descriptor_path(&self) -> PathBuf {
        self.path.join(DESCRIPTOR_FILE_NAME)
    }

    /// Removes the directory unless it is kept for inspection.
    pub async fn release(self) {
        if self.keep {
            tracing::info!(path = %self.path.display(), "Keeping workspace.");
            return;
        }

        if let Err(error) = tokio::fs::remove_dir_all(&self.path).await {
            tracing::warn!(%error, path = %self.path.display(), "Failed to remove workspace.");
        }
    }
}
