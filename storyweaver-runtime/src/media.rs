use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::Context;
use storyweaver_engine::traits::{MediaHandle, MediaStore};

use crate::files::atomic_copy;

fn extension_for(mime_type: &str) -> &'static str {
    match mime_type.split(';').next().unwrap_or("").trim() {
        "video/mp4" => "mp4",
        "video/webm" => "webm",
        "video/quicktime" => "mov",
        _ => "bin",
    }
}

/// Downloaded media kept in a private temp directory. The directory, and any
/// file not yet released, is removed when the store is dropped.
#[derive(Debug)]
pub struct TempMediaStore {
    dir: tempfile::TempDir,
    live: Mutex<HashMap<String, PathBuf>>,
}

impl TempMediaStore {
    pub fn new() -> anyhow::Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix("storyweaver-media-")
            .tempdir()
            .context("create media temp dir")?;
        Ok(Self::with_dir(dir))
    }

    pub fn in_dir(parent: &Path) -> anyhow::Result<Self> {
        crate::files::ensure_dir(parent)?;
        let dir = tempfile::Builder::new()
            .prefix("storyweaver-media-")
            .tempdir_in(parent)
            .with_context(|| format!("create media temp dir in {}", parent.display()))?;
        Ok(Self::with_dir(dir))
    }

    fn with_dir(dir: tempfile::TempDir) -> Self {
        Self {
            dir,
            live: Mutex::new(HashMap::new()),
        }
    }

    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    pub fn live_count(&self) -> usize {
        self.live.lock().map(|m| m.len()).unwrap_or(0)
    }

    /// Copies a materialized file out of the store, e.g. to a user-chosen path.
    pub fn export(&self, handle: &MediaHandle, dest: &Path) -> anyhow::Result<()> {
        atomic_copy(&handle.path, dest)
    }
}

#[async_trait::async_trait]
impl MediaStore for TempMediaStore {
    async fn materialize(&self, bytes: Vec<u8>, mime_type: &str) -> anyhow::Result<MediaHandle> {
        let id = uuid::Uuid::new_v4().to_string();
        let path = self.dir.path().join(format!("{id}.{}", extension_for(mime_type)));
        let size_bytes = bytes.len() as u64;

        tokio::fs::write(&path, bytes)
            .await
            .with_context(|| format!("write media: {}", path.display()))?;

        if let Ok(mut live) = self.live.lock() {
            live.insert(id.clone(), path.clone());
        }
        log::debug!("materialized {size_bytes} bytes as {}", path.display());

        Ok(MediaHandle {
            id,
            path,
            mime_type: mime_type.to_string(),
            size_bytes,
        })
    }

    fn release(&self, handle: &MediaHandle) {
        let path = match self.live.lock() {
            Ok(mut live) => live.remove(&handle.id),
            Err(_) => None,
        };
        // Unknown or already released handles are ignored.
        let Some(path) = path else {
            return;
        };
        if let Err(e) = std::fs::remove_file(&path) {
            log::warn!("failed to remove media {}: {e}", path.display());
        }
    }
}
