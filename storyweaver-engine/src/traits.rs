use async_trait::async_trait;
use base64::Engine;
use futures_util::stream::BoxStream;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use storyweaver_core::library::SavedStoryRecord;

/// Incremental story text. Finite, not restartable; an `Err` item ends it.
pub type FragmentStream = BoxStream<'static, anyhow::Result<String>>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedImage {
    pub mime_type: String,
    pub data_base64: String,
}

impl GeneratedImage {
    pub fn decode(&self) -> anyhow::Result<Vec<u8>> {
        base64::engine::general_purpose::STANDARD
            .decode(self.data_base64.as_bytes())
            .map_err(|e| anyhow::anyhow!("invalid base64 image payload: {e}"))
    }

    pub fn data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data_base64)
    }

    /// Download name for the image at zero-based `index`, e.g. `story_image_1.jpg`.
    pub fn file_name(&self, index: usize) -> String {
        let ext = match self.mime_type.as_str() {
            "image/png" => "png",
            "image/webp" => "webp",
            _ => "jpg",
        };
        format!("story_image_{}.{ext}", index + 1)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSpec {
    pub count: u32,
    pub mime_type: String,
    pub aspect_ratio: String,
}

/// Opaque backend token for a long-running job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OperationHandle(pub String);

impl OperationHandle {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationStatus {
    pub handle: OperationHandle,
    pub done: bool,
    pub download_uri: Option<String>,
    // Backend-reported failure of the operation itself.
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedBinary {
    pub status: u16,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// Locally resolvable handle to downloaded media. Must be released through the
/// store that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaHandle {
    pub id: String,
    pub path: PathBuf,
    pub mime_type: String,
    pub size_bytes: u64,
}

#[async_trait]
pub trait TextProvider: Send + Sync {
    async fn stream_text(&self, model: &str, prompt: &str) -> anyhow::Result<FragmentStream>;

    async fn generate_text(&self, model: &str, prompt: &str) -> anyhow::Result<String>;
}

#[async_trait]
pub trait ImageProvider: Send + Sync {
    async fn generate_images(
        &self,
        model: &str,
        prompt: &str,
        spec: &ImageSpec,
    ) -> anyhow::Result<Vec<GeneratedImage>>;
}

#[async_trait]
pub trait VideoProvider: Send + Sync {
    async fn submit_video_job(
        &self,
        model: &str,
        prompt: &str,
        clip_count: u32,
    ) -> anyhow::Result<OperationStatus>;

    async fn poll_video_job(&self, handle: &OperationHandle) -> anyhow::Result<OperationStatus>;

    /// Non-success statuses are returned, not raised; the caller decides.
    async fn fetch_binary(&self, uri: &str) -> anyhow::Result<FetchedBinary>;
}

#[async_trait]
pub trait MediaStore: Send + Sync {
    async fn materialize(&self, bytes: Vec<u8>, mime_type: &str) -> anyhow::Result<MediaHandle>;

    fn release(&self, handle: &MediaHandle);
}

/// The persisted saved-story list, read and replaced as a whole.
///
/// Implementations may block; callers run them off the async workers.
pub trait StoryLibrary: Send + Sync {
    /// An absent list is empty. Content that cannot be read in full is an error.
    fn load(&self) -> anyhow::Result<Vec<SavedStoryRecord>>;

    fn store(&self, records: &[SavedStoryRecord]) -> anyhow::Result<()>;
}
