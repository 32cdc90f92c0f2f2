use crate::traits::{GeneratedImage, MediaHandle, OperationHandle};
use serde::{Deserialize, Serialize};
use storyweaver_core::types::{Genre, GenerationRequest, TargetLanguage};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StreamStatus {
    #[default]
    Idle,
    Streaming,
    Complete,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum JobStatus {
    #[default]
    Idle,
    InProgress,
    Complete,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum VideoStatus {
    #[default]
    Idle,
    Submitted,
    Polling,
    Complete,
    Failed,
}

impl VideoStatus {
    pub fn is_active(self) -> bool {
        matches!(self, VideoStatus::Submitted | VideoStatus::Polling)
    }
}

/// The story being written. `text` only grows while `status` is `Streaming`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StorySession {
    pub idea: String,
    pub genre: Genre,
    pub text: String,
    pub status: StreamStatus,
    pub error_message: Option<String>,
}

impl StorySession {
    pub fn matches(&self, request: &GenerationRequest) -> bool {
        self.idea == request.idea() && self.genre == request.genre()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TranslationResult {
    pub target_language: Option<TargetLanguage>,
    pub text: String,
    pub status: JobStatus,
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ImageBatchResult {
    pub images: Vec<GeneratedImage>,
    pub status: JobStatus,
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct VideoJob {
    pub status: VideoStatus,
    pub operation: Option<OperationHandle>,
    pub progress_message: String,
    pub result: Option<MediaHandle>,
    pub error_message: Option<String>,
}

/// Owned copy of everything the presentation layer may show.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SessionView {
    pub session: StorySession,
    pub translation: TranslationResult,
    pub images: ImageBatchResult,
    pub video: VideoJob,
}
