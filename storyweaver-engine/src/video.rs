use crate::error::GenerationError;
use crate::poll::PollPolicy;
use crate::session::VideoStatus;
use crate::traits::{MediaHandle, MediaStore, OperationHandle, OperationStatus, VideoProvider};
use std::sync::Arc;
use storyweaver_core::prompt::video_prompt;
use storyweaver_core::text::is_blank;
use tokio::sync::mpsc;
use tokio::time::Instant;

pub const MSG_SUBMITTING: &str = "Sending your story to the film studio...";
pub const MSG_READY: &str = "Premiere! Your video is ready.";
pub const MSG_DOWNLOADING: &str = "Downloading the final cut...";

pub const PROGRESS_MESSAGES: [&str; 5] = [
    "The director is reviewing the script...",
    "Setting up the cameras and lighting...",
    "Filming the first scenes...",
    "Adding visual effects in post-production...",
    "Finalizing the edit, this can take a moment...",
];

const VIDEO_FAILED: &str = "Failed to generate the video. Please try another story.";
const VIDEO_TIMED_OUT: &str = "The film studio took too long to finish the video. Please try again.";
const VIDEO_LINK_MISSING: &str = "The video was generated but the download link is missing.";

/// Progress of one video job, in emission order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VideoEvent {
    Status(VideoStatus),
    Submitted(OperationHandle),
    Progress(String),
    Polled { attempt: u32, done: bool },
}

#[derive(Debug, Clone)]
pub struct VideoSettings {
    pub model: String,
    pub clip_count: u32,
    pub prompt_char_budget: usize,
    pub poll: PollPolicy,
}

#[derive(Clone)]
pub struct VideoJobOrchestrator {
    provider: Arc<dyn VideoProvider>,
    media: Arc<dyn MediaStore>,
    settings: VideoSettings,
}

// Receivers may be dropped at any time; progress is best-effort.
fn emit(events: &mpsc::UnboundedSender<VideoEvent>, event: VideoEvent) {
    let _ = events.send(event);
}

impl VideoJobOrchestrator {
    pub fn new(
        provider: Arc<dyn VideoProvider>,
        media: Arc<dyn MediaStore>,
        settings: VideoSettings,
    ) -> Self {
        Self {
            provider,
            media,
            settings,
        }
    }

    /// Drives one job from submission to a materialized file.
    ///
    /// Always ends with a terminal `Status` event (`Complete` or `Failed`) unless
    /// the story is rejected up front, in which case nothing is emitted.
    pub async fn run(
        &self,
        story: &str,
        events: mpsc::UnboundedSender<VideoEvent>,
    ) -> Result<MediaHandle, GenerationError> {
        if is_blank(story) {
            return Err(GenerationError::precondition("There is no story to film yet."));
        }

        let result = self.drive(story, &events).await;
        match &result {
            Ok(handle) => {
                log::info!("video job complete: media_id={} bytes={}", handle.id, handle.size_bytes);
                emit(&events, VideoEvent::Status(VideoStatus::Complete));
            }
            Err(e) => {
                log::warn!("video job failed: {}", e.log_detail());
                emit(&events, VideoEvent::Status(VideoStatus::Failed));
            }
        }
        result
    }

    async fn drive(
        &self,
        story: &str,
        events: &mpsc::UnboundedSender<VideoEvent>,
    ) -> Result<MediaHandle, GenerationError> {
        let prompt = video_prompt(story, self.settings.prompt_char_budget);

        emit(events, VideoEvent::Status(VideoStatus::Submitted));
        emit(events, VideoEvent::Progress(MSG_SUBMITTING.to_string()));

        let mut op = self
            .provider
            .submit_video_job(&self.settings.model, &prompt, self.settings.clip_count)
            .await
            .map_err(|e| GenerationError::transport(VIDEO_FAILED, e))?;
        log::info!("video job submitted: operation={}", op.handle.as_str());
        emit(events, VideoEvent::Submitted(op.handle.clone()));

        let op = self.poll_until_done(&mut op, events).await?;

        if let Some(err) = &op.error {
            return Err(GenerationError::data(VIDEO_FAILED, err.clone()));
        }
        let Some(uri) = op.download_uri.as_deref().filter(|u| !u.trim().is_empty()) else {
            return Err(GenerationError::data(
                VIDEO_LINK_MISSING,
                format!("operation {} finished without a result", op.handle.as_str()),
            ));
        };

        emit(events, VideoEvent::Progress(MSG_READY.to_string()));
        emit(events, VideoEvent::Progress(MSG_DOWNLOADING.to_string()));

        let fetched = self
            .provider
            .fetch_binary(uri)
            .await
            .map_err(|e| GenerationError::transport(VIDEO_FAILED, e))?;
        if !(200..300).contains(&fetched.status) {
            let message = format!("Failed to download the generated video. Status: {}", fetched.status);
            return Err(GenerationError::transport(
                message,
                anyhow::anyhow!("download returned HTTP {}", fetched.status),
            ));
        }

        let mime = fetched.content_type.as_deref().unwrap_or("video/mp4");
        self.media
            .materialize(fetched.bytes, mime)
            .await
            .map_err(|e| GenerationError::persistence("Failed to save the generated video.", e))
    }

    async fn poll_until_done(
        &self,
        op: &mut OperationStatus,
        events: &mpsc::UnboundedSender<VideoEvent>,
    ) -> Result<OperationStatus, GenerationError> {
        let policy = &self.settings.poll;
        let started = Instant::now();
        let mut attempt: u32 = 0;

        if !op.done {
            emit(events, VideoEvent::Status(VideoStatus::Polling));
        }

        while !op.done {
            if policy.exhausted(attempt, started.elapsed()) {
                return Err(GenerationError::transport(
                    VIDEO_TIMED_OUT,
                    anyhow::anyhow!(
                        "operation {} still running after {attempt} polls ({:?})",
                        op.handle.as_str(),
                        started.elapsed()
                    ),
                ));
            }

            let message = PROGRESS_MESSAGES[attempt as usize % PROGRESS_MESSAGES.len()];
            emit(events, VideoEvent::Progress(message.to_string()));
            tokio::time::sleep(policy.delay()).await;

            attempt += 1;
            let next = self
                .provider
                .poll_video_job(&op.handle)
                .await
                .map_err(|e| GenerationError::transport(VIDEO_FAILED, e))?;
            log::debug!(
                "video poll #{attempt}: operation={} done={}",
                next.handle.as_str(),
                next.done
            );
            emit(events, VideoEvent::Polled { attempt, done: next.done });
            *op = next;
        }

        Ok(op.clone())
    }
}
