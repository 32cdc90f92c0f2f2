use crate::error::GenerationError;
use crate::images::ImageBatchClient;
use crate::library::SavedStories;
use crate::poll::PollPolicy;
use crate::session::{
    ImageBatchResult, JobStatus, SessionView, StorySession, StreamStatus, TranslationResult,
    VideoJob, VideoStatus,
};
use crate::stream::{STREAM_INTERRUPTED, StreamingTextGenerator};
use crate::traits::{ImageProvider, ImageSpec, MediaHandle, MediaStore, StoryLibrary, TextProvider, VideoProvider};
use crate::translation::TranslationClient;
use crate::video::{VideoEvent, VideoJobOrchestrator, VideoSettings};
use futures_util::StreamExt;
use std::sync::Arc;
use storyweaver_core::config::AppConfig;
use storyweaver_core::library::{SaveOutcome, SavedStoryRecord};
use storyweaver_core::text::is_blank;
use storyweaver_core::types::{GenerationRequest, Genre, TargetLanguage};
use tokio::sync::{Mutex, broadcast, mpsc};

const EVENT_CAPACITY: usize = 256;

/// Models and knobs the coordinator hands to its clients.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub text_model: String,
    pub image_model: String,
    pub image_spec: ImageSpec,
    pub image_prompt_char_budget: usize,
    pub video: VideoSettings,
}

impl EngineConfig {
    pub fn from_app_config(cfg: &AppConfig) -> Self {
        Self {
            text_model: cfg.models.text.clone(),
            image_model: cfg.models.image.clone(),
            image_spec: ImageSpec {
                count: cfg.images.count,
                mime_type: cfg.images.mime_type.clone(),
                aspect_ratio: cfg.images.aspect_ratio.clone(),
            },
            image_prompt_char_budget: cfg.images.prompt_char_budget,
            video: VideoSettings {
                model: cfg.models.video.clone(),
                clip_count: cfg.video.clip_count,
                prompt_char_budget: cfg.video.prompt_char_budget,
                poll: PollPolicy::from_config(&cfg.video.poll),
            },
        }
    }
}

/// What observers see while jobs run. Only events from the current session
/// and the current request of each kind are published.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoordinatorEvent {
    SessionStarted { generation: u64 },
    Fragment(String),
    StreamFinished { status: StreamStatus },
    TranslationFinished { language: TargetLanguage, status: JobStatus },
    ImagesFinished { status: JobStatus, count: usize },
    Video(VideoEvent),
    VideoFinished { status: VideoStatus },
}

/// A spawned job. Dropping it detaches the task.
#[derive(Debug)]
pub struct JobHandle(tokio::task::JoinHandle<()>);

impl JobHandle {
    pub async fn wait(self) {
        if let Err(e) = self.0.await {
            log::error!("generation job ended abnormally: {e}");
        }
    }
}

#[derive(Debug)]
pub enum StartOutcome {
    Spawned(JobHandle),
    // An identical job of the same kind is still running.
    AlreadyPending,
}

impl StartOutcome {
    pub fn is_spawned(&self) -> bool {
        matches!(self, StartOutcome::Spawned(_))
    }

    pub async fn wait(self) {
        if let StartOutcome::Spawned(job) = self {
            job.wait().await;
        }
    }
}

#[derive(Default)]
struct Inner {
    view: SessionView,

    // Bumped whenever the session is replaced; jobs from older sessions are ignored.
    session_gen: u64,
    translation_token: u64,
    image_token: u64,
    video_token: u64,
}

impl Inner {
    fn story_snapshot(&self) -> Result<String, GenerationError> {
        if self.view.session.status == StreamStatus::Streaming {
            return Err(GenerationError::precondition(
                "Please wait for the story to finish first.",
            ));
        }
        if is_blank(&self.view.session.text) {
            return Err(GenerationError::precondition("Please write a story first."));
        }
        Ok(self.view.session.text.clone())
    }

    // Resets every slot for a new session and returns the video handle to release.
    fn replace_session(&mut self, session: StorySession) -> Option<MediaHandle> {
        self.session_gen += 1;
        let old_video = self.view.video.result.take();
        self.view = SessionView {
            session,
            ..SessionView::default()
        };
        old_video
    }
}

/// Owns one story session and runs its jobs.
#[derive(Clone)]
pub struct GenerationCoordinator {
    inner: Arc<Mutex<Inner>>,
    stream: StreamingTextGenerator,
    translator: TranslationClient,
    images: ImageBatchClient,
    video: VideoJobOrchestrator,
    media: Arc<dyn MediaStore>,
    library: SavedStories,
    events: broadcast::Sender<CoordinatorEvent>,
}

impl GenerationCoordinator {
    pub fn new(
        cfg: EngineConfig,
        text: Arc<dyn TextProvider>,
        images: Arc<dyn ImageProvider>,
        video: Arc<dyn VideoProvider>,
        media: Arc<dyn MediaStore>,
        library: Arc<dyn StoryLibrary>,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            inner: Arc::new(Mutex::new(Inner::default())),
            stream: StreamingTextGenerator::new(text.clone(), cfg.text_model.clone()),
            translator: TranslationClient::new(text, cfg.text_model),
            images: ImageBatchClient::new(
                images,
                cfg.image_model,
                cfg.image_spec,
                cfg.image_prompt_char_budget,
            ),
            video: VideoJobOrchestrator::new(video, media.clone(), cfg.video),
            media,
            library: SavedStories::new(library),
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CoordinatorEvent> {
        self.events.subscribe()
    }

    pub async fn snapshot(&self) -> SessionView {
        self.inner.lock().await.view.clone()
    }

    fn publish(&self, event: CoordinatorEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    fn release_media(&self, handle: Option<MediaHandle>) {
        if let Some(h) = handle {
            log::debug!("releasing media {}", h.id);
            self.media.release(&h);
        }
    }

    pub async fn start_story(
        &self,
        request: GenerationRequest,
    ) -> Result<StartOutcome, GenerationError> {
        if is_blank(request.idea()) {
            return Err(GenerationError::precondition("Please enter a story idea first."));
        }

        let (generation, released) = {
            let mut inner = self.inner.lock().await;
            let session = &inner.view.session;
            if session.status == StreamStatus::Streaming && session.matches(&request) {
                return Ok(StartOutcome::AlreadyPending);
            }
            let released = inner.replace_session(StorySession {
                idea: request.idea().to_string(),
                genre: request.genre(),
                status: StreamStatus::Streaming,
                ..StorySession::default()
            });
            (inner.session_gen, released)
        };
        self.release_media(released);
        self.publish(CoordinatorEvent::SessionStarted { generation });
        log::info!("story session {generation} started: genre={}", request.genre());

        let this = self.clone();
        let task = tokio::spawn(async move {
            this.run_story(generation, request).await;
        });
        Ok(StartOutcome::Spawned(JobHandle(task)))
    }

    async fn run_story(&self, generation: u64, request: GenerationRequest) {
        let mut fragments = match self.stream.start(&request).await {
            Ok(s) => s,
            Err(e) => {
                log::warn!("story stream failed to start: {}", e.log_detail());
                self.finish_story(generation, Some(e.user_message())).await;
                return;
            }
        };

        while let Some(item) = fragments.next().await {
            match item {
                Ok(fragment) => {
                    if fragment.is_empty() {
                        continue;
                    }
                    let mut inner = self.inner.lock().await;
                    if inner.session_gen != generation {
                        log::debug!("story session {generation} superseded; dropping stream");
                        return;
                    }
                    inner.view.session.text.push_str(&fragment);
                    drop(inner);
                    self.publish(CoordinatorEvent::Fragment(fragment));
                }
                Err(e) => {
                    log::warn!("story stream interrupted: {e:#}");
                    self.finish_story(generation, Some(STREAM_INTERRUPTED.to_string()))
                        .await;
                    return;
                }
            }
        }

        self.finish_story(generation, None).await;
    }

    async fn finish_story(&self, generation: u64, error: Option<String>) {
        let status = if error.is_some() {
            StreamStatus::Failed
        } else {
            StreamStatus::Complete
        };
        {
            let mut inner = self.inner.lock().await;
            if inner.session_gen != generation {
                return;
            }
            let session = &mut inner.view.session;
            session.status = status;
            session.error_message = error;
            log::info!(
                "story session {generation} finished: status={status:?} chars={}",
                session.text.chars().count()
            );
        }
        self.publish(CoordinatorEvent::StreamFinished { status });
    }

    pub async fn start_translation(
        &self,
        language: TargetLanguage,
    ) -> Result<StartOutcome, GenerationError> {
        let (story, generation, token) = {
            let mut inner = self.inner.lock().await;
            let story = inner.story_snapshot()?;
            let current = &inner.view.translation;
            if current.status == JobStatus::InProgress && current.target_language == Some(language) {
                return Ok(StartOutcome::AlreadyPending);
            }
            inner.translation_token += 1;
            inner.view.translation = TranslationResult {
                target_language: Some(language),
                status: JobStatus::InProgress,
                ..TranslationResult::default()
            };
            (story, inner.session_gen, inner.translation_token)
        };

        let this = self.clone();
        let task = tokio::spawn(async move {
            let result = this.translator.translate(&story, language).await;

            let status = {
                let mut inner = this.inner.lock().await;
                if inner.session_gen != generation || inner.translation_token != token {
                    log::debug!("discarding stale {language} translation (token {token})");
                    return;
                }
                let slot = &mut inner.view.translation;
                match result {
                    Ok(text) => {
                        slot.text = text;
                        slot.status = JobStatus::Complete;
                    }
                    Err(e) => {
                        log::warn!("translation failed: {}", e.log_detail());
                        slot.status = JobStatus::Failed;
                        slot.error_message = Some(e.user_message());
                    }
                }
                slot.status
            };
            this.publish(CoordinatorEvent::TranslationFinished { language, status });
        });
        Ok(StartOutcome::Spawned(JobHandle(task)))
    }

    pub async fn start_image_batch(&self) -> Result<StartOutcome, GenerationError> {
        let (story, generation, token) = {
            let mut inner = self.inner.lock().await;
            let story = inner.story_snapshot()?;
            if inner.view.images.status == JobStatus::InProgress {
                return Ok(StartOutcome::AlreadyPending);
            }
            inner.image_token += 1;
            // The previous batch stays visible until the new one lands or fails.
            inner.view.images.status = JobStatus::InProgress;
            inner.view.images.error_message = None;
            (story, inner.session_gen, inner.image_token)
        };

        let this = self.clone();
        let task = tokio::spawn(async move {
            let result = this.images.generate(&story).await;

            let (status, count) = {
                let mut inner = this.inner.lock().await;
                if inner.session_gen != generation || inner.image_token != token {
                    return;
                }
                let slot = &mut inner.view.images;
                match result {
                    Ok(images) => {
                        *slot = ImageBatchResult {
                            images,
                            status: JobStatus::Complete,
                            error_message: None,
                        };
                    }
                    Err(e) => {
                        log::warn!("image batch failed: {}", e.log_detail());
                        *slot = ImageBatchResult {
                            images: Vec::new(),
                            status: JobStatus::Failed,
                            error_message: Some(e.user_message()),
                        };
                    }
                }
                (slot.status, slot.images.len())
            };
            this.publish(CoordinatorEvent::ImagesFinished { status, count });
        });
        Ok(StartOutcome::Spawned(JobHandle(task)))
    }

    /// One video job per session at a time; a second request while one is
    /// submitted or polling is reported as `AlreadyPending`.
    pub async fn start_video_job(&self) -> Result<StartOutcome, GenerationError> {
        let (story, generation, token, released) = {
            let mut inner = self.inner.lock().await;
            let story = inner.story_snapshot()?;
            if inner.view.video.status.is_active() {
                return Ok(StartOutcome::AlreadyPending);
            }
            inner.video_token += 1;
            let released = inner.view.video.result.take();
            inner.view.video = VideoJob {
                status: VideoStatus::Submitted,
                ..VideoJob::default()
            };
            (story, inner.session_gen, inner.video_token, released)
        };
        self.release_media(released);

        let this = self.clone();
        let task = tokio::spawn(async move {
            this.run_video(story, generation, token).await;
        });
        Ok(StartOutcome::Spawned(JobHandle(task)))
    }

    async fn run_video(&self, story: String, generation: u64, token: u64) {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let run = self.video.run(&story, tx);
        tokio::pin!(run);

        let result = loop {
            tokio::select! {
                biased;
                Some(event) = rx.recv() => self.apply_video_event(generation, token, event).await,
                result = &mut run => break result,
            }
        };
        while let Ok(event) = rx.try_recv() {
            self.apply_video_event(generation, token, event).await;
        }

        let status = {
            let mut inner = self.inner.lock().await;
            if inner.session_gen != generation || inner.video_token != token {
                drop(inner);
                // Nobody will show this video any more.
                if let Ok(handle) = result {
                    self.media.release(&handle);
                }
                return;
            }
            let slot = &mut inner.view.video;
            slot.progress_message.clear();
            match result {
                Ok(handle) => {
                    slot.result = Some(handle);
                    slot.status = VideoStatus::Complete;
                }
                Err(e) => {
                    slot.status = VideoStatus::Failed;
                    slot.error_message = Some(e.user_message());
                }
            }
            slot.status
        };
        self.publish(CoordinatorEvent::VideoFinished { status });
    }

    async fn apply_video_event(&self, generation: u64, token: u64, event: VideoEvent) {
        {
            let mut inner = self.inner.lock().await;
            if inner.session_gen != generation || inner.video_token != token {
                return;
            }
            let slot = &mut inner.view.video;
            match &event {
                // Terminal states are written together with the result.
                VideoEvent::Status(VideoStatus::Complete | VideoStatus::Failed) => {}
                VideoEvent::Status(status) => slot.status = *status,
                VideoEvent::Submitted(handle) => slot.operation = Some(handle.clone()),
                VideoEvent::Progress(message) => slot.progress_message = message.clone(),
                VideoEvent::Polled { .. } => {}
            }
        }
        self.publish(CoordinatorEvent::Video(event));
    }

    pub async fn save_current_story(&self) -> Result<SaveOutcome, GenerationError> {
        let (idea, genre, story) = {
            let inner = self.inner.lock().await;
            let story = inner.story_snapshot()?;
            let session = &inner.view.session;
            if is_blank(&session.idea) {
                return Err(GenerationError::precondition("Please enter a story idea first."));
            }
            (session.idea.clone(), session.genre, story)
        };
        self.library.save(idea, genre, story).await
    }

    /// Newest first. Read failures degrade to an empty list.
    pub async fn saved_stories(&self) -> Vec<SavedStoryRecord> {
        self.library.list().await
    }

    pub async fn delete_saved_story(&self, id: i64) -> Result<bool, GenerationError> {
        self.library.delete(id).await
    }

    /// Replaces the session with a saved story, as if it had just finished streaming.
    pub async fn load_saved_story(&self, record: &SavedStoryRecord) {
        let genre = record.genre.parse::<Genre>().unwrap_or_else(|_| {
            log::warn!("unknown genre {:?} in saved story {}", record.genre, record.id);
            Genre::default()
        });
        let (generation, released) = {
            let mut inner = self.inner.lock().await;
            let released = inner.replace_session(StorySession {
                idea: record.idea.clone(),
                genre,
                text: record.story.clone(),
                status: StreamStatus::Complete,
                error_message: None,
            });
            (inner.session_gen, released)
        };
        self.release_media(released);
        self.publish(CoordinatorEvent::SessionStarted { generation });
    }

    /// Drops the session and frees local media. Running jobs finish unobserved.
    pub async fn end_session(&self) {
        let released = {
            let mut inner = self.inner.lock().await;
            inner.replace_session(StorySession::default())
        };
        self.release_media(released);
    }
}
