use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use storyweaver_core::config::AppConfig;
use storyweaver_engine::SavedStories;
use storyweaver_engine::coordinator::{EngineConfig, GenerationCoordinator};
use storyweaver_providers::gemini::GeminiConfig;
use storyweaver_providers::runtime::{HttpRuntime, HttpTimeouts};

use crate::gemini_backend::GeminiBackend;
use crate::library_store::StoryLibraryStore;
use crate::media::TempMediaStore;
use crate::secrets::resolve_api_key;

/// A coordinator plus the concrete stores behind it, for callers that need
/// more than the engine seams expose (exporting media).
pub struct StoryRuntime {
    pub coordinator: GenerationCoordinator,
    pub media: Arc<TempMediaStore>,
}

/// The saved-story library under `data_dir`. Needs no API key.
pub fn open_library(data_dir: &Path) -> SavedStories {
    SavedStories::new(Arc::new(StoryLibraryStore::at_dir(data_dir)))
}

/// Build a runnable coordinator from config, resolving the API key from the
/// environment or keyring.
pub fn build_runtime_from_config(cfg: &AppConfig, data_dir: &Path) -> anyhow::Result<StoryRuntime> {
    let api_key = resolve_api_key()?;
    build_runtime_with_key(cfg, api_key, data_dir)
}

pub fn build_runtime_with_key(
    cfg: &AppConfig,
    api_key: String,
    data_dir: &Path,
) -> anyhow::Result<StoryRuntime> {
    if api_key.trim().is_empty() {
        return Err(anyhow::anyhow!("Gemini API key is empty"));
    }

    let http = HttpRuntime::new(HttpTimeouts {
        connect: Duration::from_secs(cfg.connect_timeout_secs),
        request: Duration::from_secs(cfg.request_timeout_secs),
    })?;
    let backend = Arc::new(GeminiBackend::new(
        http,
        GeminiConfig {
            base_url: cfg.api_base_url.clone(),
            api_key,
        },
    ));

    let media = Arc::new(TempMediaStore::in_dir(&data_dir.join("media"))?);
    let library = Arc::new(StoryLibraryStore::at_dir(data_dir));

    let coordinator = GenerationCoordinator::new(
        EngineConfig::from_app_config(cfg),
        backend.clone(),
        backend.clone(),
        backend,
        media.clone(),
        library,
    );
    log::info!(
        "coordinator ready: base_url={} text_model={} data_dir={}",
        cfg.api_base_url,
        cfg.models.text,
        data_dir.display()
    );

    Ok(StoryRuntime { coordinator, media })
}
