use storyweaver_core::config::{
    AppConfig, DEFAULT_IMAGE_COUNT, DEFAULT_IMAGE_PROMPT_CHAR_BUDGET, DEFAULT_POLL_INTERVAL_MS,
    DEFAULT_VIDEO_CLIP_COUNT, DEFAULT_VIDEO_PROMPT_CHAR_BUDGET, ImageConfig, ModelConfig,
    PollConfig, VideoConfig,
};

pub const DEFAULT_API_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

// Video jobs usually finish within minutes; give up after half an hour.
const DEFAULT_VIDEO_MAX_ELAPSED_MS: u64 = 30 * 60 * 1000;

pub fn default_model_config() -> ModelConfig {
    ModelConfig {
        text: "gemini-2.5-flash".into(),
        image: "imagen-4.0-generate-001".into(),
        video: "veo-2.0-generate-001".into(),
    }
}

pub fn default_app_config() -> AppConfig {
    AppConfig {
        api_base_url: DEFAULT_API_BASE_URL.into(),
        models: default_model_config(),
        images: ImageConfig {
            count: DEFAULT_IMAGE_COUNT,
            mime_type: "image/jpeg".into(),
            aspect_ratio: "16:9".into(),
            prompt_char_budget: DEFAULT_IMAGE_PROMPT_CHAR_BUDGET,
        },
        video: VideoConfig {
            clip_count: DEFAULT_VIDEO_CLIP_COUNT,
            prompt_char_budget: DEFAULT_VIDEO_PROMPT_CHAR_BUDGET,
            poll: PollConfig {
                interval_ms: DEFAULT_POLL_INTERVAL_MS,
                max_attempts: None,
                max_elapsed_ms: Some(DEFAULT_VIDEO_MAX_ELAPSED_MS),
                jitter_ms: 0,
            },
        },
        connect_timeout_secs: 10,
        request_timeout_secs: 120,
    }
}
