use serde::{Deserialize, Serialize};

pub const DEFAULT_IMAGE_COUNT: u32 = 4;
pub const DEFAULT_IMAGE_PROMPT_CHAR_BUDGET: usize = 4000;
pub const DEFAULT_VIDEO_CLIP_COUNT: u32 = 1;
pub const DEFAULT_VIDEO_PROMPT_CHAR_BUDGET: usize = 2000;
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 10_000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelConfig {
    pub text: String,
    pub image: String,
    pub video: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageConfig {
    pub count: u32,
    pub mime_type: String,
    pub aspect_ratio: String,
    pub prompt_char_budget: usize,
}

/// Serialized form of the video poll policy. Absent bounds mean "no bound".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollConfig {
    pub interval_ms: u64,
    #[serde(default)]
    pub max_attempts: Option<u32>,
    #[serde(default)]
    pub max_elapsed_ms: Option<u64>,
    #[serde(default)]
    pub jitter_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoConfig {
    pub clip_count: u32,
    pub prompt_char_budget: usize,
    pub poll: PollConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    pub api_base_url: String,
    pub models: ModelConfig,
    pub images: ImageConfig,
    pub video: VideoConfig,

    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    // Applies to single-shot calls only; the text stream and the video poll loop are unbounded here.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_request_timeout_secs() -> u64 {
    120
}
