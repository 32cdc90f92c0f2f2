use crate::error::GenerationError;
use crate::traits::{FragmentStream, TextProvider};
use std::sync::Arc;
use storyweaver_core::prompt::story_prompt;
use storyweaver_core::text::is_blank;
use storyweaver_core::types::GenerationRequest;

pub const STREAM_START_FAILED: &str = "Failed to start the story. Please try again.";
pub const STREAM_INTERRUPTED: &str = "The story was interrupted before it was finished. Please try again.";

#[derive(Clone)]
pub struct StreamingTextGenerator {
    provider: Arc<dyn TextProvider>,
    model: String,
}

impl StreamingTextGenerator {
    pub fn new(provider: Arc<dyn TextProvider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
        }
    }

    /// Opens the fragment stream for `request`. Fragments are not buffered here.
    pub async fn start(&self, request: &GenerationRequest) -> Result<FragmentStream, GenerationError> {
        if is_blank(request.idea()) {
            return Err(GenerationError::precondition("Please enter a story idea first."));
        }

        let prompt = story_prompt(request);
        log::info!(
            "starting story stream: model={} genre={} prompt_chars={}",
            self.model,
            request.genre(),
            prompt.chars().count()
        );

        self.provider
            .stream_text(&self.model, &prompt)
            .await
            .map_err(|e| GenerationError::transport(STREAM_START_FAILED, e))
    }
}
