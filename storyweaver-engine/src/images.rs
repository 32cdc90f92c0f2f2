use crate::error::GenerationError;
use crate::traits::{GeneratedImage, ImageProvider, ImageSpec};
use std::sync::Arc;
use storyweaver_core::prompt::image_prompt;
use storyweaver_core::text::is_blank;

pub const IMAGES_FAILED: &str = "Failed to generate images. The AI might be camera shy.";

#[derive(Clone)]
pub struct ImageBatchClient {
    provider: Arc<dyn ImageProvider>,
    model: String,
    spec: ImageSpec,
    prompt_char_budget: usize,
}

impl ImageBatchClient {
    pub fn new(
        provider: Arc<dyn ImageProvider>,
        model: impl Into<String>,
        spec: ImageSpec,
        prompt_char_budget: usize,
    ) -> Self {
        Self {
            provider,
            model: model.into(),
            spec,
            prompt_char_budget,
        }
    }

    /// One request, one batch. Fewer images than asked for are returned as-is.
    pub async fn generate(&self, story: &str) -> Result<Vec<GeneratedImage>, GenerationError> {
        if is_blank(story) {
            return Err(GenerationError::precondition("There is no story to illustrate yet."));
        }

        let prompt = image_prompt(
            story,
            self.spec.count,
            &self.spec.aspect_ratio,
            self.prompt_char_budget,
        );
        let mut images = self
            .provider
            .generate_images(&self.model, &prompt, &self.spec)
            .await
            .map_err(|e| GenerationError::transport(IMAGES_FAILED, e))?;

        let wanted = self.spec.count as usize;
        if images.len() != wanted {
            log::warn!("image batch returned {} of {wanted} images", images.len());
        }
        images.truncate(wanted);
        Ok(images)
    }
}
