use crate::error::GenerationError;
use crate::traits::TextProvider;
use std::sync::Arc;
use storyweaver_core::prompt::translation_prompt;
use storyweaver_core::text::{clean_model_output, is_blank};
use storyweaver_core::types::TargetLanguage;

pub const TRANSLATION_FAILED: &str = "Failed to translate the text. Please try again.";

#[derive(Clone)]
pub struct TranslationClient {
    provider: Arc<dyn TextProvider>,
    model: String,
}

impl TranslationClient {
    pub fn new(provider: Arc<dyn TextProvider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
        }
    }

    pub async fn translate(
        &self,
        story: &str,
        language: TargetLanguage,
    ) -> Result<String, GenerationError> {
        if is_blank(story) {
            return Err(GenerationError::precondition("There is no story to translate yet."));
        }

        let prompt = translation_prompt(story, language);
        let raw = self
            .provider
            .generate_text(&self.model, &prompt)
            .await
            .map_err(|e| GenerationError::transport(TRANSLATION_FAILED, e))?;

        let text = clean_model_output(&raw);
        if text.is_empty() {
            return Err(GenerationError::data(
                TRANSLATION_FAILED,
                format!("empty {language} translation"),
            ));
        }
        Ok(text)
    }
}
