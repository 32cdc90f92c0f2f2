//! Prompt construction. Everything here is pure: user intent in, backend-ready text out.

use crate::text::truncate_chars;
use crate::types::{Genre, GenerationRequest, TargetLanguage};

pub fn story_prompt(request: &GenerationRequest) -> String {
    let genre_instruction = match request.genre() {
        Genre::General => "The story should be a general fiction piece.".to_string(),
        other => format!("The story must be written in the **{other}** genre."),
    };

    format!(
        "You are a master storyteller. Your task is to write a detailed and engaging story based on the following title/idea: \"{idea}\".\n\n\
**Instructions:**\n\
- **Genre and Style:** {genre_instruction}\n\
- **Readability:** Use simple, clear, and accessible English. The language should be very easy for a non-native English speaker to understand. Use common words and straightforward sentence structures, but still create a rich, descriptive story.\n\n\
Follow these rules meticulously:\n\
1.  **Atmospheric Opening:** Begin with a strong introduction that immerses the reader in the story's world.\n\
2.  **Engaging Narrative:** The story must read like a well-crafted short story, not a summary. It should have a natural, continuous flow.\n\
3.  **Rich Detail:** Weave in vivid descriptions of settings, characters, and actions.\n\
4.  **Emotional Depth:** Explore the characters' inner thoughts and feelings.\n\
5.  **Engaging Plot:** Include key events, conflicts, and turning points.\n\
6.  **Authentic Dialogue:** Write dialogue that is natural and easy to understand.\n\
7.  **Pacing and Tone:** Maintain a consistent tone appropriate for the chosen genre.\n\n\
Do not break the narrative with headings, summaries, or author's notes. Write only the story itself.\n",
        idea = request.idea().trim(),
    )
}

pub fn translation_prompt(text: &str, language: TargetLanguage) -> String {
    format!(
        "Translate the following English text into {language}. Provide only the translated text, with no extra explanations or introductions. Ensure the translation is natural and accurate.\n\n\
English Text:\n\"\"\"\n{text}\n\"\"\"\n\n{language} Translation:"
    )
}

pub fn image_prompt(story: &str, count: u32, aspect_ratio: &str, char_budget: usize) -> String {
    format!(
        "Based on the following story, generate {count} distinct, visually compelling, {aspect_ratio} cinematic images that represent key scenes or the overall mood. Focus on the core emotional and visual elements described in the text.\n\n\
Story: \"\"\"\n{story}\n\"\"\"",
        story = truncate_chars(story, char_budget),
    )
}

pub fn video_prompt(story: &str, char_budget: usize) -> String {
    format!(
        "Create a short, cinematic video, like a movie trailer, that captures the essence and mood of this story. Focus on dynamic visuals and atmosphere.\n\n\
Story: \"\"\"\n{story}\n\"\"\"",
        story = truncate_chars(story, char_budget),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn general_genre_asks_for_general_fiction() {
        let p = story_prompt(&GenerationRequest::new("A quiet harbor", Genre::General));
        assert!(p.contains("\"A quiet harbor\""));
        assert!(p.contains("general fiction piece"));
        assert!(!p.contains("** genre"));
    }

    #[test]
    fn specific_genre_is_named() {
        let p = story_prompt(&GenerationRequest::new(
            "A lighthouse keeper who hears voices in storms",
            Genre::Gothic,
        ));
        assert!(p.contains("**Gothic** genre"));
        assert!(p.contains("Write only the story itself."));
    }

    #[test]
    fn translation_prompt_fences_source_text() {
        let p = translation_prompt("Once upon a time.", TargetLanguage::Urdu);
        assert!(p.starts_with("Translate the following English text into Urdu."));
        assert!(p.contains("\"\"\"\nOnce upon a time.\n\"\"\""));
        assert!(p.ends_with("Urdu Translation:"));
    }

    #[test]
    fn media_prompts_truncate_story() {
        let story = "#".repeat(5000);
        let p = image_prompt(&story, 4, "16:9", 4000);
        assert_eq!(p.matches('#').count(), 4000);
        assert!(p.contains("generate 4 distinct"));
        assert!(p.contains("16:9 cinematic"));

        let v = video_prompt(&story, 2000);
        assert_eq!(v.matches('#').count(), 2000);
    }
}
