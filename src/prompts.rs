//! Prompts for study-material generation.
//!
//! Every prompt lives here so a wording change touches exactly one place and
//! tests can inspect prompts without calling a model. Each task sends one
//! system message (the fixed persona below) and one user message built by the
//! matching `*_prompt` function around the already-truncated document text.

/// System prompt for summaries.
pub const SUMMARY_SYSTEM_PROMPT: &str = "You are an expert at writing concise, useful summaries. \
Produce clear, well-structured summaries that keep the key ideas and drop filler.";

/// System prompt for flashcards.
pub const FLASHCARD_SYSTEM_PROMPT: &str = "You are an expert at writing educational flashcards. \
Write clear questions with short, accurate answers that help a student review the material.";

/// System prompt for study notes.
pub const NOTES_SYSTEM_PROMPT: &str = "You are an expert at writing well-organised study notes. \
Structure the information clearly with key points, important concepts and examples.";

/// Default system prompt for free-form chat sessions.
pub const CHAT_SYSTEM_PROMPT: &str = "You are a helpful assistant.";

/// Line format the flashcard prompt asks for, parsed by
/// [`crate::pipeline::flashcards::parse_flashcards`].
pub const FLASHCARD_LINE_FORMAT: &str = "Q: [question] | A: [answer]";

/// User message for a summary of at most `max_length` words.
pub fn summary_prompt(text: &str, max_length: u32) -> String {
    format!(
        "Please write a concise summary of the following text (at most {max_length} words):\n\n{text}"
    )
}

/// User message asking for `count` flashcards, one per line.
pub fn flashcard_prompt(text: &str, count: u32) -> String {
    format!(
        "Create {count} flashcards from the following text. \
Write one flashcard per line using the format '{FLASHCARD_LINE_FORMAT}':\n\n{text}"
    )
}

/// User message for structured study notes.
pub fn notes_prompt(text: &str) -> String {
    format!("Create structured study notes from the following text:\n\n{text}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_prompt_carries_length_and_text() {
        let p = summary_prompt("Binary search halves the range.", 150);
        assert!(p.contains("150 words"));
        assert!(p.ends_with("Binary search halves the range."));
    }

    #[test]
    fn flashcard_prompt_names_format_and_count() {
        let p = flashcard_prompt("text", 4);
        assert!(p.contains("Create 4 flashcards"));
        assert!(p.contains(FLASHCARD_LINE_FORMAT));
    }

    #[test]
    fn notes_prompt_embeds_text() {
        assert!(notes_prompt("graphs").ends_with("graphs"));
    }
}
