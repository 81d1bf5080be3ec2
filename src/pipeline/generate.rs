//! Content generation: summary, flashcards and study notes.
//!
//! Each task is one completion call with a fixed system prompt and a user
//! message built from the (truncated) document text. Calls are sequential
//! and never retried; the first failure aborts [`ContentGenerator::generate`].

use crate::completion::{CompletionRequest, CompletionService, PromptMessage};
use crate::config::GenerationSettings;
use crate::error::StudyError;
use crate::model::{SourceDocument, StudyMaterial};
use crate::options::WorkflowOptions;
use crate::pipeline::postprocess::clean_generated;
use crate::prompts;
use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info};

/// Drives the completion service for the three study-material tasks.
#[derive(Clone)]
pub struct ContentGenerator {
    completion: Arc<dyn CompletionService>,
    settings: GenerationSettings,
}

impl ContentGenerator {
    pub fn new(completion: Arc<dyn CompletionService>, settings: GenerationSettings) -> Self {
        Self {
            completion,
            settings,
        }
    }

    pub fn settings(&self) -> &GenerationSettings {
        &self.settings
    }

    /// Summary of at most `max_length` words.
    ///
    /// The token budget is `max_length * 2`.
    pub async fn summarize(&self, text: &str, max_length: u32) -> Result<String, StudyError> {
        let input = truncate_chars(text, self.settings.max_input_chars);
        let request = CompletionRequest {
            messages: vec![
                PromptMessage::system(prompts::SUMMARY_SYSTEM_PROMPT),
                PromptMessage::user(prompts::summary_prompt(input, max_length)),
            ],
            max_tokens: max_length as usize * 2,
            temperature: self.settings.summary_temperature,
        };
        self.run("summary", &request).await
    }

    /// `count` flashcards as `Q: … | A: …` lines.
    pub async fn flashcards(&self, text: &str, count: u32) -> Result<String, StudyError> {
        let input = truncate_chars(text, self.settings.max_input_chars);
        let request = CompletionRequest {
            messages: vec![
                PromptMessage::system(prompts::FLASHCARD_SYSTEM_PROMPT),
                PromptMessage::user(prompts::flashcard_prompt(input, count)),
            ],
            max_tokens: self.settings.flashcard_max_tokens,
            temperature: self.settings.flashcard_temperature,
        };
        self.run("flashcards", &request).await
    }

    /// Structured study notes.
    pub async fn study_notes(&self, text: &str) -> Result<String, StudyError> {
        let input = truncate_chars(text, self.settings.max_input_chars);
        let request = CompletionRequest {
            messages: vec![
                PromptMessage::system(prompts::NOTES_SYSTEM_PROMPT),
                PromptMessage::user(prompts::notes_prompt(input)),
            ],
            max_tokens: self.settings.notes_max_tokens,
            temperature: self.settings.notes_temperature,
        };
        self.run("study notes", &request).await
    }

    /// Run summary, flashcards and (if requested) notes for one document.
    pub async fn generate(
        &self,
        document: &SourceDocument,
        options: &WorkflowOptions,
    ) -> Result<StudyMaterial, StudyError> {
        let start = Instant::now();
        let text = document.text.as_str();

        let summary = self.summarize(text, options.summary_length).await?;
        let flashcards = self.flashcards(text, options.num_flashcards).await?;
        let study_notes = if options.include_notes {
            Some(self.study_notes(text).await?)
        } else {
            None
        };

        info!(
            "Generated study material for {} in {:?}",
            document.path.display(),
            start.elapsed()
        );

        Ok(StudyMaterial {
            summary,
            flashcards,
            study_notes,
            generated_at: Utc::now(),
        })
    }

    async fn run(&self, task: &'static str, request: &CompletionRequest) -> Result<String, StudyError> {
        debug!(
            "Requesting {} from {} (max_tokens={}, temperature={})",
            task,
            self.completion.model(),
            request.max_tokens,
            request.temperature
        );

        let completion = self.completion.complete(request).await.map_err(|e| {
            error!("Error generating {}: {}", task, e);
            match e {
                StudyError::GenerationFailed { detail, .. } => {
                    StudyError::GenerationFailed { task, detail }
                }
                other => StudyError::GenerationFailed {
                    task,
                    detail: other.to_string(),
                },
            }
        })?;

        let text = clean_generated(&completion.text);
        if text.is_empty() {
            error!("Empty {} returned by {}", task, self.completion.model());
            return Err(StudyError::GenerationFailed {
                task,
                detail: "completion service returned empty text".to_string(),
            });
        }
        Ok(text)
    }
}

/// Longest prefix of `text` holding at most `max_chars` characters.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}
