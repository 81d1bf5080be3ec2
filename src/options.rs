//! Per-request workflow options.
//!
//! RPC callers send an `options` object with any subset of the keys below.
//! It is deserialised into [`WorkflowOptions`] once at the RPC boundary and
//! validated there; the rest of the pipeline only ever sees typed, in-range
//! values. Unknown keys are ignored.

use crate::error::StudyError;
use serde::{Deserialize, Serialize};

/// Typed options bag for `process_document`, `create_study_repo` and
/// `complete_workflow`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowOptions {
    /// Target summary length in words. Default: 200. Range: 1–2000.
    pub summary_length: u32,
    /// Number of flashcards to request. Default: 5. Range: 1–50.
    pub num_flashcards: u32,
    /// Whether to generate study notes. Default: true.
    pub include_notes: bool,
    /// Repository description. Default: a dated generic description.
    pub description: Option<String>,
    /// Create the repository as private. Default: false.
    pub private: bool,
}

impl Default for WorkflowOptions {
    fn default() -> Self {
        Self {
            summary_length: 200,
            num_flashcards: 5,
            include_notes: true,
            description: None,
            private: false,
        }
    }
}

impl WorkflowOptions {
    pub const MAX_SUMMARY_LENGTH: u32 = 2000;
    pub const MAX_FLASHCARDS: u32 = 50;

    /// Check every field is within its documented range.
    pub fn validate(&self) -> Result<(), StudyError> {
        if self.summary_length == 0 || self.summary_length > Self::MAX_SUMMARY_LENGTH {
            return Err(StudyError::InvalidOptions(format!(
                "summary_length must be 1–{}, got {}",
                Self::MAX_SUMMARY_LENGTH,
                self.summary_length
            )));
        }
        if self.num_flashcards == 0 || self.num_flashcards > Self::MAX_FLASHCARDS {
            return Err(StudyError::InvalidOptions(format!(
                "num_flashcards must be 1–{}, got {}",
                Self::MAX_FLASHCARDS,
                self.num_flashcards
            )));
        }
        Ok(())
    }

    /// Deserialise from an optional JSON value and validate.
    ///
    /// `None` and JSON `null` both mean "all defaults".
    pub fn from_json(value: Option<serde_json::Value>) -> Result<Self, StudyError> {
        let opts = match value {
            None | Some(serde_json::Value::Null) => Self::default(),
            Some(v) => serde_json::from_value::<Self>(v)
                .map_err(|e| StudyError::InvalidOptions(e.to_string()))?,
        };
        opts.validate()?;
        Ok(opts)
    }
}
