//! Value types that flow through the workflow.
//!
//! Every type here lives for one request at most. Nothing is persisted
//! locally; the hosting service is the system of record for published
//! repositories.

use crate::error::StudyError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Input formats understood by the document reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    Pdf,
    Markdown,
    Text,
}

impl DocumentFormat {
    /// Every extension the reader accepts, with leading dot.
    pub const SUPPORTED_EXTENSIONS: [&'static str; 5] = [".pdf", ".md", ".markdown", ".txt", ".text"];

    /// Classify a path by its (case-insensitive) extension.
    pub fn from_path(path: &Path) -> Result<Self, StudyError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|s| s.to_lowercase());

        match ext.as_deref() {
            Some("pdf") => Ok(DocumentFormat::Pdf),
            Some("md") | Some("markdown") => Ok(DocumentFormat::Markdown),
            Some("txt") | Some("text") => Ok(DocumentFormat::Text),
            other => Err(StudyError::UnsupportedFormat {
                path: path.to_path_buf(),
                extension: other.map(|e| format!(".{e}")).unwrap_or_else(|| "<none>".into()),
            }),
        }
    }
}

/// A document after text extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDocument {
    pub path: PathBuf,
    pub format: DocumentFormat,
    /// Extracted text, never blank.
    pub text: String,
}

impl SourceDocument {
    /// Size of the extracted text in bytes.
    pub fn byte_len(&self) -> usize {
        self.text.len()
    }

    /// Size of the extracted text in characters.
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// Summary, flashcards and optional notes derived from one document.
///
/// Also the shape accepted as `content` by `create_study_repo`; missing
/// sections deserialise as empty and render as "Not available".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudyMaterial {
    #[serde(default)]
    pub summary: String,
    /// One `Q: … | A: …` pair per line.
    #[serde(default)]
    pub flashcards: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub study_notes: Option<String>,
    #[serde(default = "Utc::now")]
    pub generated_at: DateTime<Utc>,
}

/// Result of `process_document`: the material plus file metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessedDocument {
    pub file_path: String,
    /// Extracted text length in characters.
    pub file_size: usize,
    pub processed_at: DateTime<Utc>,
    #[serde(flatten)]
    pub material: StudyMaterial,
}

/// A repository created on the hosting service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryDescriptor {
    pub name: String,
    pub full_name: String,
    pub owner: String,
    pub private: bool,
    pub description: Option<String>,
    /// Creation timestamp as reported by the hosting service.
    pub created_at: String,
    /// Canonical web URL.
    pub repo_url: String,
    pub clone_url: String,
}

/// One file to write into a repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitRequest {
    /// Path within the repository, e.g. `README.md`.
    pub path: String,
    pub content: String,
    pub message: String,
    /// Blob SHA of the file being replaced. `None` lets the host look it up.
    pub sha: Option<String>,
}

impl CommitRequest {
    pub fn new(path: impl Into<String>, content: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
            message: message.into(),
            sha: None,
        }
    }

    /// Replace the file whose current blob is `sha`.
    pub fn with_sha(mut self, sha: impl Into<String>) -> Self {
        self.sha = Some(sha.into());
        self
    }
}

/// What the hosting service reports for a written file.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CommitResult {
    pub path: String,
    pub content_sha: Option<String>,
    pub commit_sha: Option<String>,
    pub html_url: Option<String>,
}

/// Result of `complete_workflow`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowReport {
    /// Always `"complete"`.
    pub workflow: String,
    pub file_processing: ProcessedDocument,
    pub repository: RepositoryDescriptor,
    pub completed_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn format_from_extension() {
        assert_eq!(DocumentFormat::from_path(Path::new("a.pdf")).unwrap(), DocumentFormat::Pdf);
        assert_eq!(DocumentFormat::from_path(Path::new("a.PDF")).unwrap(), DocumentFormat::Pdf);
        assert_eq!(DocumentFormat::from_path(Path::new("a.md")).unwrap(), DocumentFormat::Markdown);
        assert_eq!(
            DocumentFormat::from_path(Path::new("a.markdown")).unwrap(),
            DocumentFormat::Markdown
        );
        assert_eq!(DocumentFormat::from_path(Path::new("a.txt")).unwrap(), DocumentFormat::Text);
        assert_eq!(DocumentFormat::from_path(Path::new("a.text")).unwrap(), DocumentFormat::Text);
    }

    #[test]
    fn unsupported_extensions() {
        for p in ["report.docx", "Makefile", "archive.tar.gz"] {
            let err = DocumentFormat::from_path(Path::new(p)).unwrap_err();
            assert!(matches!(err, StudyError::UnsupportedFormat { .. }), "{p}");
        }
    }

    #[test]
    fn char_len_counts_characters_not_bytes() {
        let doc = SourceDocument {
            path: "n.md".into(),
            format: DocumentFormat::Markdown,
            text: "Árbol".into(),
        };
        assert_eq!(doc.char_len(), 5);
        assert_eq!(doc.byte_len(), 6);
    }

    #[test]
    fn material_accepts_processed_document_shape() {
        // create_study_repo callers forward the whole process_document payload.
        let content = json!({
            "file_path": "notes.md",
            "file_size": 512,
            "processed_at": "2026-01-02T03:04:05Z",
            "summary": "S",
            "flashcards": "Q: a | A: b",
            "study_notes": "N"
        });
        let m: StudyMaterial = serde_json::from_value(content).unwrap();
        assert_eq!(m.summary, "S");
        assert_eq!(m.study_notes.as_deref(), Some("N"));
    }

    #[test]
    fn processed_document_serialises_flat() {
        let doc = ProcessedDocument {
            file_path: "/tmp/doc.md".into(),
            file_size: 3,
            processed_at: Utc::now(),
            material: StudyMaterial {
                summary: "sum".into(),
                flashcards: "cards".into(),
                study_notes: None,
                generated_at: Utc::now(),
            },
        };
        let v = serde_json::to_value(&doc).unwrap();
        assert_eq!(v["summary"], "sum");
        assert_eq!(v["file_size"], 3);
        assert!(v.get("study_notes").is_none());
    }
}
