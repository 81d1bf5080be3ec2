//! Error types for the study-forge library.
//!
//! A single enum, [`StudyError`], covers every stage of the workflow. The
//! variants are grouped by the stage that raises them so a caller can tell
//! at a glance whether a failure came from the input file, the completion
//! service or the hosting service.
//!
//! Nothing here is fatal to the process: the RPC layer turns every
//! `StudyError` into a `{success: false, error}` envelope and the server keeps
//! serving. The `Display` text is what ends up in that envelope, so it carries
//! the downstream HTTP status and body where there is one.

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the study-forge library.
#[derive(Debug, Error)]
pub enum StudyError {
    // ── Reading ───────────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("File not found: '{path}'")]
    NotFound { path: PathBuf },

    /// The file extension is not one the reader understands.
    #[error("Unsupported file type '{extension}' for '{path}'. Supported: .pdf, .md, .markdown, .txt, .text")]
    UnsupportedFormat { path: PathBuf, extension: String },

    /// The document yielded no text after trimming whitespace.
    #[error("File '{path}' is empty or no text could be extracted")]
    EmptyContent { path: PathBuf },

    /// A text-like file is not valid UTF-8.
    #[error("File '{path}' is not valid UTF-8 text")]
    InvalidEncoding { path: PathBuf },

    /// Reading the file failed for another reason (permissions, I/O).
    #[error("Failed to read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\
Set PDFIUM_LIB_PATH=/path/to/libpdfium or install pdfium system-wide."
    )]
    PdfiumUnavailable(String),

    /// pdfium could not open the document at all.
    #[error("PDF '{path}' could not be opened: {detail}")]
    PdfOpen { path: PathBuf, detail: String },

    // ── Generation ────────────────────────────────────────────────────────
    /// The completion service failed or returned unusable output.
    #[error("Generation of {task} failed: {detail}")]
    GenerationFailed { task: &'static str, detail: String },

    /// The configured completion provider could not be initialised.
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    // ── Publishing ────────────────────────────────────────────────────────
    /// The hosting service answered with an unexpected status.
    #[error("Hosting API error ({status}): {body}")]
    RemoteApi { status: u16, body: String },

    /// HTTP transport error talking to the hosting service.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// A credential required for this operation is not configured.
    #[error("{0} is not configured")]
    MissingCredential(&'static str),

    // ── Input validation ──────────────────────────────────────────────────
    /// Caller-supplied workflow options are out of range.
    #[error("Invalid options: {0}")]
    InvalidOptions(String),

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Server ────────────────────────────────────────────────────────────
    /// The RPC listener could not bind its address.
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl StudyError {
    /// Short machine-readable name of the error class.
    ///
    /// Surfaced in RPC failure envelopes next to the human-readable message.
    pub fn kind(&self) -> &'static str {
        match self {
            StudyError::NotFound { .. } => "NotFound",
            StudyError::UnsupportedFormat { .. } => "UnsupportedFormat",
            StudyError::EmptyContent { .. } => "EmptyContent",
            StudyError::InvalidEncoding { .. } | StudyError::Io { .. } => "ReadFailed",
            StudyError::PdfiumUnavailable(_) | StudyError::PdfOpen { .. } => "PdfFailed",
            StudyError::GenerationFailed { .. } | StudyError::ProviderNotConfigured { .. } => {
                "GenerationFailed"
            }
            StudyError::RemoteApi { .. } | StudyError::Http(_) => "RemoteAPIError",
            StudyError::MissingCredential(_) => "MissingCredential",
            StudyError::InvalidOptions(_) | StudyError::InvalidConfig(_) => "InvalidInput",
            StudyError::Bind { .. } | StudyError::Internal(_) => "Internal",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_display() {
        let e = StudyError::NotFound {
            path: "/nonexistent.md".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("not found"), "got: {msg}");
        assert!(msg.contains("/nonexistent.md"));
        assert_eq!(e.kind(), "NotFound");
    }

    #[test]
    fn unsupported_format_names_extension() {
        let e = StudyError::UnsupportedFormat {
            path: "report.docx".into(),
            extension: ".docx".into(),
        };
        assert!(e.to_string().contains(".docx"));
        assert_eq!(e.kind(), "UnsupportedFormat");
    }

    #[test]
    fn remote_api_display_carries_status_and_body() {
        let e = StudyError::RemoteApi {
            status: 422,
            body: r#"{"message":"name already exists"}"#.into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("422"));
        assert!(msg.contains("name already exists"));
        assert_eq!(e.kind(), "RemoteAPIError");
    }

    #[test]
    fn generation_failed_display() {
        let e = StudyError::GenerationFailed {
            task: "summary",
            detail: "timed out after 60s".into(),
        };
        assert!(e.to_string().contains("summary"));
        assert!(e.to_string().contains("60s"));
    }

    #[test]
    fn missing_credential_display() {
        let e = StudyError::MissingCredential("GITHUB_TOKEN");
        assert_eq!(e.to_string(), "GITHUB_TOKEN is not configured");
    }
}
