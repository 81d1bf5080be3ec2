//! # study-forge
//!
//! Turn a document into study material with a language model and publish it
//! as a GitHub repository.
//!
//! ## Why this crate?
//!
//! Reading a chapter and then writing your own summary, flashcards and notes
//! is the slow part of studying. This crate reads the document (PDF,
//! Markdown or plain text), asks a chat model for the three artefacts with
//! task-specific prompts and sampling settings, and can publish the result as
//! a fresh repository so the material lives next to the rest of your notes.
//!
//! ## Pipeline Overview
//!
//! ```text
//! file
//!  │
//!  ├─ 1. Read      extension dispatch; pdfium per page (spawn_blocking)
//!  ├─ 2. Generate  summary, flashcards, notes (one completion call each)
//!  ├─ 3. Polish    strip fences, normalise whitespace, drop invisible chars
//!  └─ 4. Publish   POST /user/repos, then one PUT per file
//! ```
//!
//! The same operations are exposed three ways: as library calls on
//! [`Workflow`], as JSON-RPC 2.0 methods over HTTP (see [`rpc`]) and as the
//! `study-forge` command-line binary.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use study_forge::{ServerConfig, Workflow, WorkflowOptions};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Provider auto-detected from OPENAI_API_KEY / ANTHROPIC_API_KEY / …
//!     let config = ServerConfig::builder()
//!         .github_token(std::env::var("GITHUB_TOKEN").ok())
//!         .build()?;
//!     let workflow = Workflow::from_config(&config)?;
//!
//!     let report = workflow
//!         .complete_workflow("chapter3.md", "chapter3-study", &WorkflowOptions::default())
//!         .await?;
//!     println!("{}", report.repository.repo_url);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `study-forge` binary (clap + anyhow + tracing-subscriber + indicatif + dotenvy) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! study-forge = { version = "0.2", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod chat;
pub mod completion;
pub mod config;
pub mod error;
pub mod hosting;
pub mod model;
pub mod options;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod rpc;
pub mod workflow;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use chat::ChatSession;
pub use completion::{Completion, CompletionRequest, CompletionService, LlmCompletion, PromptMessage, Role};
pub use config::{GenerationSettings, ServerConfig, ServerConfigBuilder, SERVER_NAME, VERSION};
pub use error::StudyError;
pub use hosting::{GitHubClient, RepositoryHost};
pub use model::{
    CommitRequest, CommitResult, DocumentFormat, ProcessedDocument, RepositoryDescriptor,
    SourceDocument, StudyMaterial, WorkflowReport,
};
pub use options::WorkflowOptions;
pub use pipeline::flashcards::{parse_flashcards, Flashcard};
pub use pipeline::reader::read_document;
pub use progress::{NoopObserver, WorkflowObserver, WorkflowStage};
pub use workflow::Workflow;
