//! Pipeline stages for document-to-study-material processing.
//!
//! Each submodule implements exactly one step. Keeping stages separate
//! makes each independently testable and lets the orchestrator in
//! [`crate::workflow`] compose them without knowing their internals.
//!
//! ## Data Flow
//!
//! ```text
//! reader ──▶ generate ──▶ postprocess ──▶ publish
//! (file)     (LLM)        (cleanup)       (GitHub)
//!                  └──▶ flashcards (parse/render)
//! ```
//!
//! 1. [`reader`]: path → text; pdfium for PDFs on the blocking pool
//! 2. [`generate`]: summary, flashcards and notes through the completion
//!    service; the only stage that talks to the model
//! 3. [`postprocess`]: deterministic cleanup of model output
//! 4. [`flashcards`]: lenient parsing of `Q: … | A: …` lines and
//!    `flashcards.md` rendering
//! 5. [`publish`]: create the repository and commit the files one by one

pub mod flashcards;
pub mod generate;
pub mod postprocess;
pub mod publish;
pub mod reader;
