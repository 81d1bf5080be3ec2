//! Document reading: turn a file path into plain text.
//!
//! Dispatch is by extension only; file contents are never sniffed. PDFs go
//! through pdfium page by page on the blocking pool, because pdfium keeps
//! thread-local state and must not run on a Tokio worker. A page whose text
//! layer cannot be extracted is logged and contributes an empty string, so
//! one damaged page never costs the whole document.

use crate::error::StudyError;
use crate::model::{DocumentFormat, SourceDocument};
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Environment variable naming an explicit pdfium shared library.
pub const PDFIUM_LIB_PATH_ENV: &str = "PDFIUM_LIB_PATH";

/// Read a supported document and return its extracted text.
///
/// # Errors
/// - [`StudyError::NotFound`] if `path` does not exist
/// - [`StudyError::UnsupportedFormat`] for extensions other than
///   `.pdf`, `.md`, `.markdown`, `.txt`, `.text`
/// - [`StudyError::EmptyContent`] if the text is blank after trimming
pub async fn read_document(path: impl AsRef<Path>) -> Result<SourceDocument, StudyError> {
    let path = path.as_ref().to_path_buf();

    if !path.exists() {
        return Err(StudyError::NotFound { path });
    }
    let format = DocumentFormat::from_path(&path)?;
    debug!("Reading {} as {:?}", path.display(), format);

    let text = match format {
        DocumentFormat::Pdf => {
            let pdf_path = path.clone();
            tokio::task::spawn_blocking(move || extract_pdf_text(&pdf_path))
                .await
                .map_err(|e| StudyError::Internal(format!("PDF task panicked: {}", e)))??
        }
        DocumentFormat::Markdown | DocumentFormat::Text => read_utf8(&path).await?,
    };

    if text.trim().is_empty() {
        return Err(StudyError::EmptyContent { path });
    }

    info!(
        "Read {} ({} chars)",
        path.display(),
        text.chars().count()
    );

    Ok(SourceDocument { path, format, text })
}

/// Read a text-like file verbatim as UTF-8.
async fn read_utf8(path: &Path) -> Result<String, StudyError> {
    let bytes = tokio::fs::read(path).await.map_err(|e| io_error(path, e))?;
    String::from_utf8(bytes).map_err(|_| StudyError::InvalidEncoding {
        path: path.to_path_buf(),
    })
}

fn io_error(path: &Path, source: std::io::Error) -> StudyError {
    if source.kind() == std::io::ErrorKind::NotFound {
        StudyError::NotFound {
            path: path.to_path_buf(),
        }
    } else {
        StudyError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Blocking per-page text extraction.
fn extract_pdf_text(pdf_path: &Path) -> Result<String, StudyError> {
    let pdfium = bind_pdfium()?;

    let document = pdfium
        .load_pdf_from_file(pdf_path, None)
        .map_err(|e| StudyError::PdfOpen {
            path: pdf_path.to_path_buf(),
            detail: format!("{:?}", e),
        })?;

    let pages = document.pages();
    let total_pages = pages.len() as usize;
    info!("PDF loaded: {} pages", total_pages);

    let mut texts = Vec::with_capacity(total_pages);
    for (idx, page) in pages.iter().enumerate() {
        match page.text() {
            Ok(text) => texts.push(text.all()),
            Err(e) => {
                warn!("Error extracting page {}: {:?}", idx + 1, e);
                texts.push(String::new());
            }
        }
    }

    Ok(join_pages(&texts))
}

/// Join per-page texts, one newline after each page, then trim.
fn join_pages(pages: &[String]) -> String {
    let mut out = String::with_capacity(pages.iter().map(|p| p.len() + 1).sum());
    for page in pages {
        out.push_str(page);
        out.push('\n');
    }
    out.trim().to_string()
}

/// Bind pdfium, preferring an explicit library path.
///
/// `PDFIUM_LIB_PATH` may name the library file or the directory holding it.
fn bind_pdfium() -> Result<Pdfium, StudyError> {
    let bindings = match std::env::var(PDFIUM_LIB_PATH_ENV) {
        Ok(configured) if !configured.is_empty() => {
            let lib_path = resolve_library_file(PathBuf::from(configured));
            let lib_path = lib_path.to_string_lossy().to_string();
            debug!("Binding pdfium from {}", lib_path);
            Pdfium::bind_to_library(&lib_path)
        }
        _ => Pdfium::bind_to_system_library(),
    }
    .map_err(|e| StudyError::PdfiumUnavailable(format!("{:?}", e)))?;

    Ok(Pdfium::new(bindings))
}

/// Expand a directory into the platform library file inside it.
fn resolve_library_file(path: PathBuf) -> PathBuf {
    if !path.is_dir() {
        return path;
    }
    let name = if cfg!(target_os = "windows") {
        "pdfium.dll"
    } else if cfg!(target_os = "macos") {
        "libpdfium.dylib"
    } else {
        "libpdfium.so"
    };
    path.join(name)
}
