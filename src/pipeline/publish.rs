//! Repository publishing: create a repository and commit the study files.
//!
//! Files are written one commit at a time in a fixed order:
//!
//! 1. `README.md` titled with the repository name, with every section (always)
//! 2. `flashcards.md` (when flashcards are non-empty)
//! 3. `study_notes.md` (when notes are present)
//!
//! There is no rollback. If a later commit fails the repository stays
//! partially populated and the error is returned unchanged.

use crate::error::StudyError;
use crate::hosting::RepositoryHost;
use crate::model::{CommitRequest, CommitResult, RepositoryDescriptor, StudyMaterial};
use crate::options::WorkflowOptions;
use crate::pipeline::flashcards::render_flashcards_markdown;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::info;

pub const README_COMMIT_MESSAGE: &str = "Initial commit: add study materials";
pub const FLASHCARDS_COMMIT_MESSAGE: &str = "Add flashcards";
pub const NOTES_COMMIT_MESSAGE: &str = "Add study notes";

const NOT_AVAILABLE: &str = "Not available";

/// Publishes [`StudyMaterial`] to a [`RepositoryHost`].
#[derive(Clone)]
pub struct Publisher {
    host: Arc<dyn RepositoryHost>,
}

impl Publisher {
    pub fn new(host: Arc<dyn RepositoryHost>) -> Self {
        Self { host }
    }

    pub fn host(&self) -> &Arc<dyn RepositoryHost> {
        &self.host
    }

    /// Create a repository, initialised with an empty default branch.
    pub async fn create_repository(
        &self,
        name: &str,
        description: &str,
        private: bool,
    ) -> Result<RepositoryDescriptor, StudyError> {
        self.host.create_repository(name, description, private).await
    }

    /// Write one file into an existing repository.
    pub async fn commit_file(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
        content: &str,
        message: &str,
    ) -> Result<CommitResult, StudyError> {
        let request = CommitRequest::new(path, content, message);
        self.host.commit_file(owner, repo, &request).await
    }

    /// Create `name` and commit every study file into it.
    pub async fn publish(
        &self,
        name: &str,
        material: &StudyMaterial,
        options: &WorkflowOptions,
    ) -> Result<RepositoryDescriptor, StudyError> {
        let description = options
            .description
            .clone()
            .unwrap_or_else(|| default_description(Utc::now()));

        let repo = self
            .create_repository(name, &description, options.private)
            .await?;

        for file in study_files(&repo.name, material) {
            self.commit_file(&repo.owner, &repo.name, &file.path, &file.content, &file.message)
                .await?;
        }

        info!("Published study material to {}", repo.repo_url);
        Ok(repo)
    }
}

/// `Study material generated by study-forge - YYYY-MM-DD`.
pub fn default_description(now: DateTime<Utc>) -> String {
    format!(
        "Study material generated by study-forge - {}",
        now.format("%Y-%m-%d")
    )
}

/// Commits for one publish, in order.
pub fn study_files(repo_name: &str, material: &StudyMaterial) -> Vec<CommitRequest> {
    let mut files = vec![CommitRequest::new(
        "README.md",
        render_readme(repo_name, material),
        README_COMMIT_MESSAGE,
    )];

    if !material.flashcards.trim().is_empty() {
        files.push(CommitRequest::new(
            "flashcards.md",
            render_flashcards_markdown(&material.flashcards),
            FLASHCARDS_COMMIT_MESSAGE,
        ));
    }

    if let Some(notes) = material.study_notes.as_deref().filter(|n| !n.trim().is_empty()) {
        files.push(CommitRequest::new(
            "study_notes.md",
            format!("# Study Notes\n\n{}\n", notes.trim()),
            NOTES_COMMIT_MESSAGE,
        ));
    }

    files
}

/// README titled `title` with summary, flashcards and notes sections plus a
/// timestamp.
pub fn render_readme(title: &str, material: &StudyMaterial) -> String {
    fn section(text: Option<&str>) -> &str {
        match text.map(str::trim) {
            Some(t) if !t.is_empty() => t,
            _ => NOT_AVAILABLE,
        }
    }

    format!(
        "# {}\n\n\
Study material generated automatically from a source document.\n\n\
## Summary\n\n{}\n\n\
## Flashcards\n\n{}\n\n\
## Study Notes\n\n{}\n\n\
---\n\n*Generated on {}*\n",
        title.trim(),
        section(Some(material.summary.as_str())),
        section(Some(material.flashcards.as_str())),
        section(material.study_notes.as_deref()),
        material.generated_at.format("%Y-%m-%d %H:%M:%S UTC"),
    )
}
