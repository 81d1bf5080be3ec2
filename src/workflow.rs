//! Workflow orchestration: Reader → Generator → Publisher.
//!
//! Three entry points mirror the RPC methods:
//!
//! - [`Workflow::process_document`]: read a file and generate material
//! - [`Workflow::create_study_repository`]: publish existing material
//! - [`Workflow::complete_workflow`]: both, fail-fast
//!
//! Control flow is strictly linear. Each stage is bracketed by observer
//! events and an `info!` line; the first failure is logged once at `error!`
//! and returned unchanged, so a failed read never reaches the completion
//! service and a failed generation never creates a repository.

use crate::completion::{CompletionService, LlmCompletion, UnavailableCompletion};
use crate::config::ServerConfig;
use crate::error::StudyError;
use crate::hosting::{GitHubClient, RepositoryHost};
use crate::model::{ProcessedDocument, RepositoryDescriptor, StudyMaterial, WorkflowReport};
use crate::options::WorkflowOptions;
use crate::pipeline::generate::ContentGenerator;
use crate::pipeline::publish::Publisher;
use crate::pipeline::reader::read_document;
use crate::progress::{NoopObserver, SharedObserver, WorkflowStage};
use chrono::Utc;
use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

/// The orchestrator. Cheap to clone; every handle inside is shared.
#[derive(Clone)]
pub struct Workflow {
    completion: Arc<dyn CompletionService>,
    generator: ContentGenerator,
    publisher: Publisher,
    observer: SharedObserver,
}

impl Workflow {
    /// Compose a workflow from explicit backends.
    pub fn new(
        completion: Arc<dyn CompletionService>,
        host: Arc<dyn RepositoryHost>,
        config: &ServerConfig,
    ) -> Self {
        Self {
            generator: ContentGenerator::new(completion.clone(), config.generation.clone()),
            completion,
            publisher: Publisher::new(host),
            observer: Arc::new(NoopObserver),
        }
    }

    /// Build the production backends from configuration.
    ///
    /// A completion provider that cannot be resolved is not fatal: the
    /// workflow is built with [`UnavailableCompletion`] and every generation
    /// call reports why.
    pub fn from_config(config: &ServerConfig) -> Result<Self, StudyError> {
        let completion: Arc<dyn CompletionService> = match LlmCompletion::from_config(config) {
            Ok(llm) => Arc::new(llm),
            Err(e) => {
                warn!("Completion service unavailable: {}", e);
                Arc::new(UnavailableCompletion::new(&config.model, e.to_string()))
            }
        };
        let host: Arc<dyn RepositoryHost> = Arc::new(GitHubClient::from_config(config)?);
        Ok(Self::new(completion, host, config))
    }

    /// Replace the stage observer.
    pub fn with_observer(mut self, observer: SharedObserver) -> Self {
        self.observer = observer;
        self
    }

    pub fn completion(&self) -> &Arc<dyn CompletionService> {
        &self.completion
    }

    pub fn generator(&self) -> &ContentGenerator {
        &self.generator
    }

    pub fn publisher(&self) -> &Publisher {
        &self.publisher
    }

    /// Read `file_path` and generate study material from it.
    pub async fn process_document(
        &self,
        file_path: impl AsRef<Path>,
        options: &WorkflowOptions,
    ) -> Result<ProcessedDocument, StudyError> {
        let file_path = file_path.as_ref();
        info!("Processing document: {}", file_path.display());

        let document = self
            .stage(WorkflowStage::Reading, read_document(file_path))
            .await?;
        let material = self
            .stage(
                WorkflowStage::Generating,
                self.generator.generate(&document, options),
            )
            .await?;

        Ok(ProcessedDocument {
            file_path: file_path.display().to_string(),
            file_size: document.char_len(),
            processed_at: Utc::now(),
            material,
        })
    }

    /// Publish `material` as a new repository named `repo_name`.
    pub async fn create_study_repository(
        &self,
        repo_name: &str,
        material: &StudyMaterial,
        options: &WorkflowOptions,
    ) -> Result<RepositoryDescriptor, StudyError> {
        let repo_name = repo_name.trim();
        if repo_name.is_empty() {
            return Err(StudyError::InvalidOptions(
                "repo_name must not be empty".to_string(),
            ));
        }
        info!("Creating study repository: {}", repo_name);

        self.stage(
            WorkflowStage::Publishing,
            self.publisher.publish(repo_name, material, options),
        )
        .await
    }

    /// Process `file_path`, then publish the result as `repo_name`.
    pub async fn complete_workflow(
        &self,
        file_path: impl AsRef<Path>,
        repo_name: &str,
        options: &WorkflowOptions,
    ) -> Result<WorkflowReport, StudyError> {
        let start = Instant::now();

        let processed = self.process_document(file_path, options).await?;
        let repository = self
            .create_study_repository(repo_name, &processed.material, options)
            .await?;

        info!(
            "Workflow complete: {} in {:?}",
            repository.repo_url,
            start.elapsed()
        );

        Ok(WorkflowReport {
            workflow: "complete".to_string(),
            file_processing: processed,
            repository,
            completed_at: Utc::now(),
        })
    }

    async fn stage<T>(
        &self,
        stage: WorkflowStage,
        fut: impl Future<Output = Result<T, StudyError>>,
    ) -> Result<T, StudyError> {
        self.observer.on_stage_start(stage);
        let start = Instant::now();
        match fut.await {
            Ok(value) => {
                info!("Stage {} finished in {:?}", stage, start.elapsed());
                self.observer.on_stage_complete(stage);
                Ok(value)
            }
            Err(e) => {
                error!("Stage {} failed: {}", stage, e);
                self.observer.on_stage_error(stage, &e.to_string());
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::completion::{Completion, CompletionRequest};
    use crate::model::{CommitRequest, CommitResult};
    use crate::progress::WorkflowObserver;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct EchoCompletion {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl CompletionService for EchoCompletion {
        fn model(&self) -> &str {
            "echo"
        }

        async fn complete(&self, request: &CompletionRequest) -> Result<Completion, StudyError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let text = if request.messages[0].content == crate::prompts::FLASHCARD_SYSTEM_PROMPT {
                "Q: What is tested? | A: The workflow".to_string()
            } else {
                format!("Generated with max_tokens={}", request.max_tokens)
            };
            Ok(Completion {
                text,
                ..Default::default()
            })
        }
    }

    #[derive(Default)]
    struct CountingHost {
        creates: AtomicUsize,
    }

    #[async_trait]
    impl RepositoryHost for CountingHost {
        async fn create_repository(
            &self,
            name: &str,
            _description: &str,
            private: bool,
        ) -> Result<RepositoryDescriptor, StudyError> {
            self.creates.fetch_add(1, Ordering::SeqCst);
            Ok(RepositoryDescriptor {
                name: name.into(),
                full_name: format!("tester/{name}"),
                owner: "tester".into(),
                private,
                description: None,
                created_at: String::new(),
                repo_url: format!("https://github.com/tester/{name}"),
                clone_url: format!("https://github.com/tester/{name}.git"),
            })
        }

        async fn commit_file(
            &self,
            _owner: &str,
            _repo: &str,
            request: &CommitRequest,
        ) -> Result<CommitResult, StudyError> {
            Ok(CommitResult {
                path: request.path.clone(),
                ..Default::default()
            })
        }

        fn is_configured(&self) -> bool {
            true
        }
    }

    #[derive(Default)]
    struct StageLog(Mutex<Vec<String>>);

    impl WorkflowObserver for StageLog {
        fn on_stage_start(&self, stage: WorkflowStage) {
            self.0.lock().unwrap().push(format!("+{stage}"));
        }
        fn on_stage_complete(&self, stage: WorkflowStage) {
            self.0.lock().unwrap().push(format!("-{stage}"));
        }
        fn on_stage_error(&self, stage: WorkflowStage, _error: &str) {
            self.0.lock().unwrap().push(format!("!{stage}"));
        }
    }

    fn fixture() -> (Workflow, Arc<EchoCompletion>, Arc<CountingHost>) {
        let completion = Arc::new(EchoCompletion {
            calls: AtomicUsize::new(0),
        });
        let host = Arc::new(CountingHost::default());
        let wf = Workflow::new(completion.clone(), host.clone(), &ServerConfig::default());
        (wf, completion, host)
    }

    fn write_doc(dir: &tempfile::TempDir, name: &str, body: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, body).unwrap();
        path
    }

    #[tokio::test]
    async fn complete_workflow_runs_every_stage() {
        let (wf, completion, host) = fixture();
        let log = Arc::new(StageLog::default());
        let wf = wf.with_observer(log.clone());

        let dir = tempfile::tempdir().unwrap();
        let path = write_doc(&dir, "doc.md", &"Photosynthesis converts light. ".repeat(17));

        let report = wf
            .complete_workflow(&path, "repo-test-1", &WorkflowOptions::default())
            .await
            .unwrap();

        assert_eq!(report.workflow, "complete");
        assert_eq!(report.repository.name, "repo-test-1");
        assert!(!report.file_processing.material.summary.is_empty());
        assert_eq!(report.file_processing.material.summary, "Generated with max_tokens=400");
        assert_eq!(completion.calls.load(Ordering::SeqCst), 3);
        assert_eq!(host.creates.load(Ordering::SeqCst), 1);
        assert_eq!(
            *log.0.lock().unwrap(),
            ["+reading", "-reading", "+generating", "-generating", "+publishing", "-publishing"]
        );
    }

    #[tokio::test]
    async fn missing_file_never_reaches_completion() {
        let (wf, completion, host) = fixture();
        let err = wf
            .complete_workflow("/nonexistent.md", "never", &WorkflowOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, StudyError::NotFound { .. }));
        assert_eq!(completion.calls.load(Ordering::SeqCst), 0);
        assert_eq!(host.creates.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn file_size_counts_characters() {
        let (wf, _, _) = fixture();
        let dir = tempfile::tempdir().unwrap();
        let path = write_doc(&dir, "doc.txt", "ñandú");
        let processed = wf
            .process_document(&path, &WorkflowOptions::default())
            .await
            .unwrap();
        assert_eq!(processed.file_size, 5);
        assert_eq!(processed.file_path, path.display().to_string());
    }

    #[tokio::test]
    async fn publishing_twice_creates_twice() {
        let (wf, _, host) = fixture();
        let material = StudyMaterial {
            summary: "s".into(),
            flashcards: String::new(),
            study_notes: None,
            generated_at: Utc::now(),
        };
        let opts = WorkflowOptions::default();
        wf.create_study_repository("dup", &material, &opts).await.unwrap();
        wf.create_study_repository("dup", &material, &opts).await.unwrap();
        assert_eq!(host.creates.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn blank_repo_name_is_rejected() {
        let (wf, _, host) = fixture();
        let material = StudyMaterial {
            summary: "s".into(),
            flashcards: String::new(),
            study_notes: None,
            generated_at: Utc::now(),
        };
        let err = wf
            .create_study_repository("  ", &material, &WorkflowOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, StudyError::InvalidOptions(_)));
        assert_eq!(host.creates.load(Ordering::SeqCst), 0);
    }
}
