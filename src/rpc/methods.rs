//! Built-in RPC method handlers.
//!
//! Each handler binds and validates its arguments (bad arguments are a
//! JSON-RPC `-32602`), runs one workflow operation and wraps the outcome
//! in the `{success, data | error}` envelope. Operation failures are never
//! protocol errors.

use crate::chat::ChatSession;
use crate::completion::PromptMessage;
use crate::config::{SERVER_NAME, VERSION};
use crate::model::{DocumentFormat, StudyMaterial};
use crate::options::WorkflowOptions;
use crate::rpc::protocol::{envelope, success, Params, RpcError};
use crate::rpc::server::AppState;
use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use futures::FutureExt;
use serde::Serialize;
use serde_json::Value;

type HandlerResult = BoxFuture<'static, Result<Value, RpcError>>;

fn options(params: &mut Params) -> Result<WorkflowOptions, RpcError> {
    WorkflowOptions::from_json(params.take("options"))
        .map_err(|e| RpcError::invalid_params(e.to_string()))
}

/// `process_document(file_path, options?)`
pub fn process_document(state: AppState, mut params: Params) -> HandlerResult {
    async move {
        let file_path: String = params.required("file_path")?;
        let options = options(&mut params)?;
        let outcome = state.workflow().process_document(&file_path, &options).await;
        Ok(envelope(outcome))
    }
    .boxed()
}

/// `create_study_repo(repo_name, content, options?)`
///
/// `content` is a study-material object; the full `process_document`
/// payload is accepted as-is.
pub fn create_study_repo(state: AppState, mut params: Params) -> HandlerResult {
    async move {
        let repo_name: String = params.required("repo_name")?;
        let content: StudyMaterial = params.required("content")?;
        let options = options(&mut params)?;
        let outcome = state
            .workflow()
            .create_study_repository(&repo_name, &content, &options)
            .await;
        Ok(envelope(outcome))
    }
    .boxed()
}

/// `complete_workflow(file_path, repo_name, options?)`
pub fn complete_workflow(state: AppState, mut params: Params) -> HandlerResult {
    async move {
        let file_path: String = params.required("file_path")?;
        let repo_name: String = params.required("repo_name")?;
        let options = options(&mut params)?;
        let outcome = state
            .workflow()
            .complete_workflow(&file_path, &repo_name, &options)
            .await;
        Ok(envelope(outcome))
    }
    .boxed()
}

/// Data of `get_server_status`.
#[derive(Debug, Clone, Serialize)]
pub struct ServerStatus {
    pub server_name: &'static str,
    pub version: &'static str,
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
    pub capabilities: Vec<&'static str>,
    pub supported_formats: Vec<&'static str>,
    pub integrations: Integrations,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Integrations {
    pub openai: bool,
    pub github: bool,
}

impl ServerStatus {
    pub fn collect(state: &AppState) -> Self {
        Self {
            server_name: SERVER_NAME,
            version: VERSION,
            status: "running",
            timestamp: Utc::now(),
            capabilities: vec![
                "document_processing",
                "github_integration",
                "ai_content_generation",
                "study_materials_creation",
                "complete_workflow",
                "assistant_chat",
            ],
            supported_formats: DocumentFormat::SUPPORTED_EXTENSIONS.to_vec(),
            integrations: Integrations {
                openai: state.config().has_openai_key(),
                github: state.workflow().publisher().host().is_configured(),
            },
        }
    }
}

/// `get_server_status()`
pub fn get_server_status(state: AppState, _params: Params) -> HandlerResult {
    async move { Ok(success(ServerStatus::collect(&state))) }.boxed()
}

/// Data of `ask_assistant`.
#[derive(Debug, Clone, Serialize)]
pub struct AssistantReply {
    pub answer: String,
    /// Full history including this turn; send it back to continue.
    pub history: Vec<PromptMessage>,
}

/// `ask_assistant(question, history?)`
pub fn ask_assistant(state: AppState, mut params: Params) -> HandlerResult {
    async move {
        let question: String = params.required("question")?;
        let history: Option<Vec<PromptMessage>> = params.optional("history")?;

        let settings = state.workflow().generator().settings();
        let mut session = match history {
            Some(h) => ChatSession::from_history(h, settings),
            None => ChatSession::new(settings),
        };

        let outcome = session
            .ask(state.workflow().completion().as_ref(), &question)
            .await
            .map(|answer| AssistantReply {
                answer,
                history: session.history().to_vec(),
            });
        Ok(envelope(outcome))
    }
    .boxed()
}
