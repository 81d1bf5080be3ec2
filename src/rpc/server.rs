//! HTTP front-end: `POST /` for JSON-RPC, `GET /health` for health checks.
//!
//! The handler never fails the HTTP exchange for an operation error. HTTP
//! status codes are reserved for transport problems:
//!
//! | Situation | Status | Body |
//! |-----------|--------|------|
//! | body is not JSON | 400 | `{"error": "..."}` |
//! | only notifications | 204 | empty |
//! | anything else | 200 | JSON-RPC response (or batch array) |
//!
//! Batch members run one after another in request order.

use crate::config::{ServerConfig, SERVER_NAME, VERSION};
use crate::error::StudyError;
use crate::rpc::protocol::{RpcError, RpcRequest, RpcResponse};
use crate::rpc::registry::MethodRegistry;
use crate::workflow::Workflow;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde_json::{json, Value};
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tracing::{info, warn};

/// Shared, read-only server state.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<StateInner>,
}

struct StateInner {
    config: ServerConfig,
    workflow: Workflow,
    registry: MethodRegistry,
}

impl AppState {
    /// State with the standard method set.
    pub fn new(config: ServerConfig, workflow: Workflow) -> Self {
        Self::with_registry(config, workflow, MethodRegistry::standard())
    }

    pub fn with_registry(config: ServerConfig, workflow: Workflow, registry: MethodRegistry) -> Self {
        Self {
            inner: Arc::new(StateInner {
                config,
                workflow,
                registry,
            }),
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.inner.config
    }

    pub fn workflow(&self) -> &Workflow {
        &self.inner.workflow
    }

    pub fn registry(&self) -> &MethodRegistry {
        &self.inner.registry
    }
}

/// The axum router for `state`.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", post(rpc_endpoint))
        .route("/health", get(health))
        .with_state(state)
}

/// Bind `config.bind_addr()` and serve until Ctrl-C.
pub async fn serve(state: AppState) -> Result<(), StudyError> {
    let addr = state.config().bind_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|source| StudyError::Bind {
            addr: addr.clone(),
            source,
        })?;
    serve_with_shutdown(listener, state, shutdown_signal()).await
}

/// Serve on an already-bound listener until `shutdown` resolves.
pub async fn serve_with_shutdown(
    listener: TcpListener,
    state: AppState,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(), StudyError> {
    let local = listener
        .local_addr()
        .map(|a| a.to_string())
        .unwrap_or_else(|_| "<unknown>".to_string());
    info!("{} v{} listening on {}", SERVER_NAME, VERSION, local);
    info!(
        "Completion key configured: {}, hosting token configured: {}",
        state.config().has_openai_key(),
        state.workflow().publisher().host().is_configured()
    );

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| StudyError::Internal(format!("server error: {e}")))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": Utc::now(),
        "server": format!("{SERVER_NAME} v{VERSION}"),
    }))
}

async fn rpc_endpoint(State(state): State<AppState>, body: Bytes) -> Response {
    let payload: Value = match serde_json::from_slice(&body) {
        Ok(v) => v,
        Err(e) => {
            warn!("Rejected request body: {}", e);
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": format!("Invalid JSON body: {e}") })),
            )
                .into_response();
        }
    };

    match payload {
        Value::Array(items) if items.is_empty() => Json(RpcResponse::error(
            Value::Null,
            RpcError::invalid_request("empty batch"),
        ))
        .into_response(),
        Value::Array(items) => {
            let mut responses = Vec::with_capacity(items.len());
            for item in items {
                if let Some(resp) = dispatch(&state, item).await {
                    responses.push(resp);
                }
            }
            if responses.is_empty() {
                StatusCode::NO_CONTENT.into_response()
            } else {
                Json(responses).into_response()
            }
        }
        single => match dispatch(&state, single).await {
            Some(resp) => Json(resp).into_response(),
            None => StatusCode::NO_CONTENT.into_response(),
        },
    }
}

/// Run one request; `None` for notifications.
async fn dispatch(state: &AppState, value: Value) -> Option<RpcResponse> {
    let fallback_id = value.get("id").cloned().unwrap_or(Value::Null);

    let request: RpcRequest = match serde_json::from_value(value) {
        Ok(r) => r,
        Err(e) => {
            warn!("Invalid JSON-RPC request: {}", e);
            return Some(RpcResponse::error(
                fallback_id,
                RpcError::invalid_request(format!("Invalid request: {e}")),
            ));
        }
    };

    let start = Instant::now();
    let outcome = match request.check_version() {
        Ok(()) => {
            state
                .registry()
                .call(state.clone(), &request.method, request.params.clone())
                .await
        }
        Err(e) => Err(e),
    };

    match &outcome {
        Ok(_) => info!("RPC {} handled in {:?}", request.method, start.elapsed()),
        Err(e) => warn!("RPC {} rejected ({}): {}", request.method, e.code, e.message),
    }

    let id = request.id?;
    Some(match outcome {
        Ok(result) => RpcResponse::result(id, result),
        Err(error) => RpcResponse::error(id, error),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::completion::UnavailableCompletion;
    use crate::hosting::GitHubClient;

    fn state() -> AppState {
        let config = ServerConfig::builder()
            .github_api_base("http://127.0.0.1:9")
            .build()
            .unwrap();
        let completion = Arc::new(UnavailableCompletion::new("none", "no provider"));
        let host = Arc::new(GitHubClient::from_config(&config).unwrap());
        let workflow = Workflow::new(completion, host, &config);
        AppState::new(config, workflow)
    }

    #[tokio::test]
    async fn unknown_method_is_32601() {
        let resp = dispatch(&state(), json!({"jsonrpc": "2.0", "method": "nope", "id": 1}))
            .await
            .unwrap();
        assert_eq!(resp.error.unwrap().code, crate::rpc::protocol::METHOD_NOT_FOUND);
        assert_eq!(resp.id, json!(1));
    }

    #[tokio::test]
    async fn notification_gets_no_response() {
        let resp = dispatch(&state(), json!({"jsonrpc": "2.0", "method": "get_server_status"})).await;
        assert!(resp.is_none());
    }

    #[tokio::test]
    async fn non_object_member_is_invalid_request() {
        let resp = dispatch(&state(), json!(42)).await.unwrap();
        assert_eq!(resp.error.unwrap().code, crate::rpc::protocol::INVALID_REQUEST);
        assert_eq!(resp.id, Value::Null);
    }

    #[tokio::test]
    async fn missing_param_is_32602() {
        let resp = dispatch(
            &state(),
            json!({"jsonrpc": "2.0", "method": "process_document", "params": {}, "id": "a"}),
        )
        .await
        .unwrap();
        assert_eq!(resp.error.unwrap().code, crate::rpc::protocol::INVALID_PARAMS);
    }

    #[tokio::test]
    async fn status_reports_integrations() {
        let resp = dispatch(
            &state(),
            json!({"jsonrpc": "2.0", "method": "get_server_status", "id": 7}),
        )
        .await
        .unwrap();
        let result = resp.result.unwrap();
        assert_eq!(result["success"], true);
        assert_eq!(result["data"]["status"], "running");
        assert_eq!(result["data"]["integrations"]["github"], false);
        assert_eq!(result["data"]["supported_formats"].as_array().unwrap().len(), 5);
    }
}
