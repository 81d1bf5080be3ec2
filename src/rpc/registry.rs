//! Method registry: name → (declared params, handler).
//!
//! Dispatch is a plain map lookup. Every method declares its parameter names
//! in order so positional calls bind the same way as named ones, and the
//! server can list what it serves without reflection.

use crate::rpc::protocol::{Params, RpcError};
use crate::rpc::server::AppState;
use futures::future::BoxFuture;
use serde_json::Value;
use std::collections::HashMap;

/// Handler signature. `Ok` carries the operation envelope, `Err` a
/// protocol error (bad params).
pub type Handler = fn(AppState, Params) -> BoxFuture<'static, Result<Value, RpcError>>;

/// A registered method.
#[derive(Clone, Copy)]
pub struct MethodSpec {
    pub name: &'static str,
    pub params: &'static [&'static str],
    pub handler: Handler,
}

/// All methods the server answers.
#[derive(Clone, Default)]
pub struct MethodRegistry {
    methods: HashMap<&'static str, MethodSpec>,
}

impl MethodRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in method.
    pub fn standard() -> Self {
        use crate::rpc::methods;

        let mut registry = Self::new();
        registry.register("process_document", &["file_path", "options"], methods::process_document);
        registry.register(
            "create_study_repo",
            &["repo_name", "content", "options"],
            methods::create_study_repo,
        );
        registry.register(
            "create_github_repository",
            &["repo_name", "content", "options"],
            methods::create_study_repo,
        );
        registry.register(
            "complete_workflow",
            &["file_path", "repo_name", "options"],
            methods::complete_workflow,
        );
        registry.register("get_server_status", &[], methods::get_server_status);
        registry.register("ask_assistant", &["question", "history"], methods::ask_assistant);
        registry
    }

    /// Add or replace a method.
    pub fn register(&mut self, name: &'static str, params: &'static [&'static str], handler: Handler) {
        self.methods.insert(
            name,
            MethodSpec {
                name,
                params,
                handler,
            },
        );
    }

    pub fn get(&self, name: &str) -> Option<&MethodSpec> {
        self.methods.get(name)
    }

    /// Registered method names, sorted.
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.methods.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Bind params and run the named method.
    pub async fn call(
        &self,
        state: AppState,
        method: &str,
        params: Option<Value>,
    ) -> Result<Value, RpcError> {
        let spec = self
            .get(method)
            .ok_or_else(|| RpcError::method_not_found(method))?;
        let params = Params::bind(spec.params, params)?;
        (spec.handler)(state, params).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_registry_lists_every_method() {
        let r = MethodRegistry::standard();
        assert_eq!(
            r.names(),
            [
                "ask_assistant",
                "complete_workflow",
                "create_github_repository",
                "create_study_repo",
                "get_server_status",
                "process_document",
            ]
        );
    }

    #[test]
    fn alias_shares_params() {
        let r = MethodRegistry::standard();
        let a = r.get("create_study_repo").unwrap();
        let b = r.get("create_github_repository").unwrap();
        assert_eq!(a.params, b.params);
        assert_eq!(a.params, ["repo_name", "content", "options"]);
    }
}
