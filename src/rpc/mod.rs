//! JSON-RPC 2.0 over HTTP.
//!
//! ```text
//! POST / ──▶ server (axum) ──▶ registry (name → handler) ──▶ methods ──▶ Workflow
//! GET /health ──▶ server
//! ```
//!
//! - [`protocol`]: request/response envelopes, error codes, param binding
//! - [`registry`]: method table
//! - [`methods`]: the built-in handlers
//! - [`server`]: router, shared state and the serve loop

pub mod methods;
pub mod protocol;
pub mod registry;
pub mod server;

pub use protocol::{RpcError, RpcRequest, RpcResponse};
pub use registry::MethodRegistry;
pub use server::{router, serve, serve_with_shutdown, AppState};
