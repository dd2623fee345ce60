//! Taskboard RPC - Protocol Types
//!
//! JSON-RPC 2.0 compatible types for the taskboard RPC surface.
//! This crate is the single source of truth for all protocol types,
//! method names, error codes, and the per-connection session context.

pub mod context;
pub mod error;
pub mod forms;
pub mod jsonrpc;
pub mod methods;

pub use context::SessionContext;
pub use error::{DomainError, HandlerError, RpcError, RpcErrorCode};
pub use jsonrpc::{
    HandlerResult, RequestId, RpcErrorResponse, RpcRequest, RpcResponse, RpcSuccessResponse,
};
pub use methods::{MethodName, Methods};
