//! Error types: JSON-RPC protocol errors and the domain failure taxonomy.
//!
//! Two layers with very different propagation rules:
//!
//! - [`RpcError`] is a JSON-RPC 2.0 error object. It crosses the wire
//!   as the `error` member of a response (parse failures, unknown
//!   methods, malformed requests).
//! - [`DomainError`] is the closed taxonomy of expected failures.
//!   These never surface as JSON-RPC errors: the dispatcher converts
//!   them to a fixed string code returned as the call's *result*.

use serde::{Deserialize, Serialize};

/// Standard JSON-RPC 2.0 error codes plus server errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RpcErrorCode {
    ParseError,
    InvalidRequest,
    MethodNotFound,
    InvalidParams,
    InternalError,
    ServerError,
    Custom(i32),
}

impl RpcErrorCode {
    pub fn code(&self) -> i32 {
        match self {
            Self::ParseError => -32700,
            Self::InvalidRequest => -32600,
            Self::MethodNotFound => -32601,
            Self::InvalidParams => -32602,
            Self::InternalError => -32603,
            Self::ServerError => -32000,
            Self::Custom(c) => *c,
        }
    }

    pub fn from_code(code: i32) -> Self {
        match code {
            -32700 => Self::ParseError,
            -32600 => Self::InvalidRequest,
            -32601 => Self::MethodNotFound,
            -32602 => Self::InvalidParams,
            -32603 => Self::InternalError,
            -32000 => Self::ServerError,
            c => Self::Custom(c),
        }
    }
}

/// JSON-RPC 2.0 error object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl RpcError {
    pub fn new(code: RpcErrorCode, message: impl Into<String>) -> Self {
        Self {
            code: code.code(),
            message: message.into(),
            data: None,
        }
    }

    pub fn parse_error(message: impl Into<String>) -> Self {
        Self::new(RpcErrorCode::ParseError, message)
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(RpcErrorCode::InvalidRequest, message)
    }

    pub fn method_not_found(method: &str) -> Self {
        Self::new(
            RpcErrorCode::MethodNotFound,
            format!("Method not found: {method}"),
        )
    }

    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::new(RpcErrorCode::InvalidParams, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(RpcErrorCode::InternalError, message)
    }

    pub fn error_code(&self) -> RpcErrorCode {
        RpcErrorCode::from_code(self.code)
    }
}

impl std::fmt::Display for RpcError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "RPC Error [{}]: {}", self.code, self.message)
    }
}

impl std::error::Error for RpcError {}

// ─────────────────────────────────────────────────────────────────────────────
// Domain failure taxonomy
// ─────────────────────────────────────────────────────────────────────────────

/// Fixed string codes returned to the caller in place of a result.
pub mod codes {
    pub const AUTHORIZATION_ERROR: &str = "AUTHORIZATION_ERROR";
    pub const ACCESS_DENIED: &str = "ACCESS_DENIED";
    pub const NOT_FOUND: &str = "NOT_FOUND";
    pub const WRONG_OPERANDS: &str = "WRONG_OPERANDS";
    pub const VALIDATION_ERROR: &str = "VALIDATION_ERROR";
    pub const INTERNAL_ERROR: &str = "INTERNAL_ERROR";
}

/// Closed enumeration of expected domain failures.
///
/// Matched exhaustively at the dispatch boundary and converted to a
/// string code; nothing here ever crosses the wire as a thrown error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomainError {
    /// Missing or invalid principal on an auth-required call.
    #[error("authorization required")]
    Authorization,

    /// Membership/ownership failure, or chain-resolution failure for a
    /// task or category. Deliberately also covers "entity does not
    /// exist" for chain-resolved entities, to avoid existence probing.
    #[error("access denied")]
    AccessDenied,

    /// Direct id lookup with no chain dependency found nothing.
    #[error("not found")]
    NotFound,

    /// Semantically invalid operation despite valid permissions.
    #[error("wrong operands")]
    WrongOperands,

    /// Request payload failed field-shape checks.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Unrecognized persistence failure. Logged at error severity by
    /// the dispatcher and reported as INTERNAL_ERROR.
    #[error("store failure: {0}")]
    Store(String),
}

impl DomainError {
    /// The fixed wire code for this failure kind.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Authorization => codes::AUTHORIZATION_ERROR,
            Self::AccessDenied => codes::ACCESS_DENIED,
            Self::NotFound => codes::NOT_FOUND,
            Self::WrongOperands => codes::WRONG_OPERANDS,
            Self::Validation(_) => codes::VALIDATION_ERROR,
            Self::Store(_) => codes::INTERNAL_ERROR,
        }
    }
}

/// Failure type returned by method handlers.
///
/// `Domain` is folded into the result as a string code. `Protocol` is
/// the deliberate "outside the taxonomy" branch: it propagates across
/// the dispatch boundary uncaught, as a JSON-RPC error.
#[derive(Debug, Clone)]
pub enum HandlerError {
    Domain(DomainError),
    Protocol(RpcError),
}

impl From<DomainError> for HandlerError {
    fn from(e: DomainError) -> Self {
        Self::Domain(e)
    }
}

impl From<RpcError> for HandlerError {
    fn from(e: RpcError) -> Self {
        Self::Protocol(e)
    }
}
