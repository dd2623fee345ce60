//! Taskboard Transport Layer
//!
//! WebSocket transport for the taskboard RPC server. The transport
//! layer handles:
//! - Connection lifecycle (open, message, close)
//! - Per-connection session context
//! - JSON-RPC framing (parse and shape validation)
//! - Concurrent request handling with in-order response writes
//!
//! The transport is decoupled from the server logic via the
//! `RequestHandler` trait.

pub mod server;

pub use server::{RequestHandler, TransportConfig, TransportServer};
