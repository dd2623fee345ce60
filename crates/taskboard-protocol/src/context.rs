//! Session context — per-connection state threaded through dispatch.
//!
//! Each WebSocket connection owns one [`SessionContext`], created at
//! connect and dropped at disconnect. It starts unauthenticated;
//! `user.register` / `user.login` bind the authenticated principal id.
//! Clones share the same principal cell, so a handler that logs a user
//! in is visible to every later request on that connection. The
//! context is never shared across connections.

use std::sync::Arc;

use parking_lot::Mutex;

/// Per-connection session: connection id plus the authenticated
/// principal, if any.
#[derive(Debug, Clone)]
pub struct SessionContext {
    /// Unique identifier for the client connection.
    pub connection_id: String,
    principal: Arc<Mutex<Option<i64>>>,
}

impl SessionContext {
    pub fn new(connection_id: impl Into<String>) -> Self {
        Self {
            connection_id: connection_id.into(),
            principal: Arc::new(Mutex::new(None)),
        }
    }

    /// The authenticated user id, or `None` while unauthenticated.
    pub fn principal(&self) -> Option<i64> {
        *self.principal.lock()
    }

    /// Bind the authenticated principal. There is no unbind: the
    /// session stays authenticated for the connection's lifetime.
    pub fn set_principal(&self, user_id: i64) {
        *self.principal.lock() = Some(user_id);
    }
}
