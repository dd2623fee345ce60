//! Taskboard RPC Server
//!
//! Owns the method table and routes requests from the transport into
//! the per-namespace handlers. All domain policy lives here: access
//! guards, the auth pre-check, and the translation of domain failures
//! into wire codes.

pub mod access;
pub mod convert;
pub mod dispatch;
pub mod routes;

use taskboard_protocol::{HandlerResult, SessionContext};
use taskboard_store::TaskStore;
use taskboard_transport::RequestHandler;
use tracing::info;

pub use dispatch::MethodDispatcher;

/// The RPC server — a fully-registered dispatcher over a store handle.
pub struct RpcServer {
    dispatcher: MethodDispatcher,
}

impl RpcServer {
    pub fn new(store: TaskStore) -> Self {
        let mut dispatcher = MethodDispatcher::new(store);
        routes::register_all(&mut dispatcher);
        info!("RPC server ready ({} methods)", dispatcher.method_count());
        Self { dispatcher }
    }

    pub fn dispatcher(&self) -> &MethodDispatcher {
        &self.dispatcher
    }
}

impl RequestHandler for RpcServer {
    fn handle_request(
        &self,
        method: &str,
        params: Option<serde_json::Value>,
        session: &SessionContext,
    ) -> impl std::future::Future<Output = HandlerResult> + Send {
        self.dispatcher.dispatch(method, params, session)
    }
}
