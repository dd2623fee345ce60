//! Method dispatch — the single boundary where domain failures become
//! wire codes.
//!
//! Handlers register into a table keyed by method name, each flagged
//! as open or auth-required. Dispatch runs the same sequence for every
//! request: trace, look up, pre-check auth, invoke exactly once,
//! translate the outcome. Domain failures fold into the *result* as
//! their fixed string code; only protocol errors cross the boundary as
//! JSON-RPC errors.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use taskboard_protocol::{
    DomainError, HandlerError, HandlerResult, MethodName, RpcError, SessionContext,
    error::codes,
};
use taskboard_store::TaskStore;
use tracing::{debug, error};

type HandlerFuture = Pin<Box<dyn Future<Output = Result<Value, HandlerError>> + Send>>;
type BoxedHandler = Arc<dyn Fn(TaskStore, Option<Value>, SessionContext) -> HandlerFuture + Send + Sync>;

struct MethodEntry {
    requires_auth: bool,
    handler: BoxedHandler,
}

/// Registration table plus the shared store handle handlers run against.
pub struct MethodDispatcher {
    store: TaskStore,
    table: HashMap<MethodName, MethodEntry>,
}

impl MethodDispatcher {
    pub fn new(store: TaskStore) -> Self {
        Self {
            store,
            table: HashMap::new(),
        }
    }

    /// Register an open method (callable while unauthenticated).
    pub fn register<F, Fut>(&mut self, method: MethodName, handler: F)
    where
        F: Fn(TaskStore, Option<Value>, SessionContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, HandlerError>> + Send + 'static,
    {
        self.insert(method, false, handler);
    }

    /// Register a method that requires an authenticated principal.
    /// Unauthenticated calls yield AUTHORIZATION_ERROR without the
    /// handler ever running.
    pub fn register_authorized<F, Fut>(&mut self, method: MethodName, handler: F)
    where
        F: Fn(TaskStore, Option<Value>, SessionContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, HandlerError>> + Send + 'static,
    {
        self.insert(method, true, handler);
    }

    fn insert<F, Fut>(&mut self, method: MethodName, requires_auth: bool, handler: F)
    where
        F: Fn(TaskStore, Option<Value>, SessionContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, HandlerError>> + Send + 'static,
    {
        let handler: BoxedHandler =
            Arc::new(move |store, params, session| Box::pin(handler(store, params, session)));
        self.table.insert(
            method,
            MethodEntry {
                requires_auth,
                handler,
            },
        );
    }

    pub fn method_count(&self) -> usize {
        self.table.len()
    }

    pub async fn dispatch(
        &self,
        method: &str,
        params: Option<Value>,
        session: &SessionContext,
    ) -> HandlerResult {
        debug!(
            connection = %session.connection_id,
            principal = ?session.principal(),
            %method,
            ?params,
            "rpc call"
        );

        let entry = match self.table.get(method) {
            Some(entry) => entry,
            None => return Err(RpcError::method_not_found(method)),
        };

        if entry.requires_auth && session.principal().is_none() {
            return Ok(json!(codes::AUTHORIZATION_ERROR));
        }

        match (entry.handler)(self.store.clone(), params, session.clone()).await {
            Ok(result) => Ok(result),
            Err(HandlerError::Domain(e)) => {
                if let DomainError::Store(detail) = &e {
                    error!(%method, %detail, "store failure");
                }
                Ok(json!(e.code()))
            }
            Err(HandlerError::Protocol(e)) => Err(e),
        }
    }
}

/// Parse required params into a typed struct. Missing or malformed
/// params are a protocol failure, not a domain one.
pub fn parse_params<T: DeserializeOwned>(params: Option<Value>) -> Result<T, HandlerError> {
    serde_json::from_value(params.unwrap_or(Value::Null))
        .map_err(|e| HandlerError::Protocol(RpcError::invalid_params(format!("Invalid params: {e}"))))
}
