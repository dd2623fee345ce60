//! WebSocket transport server using Axum.
//!
//! Handles the HTTP upgrade to WebSocket, per-connection session
//! state, and message routing to the RPC server. Each inbound request
//! is handled on its own task; responses funnel back to the socket
//! through a per-connection channel, so one slow call never blocks the
//! connection's read loop.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Router,
    extract::{
        State, WebSocketUpgrade,
        ws::{Message, WebSocket},
    },
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
};
use futures_util::{SinkExt, StreamExt};
use serde_json::json;
use taskboard_protocol::{RequestId, RpcError, RpcResponse, SessionContext};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Trait implemented by the RPC server to handle incoming requests.
/// The transport layer calls this for every well-formed JSON-RPC
/// request, passing the session of the connection it arrived on.
pub trait RequestHandler: Send + Sync + 'static {
    fn handle_request(
        &self,
        method: &str,
        params: Option<serde_json::Value>,
        session: &SessionContext,
    ) -> impl std::future::Future<Output = taskboard_protocol::HandlerResult> + Send;
}

/// Transport server configuration.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Port to listen on (0 for OS-assigned)
    pub port: u16,
    /// Hostname to bind to
    pub hostname: String,
    /// Maximum concurrent connections
    pub max_connections: Option<usize>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            port: 8081,
            hostname: "127.0.0.1".into(),
            max_connections: Some(1024),
        }
    }
}

/// Shared state for the transport server.
struct AppState<H: RequestHandler> {
    handler: Arc<H>,
    config: TransportConfig,
    client_count: Arc<std::sync::atomic::AtomicUsize>,
}

/// The transport server — manages WebSocket connections and routes messages.
pub struct TransportServer {
    shutdown_tx: Option<mpsc::Sender<()>>,
    handle: Option<tokio::task::JoinHandle<()>>,
    port: u16,
}

impl TransportServer {
    /// Start the transport server with the given request handler.
    pub async fn start<H: RequestHandler>(
        config: TransportConfig,
        handler: Arc<H>,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel(1);

        let state = Arc::new(AppState {
            handler,
            config: config.clone(),
            client_count: Arc::new(std::sync::atomic::AtomicUsize::new(0)),
        });

        let app = Router::new()
            .route("/ws", get(ws_upgrade_handler::<H>))
            .route("/health", get(health_handler::<H>))
            .with_state(state);

        let addr: SocketAddr = format!("{}:{}", config.hostname, config.port).parse()?;
        let listener = tokio::net::TcpListener::bind(addr).await?;
        let actual_port = listener.local_addr()?.port();

        info!("Transport listening on ws://{}:{}/ws", config.hostname, actual_port);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = shutdown_rx.recv().await;
                })
                .await
                .ok();
        });

        Ok(Self {
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
            port: actual_port,
        })
    }

    /// Get the actual bound port.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Gracefully stop the server.
    pub async fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(()).await;
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
        info!("Transport server stopped");
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// HTTP Handlers
// ─────────────────────────────────────────────────────────────────────────────

async fn ws_upgrade_handler<H: RequestHandler>(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState<H>>>,
) -> impl IntoResponse {
    if let Some(max) = state.config.max_connections {
        let current = state.client_count.load(std::sync::atomic::Ordering::Relaxed);
        if current >= max {
            warn!("Connection rejected: max connections reached ({max})");
            return StatusCode::SERVICE_UNAVAILABLE.into_response();
        }
    }

    ws.on_upgrade(move |socket| handle_ws_connection(socket, state))
        .into_response()
}

async fn health_handler<H: RequestHandler>(
    State(state): State<Arc<AppState<H>>>,
) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "clients": state.client_count.load(std::sync::atomic::Ordering::Relaxed),
    }))
}

// ─────────────────────────────────────────────────────────────────────────────
// WebSocket Connection Handler
// ─────────────────────────────────────────────────────────────────────────────

async fn handle_ws_connection<H: RequestHandler>(socket: WebSocket, state: Arc<AppState<H>>) {
    state.client_count.fetch_add(1, std::sync::atomic::Ordering::Relaxed);

    let connection_id = uuid::Uuid::new_v4().to_string();
    info!("Client connected: {connection_id}");

    // Session lives exactly as long as this connection. Request tasks
    // clone it; the clones share the principal cell, so a login on one
    // request is visible to every later request on this socket.
    let session = SessionContext::new(connection_id.clone());

    let (mut ws_tx, mut ws_rx) = socket.split();

    // All outbound frames go through one channel so concurrent request
    // tasks never interleave partial writes.
    let (out_tx, mut out_rx) = mpsc::channel::<Message>(64);

    let writer_id = connection_id.clone();
    let writer = tokio::spawn(async move {
        while let Some(msg) = out_rx.recv().await {
            if let Err(e) = ws_tx.send(msg).await {
                error!("Failed to send to {writer_id}: {e}");
                break;
            }
        }
    });

    while let Some(msg) = ws_rx.next().await {
        match msg {
            Ok(Message::Text(text)) => {
                dispatch_message(text.to_string(), &state.handler, &session, &out_tx);
            }
            Ok(Message::Ping(data)) => {
                let _ = out_tx.send(Message::Pong(data)).await;
            }
            Ok(Message::Close(_)) => {
                debug!("Client disconnected: {connection_id}");
                break;
            }
            Err(e) => {
                warn!("WebSocket error for {connection_id}: {e}");
                break;
            }
            _ => {}
        }
    }

    drop(out_tx);
    let _ = writer.await;

    state.client_count.fetch_sub(1, std::sync::atomic::Ordering::Relaxed);
    info!(
        "Client disconnected: {connection_id} (total: {})",
        state.client_count.load(std::sync::atomic::Ordering::Relaxed)
    );
}

/// Validate a frame and hand it to the handler on its own task.
///
/// Framing failures (bad JSON, bad JSON-RPC shape) are answered inline;
/// only well-formed requests reach the handler.
fn dispatch_message<H: RequestHandler>(
    text: String,
    handler: &Arc<H>,
    session: &SessionContext,
    out_tx: &mpsc::Sender<Message>,
) {
    let parsed: serde_json::Value = match serde_json::from_str(&text) {
        Ok(v) => v,
        Err(_) => {
            send_response(
                out_tx.clone(),
                RpcResponse::error(None, RpcError::parse_error("Failed to parse JSON")),
            );
            return;
        }
    };

    let jsonrpc = parsed.get("jsonrpc").and_then(|v| v.as_str());
    let method = parsed.get("method").and_then(|v| v.as_str());
    let id: Option<RequestId> = parsed
        .get("id")
        .cloned()
        .and_then(|v| serde_json::from_value(v).ok());

    if jsonrpc != Some("2.0") || method.is_none() {
        send_response(
            out_tx.clone(),
            RpcResponse::error(id, RpcError::invalid_request("Invalid JSON-RPC 2.0 request")),
        );
        return;
    }

    let method = method.unwrap_or_default().to_string();
    let params = parsed.get("params").cloned();

    let handler = Arc::clone(handler);
    let session = session.clone();
    let out_tx = out_tx.clone();

    tokio::spawn(async move {
        let response = match handler.handle_request(&method, params, &session).await {
            Ok(result) => RpcResponse::success(id.unwrap_or(RequestId::Number(0)), result),
            Err(rpc_err) => RpcResponse::error(id, rpc_err),
        };
        send_response(out_tx, response);
    });
}

fn send_response(out_tx: mpsc::Sender<Message>, response: RpcResponse) {
    let json = match serde_json::to_string(&response) {
        Ok(s) => s,
        Err(e) => {
            error!("Failed to serialize response: {e}");
            return;
        }
    };
    tokio::spawn(async move {
        let _ = out_tx.send(Message::Text(json.into())).await;
    });
}
