//! End-to-end integration tests — WebSocket connection and full
//! JSON-RPC request/response cycle through a running server.

use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use taskboard_server::RpcServer;
use taskboard_store::TaskStore;
use taskboard_transport::{TransportConfig, TransportServer};
use tempfile::TempDir;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};

type WsClient = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Start a server on an OS-assigned port over a scratch database.
async fn start_test_server() -> u16 {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("board.db");
    // keep the scratch dir alive for the test run
    Box::leak(Box::new(dir));

    let store = TaskStore::open(&db_path).unwrap();
    let server = Arc::new(RpcServer::new(store));

    let config = TransportConfig {
        port: 0,
        hostname: "127.0.0.1".into(),
        max_connections: Some(16),
    };
    let transport = TransportServer::start(config, server).await.unwrap();
    let port = transport.port();
    Box::leak(Box::new(transport));
    port
}

async fn connect(port: u16) -> WsClient {
    let (ws, _) = connect_async(format!("ws://127.0.0.1:{port}/ws"))
        .await
        .expect("connect failed");
    ws
}

/// Send one request and await the response carrying the same id.
async fn rpc(ws: &mut WsClient, id: i64, method: &str, params: Value) -> Value {
    let request = json!({
        "jsonrpc": "2.0",
        "id": id,
        "method": method,
        "params": params,
    });
    ws.send(Message::Text(request.to_string().into()))
        .await
        .unwrap();

    loop {
        let msg = timeout(Duration::from_secs(5), ws.next())
            .await
            .expect("response timeout")
            .expect("connection closed")
            .unwrap();
        if let Message::Text(text) = msg {
            let parsed: Value = serde_json::from_str(&text).unwrap();
            if parsed["id"] == json!(id) {
                return parsed;
            }
        }
    }
}

#[tokio::test]
async fn register_create_edit_over_websocket() {
    let port = start_test_server().await;
    let mut ws = connect(port).await;

    let reg = rpc(
        &mut ws,
        1,
        "user.register",
        json!({ "username": "alice", "password": "secret" }),
    )
    .await;
    assert_eq!(reg["result"]["token"].as_str().unwrap().len(), 64);

    let project = rpc(
        &mut ws,
        2,
        "project.create",
        json!({ "title": "Board", "description": "shared" }),
    )
    .await;
    let project_id = project["result"]["id"].as_i64().unwrap();

    let category = rpc(
        &mut ws,
        3,
        "category.create",
        json!({ "projectId": project_id, "title": "Todo" }),
    )
    .await;
    let category_id = category["result"]["id"].as_i64().unwrap();

    let task = rpc(
        &mut ws,
        4,
        "task.create",
        json!({ "categoryId": category_id, "title": "Ship", "description": "v1" }),
    )
    .await;
    let task_id = task["result"]["id"].as_i64().unwrap();

    let edited = rpc(
        &mut ws,
        5,
        "task.edit",
        json!({
            "taskId": task_id,
            "title": "Ship it",
            "description": "v1",
            "associatedUsers": [],
        }),
    )
    .await;
    assert_eq!(edited["result"]["title"], "Ship it");
    assert_eq!(edited["result"]["associatedUsers"], json!([]));
}

#[tokio::test]
async fn sessions_are_isolated_per_connection() {
    let port = start_test_server().await;

    let mut alice = connect(port).await;
    let reg = rpc(
        &mut alice,
        1,
        "user.register",
        json!({ "username": "alice", "password": "secret" }),
    )
    .await;
    assert!(reg["result"]["token"].is_string());

    // a second connection starts unauthenticated even though the first
    // one is logged in
    let mut anon = connect(port).await;
    let info = rpc(&mut anon, 1, "user.info", json!({})).await;
    assert_eq!(info["result"], json!("AUTHORIZATION_ERROR"));

    // but resuming with the token authenticates it
    let token = reg["result"]["token"].as_str().unwrap();
    let auth = rpc(&mut anon, 2, "user.authorize", json!({ "token": token })).await;
    assert_eq!(auth["result"]["username"], "alice");

    let info = rpc(&mut anon, 3, "user.info", json!({})).await;
    assert_eq!(info["result"]["username"], "alice");
}

#[tokio::test]
async fn protocol_errors_come_back_as_jsonrpc_errors() {
    let port = start_test_server().await;
    let mut ws = connect(port).await;

    // bad JSON
    ws.send(Message::Text("{not json".to_string().into()))
        .await
        .unwrap();
    let msg = timeout(Duration::from_secs(5), ws.next())
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    let parsed: Value = serde_json::from_str(msg.to_text().unwrap()).unwrap();
    assert_eq!(parsed["error"]["code"], -32700);

    // unknown method
    let resp = rpc(&mut ws, 7, "task.explode", json!({})).await;
    assert_eq!(resp["error"]["code"], -32601);

    // the connection survives both failures
    let reg = rpc(
        &mut ws,
        8,
        "user.register",
        json!({ "username": "carol", "password": "secret" }),
    )
    .await;
    assert!(reg["result"]["token"].is_string());
}

#[tokio::test]
async fn concurrent_requests_share_one_connection() {
    let port = start_test_server().await;
    let mut ws = connect(port).await;

    let reg = rpc(
        &mut ws,
        1,
        "user.register",
        json!({ "username": "dave", "password": "secret" }),
    )
    .await;
    assert!(reg["result"]["token"].is_string());

    // fire several requests without awaiting responses in between
    for id in 2..=5 {
        let request = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": "project.create",
            "params": { "title": format!("Board {id}"), "description": "batch" },
        });
        ws.send(Message::Text(request.to_string().into()))
            .await
            .unwrap();
    }

    let mut seen = 0;
    while seen < 4 {
        let msg = timeout(Duration::from_secs(5), ws.next())
            .await
            .expect("response timeout")
            .unwrap()
            .unwrap();
        if let Message::Text(text) = msg {
            let parsed: Value = serde_json::from_str(&text).unwrap();
            assert!(parsed["result"]["id"].is_i64(), "unexpected: {parsed}");
            seen += 1;
        }
    }

    let list = rpc(&mut ws, 9, "project.getList", json!({})).await;
    assert_eq!(list["result"]["projects"].as_array().unwrap().len(), 4);
}
