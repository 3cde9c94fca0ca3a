// Shared server bootstrap and client helpers for integration tests.
#![allow(dead_code)]

use axum::{Json, Router, extract::State, http::StatusCode, response::IntoResponse, routing::post};
use brain_heist_server::ServerConfig;
use futures::{SinkExt, StreamExt};
use serde_json::{Value, json};
use std::{
    collections::HashMap,
    sync::{Arc, Mutex, OnceLock},
    time::Duration,
};
use tokio::net::TcpStream;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, tungstenite::Message};

pub type Ws = WebSocketStream<MaybeTlsStream<TcpStream>>;

// Global base URL used by all tests after the server publishes its bound address.
static SERVER_URL: OnceLock<String> = OnceLock::new();
// One-time guard that ensures the server bootstrap path runs only once.
static SERVER_READY: OnceLock<()> = OnceLock::new();

// Nothing listens on the discard port, so credentialed joins fail fast.
pub const UNREACHABLE_PERSISTENCE: &str = "http://127.0.0.1:9";

pub fn test_config(persistence_url: &str) -> ServerConfig {
    ServerConfig {
        persistence_url: persistence_url.to_string(),
        persistence_timeout: Duration::from_millis(500),
        sim_seed: Some(7),
        ..ServerConfig::default()
    }
}

// Ensure the shared test server is running and return its base URL.
pub fn ensure_server() -> &'static str {
    SERVER_READY.get_or_init(|| {
        let published_url = Arc::new(OnceLock::<String>::new());
        let published_url_thread = Arc::clone(&published_url);
        // Own OS thread and runtime so the server outlives individual `#[tokio::test]` runtimes.
        std::thread::spawn(move || {
            let runtime = tokio::runtime::Runtime::new().expect("test runtime");
            runtime.block_on(async move {
                let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
                    .await
                    .expect("bind ephemeral test port");
                let addr = listener.local_addr().expect("get local addr");
                let _ = published_url_thread.set(format!("http://{}", addr));
                brain_heist_server::run(listener, test_config(UNREACHABLE_PERSISTENCE))
                    .await
                    .expect("server failed");
            });
        });
        wait_for_server_url_and_readiness(published_url);
    });

    SERVER_URL
        .get()
        .expect("server url should be initialized")
        .as_str()
}

// Wait for URL publication and then for the server socket to accept TCP connections.
fn wait_for_server_url_and_readiness(published_url: Arc<OnceLock<String>>) {
    let base_url = loop {
        if let Some(url) = published_url.get() {
            break url.clone();
        }
        std::thread::sleep(Duration::from_millis(10));
    };

    let _ = SERVER_URL.set(base_url.clone());

    let addr = base_url
        .strip_prefix("http://")
        .expect("base url should use http://");

    for _ in 0..100 {
        if std::net::TcpStream::connect(addr).is_ok() {
            return;
        }
        std::thread::sleep(Duration::from_millis(20));
    }

    panic!("server did not become ready in time");
}

// Starts a dedicated server on the current test runtime.
pub async fn start_server(config: ServerConfig) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral test port");
    let addr = listener.local_addr().expect("get local addr");
    tokio::spawn(async move {
        brain_heist_server::run(listener, config)
            .await
            .expect("server failed");
    });
    format!("http://{addr}")
}

pub async fn connect(base_url: &str) -> Ws {
    let ws_url = format!("{}/ws", base_url.replacen("http://", "ws://", 1));
    let (ws, _) = tokio_tungstenite::connect_async(ws_url)
        .await
        .expect("websocket connect");
    ws
}

pub async fn send_json(ws: &mut Ws, value: Value) {
    ws.send(Message::text(value.to_string()))
        .await
        .expect("websocket send");
}

pub enum Received {
    Json(Value),
    Closed(Option<String>),
}

// Next text or close message; pings and pongs are skipped.
pub async fn recv(ws: &mut Ws) -> Received {
    loop {
        let next = tokio::time::timeout(Duration::from_secs(5), ws.next())
            .await
            .expect("timed out waiting for a server message");
        match next {
            Some(Ok(Message::Text(text))) => {
                return Received::Json(serde_json::from_str(&text).expect("server sent json"));
            }
            Some(Ok(Message::Close(frame))) => {
                return Received::Closed(frame.map(|f| (*f.reason).to_string()));
            }
            Some(Ok(_)) => continue,
            Some(Err(_)) | None => return Received::Closed(None),
        }
    }
}

pub async fn recv_json(ws: &mut Ws) -> Value {
    match recv(ws).await {
        Received::Json(value) => value,
        Received::Closed(reason) => panic!("socket closed unexpectedly: {reason:?}"),
    }
}

pub async fn recv_close_reason(ws: &mut Ws) -> Option<String> {
    loop {
        if let Received::Closed(reason) = recv(ws).await {
            return reason;
        }
    }
}

// Waits for a state snapshot that satisfies `accept`.
pub async fn wait_for_state<F>(ws: &mut Ws, mut accept: F) -> Value
where
    F: FnMut(&Value) -> bool,
{
    for _ in 0..200 {
        let msg = recv_json(ws).await;
        if msg["type"] == "state" && accept(&msg["data"]) {
            return msg["data"].clone();
        }
    }
    panic!("no matching state snapshot arrived");
}

// Joins and returns the `init` payload.
pub async fn join(ws: &mut Ws, payload: Value) -> Value {
    send_json(ws, json!({ "type": "join", "data": payload })).await;
    loop {
        let msg = recv_json(ws).await;
        if msg["type"] == "init" {
            return msg["data"].clone();
        }
    }
}

pub fn find_by_id<'a>(items: &'a Value, id: &Value) -> Option<&'a Value> {
    items.as_array()?.iter().find(|item| &item["id"] == id)
}

#[derive(Default)]
struct MockPersistenceState {
    // username -> (password, saved game)
    accounts: HashMap<String, (String, Value)>,
    saves: Mutex<Vec<Value>>,
}

/// In-process stand-in for the account persistence service.
pub struct MockPersistence {
    pub url: String,
    state: Arc<MockPersistenceState>,
}

impl MockPersistence {
    pub async fn start(accounts: &[(&str, &str, Value)]) -> Self {
        let state = Arc::new(MockPersistenceState {
            accounts: accounts
                .iter()
                .map(|(user, password, game)| {
                    (user.to_string(), (password.to_string(), game.clone()))
                })
                .collect(),
            saves: Mutex::new(Vec::new()),
        });

        let app = Router::new()
            .route("/authenticate", post(mock_authenticate))
            .route("/save", post(mock_save))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock persistence");
        let addr = listener.local_addr().expect("get local addr");
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self {
            url: format!("http://{addr}"),
            state,
        }
    }

    pub fn saves(&self) -> Vec<Value> {
        self.state.saves.lock().expect("saves lock").clone()
    }

    pub async fn wait_for_save(&self, username: &str) -> Value {
        for _ in 0..100 {
            if let Some(save) = self
                .saves()
                .into_iter()
                .find(|save| save["username"] == username)
            {
                return save;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        panic!("no save arrived for {username}");
    }
}

async fn mock_authenticate(
    State(state): State<Arc<MockPersistenceState>>,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    let username = body["username"].as_str().unwrap_or_default();
    let password = body["password"].as_str().unwrap_or_default();
    match state.accounts.get(username) {
        Some((expected, game)) if expected == password => {
            (StatusCode::OK, Json(game.clone())).into_response()
        }
        _ => (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "invalid credentials" })),
        )
            .into_response(),
    }
}

async fn mock_save(
    State(state): State<Arc<MockPersistenceState>>,
    Json(body): Json<Value>,
) -> StatusCode {
    state.saves.lock().expect("saves lock").push(body);
    StatusCode::NO_CONTENT
}
