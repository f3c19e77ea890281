//! Mock Lokal agent for integration tests
//!
//! Serves `/api/tunnel/start` and `/api/tunnel/info/{id}` on a random
//! loopback port and records every hit.

#![allow(dead_code)]

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use lokal_client::{AgentClient, SERVER_VERSION_HEADER};
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

/// Canned response served by the mock agent
#[derive(Debug, Clone)]
pub struct Reply {
    pub status: StatusCode,
    pub body: String,
}

impl Reply {
    pub fn json(status: StatusCode, body: Value) -> Self {
        Self {
            status,
            body: body.to_string(),
        }
    }

    pub fn ok(body: Value) -> Self {
        Self::json(StatusCode::OK, body)
    }

    pub fn raw(status: StatusCode, body: &str) -> Self {
        Self {
            status,
            body: body.to_string(),
        }
    }
}

/// A `data` element as the agent returns it
pub fn tunnel_record(id: &str, address_public: &str, address_mdns: &str) -> Value {
    json!({
        "id": id,
        "name": "test",
        "server_id": "srv-1",
        "address_tunnel": "tunnel.lokal.so",
        "address_tunnel_port": 5923,
        "address_public": address_public,
        "address_mdns": address_mdns,
    })
}

pub fn success(records: Vec<Value>) -> Value {
    json!({ "success": true, "data": records })
}

pub fn failure(message: &str, records: Vec<Value>) -> Value {
    json!({ "success": false, "message": message, "data": records })
}

pub struct MockAgentState {
    version: Mutex<Option<String>>,
    start_reply: Reply,
    info_replies: Mutex<VecDeque<Reply>>,
    pub start_hits: AtomicUsize,
    pub info_hits: AtomicUsize,
    pub last_start_body: Mutex<Option<Value>>,
    pub last_info_id: Mutex<Option<String>>,
    pub last_headers: Mutex<Option<HeaderMap>>,
}

impl MockAgentState {
    fn reply(&self, reply: Reply) -> Response {
        let mut response = (
            reply.status,
            [(header::CONTENT_TYPE, "application/json")],
            reply.body,
        )
            .into_response();

        if let Some(version) = self.version.lock().unwrap().as_deref() {
            response.headers_mut().insert(
                HeaderName::from_bytes(SERVER_VERSION_HEADER.as_bytes()).unwrap(),
                HeaderValue::from_str(version).unwrap(),
            );
        }
        response
    }

    fn next_info_reply(&self) -> Option<Reply> {
        let mut replies = self.info_replies.lock().unwrap();
        if replies.len() > 1 {
            replies.pop_front()
        } else {
            replies.front().cloned()
        }
    }
}

/// Builder for a mock agent
pub struct MockAgent {
    version: Option<String>,
    start_reply: Reply,
    info_replies: Vec<Reply>,
}

impl MockAgent {
    pub fn new() -> Self {
        Self {
            version: Some("0.6.0".to_string()),
            start_reply: Reply::ok(success(vec![tunnel_record("t-1", "", "")])),
            info_replies: Vec::new(),
        }
    }

    pub fn version(mut self, version: &str) -> Self {
        self.version = Some(version.to_string());
        self
    }

    pub fn without_version(mut self) -> Self {
        self.version = None;
        self
    }

    pub fn on_start(mut self, reply: Reply) -> Self {
        self.start_reply = reply;
        self
    }

    /// Queue an info reply; the last one queued keeps being served
    pub fn on_info(mut self, reply: Reply) -> Self {
        self.info_replies.push(reply);
        self
    }

    pub async fn spawn(self) -> RunningAgent {
        let state = Arc::new(MockAgentState {
            version: Mutex::new(self.version),
            start_reply: self.start_reply,
            info_replies: Mutex::new(self.info_replies.into()),
            start_hits: AtomicUsize::new(0),
            info_hits: AtomicUsize::new(0),
            last_start_body: Mutex::new(None),
            last_info_id: Mutex::new(None),
            last_headers: Mutex::new(None),
        });

        let app = Router::new()
            .route("/api/tunnel/start", post(start_handler))
            .route("/api/tunnel/info/{id}", get(info_handler))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        RunningAgent {
            base_url: format!("http://{}", addr),
            state,
        }
    }
}

pub struct RunningAgent {
    pub base_url: String,
    pub state: Arc<MockAgentState>,
}

impl RunningAgent {
    pub fn client(&self) -> AgentClient {
        AgentClient::new().unwrap().set_base_url(&self.base_url)
    }

    pub fn start_hits(&self) -> usize {
        self.state.start_hits.load(Ordering::SeqCst)
    }

    pub fn info_hits(&self) -> usize {
        self.state.info_hits.load(Ordering::SeqCst)
    }

    pub fn last_start_body(&self) -> Value {
        self.state.last_start_body.lock().unwrap().clone().unwrap()
    }

    pub fn last_info_id(&self) -> Option<String> {
        self.state.last_info_id.lock().unwrap().clone()
    }

    pub fn last_header(&self, name: &str) -> Option<String> {
        self.state
            .last_headers
            .lock()
            .unwrap()
            .as_ref()
            .and_then(|headers| headers.get(name))
            .map(|value| value.to_str().unwrap().to_string())
    }

    /// Change the advertised version for subsequent responses
    pub fn set_version(&self, version: Option<&str>) {
        *self.state.version.lock().unwrap() = version.map(str::to_string);
    }
}

async fn start_handler(
    State(state): State<Arc<MockAgentState>>,
    headers: HeaderMap,
    body: String,
) -> Response {
    state.start_hits.fetch_add(1, Ordering::SeqCst);
    *state.last_headers.lock().unwrap() = Some(headers);
    *state.last_start_body.lock().unwrap() = serde_json::from_str(&body).ok();

    state.reply(state.start_reply.clone())
}

async fn info_handler(
    State(state): State<Arc<MockAgentState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    state.info_hits.fetch_add(1, Ordering::SeqCst);
    *state.last_headers.lock().unwrap() = Some(headers);
    *state.last_info_id.lock().unwrap() = Some(id);

    match state.next_info_reply() {
        Some(reply) => state.reply(reply),
        None => state.reply(Reply::raw(StatusCode::NOT_FOUND, "no such tunnel")),
    }
}
