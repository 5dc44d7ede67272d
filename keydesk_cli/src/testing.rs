//! In-process backend used by the tests

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use keydesk_common::{Client, ClientId, NewClient};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

struct Inner {
    clients: Vec<Client>,
    next_id: ClientId,
    key_seq: u64,
    plain_text: bool,
    failing: bool,
    list_requests: usize,
    list_delay: Duration,
    lists_in_flight: usize,
    peak_lists_in_flight: usize,
}

impl Inner {
    fn next_key(&mut self) -> String {
        self.key_seq += 1;
        format!("key-{}", self.key_seq)
    }

    /// Serialize like the real backend: JSON text, optionally without a JSON content type
    fn reply<T: Serialize>(&self, value: &T) -> Response {
        if self.plain_text {
            match serde_json::to_string(value) {
                Ok(body) => (StatusCode::OK, body).into_response(),
                Err(_) => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
            }
        } else {
            Json(value).into_response()
        }
    }
}

type Shared = Arc<Mutex<Inner>>;

/// Fake clients API served on an ephemeral local port
pub struct MockBackend {
    addr: SocketAddr,
    state: Shared,
    handle: JoinHandle<()>,
}

impl MockBackend {
    /// Start a backend seeded with `(name, key)` pairs, ids counting from 1
    pub async fn start(seed: Vec<(&str, &str)>) -> Self {
        let clients: Vec<Client> = seed
            .into_iter()
            .enumerate()
            .map(|(i, (name, key))| Client {
                id: i as ClientId + 1,
                name: name.to_string(),
                key: key.to_string(),
            })
            .collect();
        let next_id = clients.len() as ClientId + 1;

        let state = Arc::new(Mutex::new(Inner {
            clients,
            next_id,
            key_seq: 0,
            plain_text: false,
            failing: false,
            list_requests: 0,
            list_delay: Duration::ZERO,
            lists_in_flight: 0,
            peak_lists_in_flight: 0,
        }));

        let app = Router::new()
            .route("/api/clients", get(list_clients).post(create_client))
            .route(
                "/api/clients/{id}",
                get(get_client).post(update_client).delete(delete_client),
            )
            .route("/api/clients/{id}/generate_key", post(generate_key))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock backend");
        let addr = listener.local_addr().expect("mock backend address");

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        Self {
            addr,
            state,
            handle,
        }
    }

    /// API base URL, e.g. `http://127.0.0.1:PORT/api`
    pub fn api_url(&self) -> String {
        format!("http://{}/api", self.addr)
    }

    pub async fn ids(&self) -> Vec<ClientId> {
        self.state.lock().await.clients.iter().map(|c| c.id).collect()
    }

    pub async fn set_plain_text(&self, plain_text: bool) {
        self.state.lock().await.plain_text = plain_text;
    }

    /// Make every route answer 500
    pub async fn set_failing(&self, failing: bool) {
        self.state.lock().await.failing = failing;
    }

    pub async fn list_requests(&self) -> usize {
        self.state.lock().await.list_requests
    }

    /// Hold every `GET /clients` response for `delay`
    pub async fn set_list_delay(&self, delay: Duration) {
        self.state.lock().await.list_delay = delay;
    }

    /// Highest number of `GET /clients` requests served at the same time
    pub async fn peak_lists_in_flight(&self) -> usize {
        self.state.lock().await.peak_lists_in_flight
    }

    /// Add a client behind the panel's back
    pub async fn push(&self, name: &str) -> ClientId {
        let mut inner = self.state.lock().await;
        let id = inner.next_id;
        inner.next_id += 1;
        let key = inner.next_key();
        inner.clients.push(Client {
            id,
            name: name.to_string(),
            key,
        });
        id
    }

    /// Rename a client behind the panel's back
    pub async fn rename(&self, id: ClientId, name: &str) {
        let mut inner = self.state.lock().await;
        if let Some(client) = inner.clients.iter_mut().find(|c| c.id == id) {
            client.name = name.to_string();
        }
    }
}

impl Drop for MockBackend {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// A local port with nothing listening on it
pub fn unused_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind probe");
    listener.local_addr().expect("probe address").port()
}

async fn list_clients(State(state): State<Shared>) -> Response {
    let delay = {
        let mut inner = state.lock().await;
        inner.list_requests += 1;
        inner.lists_in_flight += 1;
        inner.peak_lists_in_flight = inner.peak_lists_in_flight.max(inner.lists_in_flight);
        inner.list_delay
    };

    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }

    let mut inner = state.lock().await;
    inner.lists_in_flight -= 1;
    if inner.failing {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }
    inner.reply(&inner.clients)
}

async fn create_client(State(state): State<Shared>, Form(body): Form<NewClient>) -> Response {
    let mut inner = state.lock().await;
    if inner.failing {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }
    let id = inner.next_id;
    inner.next_id += 1;
    let key = inner.next_key();
    let client = Client {
        id,
        name: body.name,
        key,
    };
    inner.clients.push(client.clone());
    inner.reply(&client)
}

async fn get_client(State(state): State<Shared>, Path(id): Path<ClientId>) -> Response {
    let inner = state.lock().await;
    if inner.failing {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }
    match inner.clients.iter().find(|c| c.id == id) {
        Some(client) => inner.reply(client),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn update_client(
    State(state): State<Shared>,
    Path(id): Path<ClientId>,
    Form(body): Form<NewClient>,
) -> Response {
    let mut inner = state.lock().await;
    if inner.failing {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }
    let Some(client) = inner.clients.iter_mut().find(|c| c.id == id) else {
        return StatusCode::NOT_FOUND.into_response();
    };
    client.name = body.name;
    let client = client.clone();
    inner.reply(&client)
}

async fn delete_client(State(state): State<Shared>, Path(id): Path<ClientId>) -> Response {
    let mut inner = state.lock().await;
    if inner.failing {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }
    let Some(idx) = inner.clients.iter().position(|c| c.id == id) else {
        return StatusCode::NOT_FOUND.into_response();
    };
    let removed = inner.clients.remove(idx);
    inner.reply(&removed)
}

async fn generate_key(State(state): State<Shared>, Path(id): Path<ClientId>) -> Response {
    let mut inner = state.lock().await;
    if inner.failing {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }
    let key = inner.next_key();
    let Some(client) = inner.clients.iter_mut().find(|c| c.id == id) else {
        return StatusCode::NOT_FOUND.into_response();
    };
    client.key = key;
    let client = client.clone();
    inner.reply(&client)
}
