//! Test utilities for eldom-client
//!
//! - [`RecordingTransport`]: in-memory [`Transport`] with scripted responses
//! - [`MockEldomServer`]: a local HTTP server emulating the Eldom API,
//!   including the encrypted relay and checksum validation

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::Utc;
use eldom_proto::{Command, DeviceFamily, Envelope, SealedMessage, GET_STATUS};
use parking_lot::Mutex;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use url::Url;

use crate::config::{ClientConfig, USER_AGENT};
use crate::direct::DEVICE_HEADER;
use crate::error::{EldomClientError, Result};
use crate::token::{token_expired, Credentials};
use crate::transport::{Headers, Transport};
use crate::types::Device;
use crate::EldomClient;

/// Build an unsigned JWT whose claims carry `exp` and a `jti` nonce
pub fn jwt_with_expiry(exp: i64, nonce: &str) -> String {
    let header = URL_SAFE_NO_PAD.encode(json!({"alg": "HS512", "typ": "JWT"}).to_string());
    let claims = URL_SAFE_NO_PAD.encode(json!({"sub": "test", "exp": exp, "jti": nonce}).to_string());
    format!("{}.{}.signature", header, claims)
}

// =============================================================================
// Recording transport
// =============================================================================

/// A request seen by [`RecordingTransport`]
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: &'static str,
    pub url: Url,
    pub headers: Headers,
    pub body: Option<String>,
}

impl RecordedRequest {
    /// Value of a header, matched case-insensitively
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Transport that records requests and replays scripted responses in order
#[derive(Debug, Default)]
pub struct RecordingTransport {
    responses: Mutex<VecDeque<Result<String>>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the outcome of the next request
    pub fn push_response(&self, response: Result<String>) {
        self.responses.lock().push_back(response);
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }

    fn record(&self, request: RecordedRequest) -> Result<String> {
        self.requests.lock().push(request);
        self.responses.lock().pop_front().unwrap_or_else(|| {
            Err(EldomClientError::server_error(
                500,
                "no scripted response left",
            ))
        })
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn get(&self, url: Url, headers: Headers) -> Result<String> {
        self.record(RecordedRequest {
            method: "GET",
            url,
            headers,
            body: None,
        })
    }

    async fn post(&self, url: Url, headers: Headers, body: String) -> Result<String> {
        self.record(RecordedRequest {
            method: "POST",
            url,
            headers,
            body: Some(body),
        })
    }
}

// =============================================================================
// Mock API server
// =============================================================================

/// A device known to [`MockEldomServer`]
#[derive(Debug, Clone)]
pub struct MockDevice {
    pub device: Device,
    pub family: DeviceFamily,
    /// Body answered to `GetStatus`
    pub status: Value,
}

/// A relay request accepted by [`MockEldomServer`]
#[derive(Debug, Clone)]
pub struct RelayRecord {
    pub device_uuid: String,
    pub encrypted: bool,
    pub command: Command,
}

#[derive(Debug)]
struct MockState {
    username: String,
    password: String,
    token_ttl: i64,
    devices: Vec<MockDevice>,
    issued: Vec<String>,
    auth_calls: usize,
    relay: Vec<RelayRecord>,
    relay_failure: Option<StatusCode>,
    plaintext_replies: bool,
}

type SharedState = Arc<Mutex<MockState>>;

/// Local server emulating the Eldom API; shuts down when dropped
pub struct MockEldomServer {
    pub addr: SocketAddr,
    state: SharedState,
    shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
    handle: Option<tokio::task::JoinHandle<()>>,
}

impl MockEldomServer {
    /// Start a server accepting `username`/`password`, issuing tokens valid
    /// for an hour
    pub async fn start(username: &str, password: &str, devices: Vec<MockDevice>) -> Result<Self> {
        Self::start_with_ttl(username, password, devices, 3600).await
    }

    /// Start a server issuing tokens that expire `token_ttl` seconds after
    /// login (zero or negative issues already-expired tokens)
    pub async fn start_with_ttl(
        username: &str,
        password: &str,
        devices: Vec<MockDevice>,
        token_ttl: i64,
    ) -> Result<Self> {
        let state = Arc::new(Mutex::new(MockState {
            username: username.to_string(),
            password: password.to_string(),
            token_ttl,
            devices,
            issued: Vec::new(),
            auth_calls: 0,
            relay: Vec::new(),
            relay_failure: None,
            plaintext_replies: false,
        }));

        let router = Router::new()
            .route("/api/authenticate", post(authenticate))
            .route("/api/account", get(account))
            .route("/api/device-list", get(device_list))
            .route("/api/direct-req", post(direct_request))
            .with_state(Arc::clone(&state));

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();

        let handle = tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
                .ok();
        });

        // Give server a moment to start
        tokio::time::sleep(Duration::from_millis(10)).await;

        Ok(Self {
            addr,
            state,
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        })
    }

    /// Get the base URL of the mock server
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Client pointed at this server
    pub fn client(&self, username: &str, password: &str) -> Result<EldomClient> {
        let config = ClientConfig::new(&self.base_url())?
            .with_timeouts(Duration::from_secs(5), Duration::from_secs(2));
        EldomClient::with_config(config, username, password)
    }

    /// Client over an explicit transport pointed at this server
    pub fn client_with_transport(
        &self,
        transport: Arc<dyn Transport>,
        credentials: Credentials,
    ) -> Result<EldomClient> {
        let config = ClientConfig::new(&self.base_url())?;
        EldomClient::with_transport(transport, config, credentials)
    }

    /// Number of successful and failed login attempts
    pub fn auth_calls(&self) -> usize {
        self.state.lock().auth_calls
    }

    /// Relay requests accepted so far
    pub fn relay_requests(&self) -> Vec<RelayRecord> {
        self.state.lock().relay.clone()
    }

    /// Make every relay request fail with `status`
    pub fn fail_relay_with(&self, status: StatusCode) {
        self.state.lock().relay_failure = Some(status);
    }

    /// Answer encrypted-family requests with plain JSON, as the live relay
    /// does for some boilers
    pub fn reply_in_plaintext(&self) {
        self.state.lock().plaintext_replies = true;
    }

    /// Shutdown the server gracefully
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

impl Drop for MockEldomServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

fn error(status: StatusCode, detail: &str) -> Response {
    (status, Json(json!({ "detail": detail }))).into_response()
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

fn authorized(state: &MockState, headers: &HeaderMap) -> bool {
    header(headers, "authorization")
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|token| state.issued.iter().any(|t| t == token) && !token_expired(token))
        .unwrap_or(false)
}

async fn authenticate(State(state): State<SharedState>, Json(body): Json<Value>) -> Response {
    let mut state = state.lock();
    state.auth_calls += 1;

    let accepted = body["username"] == state.username.as_str()
        && body["password"] == state.password.as_str()
        && body["rememberMe"] == false;
    if !accepted {
        return error(StatusCode::UNAUTHORIZED, "Bad credentials");
    }

    let nonce = format!("token-{}", state.auth_calls);
    let token = jwt_with_expiry(Utc::now().timestamp() + state.token_ttl, &nonce);
    state.issued.push(token.clone());
    Json(json!({ "id_token": token })).into_response()
}

async fn account(State(state): State<SharedState>, headers: HeaderMap) -> Response {
    let state = state.lock();
    if !authorized(&state, &headers) {
        return error(StatusCode::UNAUTHORIZED, "Full authentication is required");
    }
    Json(json!({
        "id": 1001,
        "login": state.username,
        "email": format!("{}@example.com", state.username),
        "activated": true
    }))
    .into_response()
}

async fn device_list(State(state): State<SharedState>, headers: HeaderMap) -> Response {
    let state = state.lock();
    if !authorized(&state, &headers) {
        return error(StatusCode::UNAUTHORIZED, "Full authentication is required");
    }
    let devices: Vec<Value> = state
        .devices
        .iter()
        .map(|d| {
            json!({
                "uuid": d.device.uuid,
                "model": d.device.model,
                "fmodel": d.device.fmodel,
                "name": d.device.name,
                "pairTok": d.device.pair_tok,
                "online": true
            })
        })
        .collect();
    Json(Value::Array(devices)).into_response()
}

async fn direct_request(
    State(state): State<SharedState>,
    headers: HeaderMap,
    body: String,
) -> Response {
    let mut state = state.lock();
    if !authorized(&state, &headers) {
        return error(StatusCode::UNAUTHORIZED, "Full authentication is required");
    }
    if header(&headers, "user-agent") != Some(USER_AGENT) {
        return error(StatusCode::FORBIDDEN, "Unsupported client");
    }
    if let Some(status) = state.relay_failure {
        return error(status, "Relay unavailable");
    }

    let Some(uuid) = header(&headers, DEVICE_HEADER) else {
        return error(StatusCode::BAD_REQUEST, "Missing device header");
    };
    let Some(target) = state
        .devices
        .iter()
        .find(|d| d.device.uuid == uuid)
        .cloned()
    else {
        return error(StatusCode::NOT_FOUND, "Unknown device");
    };

    let envelope = Envelope::vendor();
    let encrypted = target.family.encrypted();
    let plaintext = if encrypted {
        let sealed: SealedMessage = match serde_json::from_str(&body) {
            Ok(sealed) => sealed,
            Err(_) => return error(StatusCode::BAD_REQUEST, "Expected encrypted message"),
        };
        match envelope.decrypt_text(&sealed.msg) {
            Ok(text) => text,
            Err(_) => return error(StatusCode::BAD_REQUEST, "Undecryptable message"),
        }
    } else {
        body
    };

    let command = match Command::parse(&plaintext) {
        Ok(command) => command,
        Err(_) => return error(StatusCode::BAD_REQUEST, "Malformed command"),
    };
    if !command.verify() || command.device_id() != target.device.pair_tok {
        return error(StatusCode::BAD_REQUEST, "Checksum mismatch");
    }

    let reply = if command.request() == GET_STATUS {
        target.status.clone()
    } else {
        json!({
            "Res": command.request(),
            "Code": "0",
            "Type": "OK",
            "Reason": "SUCCESS"
        })
    };

    state.relay.push(RelayRecord {
        device_uuid: uuid.to_string(),
        encrypted,
        command,
    });

    if encrypted && !state.plaintext_replies {
        match envelope.encrypt(&reply) {
            Ok(msg) => Json(json!({ "Msg": msg })).into_response(),
            Err(_) => error(StatusCode::INTERNAL_SERVER_ERROR, "Encryption failed"),
        }
    } else {
        Json(reply).into_response()
    }
}
