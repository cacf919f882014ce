//! Integration tests for the RAMM Shop client.
//!
//! Every test runs the real client against a [`MockServer`]: an axum app
//! bound to an ephemeral local port that answers from canned stubs and
//! records every request it receives. One server can stand in for the
//! marketplace API, the identity provider and the storage upload target
//! at once.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p ramm-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `auth_flow` - Signup, login, confirmation recovery, forced password change
//! - `listings` - Visibility, seller scoping, update patches, delete, search
//! - `listing_creation` - Three-step creation and its failure modes
//! - `orders` - History, checkout and finalization
//! - `admin` - Access gate, lazy sections, moderation toggle

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use ramm_client::ApiClient;
use ramm_client::config::IdentityConfig;
use ramm_client::session::Session;
use ramm_core::UserAttributes;
use ramm_core::user::attr;
use secrecy::SecretString;
use serde_json::{Value, json};
use tokio::task::JoinHandle;
use url::Url;

/// Header carrying the identity provider action.
const AMZ_TARGET: &str = "x-amz-target";

/// A canned response.
#[derive(Debug, Clone)]
struct Stub {
    status: StatusCode,
    body: Value,
}

/// A request as the mock server saw it.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl RecordedRequest {
    /// Header value, if present and valid UTF-8.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }

    /// Identity provider action without its service prefix.
    #[must_use]
    pub fn action(&self) -> Option<&str> {
        self.header(AMZ_TARGET)
            .map(|target| target.rsplit('.').next().unwrap_or(target))
    }

    /// Decoded query parameter.
    #[must_use]
    pub fn query_param(&self, key: &str) -> Option<String> {
        let query = self.query.as_deref()?;
        url::form_urlencoded::parse(query.as_bytes())
            .find(|(name, _)| name == key)
            .map(|(_, value)| value.into_owned())
    }

    /// Decoded `application/x-www-form-urlencoded` body parameter.
    #[must_use]
    pub fn form_param(&self, key: &str) -> Option<String> {
        url::form_urlencoded::parse(&self.body)
            .find(|(name, _)| name == key)
            .map(|(_, value)| value.into_owned())
    }

    #[must_use]
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Body parsed as JSON; `Value::Null` when it is not JSON.
    #[must_use]
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap_or(Value::Null)
    }
}

#[derive(Default)]
struct MockState {
    stubs: Mutex<HashMap<String, VecDeque<Stub>>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl MockState {
    fn next_stub(&self, key: &str) -> Option<Stub> {
        let mut stubs = self.stubs.lock().unwrap_or_else(PoisonError::into_inner);
        let queue = stubs.get_mut(key)?;
        // The last stub answers every further request
        if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        }
    }
}

fn stub_key(method: &Method, path: &str) -> String {
    format!("{method} {path}")
}

fn action_key(action: &str) -> String {
    format!("POST amz:{action}")
}

async fn record(
    State(state): State<Arc<MockState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let request = RecordedRequest {
        method: method.clone(),
        path: uri.path().to_string(),
        query: uri.query().map(str::to_string),
        headers,
        body: body.to_vec(),
    };
    let key = match request.action() {
        Some(action) => action_key(action),
        None => stub_key(&method, uri.path()),
    };
    state
        .requests
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .push(request);

    match state.next_stub(&key) {
        Some(stub) => (stub.status, axum::Json(stub.body)).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            axum::Json(json!({ "detail": format!("No stub for {key}") })),
        )
            .into_response(),
    }
}

/// Local HTTP server answering from stubs.
pub struct MockServer {
    base_url: Url,
    state: Arc<MockState>,
    handle: JoinHandle<()>,
}

impl MockServer {
    /// Bind to an ephemeral port and start serving.
    ///
    /// # Panics
    ///
    /// Panics if the listener cannot be bound.
    pub async fn start() -> Self {
        let state = Arc::new(MockState::default());
        let app = Router::new().fallback(record).with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind mock server");
        let addr = listener.local_addr().expect("Mock server has no address");
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        let base_url = Url::parse(&format!("http://{addr}/")).expect("Invalid mock server URL");
        Self {
            base_url,
            state,
            handle,
        }
    }

    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Absolute URL of `path` on this server.
    ///
    /// # Panics
    ///
    /// Panics if `path` does not form a valid URL.
    #[must_use]
    pub fn url(&self, path: &str) -> Url {
        self.base_url
            .join(path.trim_start_matches('/'))
            .expect("Invalid mock path")
    }

    /// Queue a response for `method path`. Queued responses are served in
    /// order; the last one repeats.
    pub fn stub(&self, method: Method, path: &str, status: u16, body: Value) {
        self.push(stub_key(&method, path), status, body);
    }

    /// Queue a response for an identity provider action.
    pub fn stub_action(&self, action: &str, status: u16, body: Value) {
        self.push(action_key(action), status, body);
    }

    fn push(&self, key: String, status: u16, body: Value) {
        let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        self.state
            .stubs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(key)
            .or_default()
            .push_back(Stub { status, body });
    }

    /// Every request received so far, in arrival order.
    #[must_use]
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state
            .requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Requests received for `method path`.
    #[must_use]
    pub fn requests_to(&self, method: &Method, path: &str) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|request| request.method == *method && request.path == path)
            .collect()
    }

    /// Requests received for an identity provider action.
    #[must_use]
    pub fn action_requests(&self, action: &str) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|request| request.action() == Some(action))
            .collect()
    }

    /// API client pointed at this server.
    ///
    /// # Panics
    ///
    /// Panics if the client cannot be built.
    #[must_use]
    pub fn api_client(&self) -> ApiClient {
        ApiClient::new(self.base_url.clone(), Duration::from_secs(5))
            .expect("Failed to build API client")
    }

    /// Identity provider configuration whose endpoint is this server.
    #[must_use]
    pub fn identity_config(&self) -> IdentityConfig {
        IdentityConfig {
            region: "us-east-1".to_string(),
            user_pool_id: "us-east-1_testpool".to_string(),
            client_id: "test-client".to_string(),
            endpoint: self.url("cognito/"),
        }
    }
}

impl Drop for MockServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// A product in the shape the marketplace API returns.
#[must_use]
pub fn product(id: i32, title: &str, price: f64, status: &str, seller_id: &str) -> Value {
    json!({
        "ProductID": id,
        "title": title,
        "price": price,
        "status": status,
        "quantity": 1,
        "description": "general",
        "imageKey": format!("products/{id}.png"),
        "seller_id": seller_id,
    })
}

/// A signed-in session with the given role attribute.
#[must_use]
pub fn session(user_id: &str, email: &str, role: &str) -> Session {
    let mut attributes = UserAttributes::default();
    attributes.insert(attr::SUB, user_id);
    attributes.insert(attr::EMAIL, email);
    attributes.insert(attr::ROLE, role);
    Session::new(SecretString::from("id-token"), attributes)
}
