//! In-memory fakes for the network boundary.
//!
//! `MockTransport` answers calls from a route table and records every call,
//! so tests can assert on headers, bodies and call counts without a server.
//! `MemoryCredentials` is a token holder for pipeline-level tests.
//!
//! ```
//! use std::sync::Arc;
//! use alms_http::mock::{MemoryCredentials, MockReply, MockTransport};
//! use alms_http::{BaseAddress, Method, RequestPipeline};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() {
//!     let transport = Arc::new(MockTransport::new());
//!     transport.on(Method::Get, "/partners", MockReply::ok(json!({"status": "success", "data": []})));
//!
//!     let pipeline = RequestPipeline::new(
//!         transport.clone(),
//!         BaseAddress::new("http://localhost:5000/api"),
//!         Arc::new(MemoryCredentials::default()),
//!     );
//!     pipeline.get("/partners").await.unwrap();
//!     pipeline.get("/partners").await.unwrap();
//!     assert_eq!(transport.call_count(), 1);
//! }
//! ```

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::credentials::CredentialStore;
use crate::transport::{Method, OutboundRequest, RawResponse, Transport, TransportError};

/// A scripted answer.
#[derive(Debug, Clone)]
pub struct MockReply(Result<RawResponse, TransportError>);

impl MockReply {
    #[must_use]
    pub const fn json(status: u16, body: Value) -> Self {
        Self(Ok(RawResponse { status, body }))
    }

    #[must_use]
    pub const fn ok(body: Value) -> Self {
        Self::json(200, body)
    }

    /// `{status: "error", message}` with the given HTTP status.
    #[must_use]
    pub fn error(status: u16, message: &str) -> Self {
        Self::json(status, json!({"status": "error", "message": message}))
    }

    #[must_use]
    pub const fn timeout() -> Self {
        Self(Err(TransportError::Timeout))
    }

    #[must_use]
    pub fn refused() -> Self {
        Self(Err(TransportError::Connect("connection refused".to_string())))
    }
}

struct Route {
    method: Method,
    path: String,
    replies: VecDeque<MockReply>,
}

#[derive(Default)]
struct MockState {
    routes: Vec<Route>,
    calls: Vec<OutboundRequest>,
}

#[derive(Default)]
pub struct MockTransport {
    state: Mutex<MockState>,
}

impl MockTransport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `reply` for `method path`. Replies are served in order; the
    /// last one repeats. Unrouted calls get a 404.
    pub fn on(&self, method: Method, path: &str, reply: MockReply) -> &Self {
        let mut state = self.lock();
        if let Some(route) = state
            .routes
            .iter_mut()
            .find(|route| route.method == method && route.path == path)
        {
            route.replies.push_back(reply);
        } else {
            state.routes.push(Route {
                method,
                path: path.to_string(),
                replies: VecDeque::from([reply]),
            });
        }
        self
    }

    /// Every call received so far.
    #[must_use]
    pub fn calls(&self) -> Vec<OutboundRequest> {
        self.lock().calls.clone()
    }

    #[must_use]
    pub fn call_count(&self) -> usize {
        self.lock().calls.len()
    }

    /// Calls whose URL ends with `path`.
    #[must_use]
    pub fn calls_to(&self, path: &str) -> Vec<OutboundRequest> {
        self.lock()
            .calls
            .iter()
            .filter(|call| call.url.ends_with(path))
            .cloned()
            .collect()
    }

    /// The most recent call.
    #[must_use]
    pub fn last_call(&self) -> Option<OutboundRequest> {
        self.lock().calls.last().cloned()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: OutboundRequest) -> Result<RawResponse, TransportError> {
        let mut state = self.lock();
        state.calls.push(request.clone());

        // Most specific route wins: `/campaigns/c1/donations` over `/donations`.
        let Some(route) = state
            .routes
            .iter_mut()
            .filter(|route| {
                route.method == request.method && request.url.ends_with(route.path.as_str())
            })
            .max_by_key(|route| route.path.len())
        else {
            return Ok(RawResponse {
                status: 404,
                body: json!({"status": "error", "message": format!("No route for {} {}", request.method.as_str(), request.url)}),
            });
        };

        let reply = if route.replies.len() > 1 {
            route.replies.pop_front()
        } else {
            route.replies.front().cloned()
        };
        reply.map_or_else(
            || Ok(RawResponse { status: 404, body: Value::Null }),
            |reply| reply.0,
        )
    }
}

/// A token held in memory.
#[derive(Debug, Default)]
pub struct MemoryCredentials {
    token: Mutex<Option<String>>,
}

impl MemoryCredentials {
    #[must_use]
    pub fn with_token(token: &str) -> Self {
        Self {
            token: Mutex::new(Some(token.to_string())),
        }
    }

    pub fn set(&self, token: Option<&str>) {
        *self.token.lock().unwrap_or_else(PoisonError::into_inner) = token.map(ToString::to_string);
    }
}

impl CredentialStore for MemoryCredentials {
    fn token(&self) -> Option<String> {
        self.token
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn clear(&self) {
        self.set(None);
    }
}
