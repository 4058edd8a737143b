//! # Mock API Client
//!
//! Test double for [`HttpClient`] with ordered expectations. Each
//! expectation names a method and path and carries its reply; requests
//! consume expectations front to back, so a test reads as the exact
//! conversation it verifies.
//!
//! Replies are either immediate or deferred. A deferred expectation hands
//! back a [`DeferredReply`]; the request blocks until the test releases
//! it, which is how response races (slow first request, fast second) are
//! staged deterministically.
//!
//! ```rust,ignore
//! let api = MockApi::new();
//! api.expect_get("/api/projects").return_json(json!([{"id": 1, "name": "Default"}]));
//! let slow = api.expect_get("/api/projects").defer();
//!
//! // ... drive the scene, then release the straggler:
//! slow.respond_json(json!([{"id": 2, "name": "Late"}]));
//! api.verify();
//! ```
//!
//! Unexpected or mismatched requests fail soft at call time (the scene
//! sees an [`ApiError`]) and hard at [`verify`](MockApi::verify) time, so
//! a wayward request cannot pass silently.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use serde_json::Value;
use tokio::sync::oneshot;

use crate::http::{ApiError, HttpClient};

/// Request method, as far as scenes are concerned.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Method {
    Get,
    Create,
}

impl Method {
    fn label(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Create => "CREATE",
        }
    }
}

/// One request the mock received, for body and ordering assertions.
#[derive(Clone, Debug)]
pub struct RecordedRequest {
    pub method: Method,
    pub path: String,
    pub body: Option<Value>,
}

enum Reply {
    Now(Result<Value, ApiError>),
    Deferred(oneshot::Receiver<Result<Value, ApiError>>),
}

struct Expectation {
    method: Method,
    path: String,
    reply: Reply,
}

#[derive(Default)]
struct MockState {
    expectations: VecDeque<Expectation>,
    requests: Vec<RecordedRequest>,
    violations: Vec<String>,
}

/// Scripted [`HttpClient`] for tests.
#[derive(Clone, Default)]
pub struct MockApi {
    state: Arc<Mutex<MockState>>,
}

impl MockApi {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Expects a GET of `path` as the next request.
    pub fn expect_get(&self, path: &str) -> ReplyBuilder<'_> {
        ReplyBuilder { mock: self, method: Method::Get, path: path.to_string() }
    }

    /// Expects a CREATE of `path` as the next request.
    pub fn expect_create(&self, path: &str) -> ReplyBuilder<'_> {
        ReplyBuilder { mock: self, method: Method::Create, path: path.to_string() }
    }

    /// Every request received so far, in order.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.lock().requests.clone()
    }

    /// Panics if expectations remain unconsumed or any request arrived
    /// unexpected or out of order. Call at the end of a test.
    pub fn verify(&self) {
        let state = self.lock();
        let leftovers: Vec<String> = state
            .expectations
            .iter()
            .map(|exp| format!("{} {}", exp.method.label(), exp.path))
            .collect();
        if !leftovers.is_empty() || !state.violations.is_empty() {
            panic!(
                "MockApi::verify failed; unmet expectations: [{}]; violations: [{}]",
                leftovers.join(", "),
                state.violations.join(", "),
            );
        }
    }

    async fn request(&self, method: Method, path: &str, body: Option<Value>) -> Result<Value, ApiError> {
        let reply = {
            let mut state = self.lock();
            state.requests.push(RecordedRequest {
                method,
                path: path.to_string(),
                body,
            });
            match state.expectations.pop_front() {
                None => {
                    let violation = format!("unexpected {} {}", method.label(), path);
                    state.violations.push(violation.clone());
                    return Err(ApiError::new(500, "unexpected_request", violation));
                }
                Some(exp) if exp.method != method || exp.path != path => {
                    let violation = format!(
                        "expected {} {}, got {} {}",
                        exp.method.label(),
                        exp.path,
                        method.label(),
                        path
                    );
                    state.violations.push(violation.clone());
                    return Err(ApiError::new(500, "unexpected_request", violation));
                }
                Some(exp) => exp.reply,
            }
        };
        match reply {
            Reply::Now(outcome) => outcome,
            Reply::Deferred(pending) => pending
                .await
                .unwrap_or_else(|_| Err(ApiError::network("mock responder dropped"))),
        }
    }
}

#[async_trait::async_trait]
impl HttpClient for MockApi {
    async fn get(&self, path: &str) -> Result<Value, ApiError> {
        self.request(Method::Get, path, None).await
    }

    async fn create(&self, path: &str, body: Value) -> Result<Value, ApiError> {
        self.request(Method::Create, path, Some(body)).await
    }
}

/// Names the reply for one expectation.
pub struct ReplyBuilder<'a> {
    mock: &'a MockApi,
    method: Method,
    path: String,
}

impl ReplyBuilder<'_> {
    fn push(self, reply: Reply) {
        self.mock.lock().expectations.push_back(Expectation {
            method: self.method,
            path: self.path,
            reply,
        });
    }

    /// Replies immediately with a success body.
    pub fn return_json(self, value: Value) {
        self.push(Reply::Now(Ok(value)));
    }

    /// Replies immediately with an error.
    pub fn return_err(self, error: ApiError) {
        self.push(Reply::Now(Err(error)));
    }

    /// Holds the request open until the returned handle answers it.
    pub fn defer(self) -> DeferredReply {
        let (release, pending) = oneshot::channel();
        self.push(Reply::Deferred(pending));
        DeferredReply { release }
    }
}

/// Answers one deferred expectation.
pub struct DeferredReply {
    release: oneshot::Sender<Result<Value, ApiError>>,
}

impl DeferredReply {
    pub fn respond_json(self, value: Value) {
        let _ = self.release.send(Ok(value));
    }

    pub fn respond_err(self, error: ApiError) {
        let _ = self.release.send(Err(error));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn expectations_are_consumed_in_order() {
        let api = MockApi::new();
        api.expect_get("/a").return_json(json!(1));
        api.expect_create("/b").return_json(json!(2));

        assert_eq!(api.get("/a").await.unwrap(), json!(1));
        assert_eq!(api.create("/b", json!({"x": 1})).await.unwrap(), json!(2));

        let requests = api.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[1].body, Some(json!({"x": 1})));
        api.verify();
    }

    #[tokio::test]
    async fn unexpected_request_is_an_error_and_a_violation() {
        let api = MockApi::new();
        let err = api.get("/nope").await.unwrap_err();
        assert_eq!(err.code, "unexpected_request");

        let result = std::panic::catch_unwind(|| api.verify());
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn deferred_reply_blocks_until_released() {
        let api = MockApi::new();
        let gate = api.expect_get("/slow").defer();

        let call = tokio::spawn({
            let api = api.clone();
            async move { api.get("/slow").await }
        });
        // Give the request a chance to start and park on the gate.
        tokio::task::yield_now().await;
        assert!(!call.is_finished());

        gate.respond_json(json!("done"));
        assert_eq!(call.await.unwrap().unwrap(), json!("done"));
        api.verify();
    }

    #[tokio::test]
    async fn mismatched_path_is_flagged() {
        let api = MockApi::new();
        api.expect_get("/right").return_json(json!(null));
        let err = api.get("/wrong").await.unwrap_err();
        assert_eq!(err.code, "unexpected_request");
    }
}
