//! Test doubles: `MockNode` for the engine and `MockTransport` for nodes.
//!
//! Useful in unit and integration tests where a real node or a live vendor
//! API is either unavailable or irrelevant.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::http::{HttpRequest, HttpTransport, Method};
use crate::{traits::ExecutionContext, ExecutableNode, NodeError};

/// Behaviour injected into `MockNode` at construction time.
pub enum MockBehaviour {
    /// Return a specific JSON value.
    ReturnValue(Value),
    /// Fail every call with the given error.
    Fail(NodeError),
    /// Pop one outcome per call; `{}` once the script runs out.
    Script(Mutex<VecDeque<Result<Value, NodeError>>>),
}

/// A mock node that records every call it receives and returns a
/// programmer-specified result.
pub struct MockNode {
    /// Label used in test assertions.
    pub name: String,
    /// What the node will do when `execute` is called.
    pub behaviour: MockBehaviour,
    /// All inputs seen by this node (in call order), with their item index.
    pub calls: Arc<Mutex<Vec<(usize, Value)>>>,
}

impl MockNode {
    fn with_behaviour(name: impl Into<String>, behaviour: MockBehaviour) -> Self {
        Self {
            name: name.into(),
            behaviour,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Create a mock that always succeeds with the given value.
    pub fn returning(name: impl Into<String>, value: Value) -> Self {
        Self::with_behaviour(name, MockBehaviour::ReturnValue(value))
    }

    /// Create a mock that always fails with `error`.
    pub fn failing(name: impl Into<String>, error: NodeError) -> Self {
        Self::with_behaviour(name, MockBehaviour::Fail(error))
    }

    /// Create a mock that plays back `outcomes` in call order.
    pub fn scripted(name: impl Into<String>, outcomes: Vec<Result<Value, NodeError>>) -> Self {
        Self::with_behaviour(name, MockBehaviour::Script(Mutex::new(outcomes.into())))
    }

    /// Number of times this node has been executed.
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Item indices in the order they were executed.
    pub fn seen_items(&self) -> Vec<usize> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(index, _)| *index)
            .collect()
    }
}

#[async_trait]
impl ExecutableNode for MockNode {
    async fn execute(&self, input: Value, ctx: &ExecutionContext) -> Result<Value, NodeError> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((ctx.item_index, input));

        match &self.behaviour {
            MockBehaviour::ReturnValue(v) => {
                // Tag the output with the node name so tests can trace it.
                let mut out = json!({ "node": self.name });
                if let (Some(out_obj), Some(v_obj)) = (out.as_object_mut(), v.as_object()) {
                    for (k, val) in v_obj {
                        out_obj.insert(k.clone(), val.clone());
                    }
                }
                Ok(out)
            }
            MockBehaviour::Fail(error) => Err(error.clone()),
            MockBehaviour::Script(outcomes) => outcomes
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .pop_front()
                .unwrap_or_else(|| Ok(json!({}))),
        }
    }
}

/// Canned reply for one route.
#[derive(Debug, Clone)]
enum MockReply {
    Json(Value),
    Fail(NodeError),
}

/// An in-memory `HttpTransport`.
///
/// Routes match on method and on the URL without its query string. Every
/// request is recorded, matched or not; unmatched requests fail with a 404.
#[derive(Debug, Default)]
pub struct MockTransport {
    routes: Vec<(Method, String, MockReply)>,
    requests: Arc<Mutex<Vec<HttpRequest>>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `method url` with `body`.
    pub fn reply(mut self, method: Method, url: impl Into<String>, body: Value) -> Self {
        self.routes.push((method, url.into(), MockReply::Json(body)));
        self
    }

    /// Fail `method url` with `error`.
    pub fn fail(mut self, method: Method, url: impl Into<String>, error: NodeError) -> Self {
        self.routes.push((method, url.into(), MockReply::Fail(error)));
        self
    }

    /// Every request received so far, in order.
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Number of requests whose URL (without query) equals `url`.
    pub fn requests_to(&self, url: &str) -> usize {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|r| strip_query(&r.url) == url)
            .count()
    }
}

fn strip_query(url: &str) -> &str {
    url.split_once('?').map_or(url, |(base, _)| base)
}

#[async_trait]
impl HttpTransport for MockTransport {
    async fn send(&self, request: HttpRequest) -> Result<Value, NodeError> {
        let reply = self
            .routes
            .iter()
            .find(|(method, url, _)| *method == request.method && url == strip_query(&request.url))
            .map(|(_, _, reply)| reply.clone());
        let target = format!("{} {}", request.method, request.url);

        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request);

        match reply {
            Some(MockReply::Json(body)) => Ok(body),
            Some(MockReply::Fail(error)) => Err(error),
            None => Err(NodeError::Transport(format!("HTTP 404 Not Found: no mock route for {target}"))),
        }
    }
}
