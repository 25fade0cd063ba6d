//! Scripted transport for unit tests

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::oneshot;

use crate::api::{ApiClient, ApiError, ApiRequest, ApiResponse, Method, Transport};

/// A canned reply
#[derive(Debug, Clone)]
pub enum Reply {
    Json(u16, serde_json::Value),
    Text(u16, String),
    Empty(u16),
}

impl Reply {
    fn into_response(self) -> ApiResponse {
        match self {
            Reply::Json(status, value) => ApiResponse {
                status,
                body: serde_json::to_vec(&value).unwrap_or_default(),
            },
            Reply::Text(status, text) => ApiResponse {
                status,
                body: text.into_bytes(),
            },
            Reply::Empty(status) => ApiResponse {
                status,
                body: Vec::new(),
            },
        }
    }
}

enum Scripted {
    Ready(Reply),
    Held(oneshot::Receiver<Reply>),
}

#[derive(Default)]
struct Inner {
    routes: HashMap<(Method, String), VecDeque<Scripted>>,
    requests: Vec<ApiRequest>,
}

/// Records every request and answers from per-route queues.
///
/// Routes without a scripted reply answer 404, so an unexpected call shows
/// up both in `requests()` and as a failed operation.
#[derive(Clone, Default)]
pub struct MockTransport {
    inner: Arc<Mutex<Inner>>,
}

/// Releases a held reply
pub struct Release(oneshot::Sender<Reply>);

impl Release {
    pub fn json(self, value: serde_json::Value) {
        let _ = self.0.send(Reply::Json(200, value));
    }

    pub fn status(self, status: u16) {
        let _ = self.0.send(Reply::Text(status, "error".to_string()));
    }
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn client(&self) -> ApiClient {
        ApiClient::new(Arc::new(self.clone()))
    }

    fn push(&self, method: Method, path: &str, scripted: Scripted) {
        self.inner
            .lock()
            .routes
            .entry((method, path.to_string()))
            .or_default()
            .push_back(scripted);
    }

    pub fn reply(&self, method: Method, path: &str, reply: Reply) {
        self.push(method, path, Scripted::Ready(reply));
    }

    pub fn reply_json(&self, method: Method, path: &str, value: serde_json::Value) {
        self.reply(method, path, Reply::Json(200, value));
    }

    pub fn reply_status(&self, method: Method, path: &str, status: u16, text: &str) {
        self.reply(method, path, Reply::Text(status, text.to_string()));
    }

    pub fn reply_empty(&self, method: Method, path: &str, status: u16) {
        self.reply(method, path, Reply::Empty(status));
    }

    /// Queue a reply that is only delivered once the returned handle fires
    pub fn hold(&self, method: Method, path: &str) -> Release {
        let (tx, rx) = oneshot::channel();
        self.push(method, path, Scripted::Held(rx));
        Release(tx)
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.inner.lock().requests.clone()
    }

    pub fn request_count(&self) -> usize {
        self.inner.lock().requests.len()
    }

    pub fn requests_to(&self, method: Method, path: &str) -> Vec<ApiRequest> {
        self.inner
            .lock()
            .requests
            .iter()
            .filter(|r| r.method == method && r.path == path)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        let scripted = {
            let mut inner = self.inner.lock();
            let key = (request.method, request.path.clone());
            inner.requests.push(request);
            inner.routes.get_mut(&key).and_then(|q| q.pop_front())
        };

        let reply = match scripted {
            Some(Scripted::Ready(reply)) => reply,
            Some(Scripted::Held(rx)) => rx
                .await
                .unwrap_or_else(|_| Reply::Text(503, "reply dropped".to_string())),
            None => Reply::Text(404, "no reply scripted".to_string()),
        };

        Ok(reply.into_response())
    }
}
