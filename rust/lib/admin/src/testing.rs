//! In-memory transport for session tests.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use fleetdesk_client::{ApiClient, ApiError, ApiRequest, Method, Transport};
use serde_json::{json, Value};

type Responder = dyn Fn(&ApiRequest) -> (Duration, Result<Value, ApiError>) + Send + Sync;

/// Answers each request through a closure, optionally after a delay, and
/// records everything it was asked.
pub struct Scripted {
    responder: Box<Responder>,
    seen: Mutex<Vec<ApiRequest>>,
}

impl Scripted {
    pub fn new<F>(responder: F) -> Arc<Self>
    where
        F: Fn(&ApiRequest) -> (Duration, Result<Value, ApiError>) + Send + Sync + 'static,
    {
        Arc::new(Self {
            responder: Box::new(responder),
            seen: Mutex::new(Vec::new()),
        })
    }

    /// Responder without delays.
    pub fn immediate<F>(responder: F) -> Arc<Self>
    where
        F: Fn(&ApiRequest) -> Result<Value, ApiError> + Send + Sync + 'static,
    {
        Self::new(move |req| (Duration::ZERO, responder(req)))
    }

    pub fn client(self: &Arc<Self>) -> ApiClient {
        ApiClient::new(self.clone())
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.seen.lock().unwrap().clone()
    }

    pub fn count(&self, method: Method, path: &str) -> usize {
        self.requests()
            .iter()
            .filter(|r| r.method == method && r.path == path)
            .count()
    }
}

#[async_trait::async_trait]
impl Transport for Scripted {
    async fn send(&self, req: ApiRequest) -> Result<Value, ApiError> {
        self.seen.lock().unwrap().push(req.clone());
        let (delay, reply) = (self.responder)(&req);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        reply
    }
}

pub fn ok(data: Value) -> Result<Value, ApiError> {
    Ok(json!({"success": true, "data": data}))
}

pub fn fail(message: &str) -> Result<Value, ApiError> {
    Ok(json!({"success": false, "error": message}))
}

/// Stand-in for a dropped connection.
pub fn broken() -> Result<Value, ApiError> {
    Err(ApiError::Decode("connection reset".into()))
}
