//! In-memory inference transport
//!
//! Answers every request with a canned response (or a network error) and
//! records what it was asked.

use async_trait::async_trait;
use songtag_ai::services::{InferenceRequest, InferenceTransport, TransportError};
use std::sync::Mutex;

pub struct MockTransport {
    response: Option<String>,
    requests: Mutex<Vec<InferenceRequest>>,
}

impl MockTransport {
    /// Transport that always returns `response`
    pub fn responding(response: impl Into<String>) -> Self {
        Self {
            response: Some(response.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Transport whose backend is down
    pub fn unreachable() -> Self {
        Self {
            response: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<InferenceRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl InferenceTransport for MockTransport {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn complete(&self, request: &InferenceRequest) -> Result<String, TransportError> {
        self.requests.lock().unwrap().push(request.clone());
        self.response
            .clone()
            .ok_or_else(|| TransportError::Network("connection refused".to_string()))
    }

    async fn health_check(&self) -> Result<(), TransportError> {
        match self.response {
            Some(_) => Ok(()),
            None => Err(TransportError::Network("connection refused".to_string())),
        }
    }
}
