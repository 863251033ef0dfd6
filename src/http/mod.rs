//! Request dispatching
//!
//! Turns a case's request into a real HTTP exchange and hands back the
//! raw response for verification.

mod client;

use async_trait::async_trait;
use thiserror::Error;

use crate::cases::{Headers, Request};

pub use client::ReqwestDispatcher;

/// Failure while dispatching a request
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    #[error("invalid method '{0}'")]
    InvalidMethod(String),

    #[error("request failed: {0}")]
    Transport(String),

    #[error("failed to read response body: {0}")]
    Body(String),
}

/// Response as received from the server under test
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActualResponse {
    /// Status code
    pub status: u16,
    /// Response headers, names as sent on the wire
    pub headers: Headers,
    /// Raw body bytes
    pub body: Vec<u8>,
}

impl ActualResponse {
    /// Create a response with a status and body and no headers
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: Headers::new(),
            body: body.into(),
        }
    }

    /// Add a header value
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers
            .entry(name.to_string())
            .or_default()
            .push(value.to_string());
        self
    }
}

/// Sends case requests to the server under test
#[async_trait]
pub trait RequestDispatcher: Send + Sync {
    /// Perform the request described by `request`
    async fn send(&self, request: &Request) -> Result<ActualResponse, DispatchError>;
}
