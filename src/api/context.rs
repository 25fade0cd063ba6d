//! Per-request credential context
//!
//! Every outbound call receives a `RequestContext` explicitly instead of
//! reading a default header from a shared client.

use std::fmt;

/// Credential attached to outbound requests
#[derive(Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    bearer: Option<String>,
}

impl RequestContext {
    /// Context with no credential
    pub fn anonymous() -> Self {
        Self { bearer: None }
    }

    /// Context carrying a bearer token
    pub fn with_bearer(token: impl Into<String>) -> Self {
        Self {
            bearer: Some(token.into()),
        }
    }

    pub fn bearer(&self) -> Option<&str> {
        self.bearer.as_deref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.bearer.is_some()
    }

    /// Value for the `Authorization` header
    pub fn authorization_header(&self) -> Option<String> {
        self.bearer.as_ref().map(|t| format!("Bearer {}", t))
    }
}

// tokens never end up in logs
impl fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestContext")
            .field("bearer", &self.bearer.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}
