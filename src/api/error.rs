//! Errors raised while talking to the catalog service

/// Anything that can go wrong on a single request
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("HTTP error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("server error (status {status}): {message}")]
    Status { status: u16, message: String },
    #[error("unexpected response format: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("response body was empty")]
    EmptyBody,
}

impl ApiError {
    /// Status code reported by the server, if the request got that far
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// True for rejected or expired credentials
    pub fn is_unauthorized(&self) -> bool {
        matches!(self.status(), Some(401) | Some(403))
    }
}
