//! Typed JSON client over a `Transport`

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::transport::{ApiRequest, ApiResponse, Method, Transport};
use super::{ApiError, RequestContext};

/// Cheap-to-clone handle used by the session and every store
#[derive(Clone)]
pub struct ApiClient {
    transport: Arc<dyn Transport>,
}

impl ApiClient {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Send a request and turn non-2xx statuses into errors
    pub async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        let resp = self.transport.send(request).await?;
        if !resp.is_success() {
            let message = String::from_utf8_lossy(&resp.body).trim().to_string();
            return Err(ApiError::Status {
                status: resp.status,
                message,
            });
        }
        Ok(resp)
    }

    /// Send a request whose response must carry a JSON body
    pub async fn fetch<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, ApiError> {
        self.fetch_optional(request)
            .await?
            .ok_or(ApiError::EmptyBody)
    }

    /// Send a request whose response body may be empty (204)
    pub async fn fetch_optional<T: DeserializeOwned>(
        &self,
        request: ApiRequest,
    ) -> Result<Option<T>, ApiError> {
        let resp = self.send(request).await?;
        if resp.is_empty() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_slice(&resp.body)?))
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        ctx: &RequestContext,
        path: &str,
    ) -> Result<T, ApiError> {
        self.fetch(ApiRequest::new(Method::Get, path, ctx)).await
    }

    pub async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        ctx: &RequestContext,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let request = ApiRequest::new(Method::Post, path, ctx).body(serde_json::to_value(body)?);
        self.fetch(request).await
    }

    pub async fn put<B: Serialize, T: DeserializeOwned>(
        &self,
        ctx: &RequestContext,
        path: &str,
        body: &B,
    ) -> Result<Option<T>, ApiError> {
        let request = ApiRequest::new(Method::Put, path, ctx).body(serde_json::to_value(body)?);
        self.fetch_optional(request).await
    }

    pub async fn delete(&self, ctx: &RequestContext, path: &str) -> Result<(), ApiError> {
        self.send(ApiRequest::new(Method::Delete, path, ctx)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Tag;
    use crate::test_support::MockTransport;
    use serde_json::json;

    #[tokio::test]
    async fn test_error_status_carries_body_text() {
        let mock = MockTransport::new();
        mock.reply_status(Method::Get, "/admin/tags", 500, "database down");
        let client = mock.client();

        let err = client
            .get::<Vec<Tag>>(&RequestContext::anonymous(), "/admin/tags")
            .await
            .unwrap_err();
        match err {
            ApiError::Status { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message, "database down");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_put_tolerates_empty_body() {
        let mock = MockTransport::new();
        mock.reply_empty(Method::Put, "/admin/tags/4", 204);
        let client = mock.client();

        let resp: Option<Tag> = client
            .put(&RequestContext::anonymous(), "/admin/tags/4", &json!({"name": "x"}))
            .await
            .unwrap();
        assert!(resp.is_none());
    }

    #[tokio::test]
    async fn test_get_requires_body() {
        let mock = MockTransport::new();
        mock.reply_empty(Method::Get, "/users", 200);
        let client = mock.client();

        let err = client
            .get::<Vec<Tag>>(&RequestContext::anonymous(), "/users")
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::EmptyBody));
    }

    #[tokio::test]
    async fn test_bearer_is_forwarded() {
        let mock = MockTransport::new();
        mock.reply_json(Method::Get, "/admin/tags", json!([]));
        let client = mock.client();

        let _: Vec<Tag> = client
            .get(&RequestContext::with_bearer("t0k"), "/admin/tags")
            .await
            .unwrap();
        let sent = mock.requests();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].context.bearer(), Some("t0k"));
    }
}
