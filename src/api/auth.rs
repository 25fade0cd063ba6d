//! Credential exchange endpoints

use serde::{Deserialize, Serialize};

use super::{ApiClient, ApiError, RequestContext};
use crate::models::{User, UserRole};

/// login request
#[derive(Debug, Serialize)]
pub struct LoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

/// register request
#[derive(Debug, Serialize)]
pub struct RegisterRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
    pub email: &'a str,
    pub role: UserRole,
}

/// login and register response
#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
}

/// `POST /login`
pub async fn login(client: &ApiClient, username: &str, password: &str) -> Result<AuthResponse, ApiError> {
    let body = LoginRequest { username, password };
    client
        .post(&RequestContext::anonymous(), "/login", &body)
        .await
}

/// `POST /register`
pub async fn register(
    client: &ApiClient,
    username: &str,
    password: &str,
    email: &str,
    role: UserRole,
) -> Result<AuthResponse, ApiError> {
    let body = RegisterRequest {
        username,
        password,
        email,
        role,
    };
    client
        .post(&RequestContext::anonymous(), "/register", &body)
        .await
}

/// `GET /me` resolves the user behind a token
pub async fn me(client: &ApiClient, ctx: &RequestContext) -> Result<User, ApiError> {
    client.get(ctx, "/me").await
}
