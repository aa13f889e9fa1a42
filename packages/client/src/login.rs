//! Guest login over HTTP.

use serde::{Deserialize, Serialize};

use crate::{domain::session_url, error::ClientError};

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    nickname: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user_id: i64,
    pub nickname: String,
    pub expires_at: i64,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    message: String,
}

/// Obtain a session token for `nickname`
pub async fn login(
    http: &reqwest::Client,
    server: &str,
    nickname: &str,
) -> Result<LoginResponse, ClientError> {
    let response = http
        .post(session_url(server))
        .json(&LoginRequest { nickname })
        .send()
        .await
        .map_err(|e| ClientError::ConnectionError(e.to_string()))?;

    let status = response.status();
    if status.is_success() {
        return response
            .json::<LoginResponse>()
            .await
            .map_err(|e| ClientError::Login(e.to_string()));
    }

    let message = response
        .json::<ErrorResponse>()
        .await
        .map(|body| body.message)
        .unwrap_or_else(|_| status.to_string());

    if status == reqwest::StatusCode::BAD_REQUEST {
        Err(ClientError::InvalidNickname(nickname.to_string(), message))
    } else {
        Err(ClientError::Login(message))
    }
}
