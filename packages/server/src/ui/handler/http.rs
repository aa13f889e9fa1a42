//! HTTP API endpoint handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};

use super::{
    token::{TOKEN_COOKIE, extract_token},
    websocket::CLOSE_DUPLICATE_SESSION,
};
use crate::{
    domain::{RoomId, RoomStatus},
    infrastructure::dto::{
        conversion::parse_room_status,
        http::{
            ErrorResponse, HealthResponse, LoginRequest, LoginResponse, RoomListQuery,
            RoomListResponse, RoomSummaryDto,
        },
        websocket::RoomDto,
    },
    ui::state::AppState,
    usecase::{AuthError, LoginError},
};

/// Error body with its status code
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorResponse,
}

impl ApiError {
    fn new(status: StatusCode, code: &str, message: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorResponse::new(code, message),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

impl From<LoginError> for ApiError {
    fn from(err: LoginError) -> Self {
        match err {
            LoginError::InvalidNickname(_) => {
                Self::new(StatusCode::BAD_REQUEST, "invalid_nickname", err.to_string())
            }
            LoginError::Rejected(_) => {
                Self::new(StatusCode::FORBIDDEN, "login_rejected", err.to_string())
            }
            LoginError::RetryLater => {
                Self::new(StatusCode::SERVICE_UNAVAILABLE, "retry_later", err.to_string())
            }
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "unauthenticated", err.to_string())
    }
}

/// Health check endpoint
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        rooms: state.room_manager.room_count(),
        connections: state.message_pusher.connected_count().await,
        timestamp: state.clock.now_millis(),
    })
}

/// Guest login; the token is returned in the body and as a cookie
pub async fn create_session(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let session = state.login_usecase.execute(request.nickname).await?;
    // The previous token is revoked, so its socket goes too
    state
        .message_pusher
        .disconnect(session.user_id, CLOSE_DUPLICATE_SESSION, "session replaced")
        .await;

    let cookie = format!(
        "{TOKEN_COOKIE}={}; Path=/; HttpOnly; SameSite=Lax",
        session.token.as_str()
    );
    let mut headers = HeaderMap::new();
    if let Ok(value) = HeaderValue::from_str(&cookie) {
        headers.insert(header::SET_COOKIE, value);
    }

    let body = LoginResponse {
        token: session.token.as_str().to_string(),
        user_id: session.user_id.value(),
        nickname: session.nickname.as_str().to_string(),
        expires_at: session.expires_at.value(),
    };
    Ok((StatusCode::CREATED, headers, Json(body)))
}

/// Logout
pub async fn delete_session(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<StatusCode, ApiError> {
    let token = extract_token(&headers, None);
    state.authenticate_usecase.logout(token.as_deref()).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Get list of rooms, optionally filtered by status
pub async fn get_rooms(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RoomListQuery>,
) -> Result<Json<RoomListResponse>, ApiError> {
    let status: Option<RoomStatus> = match query.status.as_deref() {
        None => None,
        Some(raw) => Some(parse_room_status(raw).ok_or_else(|| {
            ApiError::new(
                StatusCode::BAD_REQUEST,
                "invalid_status",
                format!("unknown room status '{raw}'"),
            )
        })?),
    };

    // Domain Model から DTO への変換
    let rooms: Vec<RoomSummaryDto> = state
        .room_manager
        .list(status)
        .iter()
        .map(Into::into)
        .collect();
    Ok(Json(RoomListResponse { rooms }))
}

/// Get room detail by ID
pub async fn get_room_detail(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<u64>,
) -> Result<Json<RoomDto>, ApiError> {
    let room_id = RoomId::new(room_id);
    let not_found =
        || ApiError::new(StatusCode::NOT_FOUND, "room_not_found", format!("room {room_id} not found"));

    let handle = state.room_manager.find(room_id).map_err(|_| not_found())?;
    let snapshot = handle.snapshot().await.map_err(|_| not_found())?;
    Ok(Json(RoomDto::from(&snapshot)))
}
