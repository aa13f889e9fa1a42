//! Domain logic for client-side operations.
//!
//! This module contains pure functions that implement business logic
//! without side effects, making them easy to test.

use crate::error::ClientError;

pub const CLOSE_GOING_AWAY: u16 = 1001;
pub const CLOSE_UNAUTHENTICATED: u16 = 4001;
pub const CLOSE_ROOM_NOT_FOUND: u16 = 4002;
pub const CLOSE_FORBIDDEN: u16 = 4003;
pub const CLOSE_DUPLICATE_SESSION: u16 = 4004;

/// Check if the client should exit immediately based on the error type.
///
/// Errors that a fresh login and reconnect cannot fix end the client.
pub fn should_exit_immediately(error: &ClientError) -> bool {
    matches!(
        error,
        ClientError::DuplicateSession(_)
            | ClientError::InvalidNickname(..)
            | ClientError::RoomNotFound(_)
            | ClientError::JoinRefused(_)
    )
}

/// Check if the client should attempt to reconnect.
///
/// # Arguments
///
/// * `error` - The client error that occurred
/// * `current_attempt` - The current reconnection attempt count (0-indexed)
/// * `max_attempts` - The maximum number of reconnection attempts allowed
pub fn should_attempt_reconnect(
    error: &ClientError,
    current_attempt: u32,
    max_attempts: u32,
) -> bool {
    if should_exit_immediately(error) {
        return false;
    }

    current_attempt < max_attempts
}

/// Translate a close frame sent by the server into a client error.
pub fn close_code_to_error(
    code: u16,
    reason: &str,
    nickname: &str,
    room_id: Option<u64>,
) -> ClientError {
    match code {
        CLOSE_UNAUTHENTICATED => ClientError::Unauthenticated,
        CLOSE_ROOM_NOT_FOUND => ClientError::RoomNotFound(room_id.unwrap_or_default()),
        CLOSE_FORBIDDEN => ClientError::JoinRefused(room_id.unwrap_or_default()),
        CLOSE_DUPLICATE_SESSION => ClientError::DuplicateSession(nickname.to_string()),
        CLOSE_GOING_AWAY if reason == "server shutdown" => ClientError::ServerShutdown,
        _ => ClientError::ConnectionError(format!("closed by server ({code}): {reason}")),
    }
}

/// Build the WebSocket URL for a server base URL.
///
/// `http` maps to `ws` and `https` to `wss`. A room id selects the
/// room-bound endpoint.
pub fn websocket_url(server: &str, room_id: Option<u64>, token: &str) -> String {
    let base = server.trim_end_matches('/');
    let base = if let Some(rest) = base.strip_prefix("https://") {
        format!("wss://{rest}")
    } else if let Some(rest) = base.strip_prefix("http://") {
        format!("ws://{rest}")
    } else {
        base.to_string()
    };

    match room_id {
        Some(id) => format!("{base}/ws/rooms/{id}?token={token}"),
        None => format!("{base}/ws?token={token}"),
    }
}

/// Build the login endpoint URL for a server base URL.
pub fn session_url(server: &str) -> String {
    format!("{}/api/session", server.trim_end_matches('/'))
}
