//! Error types for the terminal client.

use thiserror::Error;

/// Client-specific errors
#[derive(Debug, Error)]
pub enum ClientError {
    /// Server refused the nickname
    #[error("Nickname '{0}' was rejected: {1}")]
    InvalidNickname(String, String),

    /// Login request failed
    #[error("Login failed: {0}")]
    Login(String),

    /// Session token was not accepted by the WebSocket endpoint
    #[error("Session is not authenticated")]
    Unauthenticated,

    /// The requested room does not exist
    #[error("Room {0} was not found")]
    RoomNotFound(u64),

    /// Joining the requested room was refused
    #[error("Joining room {0} was refused")]
    JoinRefused(u64),

    /// Another connection already uses this session
    #[error("User '{0}' is already connected")]
    DuplicateSession(String),

    /// Server is shutting down
    #[error("Server is shutting down")]
    ServerShutdown,

    /// Connection error
    #[error("Connection error: {0}")]
    ConnectionError(String),
}
