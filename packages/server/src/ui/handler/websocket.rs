//! WebSocket connection hub.
//!
//! One task per socket: authenticate, register with the pusher, then read
//! frames in order and forward them as commands to the bound room.

use std::{sync::Arc, time::Duration};

use axum::{
    body::Bytes,
    extract::{
        Path, Query, State,
        ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade},
    },
    http::HeaderMap,
    response::IntoResponse,
};
use futures_util::{
    sink::SinkExt,
    stream::{SplitSink, SplitStream, StreamExt},
};
use serde::Deserialize;
use tokio::{sync::mpsc, time::Instant};
use uuid::Uuid;

use super::token::extract_token;
use crate::{
    domain::{
        AuthenticatedUser, ChatText, ConnectionId, GameError, ItemRejection, MessagePushError,
        OutboundFrame, PusherChannel, RoomId, RoomSettings,
    },
    infrastructure::dto::websocket::{
        ClientMessage, InboundError, ServerEnvelope, ServerMessage, parse_client_message,
    },
    ui::{
        rate_limit::SlidingWindowLimiter,
        state::{AppState, HubConfig},
    },
    usecase::{RoomHandle, RoomManagerError, room::actor::CLOSE_GOING_AWAY},
};

pub const CLOSE_UNAUTHENTICATED: u16 = 4001;
pub const CLOSE_ROOM_NOT_FOUND: u16 = 4002;
pub const CLOSE_FORBIDDEN: u16 = 4003;
pub const CLOSE_DUPLICATE_SESSION: u16 = 4004;
pub const CLOSE_SERVER_ERROR: u16 = 1011;

const FLUSH_TIMEOUT: Duration = Duration::from_secs(1);

/// Query parameters for WebSocket connection
#[derive(Debug, Default, Deserialize)]
pub struct ConnectQuery {
    #[serde(default)]
    pub token: Option<String>,
}

/// Lobby socket (`/ws`)
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Query(query): Query<ConnectQuery>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let token = extract_token(&headers, query.token.as_deref());
    ws.on_upgrade(move |socket| handle_socket(socket, state, token, None))
}

/// Socket bound to a room from the URL (`/ws/rooms/{room_id}`)
pub async fn room_websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<u64>,
    Query(query): Query<ConnectQuery>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let token = extract_token(&headers, query.token.as_deref());
    ws.on_upgrade(move |socket| handle_socket(socket, state, token, Some(RoomId::new(room_id))))
}

async fn close_socket(sender: &mut SplitSink<WebSocket, Message>, code: u16, reason: &str) {
    let frame = CloseFrame {
        code,
        reason: reason.into(),
    };
    if let Err(e) = sender.send(Message::Close(Some(frame))).await {
        tracing::debug!("Failed to send close frame: {}", e);
    }
}

/// Spawns a task that drains the outbound channel into the WebSocket sink.
///
/// Ends after a close frame or when every sender is gone.
fn pusher_loop(
    mut rx: mpsc::UnboundedReceiver<OutboundFrame>,
    mut sender: SplitSink<WebSocket, Message>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            let (message, last) = match frame {
                OutboundFrame::Text(text) => (Message::Text(text.into()), false),
                OutboundFrame::Ping => (Message::Ping(Bytes::new()), false),
                OutboundFrame::Close { code, reason } => (
                    Message::Close(Some(CloseFrame {
                        code,
                        reason: reason.into(),
                    })),
                    true,
                ),
            };
            if sender.send(message).await.is_err() || last {
                break;
            }
        }
    })
}

async fn handle_socket(
    socket: WebSocket,
    state: Arc<AppState>,
    token: Option<String>,
    room_id: Option<RoomId>,
) {
    let (mut sender, receiver) = socket.split();

    let user = match state.authenticate_usecase.execute(token.as_deref()).await {
        Ok(user) => user,
        Err(e) => {
            tracing::info!("Rejecting unauthenticated socket: {}", e);
            close_socket(&mut sender, CLOSE_UNAUTHENTICATED, "unauthenticated").await;
            return;
        }
    };

    let bound_room = match room_id {
        None => None,
        Some(room_id) => match state.room_manager.find(room_id) {
            Ok(handle) => Some(handle),
            Err(_) => {
                tracing::info!(
                    room_id = %room_id,
                    user_id = %user.user_id,
                    "Socket for unknown room"
                );
                close_socket(&mut sender, CLOSE_ROOM_NOT_FOUND, "room not found").await;
                return;
            }
        },
    };

    let (tx, rx) = mpsc::unbounded_channel();
    let connection_id = Uuid::new_v4();
    match state
        .message_pusher
        .register_client(user.user_id, connection_id, tx.clone())
        .await
    {
        Ok(()) => {}
        Err(MessagePushError::AlreadyConnected(_)) => {
            tracing::warn!(user_id = %user.user_id, "Duplicate session, rejecting socket");
            close_socket(&mut sender, CLOSE_DUPLICATE_SESSION, "duplicate session").await;
            return;
        }
        Err(e) => {
            tracing::error!(user_id = %user.user_id, "Failed to register socket: {}", e);
            close_socket(&mut sender, CLOSE_SERVER_ERROR, "server error").await;
            return;
        }
    }
    tracing::info!(
        user_id = %user.user_id,
        nickname = user.nickname.as_str(),
        %connection_id,
        "Socket connected"
    );

    let mut send_task = pusher_loop(rx, sender);
    let mut connection = Connection::new(Arc::clone(&state), user, connection_id, tx);
    connection.send(
        &ServerMessage::Connected {
            user_id: connection.user.user_id.value(),
            nickname: connection.user.nickname.as_str().to_string(),
            room_id: room_id.map(|id| id.value()),
        },
        None,
    );

    let reason = match bound_room {
        Some(handle) => {
            let joined = handle
                .join(connection.user.user_id, connection.user.nickname.clone())
                .await;
            match joined {
                Ok(()) => {
                    connection.room = Some(handle);
                    None
                }
                Err(e) => {
                    connection.send_game_error(&e, None);
                    connection.close(CLOSE_FORBIDDEN, "cannot join room");
                    Some("join refused")
                }
            }
        }
        None => None,
    };

    let mut send_done = false;
    let reason = match reason {
        Some(reason) => reason,
        None => {
            tokio::select! {
                reason = connection.receive_loop(receiver) => reason,
                _ = &mut send_task => {
                    send_done = true;
                    "send failed or closed by server"
                }
            }
        }
    };

    connection.finish(reason).await;

    // Every sender is gone now, so the loop ends once queued frames are flushed
    if !send_done && tokio::time::timeout(FLUSH_TIMEOUT, &mut send_task).await.is_err() {
        send_task.abort();
    }
}

/// Per-socket session state
struct Connection {
    state: Arc<AppState>,
    user: AuthenticatedUser,
    connection_id: ConnectionId,
    outbound: PusherChannel,
    room: Option<RoomHandle>,
    limiter: SlidingWindowLimiter,
    config: HubConfig,
}

impl Connection {
    fn new(
        state: Arc<AppState>,
        user: AuthenticatedUser,
        connection_id: ConnectionId,
        outbound: PusherChannel,
    ) -> Self {
        let config = state.hub;
        Self {
            state,
            user,
            connection_id,
            outbound,
            room: None,
            limiter: SlidingWindowLimiter::new(config.rate_limit),
            config,
        }
    }

    fn send(&self, message: &ServerMessage, request_id: Option<&str>) {
        let envelope =
            ServerEnvelope::new(message, self.state.clock.now_millis()).with_request_id(request_id);
        match envelope.to_json() {
            Ok(text) => {
                let _ = self.outbound.send(OutboundFrame::Text(text));
            }
            Err(e) => tracing::error!("Failed to serialize outbound message: {}", e),
        }
    }

    fn send_error(&self, code: &str, message: impl Into<String>, request_id: Option<&str>) {
        self.send(&ServerMessage::error(code, message), request_id);
    }

    fn send_game_error(&self, err: &GameError, request_id: Option<&str>) {
        let message = match err {
            GameError::ItemRejected(rejection) => ServerMessage::ItemRejected {
                reason: rejection.code().to_string(),
                remaining_ms: match rejection {
                    ItemRejection::CooldownActive { remaining_ms } => Some(*remaining_ms),
                    _ => None,
                },
            },
            other => ServerMessage::error(other.code(), other.to_string()),
        };
        self.send(&message, request_id);
    }

    fn close(&self, code: u16, reason: &str) {
        let _ = self.outbound.send(OutboundFrame::Close {
            code,
            reason: reason.to_string(),
        });
    }

    /// Reads frames until the socket ends; returns why it ended
    async fn receive_loop(&mut self, mut receiver: SplitStream<WebSocket>) -> &'static str {
        let mut ping_pending = false;
        loop {
            let next = tokio::time::timeout(self.config.idle_timeout, receiver.next()).await;
            let message = match next {
                Err(_) if ping_pending => {
                    self.close(CLOSE_GOING_AWAY, "idle timeout");
                    return "idle timeout";
                }
                Err(_) => {
                    ping_pending = true;
                    let _ = self.outbound.send(OutboundFrame::Ping);
                    continue;
                }
                Ok(None) => return "stream ended",
                Ok(Some(Err(e))) => {
                    tracing::warn!(user_id = %self.user.user_id, "WebSocket error: {}", e);
                    return "socket error";
                }
                Ok(Some(Ok(message))) => message,
            };
            ping_pending = false;

            match message {
                Message::Text(text) => self.handle_text(text.as_str()).await,
                Message::Binary(_) => {
                    self.send_error("unsupported_frame", "binary frames are not supported", None)
                }
                Message::Close(_) => return "closed by client",
                Message::Ping(_) | Message::Pong(_) => {}
            }
        }
    }

    async fn handle_text(&mut self, text: &str) {
        if let Err(retry_after) = self.limiter.check(Instant::now()) {
            tracing::debug!(user_id = %self.user.user_id, "Rate limited");
            self.send(
                &ServerMessage::RateLimited {
                    retry_after_s: retry_after.as_secs_f64().ceil() as u64,
                },
                None,
            );
            return;
        }

        let frame = match parse_client_message(text) {
            Ok(frame) => frame,
            Err(e) => {
                let request_id = match &e {
                    InboundError::InvalidData { request_id, .. } => request_id.clone(),
                    _ => None,
                };
                tracing::debug!(user_id = %self.user.user_id, "Dropping inbound frame: {}", e);
                self.send_error(e.code(), e.to_string(), request_id.as_deref());
                return;
            }
        };
        let request_id = frame.request_id.as_deref();
        self.dispatch(frame.message, request_id).await;
    }

    /// The bound room, forgetting it if its actor is gone
    fn current_room(&mut self) -> Option<RoomHandle> {
        if self.room.as_ref().is_some_and(RoomHandle::is_closed) {
            self.room = None;
        }
        self.room.clone()
    }

    async fn dispatch(&mut self, message: ClientMessage, request_id: Option<&str>) {
        let user_id = self.user.user_id;

        let (handle, message) = match message {
            ClientMessage::Ping(data) => {
                self.send(&ServerMessage::Pong { t: data.t }, request_id);
                return;
            }
            ClientMessage::CreateRoom(data) => {
                if self.current_room().is_some() {
                    self.send_game_error(&GameError::AlreadyInRoom, request_id);
                    return;
                }
                let settings = RoomSettings::from(&data);
                match self
                    .state
                    .room_manager
                    .create(&self.user, data.title, settings)
                    .await
                {
                    Ok(handle) => self.room = Some(handle),
                    Err(e) => self.send_manager_error(&e, request_id),
                }
                return;
            }
            ClientMessage::JoinRoom(data) => {
                if self.current_room().is_some() {
                    self.send_game_error(&GameError::AlreadyInRoom, request_id);
                    return;
                }
                let handle = match self.state.room_manager.find(RoomId::new(data.room_id)) {
                    Ok(handle) => handle,
                    Err(e) => {
                        self.send_manager_error(&e, request_id);
                        return;
                    }
                };
                match handle.join(user_id, self.user.nickname.clone()).await {
                    Ok(()) => self.room = Some(handle),
                    Err(e) => self.send_game_error(&e, request_id),
                }
                return;
            }
            other => match self.current_room() {
                Some(room) => (room, other),
                None => {
                    self.send_game_error(&GameError::NotInRoom, request_id);
                    return;
                }
            },
        };

        let result = match message {
            ClientMessage::LeaveRoom => {
                self.room = None;
                handle.leave(user_id).await
            }
            ClientMessage::ToggleReady => handle.toggle_ready(user_id).await,
            ClientMessage::StartGame => handle.start(user_id).await,
            ClientMessage::SubmitWord(data) => handle.submit_word(user_id, data.word).await,
            ClientMessage::UseItem(data) => {
                handle
                    .use_item(user_id, data.item_id(), data.target())
                    .await
            }
            ClientMessage::Chat(data) => match ChatText::new(data.text) {
                Ok(text) => handle.chat(user_id, text).await,
                Err(e) => {
                    self.send_error("invalid_chat", e.to_string(), request_id);
                    return;
                }
            },
            ClientMessage::EndGame => handle.end(user_id).await,
            ClientMessage::Ping(_) | ClientMessage::CreateRoom(_) | ClientMessage::JoinRoom(_) => {
                return;
            }
        };

        if let Err(e) = result {
            if e == GameError::RoomClosed {
                self.room = None;
            }
            tracing::debug!(
                user_id = %user_id,
                room_id = %handle.room_id(),
                code = e.code(),
                "Command refused"
            );
            self.send_game_error(&e, request_id);
        }
    }

    fn send_manager_error(&self, err: &RoomManagerError, request_id: Option<&str>) {
        match err {
            RoomManagerError::Game(e) => self.send_game_error(e, request_id),
            other => self.send_error(other.code(), other.to_string(), request_id),
        }
    }

    /// Leave the room and release the pusher registration. Drops the last
    /// outbound sender.
    async fn finish(self, reason: &str) {
        if let Some(room) = self.room {
            room.leave_detached(self.user.user_id);
        }
        self.state
            .message_pusher
            .unregister_client(self.user.user_id, self.connection_id)
            .await;
        tracing::info!(
            user_id = %self.user.user_id,
            connection_id = %self.connection_id,
            reason,
            "Socket disconnected"
        );
    }
}
