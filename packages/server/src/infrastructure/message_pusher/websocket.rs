//! WebSocket を使った MessagePusher 実装
//!
//! ## 責務
//!
//! - ユーザーごとの送信チャンネル（`PusherChannel`）を管理
//! - ドメインイベントを JSON エンベロープにシリアライズして送信（push_to, broadcast）
//! - 1 ユーザー 1 接続の制約（重複接続の拒否）
//!
//! ## 設計ノート
//!
//! WebSocket 接続の受付と送信タスクの生成は UI 層（`ui/handler/websocket.rs`）で行われます。
//! この実装は生成された sender を受け取り、メッセージ送信に使用します。
//! 送信に失敗した sender（切断済みの接続）は、その場で登録から取り除きます。

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use kkutu_shared::time::Clock;
use tokio::sync::Mutex;

use crate::domain::{
    ConnectionId, MessagePushError, MessagePusher, OutboundFrame, PusherChannel, RoomEvent,
    UserId,
};
use crate::infrastructure::dto::websocket::{ServerEnvelope, ServerMessage};

#[derive(Debug)]
struct ClientEntry {
    connection_id: ConnectionId,
    sender: PusherChannel,
}

/// WebSocket を使った MessagePusher 実装
pub struct WebSocketMessagePusher {
    /// Key: user_id, Value: 現在の接続
    clients: Mutex<HashMap<UserId, ClientEntry>>,
    clock: Arc<dyn Clock>,
}

impl WebSocketMessagePusher {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clients: Mutex::new(HashMap::new()),
            clock,
        }
    }

    fn encode(&self, event: &RoomEvent) -> Result<String, MessagePushError> {
        let message = ServerMessage::from(event);
        ServerEnvelope::new(&message, self.clock.now_millis())
            .to_json()
            .map_err(|e| MessagePushError::PushFailed(e.to_string()))
    }
}

#[async_trait]
impl MessagePusher for WebSocketMessagePusher {
    async fn register_client(
        &self,
        user_id: UserId,
        connection_id: ConnectionId,
        sender: PusherChannel,
    ) -> Result<(), MessagePushError> {
        let mut clients = self.clients.lock().await;
        if let Some(existing) = clients.get(&user_id)
            && !existing.sender.is_closed()
        {
            return Err(MessagePushError::AlreadyConnected(user_id.value()));
        }
        clients.insert(
            user_id,
            ClientEntry {
                connection_id,
                sender,
            },
        );
        tracing::debug!(user_id = %user_id, %connection_id, "Client registered to MessagePusher");
        Ok(())
    }

    async fn unregister_client(&self, user_id: UserId, connection_id: ConnectionId) {
        let mut clients = self.clients.lock().await;
        if clients
            .get(&user_id)
            .is_some_and(|entry| entry.connection_id == connection_id)
        {
            clients.remove(&user_id);
            tracing::debug!(user_id = %user_id, %connection_id, "Client unregistered from MessagePusher");
        }
    }

    async fn push_to(&self, user_id: UserId, event: &RoomEvent) -> Result<(), MessagePushError> {
        let text = self.encode(event)?;
        let mut clients = self.clients.lock().await;

        let Some(entry) = clients.get(&user_id) else {
            return Err(MessagePushError::ClientNotFound(user_id.to_string()));
        };
        if let Err(e) = entry.sender.send(OutboundFrame::Text(text)) {
            clients.remove(&user_id);
            return Err(MessagePushError::PushFailed(e.to_string()));
        }
        Ok(())
    }

    async fn broadcast(
        &self,
        targets: &[UserId],
        event: &RoomEvent,
    ) -> Result<(), MessagePushError> {
        let text = self.encode(event)?;
        let mut clients = self.clients.lock().await;

        let mut dead = Vec::new();
        for target in targets {
            match clients.get(target) {
                // ブロードキャストでは一部の送信失敗を許容
                Some(entry) => {
                    if entry.sender.send(OutboundFrame::Text(text.clone())).is_err() {
                        tracing::warn!(user_id = %target, "Dropping dead connection during broadcast");
                        dead.push(*target);
                    }
                }
                None => {
                    tracing::debug!(user_id = %target, "Client not connected, skipping");
                }
            }
        }
        for user_id in dead {
            clients.remove(&user_id);
        }

        Ok(())
    }

    async fn disconnect(&self, user_id: UserId, code: u16, reason: &str) {
        let mut clients = self.clients.lock().await;
        if let Some(entry) = clients.remove(&user_id) {
            let _ = entry.sender.send(OutboundFrame::Close {
                code,
                reason: reason.to_string(),
            });
            tracing::info!(user_id = %user_id, code, reason, "Disconnected client");
        }
    }

    async fn disconnect_all(&self, code: u16, reason: &str) -> usize {
        let mut clients = self.clients.lock().await;
        let count = clients.len();
        for (_, entry) in clients.drain() {
            let _ = entry.sender.send(OutboundFrame::Close {
                code,
                reason: reason.to_string(),
            });
        }
        tracing::info!(count, code, reason, "Disconnected all clients");
        count
    }

    async fn connected_count(&self) -> usize {
        self.clients.lock().await.len()
    }
}
