//! MessagePusher trait 定義
//!
//! ルームからクライアントへの通知のインターフェース。
//! イベントのシリアライズ形式は実装側が決めます。
//! WebSocket などの具体的な実装は Infrastructure 層が提供します。

use async_trait::async_trait;
use tokio::sync::mpsc;
use uuid::Uuid;

use super::{error::MessagePushError, game::RoomEvent, value_object::UserId};

/// 1 接続を識別する ID（同じユーザーの古い接続と新しい接続を区別する）
pub type ConnectionId = Uuid;

/// 接続の送信タスクに渡すフレーム
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundFrame {
    Text(String),
    /// Heartbeat ping; the peer answers with a pong frame
    Ping,
    Close { code: u16, reason: String },
}

/// クライアントへの送信チャンネル
pub type PusherChannel = mpsc::UnboundedSender<OutboundFrame>;

#[async_trait]
pub trait MessagePusher: Send + Sync {
    /// クライアントを登録。同じユーザーの接続が既にあれば拒否する
    async fn register_client(
        &self,
        user_id: UserId,
        connection_id: ConnectionId,
        sender: PusherChannel,
    ) -> Result<(), MessagePushError>;

    /// クライアントの登録を解除。`connection_id` が一致するときだけ解除する
    async fn unregister_client(&self, user_id: UserId, connection_id: ConnectionId);

    /// 特定のクライアントにイベントを送信
    async fn push_to(&self, user_id: UserId, event: &RoomEvent) -> Result<(), MessagePushError>;

    /// 複数のクライアントにイベントを送信。一部の失敗は許容する
    async fn broadcast(&self, targets: &[UserId], event: &RoomEvent)
    -> Result<(), MessagePushError>;

    /// 接続をクローズコード付きで閉じる
    async fn disconnect(&self, user_id: UserId, code: u16, reason: &str);

    /// 全ての接続を閉じ、閉じた数を返す
    async fn disconnect_all(&self, code: u16, reason: &str) -> usize;

    /// 接続中のユーザー数
    async fn connected_count(&self) -> usize;
}
