//! ルームアクターへの窓口（複製可能）

use tokio::sync::{mpsc, oneshot, watch};

use super::actor::{Reply, RoomCommand};
use crate::domain::{
    ChatText, GameError, ItemId, Nickname, RoomId, RoomSummary, UserId, game::RoomSnapshot,
};

/// Sends commands to one room and awaits their results.
///
/// A handle outliving its room gets `GameError::RoomClosed` for every call.
#[derive(Debug, Clone)]
pub struct RoomHandle {
    room_id: RoomId,
    sender: mpsc::UnboundedSender<RoomCommand>,
    summary: watch::Receiver<RoomSummary>,
}

impl RoomHandle {
    pub(crate) fn new(
        room_id: RoomId,
        sender: mpsc::UnboundedSender<RoomCommand>,
        summary: watch::Receiver<RoomSummary>,
    ) -> Self {
        Self {
            room_id,
            sender,
            summary,
        }
    }

    pub fn room_id(&self) -> RoomId {
        self.room_id
    }

    /// Latest summary published by the actor
    pub fn summary(&self) -> RoomSummary {
        self.summary.borrow().clone()
    }

    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    async fn request(&self, command: impl FnOnce(Reply) -> RoomCommand) -> Result<(), GameError> {
        let (reply, response) = oneshot::channel();
        self.sender
            .send(command(reply))
            .map_err(|_| GameError::RoomClosed)?;
        response.await.unwrap_or(Err(GameError::RoomClosed))
    }

    pub async fn join(&self, user_id: UserId, nickname: Nickname) -> Result<(), GameError> {
        self.request(|reply| RoomCommand::Join {
            user_id,
            nickname,
            reply,
        })
        .await
    }

    pub async fn leave(&self, user_id: UserId) -> Result<(), GameError> {
        self.request(|reply| RoomCommand::Leave {
            user_id,
            reply: Some(reply),
        })
        .await
    }

    /// Enqueue a leave without waiting for it
    pub fn leave_detached(&self, user_id: UserId) {
        let _ = self.sender.send(RoomCommand::Leave {
            user_id,
            reply: None,
        });
    }

    pub async fn toggle_ready(&self, user_id: UserId) -> Result<(), GameError> {
        self.request(|reply| RoomCommand::ToggleReady { user_id, reply })
            .await
    }

    pub async fn start(&self, user_id: UserId) -> Result<(), GameError> {
        self.request(|reply| RoomCommand::Start { user_id, reply })
            .await
    }

    pub async fn submit_word(&self, user_id: UserId, word: String) -> Result<(), GameError> {
        self.request(|reply| RoomCommand::SubmitWord {
            user_id,
            word,
            reply,
        })
        .await
    }

    pub async fn use_item(
        &self,
        user_id: UserId,
        item_id: ItemId,
        target: Option<UserId>,
    ) -> Result<(), GameError> {
        self.request(|reply| RoomCommand::UseItem {
            user_id,
            item_id,
            target,
            reply,
        })
        .await
    }

    pub async fn chat(&self, user_id: UserId, text: ChatText) -> Result<(), GameError> {
        self.request(|reply| RoomCommand::Chat {
            user_id,
            text,
            reply,
        })
        .await
    }

    pub async fn end(&self, user_id: UserId) -> Result<(), GameError> {
        self.request(|reply| RoomCommand::End { user_id, reply })
            .await
    }

    pub async fn snapshot(&self) -> Result<RoomSnapshot, GameError> {
        let (reply, response) = oneshot::channel();
        self.sender
            .send(RoomCommand::Snapshot { reply })
            .map_err(|_| GameError::RoomClosed)?;
        response.await.map_err(|_| GameError::RoomClosed)
    }

    pub fn destroy(&self, reason: impl Into<String>) {
        let _ = self.sender.send(RoomCommand::Destroy {
            reason: reason.into(),
        });
    }

    pub fn shutdown(&self) {
        let _ = self.sender.send(RoomCommand::Shutdown);
    }
}
