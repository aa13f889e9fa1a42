//! UseCase テスト用の共通フィクスチャ

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::domain::{
    ConnectionId, ItemCatalog, Lexicon, MessagePushError, MessagePusher, PusherChannel, RoomEvent,
    UserId, item::test_support::sample_catalog, lexicon::test_support::sample_lexicon,
};

/// MessagePusher that keeps every delivered event
#[derive(Debug, Default)]
pub struct RecordingPusher {
    events: Mutex<Vec<(UserId, RoomEvent)>>,
    disconnects: Mutex<Vec<(UserId, u16)>>,
}

impl RecordingPusher {
    pub fn events_for(&self, user_id: UserId) -> Vec<RoomEvent> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|(id, _)| *id == user_id)
            .map(|(_, e)| e.clone())
            .collect()
    }

    pub fn any_event(&self, user_id: UserId, pred: impl Fn(&RoomEvent) -> bool) -> bool {
        self.events_for(user_id).iter().any(pred)
    }

    pub fn disconnects(&self) -> Vec<(UserId, u16)> {
        self.disconnects.lock().unwrap().clone()
    }
}

#[async_trait]
impl MessagePusher for RecordingPusher {
    async fn register_client(
        &self,
        _user_id: UserId,
        _connection_id: ConnectionId,
        _sender: PusherChannel,
    ) -> Result<(), MessagePushError> {
        Ok(())
    }

    async fn unregister_client(&self, _user_id: UserId, _connection_id: ConnectionId) {}

    async fn push_to(&self, user_id: UserId, event: &RoomEvent) -> Result<(), MessagePushError> {
        self.events.lock().unwrap().push((user_id, event.clone()));
        Ok(())
    }

    async fn broadcast(&self, targets: &[UserId], event: &RoomEvent) -> Result<(), MessagePushError> {
        let mut events = self.events.lock().unwrap();
        for target in targets {
            events.push((*target, event.clone()));
        }
        Ok(())
    }

    async fn disconnect(&self, user_id: UserId, code: u16, _reason: &str) {
        self.disconnects.lock().unwrap().push((user_id, code));
    }

    async fn disconnect_all(&self, _code: u16, _reason: &str) -> usize {
        0
    }

    async fn connected_count(&self) -> usize {
        0
    }
}

pub fn lexicon() -> Arc<Lexicon> {
    Arc::new(sample_lexicon())
}

pub fn catalog() -> Arc<ItemCatalog> {
    Arc::new(sample_catalog())
}
