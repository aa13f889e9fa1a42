//! UseCase: ルーム管理
//!
//! ルームの作成・検索・一覧・破棄と、サーバー終了時の一斉通知を担当します。
//! 各ルームは自分のアクターを持ち、ここではそのハンドルだけを保持します。

use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicU64, Ordering},
    },
    time::Duration,
};

use dashmap::DashMap;
use futures_util::future::join_all;
use kkutu_shared::time::Clock;
use tokio::{sync::Mutex, task::JoinHandle};

use super::{
    error::RoomManagerError,
    room::{RoomActor, RoomClock, RoomHandle},
};
use crate::domain::{
    AuthenticatedUser, GameRoom, ItemCatalog, Lexicon, MessagePusher, ModeTable, RoomConfig,
    RoomId, RoomSettings, RoomStatus, RoomSummary, RoomTitle, Timestamp,
};

/// ルーム数の上限と終了後の猶予時間
#[derive(Debug, Clone, Copy)]
pub struct RoomLimits {
    pub max_rooms: usize,
    pub max_rooms_per_owner: usize,
    pub grace_period: Duration,
}

impl Default for RoomLimits {
    fn default() -> Self {
        Self {
            max_rooms: 100,
            max_rooms_per_owner: 3,
            grace_period: Duration::from_secs(10),
        }
    }
}

/// ルーム管理のユースケース
pub struct RoomManager {
    rooms: Arc<DashMap<RoomId, RoomHandle>>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
    /// 作成時の上限チェックと登録を直列化する
    creation: Mutex<()>,
    next_id: AtomicU64,
    shutting_down: AtomicBool,
    lexicon: Arc<Lexicon>,
    catalog: Arc<ItemCatalog>,
    modes: ModeTable,
    limits: RoomLimits,
    pusher: Arc<dyn MessagePusher>,
    clock: Arc<dyn Clock>,
}

impl RoomManager {
    pub fn new(
        lexicon: Arc<Lexicon>,
        catalog: Arc<ItemCatalog>,
        modes: ModeTable,
        limits: RoomLimits,
        pusher: Arc<dyn MessagePusher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            rooms: Arc::new(DashMap::new()),
            tasks: Mutex::new(Vec::new()),
            creation: Mutex::new(()),
            next_id: AtomicU64::new(0),
            shutting_down: AtomicBool::new(false),
            lexicon,
            catalog,
            modes,
            limits,
            pusher,
            clock,
        }
    }

    /// ルームを作成し、作成者をオーナーとして参加させる
    pub async fn create(
        &self,
        owner: &AuthenticatedUser,
        title: String,
        settings: RoomSettings,
    ) -> Result<RoomHandle, RoomManagerError> {
        if self.shutting_down.load(Ordering::SeqCst) {
            return Err(RoomManagerError::ShuttingDown);
        }
        let title = RoomTitle::new(title)?;
        let config = RoomConfig::resolve(title, &settings, &self.modes)?;

        let handle = {
            let _guard = self.creation.lock().await;

            if self.rooms.len() >= self.limits.max_rooms {
                return Err(RoomManagerError::ServerFull {
                    limit: self.limits.max_rooms,
                });
            }
            let owned_waiting = self
                .rooms
                .iter()
                .map(|entry| entry.value().summary())
                .filter(|s| s.owner == Some(owner.user_id) && s.status == RoomStatus::Waiting)
                .count();
            if owned_waiting >= self.limits.max_rooms_per_owner {
                return Err(RoomManagerError::TooManyRooms {
                    limit: self.limits.max_rooms_per_owner,
                });
            }

            let room_id = RoomId::new(self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
            let now = self.clock.now_millis();
            let room = GameRoom::new(
                room_id,
                config,
                Timestamp::new(now),
                Arc::clone(&self.lexicon),
                Arc::clone(&self.catalog),
            );
            let (handle, task) = RoomActor::spawn(
                room,
                RoomClock::new(now),
                self.limits.grace_period,
                Arc::clone(&self.pusher),
                Arc::clone(&self.rooms),
            );
            {
                let mut tasks = self.tasks.lock().await;
                tasks.retain(|t| !t.is_finished());
                tasks.push(task);
            }
            handle.join(owner.user_id, owner.nickname.clone()).await?;
            handle
        };

        tracing::info!(
            room_id = %handle.room_id(),
            owner = %owner.user_id,
            "Room created"
        );
        Ok(handle)
    }

    pub fn find(&self, room_id: RoomId) -> Result<RoomHandle, RoomManagerError> {
        self.rooms
            .get(&room_id)
            .map(|entry| entry.value().clone())
            .filter(|handle| !handle.is_closed())
            .ok_or(RoomManagerError::RoomNotFound(room_id))
    }

    /// ルーム一覧（ID 順）。`status` を指定するとその状態のルームだけを返す
    pub fn list(&self, status: Option<RoomStatus>) -> Vec<RoomSummary> {
        let mut summaries: Vec<RoomSummary> = self
            .rooms
            .iter()
            .map(|entry| entry.value().summary())
            .filter(|s| status.is_none_or(|wanted| s.status == wanted))
            .collect();
        summaries.sort_by_key(|s| s.room_id);
        summaries
    }

    /// ルームを破棄し、参加者に room_destroyed を通知する
    pub fn destroy(&self, room_id: RoomId, reason: &str) -> Result<(), RoomManagerError> {
        let (_, handle) = self
            .rooms
            .remove(&room_id)
            .ok_or(RoomManagerError::RoomNotFound(room_id))?;
        handle.destroy(reason);
        tracing::info!(room_id = %room_id, reason, "Room destroyed");
        Ok(())
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    /// 全ルームに server_shutdown を通知し、アクターの終了を待つ
    /// 終了していないルームタスクの数（終了済みのものはここで回収する）
    pub async fn live_tasks(&self) -> usize {
        let mut tasks = self.tasks.lock().await;
        tasks.retain(|t| !t.is_finished());
        tasks.len()
    }

    pub async fn shutdown(&self, wait: Duration) {
        self.shutting_down.store(true, Ordering::SeqCst);
        let handles: Vec<RoomHandle> = self.rooms.iter().map(|e| e.value().clone()).collect();
        tracing::info!(rooms = handles.len(), "Notifying rooms of shutdown");
        for handle in &handles {
            handle.shutdown();
        }

        let tasks = std::mem::take(&mut *self.tasks.lock().await);
        if tokio::time::timeout(wait, join_all(tasks)).await.is_err() {
            tracing::warn!("Timed out waiting for rooms to close");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{GameError, GameMode, Nickname, RoomEvent, UserId},
        usecase::test_support::{RecordingPusher, catalog, lexicon},
    };
    use kkutu_shared::time::FixedClock;

    fn user(id: i64, name: &str) -> AuthenticatedUser {
        AuthenticatedUser {
            user_id: UserId::new(id),
            nickname: Nickname::new(name.to_string()).unwrap(),
        }
    }

    fn create_manager(limits: RoomLimits) -> (RoomManager, Arc<RecordingPusher>) {
        let pusher = Arc::new(RecordingPusher::default());
        let manager = RoomManager::new(
            lexicon(),
            catalog(),
            ModeTable::default(),
            limits,
            pusher.clone(),
            Arc::new(FixedClock::new(1_700_000_000_000)),
        );
        (manager, pusher)
    }

    #[tokio::test]
    async fn test_create_joins_owner() {
        // テスト項目: ルームを作成すると作成者がオーナーとして参加している
        // given (前提条件):
        let (manager, pusher) = create_manager(RoomLimits::default());
        let alice = user(1, "alice");

        // when (操作):
        let handle = manager
            .create(
                &alice,
                "첫 번째 방".to_string(),
                RoomSettings {
                    game_mode: Some(GameMode::Blitz),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        // then (期待する結果):
        let summary = handle.summary();
        assert_eq!(summary.room_id, RoomId::new(1));
        assert_eq!(summary.owner, Some(alice.user_id));
        assert_eq!(summary.game_mode, GameMode::Blitz);
        assert!(pusher.any_event(alice.user_id, |e| matches!(e, RoomEvent::RoomJoined { .. })));
        assert!(manager.find(summary.room_id).is_ok());
    }

    #[tokio::test]
    async fn test_finished_room_tasks_are_reaped() {
        // テスト項目: 空になって終了したルームのタスクは保持され続けない
        // given (前提条件):
        let (manager, _pusher) = create_manager(RoomLimits::default());
        let alice = user(1, "alice");
        let handle = manager
            .create(&alice, "short".to_string(), RoomSettings::default())
            .await
            .unwrap();

        // when (操作):
        handle.leave(alice.user_id).await.unwrap();
        tokio::time::timeout(Duration::from_secs(1), async {
            while manager.live_tasks().await > 0 {
                tokio::task::yield_now().await;
            }
        })
        .await
        .unwrap();
        manager
            .create(&alice, "next".to_string(), RoomSettings::default())
            .await
            .unwrap();

        // then (期待する結果):
        assert_eq!(manager.live_tasks().await, 1);
    }

    #[tokio::test]
    async fn test_room_ids_are_monotonic() {
        // テスト項目: ルーム ID は作成順に増加する
        // given (前提条件):
        let (manager, _pusher) = create_manager(RoomLimits::default());

        // when (操作):
        let first = manager
            .create(&user(1, "a"), "one".to_string(), RoomSettings::default())
            .await
            .unwrap();
        let second = manager
            .create(&user(2, "b"), "two".to_string(), RoomSettings::default())
            .await
            .unwrap();

        // then (期待する結果):
        assert!(second.room_id() > first.room_id());
        let listed: Vec<RoomId> = manager.list(None).iter().map(|s| s.room_id).collect();
        assert_eq!(listed, vec![first.room_id(), second.room_id()]);
    }

    #[tokio::test]
    async fn test_per_owner_cap() {
        // テスト項目: 1 ユーザーが所有できる待機中のルームは上限まで
        // given (前提条件):
        let (manager, _pusher) = create_manager(RoomLimits {
            max_rooms_per_owner: 2,
            ..Default::default()
        });
        let alice = user(1, "alice");
        for i in 0..2 {
            manager
                .create(&alice, format!("room {i}"), RoomSettings::default())
                .await
                .unwrap();
        }

        // when (操作):
        let result = manager
            .create(&alice, "room 3".to_string(), RoomSettings::default())
            .await;

        // then (期待する結果):
        assert_eq!(
            result.unwrap_err(),
            RoomManagerError::TooManyRooms { limit: 2 }
        );
        assert!(
            manager
                .create(&user(2, "bob"), "bob's".to_string(), RoomSettings::default())
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn test_server_room_limit() {
        // テスト項目: サーバー全体のルーム数上限を超えて作成できない
        // given (前提条件):
        let (manager, _pusher) = create_manager(RoomLimits {
            max_rooms: 1,
            ..Default::default()
        });
        manager
            .create(&user(1, "a"), "one".to_string(), RoomSettings::default())
            .await
            .unwrap();

        // when (操作):
        let result = manager
            .create(&user(2, "b"), "two".to_string(), RoomSettings::default())
            .await;

        // then (期待する結果):
        assert_eq!(result.unwrap_err(), RoomManagerError::ServerFull { limit: 1 });
    }

    #[tokio::test]
    async fn test_invalid_settings_are_rejected() {
        // テスト項目: 不正なタイトルや設定ではルームを作成できない
        // given (前提条件):
        let (manager, _pusher) = create_manager(RoomLimits::default());
        let alice = user(1, "alice");

        // when (操作):
        let empty_title = manager
            .create(&alice, "   ".to_string(), RoomSettings::default())
            .await;
        let too_many = manager
            .create(
                &alice,
                "big".to_string(),
                RoomSettings {
                    max_players: Some(20),
                    ..Default::default()
                },
            )
            .await;

        // then (期待する結果):
        assert!(matches!(empty_title, Err(RoomManagerError::InvalidTitle(_))));
        assert!(matches!(too_many, Err(RoomManagerError::InvalidConfig(_))));
        assert_eq!(manager.room_count(), 0);
    }

    #[tokio::test]
    async fn test_list_filters_by_status() {
        // テスト項目: 状態を指定すると該当するルームだけが返る
        // given (前提条件):
        let (manager, _pusher) = create_manager(RoomLimits::default());
        manager
            .create(&user(1, "a"), "one".to_string(), RoomSettings::default())
            .await
            .unwrap();

        // when (操作):
        let waiting = manager.list(Some(RoomStatus::Waiting));
        let playing = manager.list(Some(RoomStatus::Playing));

        // then (期待する結果):
        assert_eq!(waiting.len(), 1);
        assert!(playing.is_empty());
    }

    #[tokio::test]
    async fn test_destroy_notifies_members() {
        // テスト項目: ルームを破棄すると参加者に通知され、以後見つからない
        // given (前提条件):
        let (manager, pusher) = create_manager(RoomLimits::default());
        let alice = user(1, "alice");
        let handle = manager
            .create(&alice, "one".to_string(), RoomSettings::default())
            .await
            .unwrap();

        // when (操作):
        manager.destroy(handle.room_id(), "closed by operator").unwrap();
        let result = handle.toggle_ready(alice.user_id).await;

        // then (期待する結果):
        assert_eq!(result, Err(GameError::RoomClosed));
        assert!(pusher.any_event(alice.user_id, |e| matches!(e, RoomEvent::RoomDestroyed { .. })));
        assert!(matches!(
            manager.find(handle.room_id()),
            Err(RoomManagerError::RoomNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_shutdown_closes_every_room() {
        // テスト項目: シャットダウンで全ルームに通知され、以後は作成できない
        // given (前提条件):
        let (manager, pusher) = create_manager(RoomLimits::default());
        let alice = user(1, "alice");
        let bob = user(2, "bob");
        manager
            .create(&alice, "one".to_string(), RoomSettings::default())
            .await
            .unwrap();
        manager
            .create(&bob, "two".to_string(), RoomSettings::default())
            .await
            .unwrap();

        // when (操作):
        manager.shutdown(Duration::from_secs(1)).await;

        // then (期待する結果):
        assert_eq!(manager.room_count(), 0);
        assert!(pusher.any_event(alice.user_id, |e| matches!(e, RoomEvent::ServerShutdown)));
        assert!(pusher.any_event(bob.user_id, |e| matches!(e, RoomEvent::ServerShutdown)));
        assert_eq!(
            manager
                .create(&alice, "late".to_string(), RoomSettings::default())
                .await
                .unwrap_err(),
            RoomManagerError::ShuttingDown
        );
    }
}
