use std::{sync::Arc, time::Duration};

use dashmap::DashMap;

use super::*;
use crate::{
    domain::{
        GameError, GameRoom, ItemId, ModeTable, Nickname, RoomConfig, RoomEvent, RoomId,
        RoomSettings, RoomStatus, RoomTitle, UserId, game::GameOverReason,
    },
    usecase::test_support::{RecordingPusher, catalog, lexicon},
};

const ALICE: UserId = UserId::new(1);
const BOB: UserId = UserId::new(2);
const GRACE: Duration = Duration::from_secs(5);

struct Fixture {
    handle: RoomHandle,
    pusher: Arc<RecordingPusher>,
    directory: Arc<DashMap<RoomId, RoomHandle>>,
    task: tokio::task::JoinHandle<()>,
}

fn spawn_room() -> Fixture {
    let config = RoomConfig::resolve(
        RoomTitle::new("방".to_string()).unwrap(),
        &RoomSettings::default(),
        &ModeTable::default(),
    )
    .unwrap();
    let clock = RoomClock::new(1_000_000);
    let room = GameRoom::new(RoomId::new(7), config, clock.now(), lexicon(), catalog());
    let pusher = Arc::new(RecordingPusher::default());
    let directory = Arc::new(DashMap::new());
    let (handle, task) = RoomActor::spawn(room, clock, GRACE, pusher.clone(), directory.clone());
    Fixture {
        handle,
        pusher,
        directory,
        task,
    }
}

async fn started_room() -> Fixture {
    let fixture = spawn_room();
    let handle = &fixture.handle;
    handle
        .join(ALICE, Nickname::new("alice".to_string()).unwrap())
        .await
        .unwrap();
    handle
        .join(BOB, Nickname::new("bob".to_string()).unwrap())
        .await
        .unwrap();
    handle.toggle_ready(BOB).await.unwrap();
    handle.start(ALICE).await.unwrap();
    fixture
}

#[tokio::test(start_paused = true)]
async fn test_commands_are_fanned_out() {
    // テスト項目: 参加すると本人にスナップショット、他の参加者に参加通知が届く
    // given (前提条件):
    let fixture = spawn_room();
    fixture
        .handle
        .join(ALICE, Nickname::new("alice".to_string()).unwrap())
        .await
        .unwrap();

    // when (操作):
    fixture
        .handle
        .join(BOB, Nickname::new("bob".to_string()).unwrap())
        .await
        .unwrap();

    // then (期待する結果):
    assert!(
        fixture
            .pusher
            .any_event(BOB, |e| matches!(e, RoomEvent::RoomJoined { .. }))
    );
    assert!(fixture.pusher.any_event(ALICE, |e| matches!(
        e,
        RoomEvent::ParticipantJoined { participant } if participant.user_id == BOB
    )));
    assert_eq!(fixture.handle.summary().player_count, 2);
}

#[tokio::test(start_paused = true)]
async fn test_command_errors_are_returned_to_caller() {
    // テスト項目: エンジンが拒否したコマンドはエラーとして呼び出し元に返る
    // given (前提条件):
    let fixture = spawn_room();
    fixture
        .handle
        .join(ALICE, Nickname::new("alice".to_string()).unwrap())
        .await
        .unwrap();

    // when (操作):
    let result = fixture.handle.start(ALICE).await;

    // then (期待する結果):
    assert_eq!(result, Err(GameError::NotEnoughPlayers));
}

#[tokio::test(start_paused = true)]
async fn test_timer_expiry_is_serialized_with_commands() {
    // テスト項目: 締め切りを過ぎるとタイムアウトが通知され手番が移る
    // given (前提条件):
    let fixture = started_room().await;

    // when (操作):
    tokio::time::sleep(Duration::from_secs(31)).await;
    let snapshot = fixture.handle.snapshot().await.unwrap();

    // then (期待する結果):
    assert!(fixture.pusher.any_event(BOB, |e| matches!(
        e,
        RoomEvent::TurnTimeout { user_id } if *user_id == ALICE
    )));
    assert_eq!(snapshot.game.unwrap().current_user_id, BOB);
}

#[tokio::test(start_paused = true)]
async fn test_timeout_fires_once_just_after_deadline() {
    // テスト項目: 締め切りちょうどではタイムアウトせず、1ms 後に一度だけタイムアウトする
    // given (前提条件):
    let fixture = started_room().await;
    let timeouts = |pusher: &RecordingPusher| {
        pusher
            .events_for(BOB)
            .into_iter()
            .filter(|e| matches!(e, RoomEvent::TurnTimeout { .. }))
            .count()
    };

    // when (操作):
    tokio::time::sleep(Duration::from_secs(30)).await;
    let at_deadline = fixture.handle.snapshot().await.unwrap();
    let timeouts_at_deadline = timeouts(&fixture.pusher);
    tokio::time::sleep(Duration::from_millis(1)).await;
    let after = fixture.handle.snapshot().await.unwrap();

    // then (期待する結果):
    assert_eq!(at_deadline.game.unwrap().current_user_id, ALICE);
    assert_eq!(timeouts_at_deadline, 0);
    assert_eq!(after.game.unwrap().current_user_id, BOB);
    assert_eq!(timeouts(&fixture.pusher), 1);
}

#[tokio::test(start_paused = true)]
async fn test_extra_time_delays_timeout() {
    // テスト項目: EXTRA_TIME を使うと元の締め切りではタイムアウトしない
    // given (前提条件):
    let fixture = started_room().await;
    tokio::time::sleep(Duration::from_secs(25)).await;

    // when (操作):
    fixture
        .handle
        .use_item(ALICE, ItemId::new("extra_time"), None)
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_secs(10)).await;
    let during = fixture.handle.snapshot().await.unwrap();
    tokio::time::sleep(Duration::from_secs(11)).await;
    let after = fixture.handle.snapshot().await.unwrap();

    // then (期待する結果):
    assert_eq!(during.game.unwrap().current_user_id, ALICE);
    assert_eq!(after.game.unwrap().current_user_id, BOB);
}

#[tokio::test(start_paused = true)]
async fn test_ticks_report_remaining_time() {
    // テスト項目: ゲーム中は 1 秒ごとに残り時間が通知される
    // given (前提条件):
    let fixture = started_room().await;

    // when (操作):
    tokio::time::sleep(Duration::from_millis(3_500)).await;
    fixture.handle.snapshot().await.unwrap();

    // then (期待する結果):
    let ticks: Vec<i64> = fixture
        .pusher
        .events_for(BOB)
        .into_iter()
        .filter_map(|e| match e {
            RoomEvent::TimerTick { remaining_ms, .. } => Some(remaining_ms),
            _ => None,
        })
        .collect();
    assert!(ticks.len() >= 3);
    assert!(ticks.windows(2).all(|w| w[0] >= w[1]));
}

#[tokio::test(start_paused = true)]
async fn test_grace_returns_room_to_waiting() {
    // テスト項目: ゲーム終了後、猶予時間が過ぎると部屋は WAITING に戻る
    // given (前提条件):
    let fixture = started_room().await;
    fixture.handle.end(ALICE).await.unwrap();
    assert_eq!(fixture.handle.summary().status, RoomStatus::Finished);

    // when (操作):
    tokio::time::sleep(GRACE + Duration::from_millis(100)).await;
    let snapshot = fixture.handle.snapshot().await.unwrap();

    // then (期待する結果):
    assert_eq!(snapshot.status, RoomStatus::Waiting);
    assert!(fixture.pusher.any_event(BOB, |e| matches!(
        e,
        RoomEvent::GameOver {
            reason: GameOverReason::OwnerEnded,
            ..
        }
    )));
    assert!(
        fixture
            .pusher
            .any_event(BOB, |e| matches!(e, RoomEvent::RoomState { .. }))
    );
}

#[tokio::test(start_paused = true)]
async fn test_empty_room_is_removed() {
    // テスト項目: 最後の参加者が退出すると部屋はディレクトリから削除される
    // given (前提条件):
    let fixture = spawn_room();
    fixture
        .handle
        .join(ALICE, Nickname::new("alice".to_string()).unwrap())
        .await
        .unwrap();
    assert!(fixture.directory.contains_key(&RoomId::new(7)));

    // when (操作):
    fixture.handle.leave(ALICE).await.unwrap();
    fixture.task.await.unwrap();

    // then (期待する結果):
    assert!(fixture.directory.is_empty());
    assert_eq!(
        fixture.handle.toggle_ready(ALICE).await,
        Err(GameError::RoomClosed)
    );
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_notifies_and_disconnects() {
    // テスト項目: シャットダウン時に server_shutdown が通知され接続が閉じられる
    // given (前提条件):
    let fixture = started_room().await;

    // when (操作):
    fixture.handle.shutdown();
    fixture.task.await.unwrap();

    // then (期待する結果):
    assert!(
        fixture
            .pusher
            .any_event(ALICE, |e| matches!(e, RoomEvent::ServerShutdown))
    );
    let mut disconnected: Vec<UserId> = fixture
        .pusher
        .disconnects()
        .into_iter()
        .map(|(user, code)| {
            assert_eq!(code, actor::CLOSE_GOING_AWAY);
            user
        })
        .collect();
    disconnected.sort();
    assert_eq!(disconnected, vec![ALICE, BOB]);
    assert_eq!(fixture.handle.start(ALICE).await, Err(GameError::RoomClosed));
}
