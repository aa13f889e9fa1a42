//! UseCase: ルームアクター
//!
//! タイマーの期限切れを含め、ルームへの変更はすべて 1 本のキューに
//! `RoomCommand` として積まれ、このタスクだけが適用します。

use std::{ops::ControlFlow, sync::Arc, time::Duration};

use dashmap::DashMap;
use rand::{SeedableRng, rngs::StdRng};
use tokio::{
    sync::{mpsc, oneshot, watch},
    task::JoinHandle,
    time::MissedTickBehavior,
};

use super::{
    handle::RoomHandle,
    timer::{RoomClock, TurnTimer},
};
use crate::domain::{
    ChatText, GameError, GameRoom, ItemId, MessagePusher, Nickname, Notice, Outcome, RoomEvent,
    RoomId, RoomStatus, RoomSummary, TimerDirective, UserId,
    game::{Audience, RoomSnapshot},
};

/// Countdown notices while a turn is running
pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// The timer fires one tick after the deadline; a submission at the
/// deadline itself is still on time.
const EXPIRY_SLACK: Duration = Duration::from_millis(1);

/// WebSocket close code sent when the server goes away
pub const CLOSE_GOING_AWAY: u16 = 1001;
/// WebSocket close code sent when a room is torn down after an internal error
pub const CLOSE_SERVER_ERROR: u16 = 1011;

pub type Reply = oneshot::Sender<Result<(), GameError>>;

#[derive(Debug)]
pub enum RoomCommand {
    Join {
        user_id: UserId,
        nickname: Nickname,
        reply: Reply,
    },
    Leave {
        user_id: UserId,
        reply: Option<Reply>,
    },
    ToggleReady {
        user_id: UserId,
        reply: Reply,
    },
    Start {
        user_id: UserId,
        reply: Reply,
    },
    SubmitWord {
        user_id: UserId,
        word: String,
        reply: Reply,
    },
    UseItem {
        user_id: UserId,
        item_id: ItemId,
        target: Option<UserId>,
        reply: Reply,
    },
    Chat {
        user_id: UserId,
        text: ChatText,
        reply: Reply,
    },
    End {
        user_id: UserId,
        reply: Reply,
    },
    Snapshot {
        reply: oneshot::Sender<RoomSnapshot>,
    },
    TimerExpired {
        arm_id: u64,
    },
    GraceElapsed {
        arm_id: u64,
    },
    Destroy {
        reason: String,
    },
    Shutdown,
}

pub struct RoomActor {
    room: GameRoom,
    commands: mpsc::UnboundedReceiver<RoomCommand>,
    sender: mpsc::UnboundedSender<RoomCommand>,
    timer: TurnTimer,
    grace: Option<(u64, JoinHandle<()>)>,
    next_grace_id: u64,
    grace_period: Duration,
    clock: RoomClock,
    pusher: Arc<dyn MessagePusher>,
    summary: watch::Sender<RoomSummary>,
    directory: Arc<DashMap<RoomId, RoomHandle>>,
    rng: StdRng,
    had_members: bool,
}

impl RoomActor {
    /// Spawn the actor for `room` and register it in `directory`.
    pub fn spawn(
        room: GameRoom,
        clock: RoomClock,
        grace_period: Duration,
        pusher: Arc<dyn MessagePusher>,
        directory: Arc<DashMap<RoomId, RoomHandle>>,
    ) -> (RoomHandle, JoinHandle<()>) {
        let room_id = room.id();
        let (sender, commands) = mpsc::unbounded_channel();
        let (summary, summary_rx) = watch::channel(room.summary());
        let handle = RoomHandle::new(room_id, sender.clone(), summary_rx);
        directory.insert(room_id, handle.clone());

        let actor = Self {
            room,
            commands,
            timer: TurnTimer::new(sender.clone()),
            sender,
            grace: None,
            next_grace_id: 0,
            grace_period,
            clock,
            pusher,
            summary,
            directory,
            rng: StdRng::from_entropy(),
            had_members: false,
        };
        let task = tokio::spawn(actor.run());
        (handle, task)
    }

    async fn run(mut self) {
        let room_id = self.room.id();
        tracing::info!(room_id = %room_id, "Room opened");

        let mut ticker = tokio::time::interval(TICK_INTERVAL);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            let playing = self.room.status() == RoomStatus::Playing;
            tokio::select! {
                command = self.commands.recv() => {
                    let Some(command) = command else { break };
                    if self.handle(command).await.is_break() {
                        break;
                    }
                }
                _ = ticker.tick(), if playing => {
                    if let Some(notice) = self.room.tick(self.clock.now()) {
                        self.deliver(notice).await;
                    }
                }
            }
        }

        self.close().await;
        tracing::info!(room_id = %room_id, "Room closed");
    }

    async fn handle(&mut self, command: RoomCommand) -> ControlFlow<()> {
        let now = self.clock.now();
        match command {
            RoomCommand::Join {
                user_id,
                nickname,
                reply,
            } => {
                let result = self.room.join(user_id, nickname, now);
                self.settle(result, Some(reply)).await;
            }
            RoomCommand::Leave { user_id, reply } => {
                let result = self.room.leave(user_id, now);
                self.settle(result, reply).await;
            }
            RoomCommand::ToggleReady { user_id, reply } => {
                let result = self.room.toggle_ready(user_id);
                self.settle(result, Some(reply)).await;
            }
            RoomCommand::Start { user_id, reply } => {
                let result = self.room.start(user_id, now, &mut self.rng);
                self.settle(result, Some(reply)).await;
            }
            RoomCommand::SubmitWord {
                user_id,
                word,
                reply,
            } => {
                let result = self.room.submit_word(user_id, &word, now);
                if matches!(result, Err(GameError::TurnExpired)) {
                    // The expiry is already due; resolve it before answering
                    let expired = self.room.expire_turn(now);
                    self.settle(expired, None).await;
                }
                self.settle(result, Some(reply)).await;
            }
            RoomCommand::UseItem {
                user_id,
                item_id,
                target,
                reply,
            } => {
                let result = self.room.use_item(user_id, &item_id, target, now);
                self.settle(result, Some(reply)).await;
            }
            RoomCommand::Chat {
                user_id,
                text,
                reply,
            } => {
                let result = self.room.chat(user_id, text);
                self.settle(result, Some(reply)).await;
            }
            RoomCommand::End { user_id, reply } => {
                let result = self.room.end_game(user_id);
                self.settle(result, Some(reply)).await;
            }
            RoomCommand::Snapshot { reply } => {
                let _ = reply.send(self.room.snapshot());
                return ControlFlow::Continue(());
            }
            RoomCommand::TimerExpired { arm_id } => {
                if !self.timer.is_current(arm_id) {
                    tracing::debug!(room_id = %self.room.id(), arm_id, "Ignoring stale timer expiry");
                    return ControlFlow::Continue(());
                }
                self.timer.acknowledge(arm_id);
                let result = self.room.expire_turn(now);
                self.settle(result, None).await;
            }
            RoomCommand::GraceElapsed { arm_id } => {
                if self.grace.as_ref().is_none_or(|(id, _)| *id != arm_id) {
                    return ControlFlow::Continue(());
                }
                self.grace = None;
                let outcome = self.room.reset_after_game();
                self.settle(Ok(outcome), None).await;
            }
            RoomCommand::Destroy { reason } => {
                self.deliver(Notice::room(RoomEvent::RoomDestroyed {
                    reason: reason.clone(),
                }))
                .await;
                self.disconnect_members(CLOSE_GOING_AWAY, &reason).await;
                return ControlFlow::Break(());
            }
            RoomCommand::Shutdown => {
                self.deliver(Notice::room(RoomEvent::ServerShutdown)).await;
                self.disconnect_members(CLOSE_GOING_AWAY, "server shutdown")
                    .await;
                return ControlFlow::Break(());
            }
        }
        self.after_command().await
    }

    /// Fan out a command's outcome, then answer the caller.
    async fn settle(&mut self, result: Result<Outcome, GameError>, reply: Option<Reply>) {
        let answer = match result {
            Ok(outcome) => {
                self.apply(outcome).await;
                Ok(())
            }
            Err(e) => Err(e),
        };
        if let Some(reply) = reply {
            let _ = reply.send(answer);
        }
    }

    async fn apply(&mut self, outcome: Outcome) {
        match outcome.timer {
            TimerDirective::Keep => {}
            TimerDirective::Arm { deadline } => {
                self.timer
                    .arm(self.clock.instant_at(deadline) + EXPIRY_SLACK);
            }
            TimerDirective::Extend { by_ms } => {
                let by = Duration::from_millis(u64::try_from(by_ms).unwrap_or(0));
                if !self.timer.extend(by) {
                    tracing::debug!(room_id = %self.room.id(), "Extension arrived after expiry");
                }
            }
            TimerDirective::Cancel => self.timer.cancel(),
        }
        for notice in outcome.notices {
            self.deliver(notice).await;
        }
    }

    async fn deliver(&self, notice: Notice) {
        let targets: Vec<UserId> = match notice.audience {
            Audience::Room => self.room.member_ids(),
            Audience::User(user_id) => vec![user_id],
            Audience::AllExcept(user_id) => self
                .room
                .member_ids()
                .into_iter()
                .filter(|id| *id != user_id)
                .collect(),
        };
        if targets.is_empty() {
            return;
        }
        if let Err(e) = self.pusher.broadcast(&targets, &notice.event).await {
            tracing::warn!(room_id = %self.room.id(), "Failed to deliver room event: {}", e);
        }
    }

    async fn after_command(&mut self) -> ControlFlow<()> {
        if let Err(violation) = self.room.check_invariants() {
            tracing::error!(
                room_id = %self.room.id(),
                "Room invariant violated, destroying room: {}",
                violation
            );
            self.deliver(Notice::room(RoomEvent::RoomDestroyed {
                reason: "internal error".to_string(),
            }))
            .await;
            self.disconnect_members(CLOSE_SERVER_ERROR, "internal error")
                .await;
            return ControlFlow::Break(());
        }

        if self.room.is_empty() {
            if self.had_members {
                return ControlFlow::Break(());
            }
        } else {
            self.had_members = true;
        }

        match self.room.status() {
            RoomStatus::Finished if self.grace.is_none() => self.schedule_grace(),
            RoomStatus::Finished => {}
            _ => {
                if let Some((_, task)) = self.grace.take() {
                    task.abort();
                }
            }
        }

        self.summary.send_replace(self.room.summary());
        ControlFlow::Continue(())
    }

    fn schedule_grace(&mut self) {
        self.next_grace_id += 1;
        let arm_id = self.next_grace_id;
        let sender = self.sender.clone();
        let period = self.grace_period;
        let task = tokio::spawn(async move {
            tokio::time::sleep(period).await;
            let _ = sender.send(RoomCommand::GraceElapsed { arm_id });
        });
        self.grace = Some((arm_id, task));
    }

    async fn disconnect_members(&self, code: u16, reason: &str) {
        for user_id in self.room.member_ids() {
            self.pusher.disconnect(user_id, code, reason).await;
        }
    }

    async fn close(&mut self) {
        self.timer.cancel();
        if let Some((_, task)) = self.grace.take() {
            task.abort();
        }
        self.directory.remove(&self.room.id());

        // Pending callers observe the dropped reply as a closed room
        self.commands.close();
        while self.commands.try_recv().is_ok() {}
    }
}
