//! ルーム集約: 参加者・オーナー・スナップショット

use std::sync::Arc;

use super::{
    event::{GameView, Notice, Outcome, ParticipantView, RankEntry, RoomEvent, RoomSnapshot},
    state::WordChainState,
};
use crate::domain::{
    entity::{Participant, ParticipantStatus, RoomConfig, RoomStatus, RoomSummary},
    error::{GameError, InvariantViolation},
    item::ItemCatalog,
    lexicon::Lexicon,
    value_object::{ChatText, Nickname, RoomId, Timestamp, UserId},
};

/// Authoritative state of one room.
///
/// Commands are synchronous and take the current time as input. The room
/// actor owns the only instance and applies commands one at a time.
#[derive(Debug)]
pub struct GameRoom {
    pub(super) id: RoomId,
    pub(super) config: RoomConfig,
    pub(super) status: RoomStatus,
    /// Join order; LEFT entries linger until the running game ends
    pub(super) participants: Vec<Participant>,
    pub(super) game: Option<WordChainState>,
    pub(super) created_at: Timestamp,
    pub(super) lexicon: Arc<Lexicon>,
    pub(super) catalog: Arc<ItemCatalog>,
    pub(super) last_ranks: Vec<RankEntry>,
}

impl GameRoom {
    pub fn new(
        id: RoomId,
        config: RoomConfig,
        created_at: Timestamp,
        lexicon: Arc<Lexicon>,
        catalog: Arc<ItemCatalog>,
    ) -> Self {
        Self {
            id,
            config,
            status: RoomStatus::Waiting,
            participants: Vec::new(),
            game: None,
            created_at,
            lexicon,
            catalog,
            last_ranks: Vec::new(),
        }
    }

    pub fn id(&self) -> RoomId {
        self.id
    }

    pub fn config(&self) -> &RoomConfig {
        &self.config
    }

    pub fn status(&self) -> RoomStatus {
        self.status
    }

    pub fn game(&self) -> Option<&WordChainState> {
        self.game.as_ref()
    }

    /// Ranks of the most recently finished game
    pub fn last_ranks(&self) -> &[RankEntry] {
        &self.last_ranks
    }

    pub fn participant(&self, user_id: UserId) -> Option<&Participant> {
        self.participants
            .iter()
            .find(|p| p.user_id == user_id && p.is_active())
    }

    pub(super) fn participant_mut(&mut self, user_id: UserId) -> Option<&mut Participant> {
        self.participants
            .iter_mut()
            .find(|p| p.user_id == user_id && p.is_active())
    }

    /// Participants that have not left
    pub fn members(&self) -> impl Iterator<Item = &Participant> {
        self.participants.iter().filter(|p| p.is_active())
    }

    pub fn member_ids(&self) -> Vec<UserId> {
        self.members().map(|p| p.user_id).collect()
    }

    pub fn owner(&self) -> Option<UserId> {
        self.members().find(|p| p.is_owner).map(|p| p.user_id)
    }

    pub fn is_empty(&self) -> bool {
        self.members().next().is_none()
    }

    pub fn join(
        &mut self,
        user_id: UserId,
        nickname: Nickname,
        now: Timestamp,
    ) -> Result<Outcome, GameError> {
        if self.participant(user_id).is_some() {
            return Err(GameError::AlreadyInRoom);
        }
        if self.status != RoomStatus::Waiting {
            return Err(GameError::GameInProgress);
        }
        if self.participants.len() >= self.config.max_players {
            return Err(GameError::RoomFull);
        }

        let mut participant =
            Participant::new(user_id, nickname, now, self.catalog.starting_inventory());
        participant.is_owner = self.is_empty();
        let view = participant_view(&participant);
        self.participants.push(participant);

        let mut outcome = Outcome::default();
        outcome.push(Notice::user(
            user_id,
            RoomEvent::RoomJoined {
                room: self.snapshot(),
            },
        ));
        outcome.push(Notice::all_except(
            user_id,
            RoomEvent::ParticipantJoined { participant: view },
        ));
        Ok(outcome)
    }

    /// Leave the room. Legal in every phase.
    pub fn leave(&mut self, user_id: UserId, now: Timestamp) -> Result<Outcome, GameError> {
        let position = self
            .participants
            .iter()
            .position(|p| p.user_id == user_id && p.is_active())
            .ok_or(GameError::NotInRoom)?;

        let mut outcome = Outcome::default();
        outcome.push(Notice::user(user_id, RoomEvent::RoomLeft { room_id: self.id }));

        let was_owner = self.participants[position].is_owner;
        let nickname = self.participants[position].nickname.as_str().to_string();
        if self.status == RoomStatus::Playing {
            let participant = &mut self.participants[position];
            participant.status = ParticipantStatus::Left;
            participant.is_owner = false;
        } else {
            self.participants.remove(position);
        }
        outcome.push(Notice::room(RoomEvent::ParticipantLeft { user_id, nickname }));

        if was_owner && let Some(new_owner) = self.transfer_ownership() {
            outcome.push(Notice::room(RoomEvent::OwnerChanged { user_id: new_owner }));
        }

        if self.status == RoomStatus::Playing {
            self.handle_departure(user_id, now, &mut outcome);
        }
        Ok(outcome)
    }

    pub fn toggle_ready(&mut self, user_id: UserId) -> Result<Outcome, GameError> {
        if self.participant(user_id).is_none() {
            return Err(GameError::NotInRoom);
        }
        if self.status != RoomStatus::Waiting {
            return Err(GameError::GameInProgress);
        }
        let participant = self.participant_mut(user_id).ok_or(GameError::NotInRoom)?;
        participant.status = match participant.status {
            ParticipantStatus::Ready => ParticipantStatus::Waiting,
            _ => ParticipantStatus::Ready,
        };
        let ready = participant.status == ParticipantStatus::Ready;

        let mut outcome = Outcome::default();
        outcome.push(Notice::room(RoomEvent::ReadyToggled { user_id, ready }));
        Ok(outcome)
    }

    pub fn chat(&self, user_id: UserId, text: ChatText) -> Result<Outcome, GameError> {
        let participant = self.participant(user_id).ok_or(GameError::NotInRoom)?;
        let mut outcome = Outcome::default();
        outcome.push(Notice::room(RoomEvent::Chat {
            user_id,
            nickname: participant.nickname.as_str().to_string(),
            text: text.into_string(),
        }));
        Ok(outcome)
    }

    /// Return a finished room to WAITING. Inventories survive.
    pub fn reset_after_game(&mut self) -> Outcome {
        let mut outcome = Outcome::default();
        if self.status != RoomStatus::Finished {
            return outcome;
        }
        self.status = RoomStatus::Waiting;
        self.game = None;
        for participant in &mut self.participants {
            participant.reset_for_new_game(ParticipantStatus::Waiting);
        }
        outcome.push(Notice::room(RoomEvent::RoomState {
            room: self.snapshot(),
        }));
        outcome
    }

    /// Hand ownership to the earliest-joined remaining member.
    fn transfer_ownership(&mut self) -> Option<UserId> {
        let next = self
            .participants
            .iter_mut()
            .filter(|p| p.is_active())
            .min_by_key(|p| p.joined_at)?;
        next.is_owner = true;
        Some(next.user_id)
    }

    pub fn snapshot(&self) -> RoomSnapshot {
        RoomSnapshot {
            room_id: self.id,
            title: self.config.title.as_str().to_string(),
            status: self.status,
            game_mode: self.config.game_mode,
            max_players: self.config.max_players,
            turn_time_limit_s: self.config.turn_time_limit_s,
            max_rounds: self.config.max_rounds,
            participants: self.participants.iter().map(participant_view).collect(),
            game: self.game.as_ref().and_then(|game| {
                Some(GameView {
                    last_word: game.last_word.clone(),
                    last_char: game.last_char,
                    round: game.round,
                    current_user_id: game.current_user()?,
                    turn_deadline: game.turn_deadline,
                    used_words: game.used_words.len(),
                })
            }),
        }
    }

    pub fn summary(&self) -> RoomSummary {
        RoomSummary {
            room_id: self.id,
            title: self.config.title.as_str().to_string(),
            game_mode: self.config.game_mode,
            status: self.status,
            player_count: self.members().count(),
            max_players: self.config.max_players,
            owner: self.owner(),
            created_at: self.created_at,
        }
    }

    pub fn check_invariants(&self) -> Result<(), InvariantViolation> {
        if !self.is_empty() {
            let owners = self.participants.iter().filter(|p| p.is_owner).count();
            let active_owner = self.owner().is_some();
            if owners != 1 || !active_owner {
                return Err(InvariantViolation::OwnerCount { owners });
            }
        }
        if self.participants.len() > self.config.max_players {
            return Err(InvariantViolation::OverCapacity {
                count: self.participants.len(),
                max: self.config.max_players,
            });
        }

        match (self.status, &self.game) {
            (RoomStatus::Playing, None) => Err(InvariantViolation::MissingGameState),
            (RoomStatus::Playing, Some(game)) => {
                if game.last_word.is_empty() || !game.used_words.contains(&game.last_word) {
                    return Err(InvariantViolation::LastWordNotUsed);
                }
                let holder = game.current_user().ok_or(InvariantViolation::TurnIndexOutOfRange {
                    index: game.current_turn_index,
                    len: game.turn_order.len(),
                })?;
                if self.participant(holder).is_none() {
                    return Err(InvariantViolation::InactiveTurnHolder(holder.value()));
                }
                if game.turn_deadline <= game.turn_started_at {
                    return Err(InvariantViolation::DeadlineBeforeStart);
                }
                Ok(())
            }
            (_, Some(_)) => Err(InvariantViolation::StrayGameState),
            (_, None) => Ok(()),
        }
    }
}

pub(super) fn participant_view(participant: &Participant) -> ParticipantView {
    ParticipantView {
        user_id: participant.user_id,
        nickname: participant.nickname.as_str().to_string(),
        status: participant.status,
        is_owner: participant.is_owner,
        score: participant.score,
        joined_at: participant.joined_at,
        inventory: participant
            .inventory
            .iter()
            .map(|(id, count)| (id.clone(), *count))
            .collect(),
    }
}
