//! ゲーム進行: 開始・単語提出・タイムアウト・終了

use std::sync::Arc;

use rand::Rng;

use super::{
    event::{GameOverReason, Notice, Outcome, RankEntry, RoomEvent, TimerDirective},
    room::GameRoom,
    state::WordChainState,
};
use crate::domain::{
    entity::{ParticipantStatus, RoomStatus},
    error::GameError,
    lexicon::{ChainRule, Verdict, validate},
    score::{ScoreInput, calculate},
    value_object::{Timestamp, UserId},
};

impl GameRoom {
    /// Start a game with a random seed word.
    pub fn start<R: Rng + ?Sized>(
        &mut self,
        by: UserId,
        now: Timestamp,
        rng: &mut R,
    ) -> Result<Outcome, GameError> {
        self.ensure_can_start(by)?;
        let lexicon = Arc::clone(&self.lexicon);
        let seed = lexicon
            .dictionary
            .random_seed(rng)
            .ok_or(GameError::NoSeedWord)?;
        Ok(self.begin_game(seed.word.clone(), seed.last_char, now))
    }

    /// Start a game from a chosen dictionary word.
    pub fn start_with_seed(
        &mut self,
        by: UserId,
        seed_word: &str,
        now: Timestamp,
    ) -> Result<Outcome, GameError> {
        self.ensure_can_start(by)?;
        let lexicon = Arc::clone(&self.lexicon);
        let seed = lexicon
            .dictionary
            .lookup(seed_word)
            .ok_or(GameError::NoSeedWord)?;
        Ok(self.begin_game(seed.word.clone(), seed.last_char, now))
    }

    fn ensure_can_start(&self, by: UserId) -> Result<(), GameError> {
        let starter = self.participant(by).ok_or(GameError::NotInRoom)?;
        if self.status != RoomStatus::Waiting {
            return Err(GameError::GameInProgress);
        }
        if !starter.is_owner {
            return Err(GameError::NotOwner);
        }
        if self.members().count() < 2 {
            return Err(GameError::NotEnoughPlayers);
        }
        let all_ready = self
            .members()
            .filter(|p| !p.is_owner)
            .all(|p| p.status == ParticipantStatus::Ready);
        if !all_ready {
            return Err(GameError::PlayersNotReady);
        }
        Ok(())
    }

    fn begin_game(&mut self, seed_word: String, last_char: char, now: Timestamp) -> Outcome {
        let turn_order = self.member_ids();
        for participant in &mut self.participants {
            participant.reset_for_new_game(ParticipantStatus::Playing);
        }
        let game = WordChainState::new(
            seed_word.clone(),
            last_char,
            turn_order.clone(),
            now,
            self.config.turn_time_limit_ms(),
        );
        let turn_deadline = game.turn_deadline;
        let first_user_id = game.current_user();
        self.game = Some(game);
        self.status = RoomStatus::Playing;

        tracing::info!(
            room_id = %self.id,
            seed_word = %seed_word,
            players = turn_order.len(),
            "Game started"
        );

        let mut outcome = Outcome::default();
        if let Some(first_user_id) = first_user_id {
            outcome.push(Notice::room(RoomEvent::GameStarted {
                seed_word,
                turn_order,
                first_user_id,
                turn_deadline,
            }));
        }
        self.announce_turn(&mut outcome);
        outcome
    }

    /// Submit a word for the current turn.
    ///
    /// A rejected word leaves the turn and its deadline untouched.
    pub fn submit_word(
        &mut self,
        user_id: UserId,
        word: &str,
        now: Timestamp,
    ) -> Result<Outcome, GameError> {
        if self.status != RoomStatus::Playing {
            return Err(GameError::GameNotInProgress);
        }
        if self.participant(user_id).is_none() {
            return Err(GameError::NotInRoom);
        }
        let game = self.game.as_ref().ok_or(GameError::GameNotInProgress)?;
        if game.current_user() != Some(user_id) {
            return Err(GameError::NotYourTurn);
        }
        if now > game.turn_deadline {
            return Err(GameError::TurnExpired);
        }

        let word = word.trim();
        let rule = ChainRule {
            required_first_char: game.last_char,
            min_len: self.config.min_word_len,
            max_len: self.config.max_word_len,
        };
        let verdict = validate(word, &rule, &game.used_words, &self.lexicon);
        let response_time_ms = now.millis_since(game.turn_started_at);
        let turn_time_limit_s = self.config.turn_time_limit_s;
        let mode_multiplier = self.config.score_multiplier;

        let mut outcome = Outcome::default();
        let participant = self.participant_mut(user_id).ok_or(GameError::NotInRoom)?;
        match verdict {
            Verdict::Invalid(reason) => {
                participant.record_rejection();
                tracing::debug!(user_id = %user_id, word, reason = reason.code(), "Word rejected");
                outcome.push(Notice::room(RoomEvent::WordRejected {
                    user_id,
                    word: word.to_string(),
                    reason,
                }));
            }
            Verdict::Valid(entry) => {
                let breakdown = calculate(&ScoreInput {
                    entry: &entry,
                    response_time_ms,
                    turn_time_limit_s,
                    consecutive_success: participant.consecutive_success,
                    item_multiplier: participant.pending_multiplier(),
                    mode_multiplier,
                });
                participant.record_acceptance(breakdown.total);
                participant.consume_one_shot_effects();
                let total_score = participant.score;

                if let Some(game) = self.game.as_mut() {
                    game.record_word(&entry.word, entry.last_char);
                }
                outcome.push(Notice::room(RoomEvent::WordAccepted {
                    user_id,
                    word: entry.word,
                    definition: entry.definition,
                    breakdown,
                    total_score,
                }));
                self.advance_turn(now, &mut outcome);
            }
        }
        Ok(outcome)
    }

    /// The current turn ran out.
    ///
    /// Called when the armed deadline passes. A deadline that was extended
    /// after arming yields a re-arm instead of a timeout.
    pub fn expire_turn(&mut self, now: Timestamp) -> Result<Outcome, GameError> {
        if self.status != RoomStatus::Playing {
            return Err(GameError::GameNotInProgress);
        }
        let game = self.game.as_ref().ok_or(GameError::GameNotInProgress)?;
        let mut outcome = Outcome::default();
        if now <= game.turn_deadline {
            outcome.set_timer(TimerDirective::Arm {
                deadline: game.turn_deadline,
            });
            return Ok(outcome);
        }

        let holder = game.current_user();
        if let Some(user_id) = holder {
            if let Some(participant) = self.participant_mut(user_id) {
                participant.record_timeout();
            }
            tracing::debug!(room_id = %self.id, user_id = %user_id, "Turn timed out");
            outcome.push(Notice::room(RoomEvent::TurnTimeout { user_id }));
        }

        if self.members().count() < 2 {
            self.terminate(GameOverReason::LastStanding, &mut outcome);
        } else {
            self.advance_turn(now, &mut outcome);
        }
        Ok(outcome)
    }

    /// Owner stops the running game.
    pub fn end_game(&mut self, by: UserId) -> Result<Outcome, GameError> {
        let participant = self.participant(by).ok_or(GameError::NotInRoom)?;
        if self.status != RoomStatus::Playing {
            return Err(GameError::GameNotInProgress);
        }
        if !participant.is_owner {
            return Err(GameError::NotOwner);
        }
        let mut outcome = Outcome::default();
        self.terminate(GameOverReason::OwnerEnded, &mut outcome);
        Ok(outcome)
    }

    /// Countdown notice for the running turn
    pub fn tick(&self, now: Timestamp) -> Option<Notice> {
        let game = self.game.as_ref()?;
        Some(Notice::room(RoomEvent::TimerTick {
            user_id: game.current_user()?,
            remaining_ms: game.turn_deadline.millis_since(now),
        }))
    }

    /// Remove a departed player from the running game.
    pub(super) fn handle_departure(&mut self, user_id: UserId, now: Timestamp, outcome: &mut Outcome) {
        let Some(game) = self.game.as_mut() else {
            return;
        };
        let held_turn = game.remove_player(user_id);
        if game.turn_order.len() < 2 {
            self.terminate(GameOverReason::LastStanding, outcome);
            return;
        }
        if held_turn {
            if game.round > self.config.max_rounds {
                self.terminate(GameOverReason::MaxRounds, outcome);
            } else {
                game.start_turn(now, self.config.turn_time_limit_ms());
                self.announce_turn(outcome);
            }
        }
    }

    fn advance_turn(&mut self, now: Timestamp, outcome: &mut Outcome) {
        let limit_ms = self.config.turn_time_limit_ms();
        let Some(game) = self.game.as_mut() else {
            return;
        };
        game.advance();
        if game.round > self.config.max_rounds {
            self.terminate(GameOverReason::MaxRounds, outcome);
            return;
        }
        game.start_turn(now, limit_ms);
        self.announce_turn(outcome);
    }

    fn announce_turn(&self, outcome: &mut Outcome) {
        let Some(game) = self.game.as_ref() else {
            return;
        };
        let Some(user_id) = game.current_user() else {
            return;
        };
        outcome.push(Notice::room(RoomEvent::TurnStarted {
            user_id,
            last_char: game.last_char,
            round: game.round,
            turn_deadline: game.turn_deadline,
        }));
        outcome.set_timer(TimerDirective::Arm {
            deadline: game.turn_deadline,
        });
    }

    fn terminate(&mut self, reason: GameOverReason, outcome: &mut Outcome) {
        let words = self.game.as_ref().map(|g| g.history.len()).unwrap_or(0);
        self.status = RoomStatus::Finished;
        self.game = None;
        let ranks = self.rankings();
        self.last_ranks = ranks.clone();
        self.participants.retain(|p| p.is_active());

        tracing::info!(
            room_id = %self.id,
            reason = reason.as_str(),
            words,
            "Game over"
        );
        outcome.push(Notice::room(RoomEvent::GameOver { reason, ranks }));
        outcome.set_timer(TimerDirective::Cancel);
    }

    /// Score descending, then fewer submissions, then earlier join
    fn rankings(&self) -> Vec<RankEntry> {
        let mut ordered: Vec<_> = self.participants.iter().collect();
        ordered.sort_by(|a, b| {
            b.score
                .cmp(&a.score)
                .then_with(|| a.words_submitted.cmp(&b.words_submitted))
                .then_with(|| a.joined_at.cmp(&b.joined_at))
        });
        ordered
            .into_iter()
            .enumerate()
            .map(|(index, p)| RankEntry {
                rank: index + 1,
                user_id: p.user_id,
                nickname: p.nickname.as_str().to_string(),
                score: p.score,
                words_accepted: p.words_accepted,
                words_submitted: p.words_submitted,
                max_combo: p.max_consecutive_success,
                timeouts: p.timeouts,
                items_used: p.items_used,
                left: !p.is_active(),
            })
            .collect()
    }
}
