//! ルーム内でのアイテム使用

use std::sync::Arc;

use super::{
    event::{AppliedEffect, Notice, Outcome, RoomEvent, TimerDirective},
    room::GameRoom,
};
use crate::domain::{
    entity::{Effect, EffectExpiry, RoomStatus},
    error::{GameError, ItemRejection},
    item::{ItemDefinition, ItemKind, TargetPolicy},
    value_object::{ItemId, Timestamp, UserId},
};

impl GameRoom {
    /// Use one item from `user_id`'s inventory.
    ///
    /// Checks run before anything is consumed, so a rejected use changes
    /// nothing.
    pub fn use_item(
        &mut self,
        user_id: UserId,
        item_id: &ItemId,
        target: Option<UserId>,
        now: Timestamp,
    ) -> Result<Outcome, GameError> {
        let actor = self.participant(user_id).ok_or(GameError::NotInRoom)?;
        let catalog = Arc::clone(&self.catalog);
        let definition = catalog.get(item_id).ok_or(ItemRejection::UnknownItem)?;

        match self.status {
            RoomStatus::Playing => {}
            RoomStatus::Waiting if definition.kind == ItemKind::WordHint => {}
            _ => return Err(ItemRejection::WrongPhase.into()),
        }
        if actor.item_count(item_id) == 0 {
            return Err(ItemRejection::OutOfStock.into());
        }
        if let Some(remaining_ms) = actor.cooldown_remaining(item_id, now) {
            return Err(ItemRejection::CooldownActive { remaining_ms }.into());
        }
        let targets = self.resolve_targets(user_id, definition, target, now)?;

        if let Some(actor) = self.participant_mut(user_id) {
            if let Some(count) = actor.inventory.get_mut(item_id) {
                *count = count.saturating_sub(1);
            }
            actor
                .cooldowns
                .insert(item_id.clone(), now.plus_secs(definition.cooldown_s));
            actor.items_used += 1;
        }

        let mut outcome = Outcome::default();
        let effect = self.apply_effect(user_id, definition, &targets, now, &mut outcome);
        let target_user_id = match definition.target_policy {
            TargetPolicy::Opponent | TargetPolicy::CurrentPlayer => targets.first().copied(),
            TargetPolicy::SelfOnly | TargetPolicy::AllOpponents => None,
        };

        tracing::debug!(
            room_id = %self.id,
            user_id = %user_id,
            item_id = %item_id,
            "Item used"
        );
        outcome.push(Notice::room(RoomEvent::ItemUsed {
            user_id,
            item_id: item_id.clone(),
            target_user_id,
            effect,
        }));
        Ok(outcome)
    }

    fn resolve_targets(
        &self,
        user_id: UserId,
        definition: &ItemDefinition,
        target: Option<UserId>,
        now: Timestamp,
    ) -> Result<Vec<UserId>, ItemRejection> {
        match definition.target_policy {
            TargetPolicy::SelfOnly => {
                if target.is_some_and(|t| t != user_id) {
                    return Err(ItemRejection::InvalidTarget);
                }
                if definition.kind == ItemKind::ExtraTime {
                    let game = self.game.as_ref().ok_or(ItemRejection::WrongPhase)?;
                    // A turn past its deadline is over even before the timer lands
                    if game.current_user() != Some(user_id) || now > game.turn_deadline {
                        return Err(ItemRejection::NotYourTurn);
                    }
                }
                Ok(vec![user_id])
            }
            TargetPolicy::CurrentPlayer => {
                let game = self.game.as_ref().ok_or(ItemRejection::WrongPhase)?;
                let holder = game.current_user().ok_or(ItemRejection::WrongPhase)?;
                if holder == user_id {
                    return Err(ItemRejection::InvalidTarget);
                }
                // A skip lands on whoever the next advance would pass over
                let affected = match definition.kind {
                    ItemKind::SkipTurn => game.next_skipped().ok_or(ItemRejection::WrongPhase)?,
                    _ => holder,
                };
                if affected == user_id || target.is_some_and(|t| t != affected) {
                    return Err(ItemRejection::InvalidTarget);
                }
                Ok(vec![affected])
            }
            TargetPolicy::Opponent => {
                let target = target.ok_or(ItemRejection::InvalidTarget)?;
                if target == user_id || self.participant(target).is_none() {
                    return Err(ItemRejection::InvalidTarget);
                }
                Ok(vec![target])
            }
            TargetPolicy::AllOpponents => Ok(self
                .members()
                .filter(|p| p.user_id != user_id && !p.is_immune(now))
                .map(|p| p.user_id)
                .collect()),
        }
    }

    fn apply_effect(
        &mut self,
        user_id: UserId,
        definition: &ItemDefinition,
        targets: &[UserId],
        now: Timestamp,
        outcome: &mut Outcome,
    ) -> AppliedEffect {
        // Hostile single-target items bounce off immunity
        if let Some(&target) = targets.first()
            && target != user_id
            && definition.target_policy != TargetPolicy::AllOpponents
            && self.participant(target).is_some_and(|p| p.is_immune(now))
        {
            return AppliedEffect::Blocked {
                target_user_id: target,
            };
        }

        match definition.kind {
            ItemKind::ExtraTime => {
                let added_ms = (definition.magnitude * 1000.0).round() as i64;
                let turn_deadline = match self.game.as_mut() {
                    Some(game) => {
                        game.turn_deadline = game.turn_deadline.plus_millis(added_ms);
                        game.turn_deadline
                    }
                    None => now,
                };
                outcome.set_timer(TimerDirective::Extend { by_ms: added_ms });
                AppliedEffect::ExtraTime {
                    added_ms,
                    turn_deadline,
                }
            }
            ItemKind::ScoreMultiplier => {
                for target in targets {
                    if let Some(participant) = self.participant_mut(*target) {
                        participant.active_effects.push(Effect {
                            source_item_id: definition.item_id.clone(),
                            kind: ItemKind::ScoreMultiplier,
                            magnitude: definition.magnitude,
                            expires: EffectExpiry::NextAcceptedWord,
                            target_user_id: *target,
                        });
                    }
                }
                AppliedEffect::ScoreMultiplier {
                    factor: definition.magnitude,
                }
            }
            ItemKind::SkipTurn => {
                let skipped_user_id = targets.first().copied().unwrap_or(user_id);
                if let Some(game) = self.game.as_mut() {
                    game.pending_skips += 1;
                }
                AppliedEffect::SkipTurn { skipped_user_id }
            }
            ItemKind::WordHint => {
                let limit = definition.magnitude.max(1.0) as usize;
                let candidates: Vec<String> = match self.game.as_ref() {
                    Some(game) => self
                        .lexicon
                        .dictionary
                        .candidates(game.last_char, &self.lexicon.table, &game.used_words, limit)
                        .into_iter()
                        .map(|e| e.word.clone())
                        .collect(),
                    None => self
                        .lexicon
                        .dictionary
                        .seed_sample(limit)
                        .into_iter()
                        .map(|e| e.word.clone())
                        .collect(),
                };
                let count = candidates.len();
                outcome.push(Notice::user(user_id, RoomEvent::WordHint { candidates }));
                AppliedEffect::WordHint { count }
            }
            ItemKind::Immunity => {
                let turn_ms = self.config.turn_time_limit_ms();
                let until = match self.game.as_ref() {
                    Some(game) => game.turn_deadline.plus_millis(turn_ms),
                    None => now.plus_millis(turn_ms),
                };
                for target in targets {
                    if let Some(participant) = self.participant_mut(*target) {
                        participant.drop_expired_effects(now);
                        participant.immunity_until = Some(until);
                        participant.active_effects.push(Effect {
                            source_item_id: definition.item_id.clone(),
                            kind: ItemKind::Immunity,
                            magnitude: definition.magnitude,
                            expires: EffectExpiry::At(until),
                            target_user_id: *target,
                        });
                    }
                }
                AppliedEffect::Immunity { until }
            }
            ItemKind::ScreenDistraction => AppliedEffect::ScreenDistraction {
                duration_s: definition.magnitude,
                targets: targets.to_vec(),
            },
        }
    }
}
