//! Message formatting utilities for client display.

use std::collections::HashMap;

use kkutu_shared::time::timestamp_to_clock;
use serde::Deserialize;
use serde_json::Value;

const RULE: &str = "============================================================";

/// Frame received from the server
#[derive(Debug, Clone, Deserialize)]
pub struct IncomingFrame {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub data: Value,
    #[serde(default)]
    pub request_id: Option<String>,
    #[serde(default)]
    pub timestamp: i64,
}

impl IncomingFrame {
    pub fn parse(text: &str) -> Option<Self> {
        serde_json::from_str(text).ok()
    }
}

/// Formats server frames, tracking nicknames seen in the current room.
#[derive(Debug, Default)]
pub struct MessageFormatter {
    me: i64,
    names: HashMap<i64, String>,
}

impl MessageFormatter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn me(&self) -> i64 {
        self.me
    }

    fn name(&self, user_id: i64) -> String {
        let name = self
            .names
            .get(&user_id)
            .cloned()
            .unwrap_or_else(|| format!("#{user_id}"));
        if user_id == self.me {
            format!("{name} (me)")
        } else {
            name
        }
    }

    fn remember_room(&mut self, room: &Value) {
        self.names.retain(|id, _| *id == self.me);
        for participant in array(room, "participants") {
            self.remember(participant);
        }
    }

    fn remember(&mut self, participant: &Value) {
        if let (Some(id), Some(nickname)) = (
            participant["user_id"].as_i64(),
            participant["nickname"].as_str(),
        ) {
            self.names.insert(id, nickname.to_string());
        }
    }

    /// Render a frame for display. `None` means nothing to show.
    pub fn format(&mut self, frame: &IncomingFrame) -> Option<String> {
        let data = &frame.data;
        let at = timestamp_to_clock(frame.timestamp);

        let text = match frame.kind.as_str() {
            "connected" => {
                self.me = data["user_id"].as_i64().unwrap_or_default();
                let nickname = str_of(data, "nickname");
                self.names.insert(self.me, nickname.clone());
                format!("Connected as '{nickname}' (user {}) at {at}", self.me)
            }
            "pong" => {
                let sent = data["t"].as_i64().unwrap_or(frame.timestamp);
                format!("pong ({} ms)", frame.timestamp - sent)
            }
            "room_joined" | "room_state" => {
                self.remember_room(data);
                self.format_room(data)
            }
            "room_left" => {
                self.names.retain(|id, _| *id == self.me);
                format!("Left room {}", data["room_id"])
            }
            "participant_joined" => {
                self.remember(data);
                format!("+ {} joined at {at}", str_of(data, "nickname"))
            }
            "participant_left" => {
                let user_id = data["user_id"].as_i64().unwrap_or_default();
                self.names.remove(&user_id);
                format!("- {} left at {at}", str_of(data, "nickname"))
            }
            "ready_toggled" => {
                let state = if data["ready"].as_bool().unwrap_or(false) {
                    "ready"
                } else {
                    "not ready"
                };
                format!("{} is {state}", self.name(user(data)))
            }
            "owner_changed" => format!("{} is now the room owner", self.name(user(data))),
            "game_started" => {
                let order: Vec<String> = array(data, "turn_order")
                    .iter()
                    .filter_map(Value::as_i64)
                    .map(|id| self.name(id))
                    .collect();
                format!(
                    "{RULE}\nGame started! Seed word: {}\nTurn order: {}\n{RULE}",
                    str_of(data, "seed_word"),
                    order.join(" -> ")
                )
            }
            "turn_started" => {
                let remaining = (data["deadline"].as_i64().unwrap_or(frame.timestamp)
                    - frame.timestamp)
                    .max(0);
                let who = if user(data) == self.me {
                    "Your turn!".to_string()
                } else {
                    format!("{}'s turn", self.name(user(data)))
                };
                format!(
                    "[round {}] {who} Start with '{}' ({:.1}s)",
                    data["round"],
                    str_of(data, "last_char"),
                    remaining as f64 / 1000.0
                )
            }
            "timer_tick" => {
                let remaining_s = data["remaining_s"].as_u64().unwrap_or_default();
                if user(data) != self.me || remaining_s > 5 {
                    return None;
                }
                format!("... {remaining_s}s left")
            }
            "word_accepted" => {
                let breakdown = &data["score_breakdown"];
                let mut line = format!(
                    "{} played '{}' +{} (total {})",
                    self.name(user(data)),
                    str_of(data, "word"),
                    breakdown["total"],
                    data["total_score"]
                );
                if let Some(definition) = data["definition"].as_str() {
                    line.push_str(&format!("\n    {definition}"));
                }
                line
            }
            "word_rejected" => format!(
                "'{}' rejected: {}",
                str_of(data, "word"),
                str_of(data, "reason")
            ),
            "turn_timeout" => format!("{} ran out of time", self.name(user(data))),
            "item_used" => self.format_item_used(data),
            "item_rejected" => match data["remaining_ms"].as_i64() {
                Some(ms) => format!(
                    "Item rejected: {} ({:.1}s left)",
                    str_of(data, "reason"),
                    ms as f64 / 1000.0
                ),
                None => format!("Item rejected: {}", str_of(data, "reason")),
            },
            "word_hint" => {
                let words: Vec<&str> = array(data, "candidates")
                    .iter()
                    .filter_map(Value::as_str)
                    .collect();
                format!("Hint: {}", words.join(", "))
            }
            "game_over" => self.format_game_over(data),
            "chat" => format!("@{}: {}  ({at})", str_of(data, "nickname"), str_of(data, "text")),
            "error" => format!(
                "Error [{}]: {}",
                str_of(data, "code"),
                str_of(data, "message")
            ),
            "rate_limited" => format!(
                "Slow down! Retry in {}s",
                data["retry_after_s"].as_u64().unwrap_or(1)
            ),
            "room_destroyed" => {
                self.names.retain(|id, _| *id == self.me);
                format!("Room closed: {}", str_of(data, "reason"))
            }
            "server_shutdown" => "Server is shutting down".to_string(),
            other => format!("[{other}] {data}"),
        };

        Some(text)
    }

    fn format_room(&self, room: &Value) -> String {
        let mut output = String::new();
        output.push_str(RULE);
        output.push('\n');
        output.push_str(&format!(
            "Room {} '{}' [{}] {} ({} players max)\n",
            room["room_id"],
            str_of(room, "title"),
            str_of(room, "game_mode"),
            str_of(room, "status"),
            room["max_players"]
        ));

        let participants = array(room, "participants");
        if participants.is_empty() {
            output.push_str("(No participants)\n");
        }
        for participant in participants {
            let id = participant["user_id"].as_i64().unwrap_or_default();
            let owner = if participant["is_owner"].as_bool().unwrap_or(false) {
                " *owner*"
            } else {
                ""
            };
            output.push_str(&format!(
                "  {}{owner} - {} - score {}\n",
                self.name(id),
                str_of(participant, "status"),
                participant["score"]
            ));
        }

        if let Some(game) = room.get("game").filter(|g| !g.is_null()) {
            output.push_str(&format!(
                "Last word: {} (next: '{}'), round {}\n",
                str_of(game, "last_word"),
                str_of(game, "last_char"),
                game["round"]
            ));
        }
        output.push_str(RULE);
        output
    }

    fn format_item_used(&self, data: &Value) -> String {
        let effect = &data["effect"];
        let detail = match effect["kind"].as_str().unwrap_or_default() {
            "EXTRA_TIME" => format!(
                "+{:.1}s",
                effect["added_ms"].as_i64().unwrap_or_default() as f64 / 1000.0
            ),
            "SCORE_MULTIPLIER" => format!("next word x{}", effect["factor"]),
            "SKIP_TURN" => format!(
                "{} skipped",
                self.name(effect["skipped_user_id"].as_i64().unwrap_or_default())
            ),
            "WORD_HINT" => "hint revealed".to_string(),
            "IMMUNITY" => "shielded".to_string(),
            "SCREEN_DISTRACTION" => format!("ink for {}s", effect["duration_s"]),
            "BLOCKED" => format!(
                "blocked by {}'s shield",
                self.name(effect["target_user_id"].as_i64().unwrap_or_default())
            ),
            other => other.to_string(),
        };
        format!(
            "{} used {}: {detail}",
            self.name(user(data)),
            str_of(data, "item_id")
        )
    }

    fn format_game_over(&self, data: &Value) -> String {
        let mut output = String::new();
        output.push_str(RULE);
        output.push('\n');
        output.push_str(&format!("Game over ({})\n", str_of(data, "reason")));
        for rank in array(data, "ranks") {
            let id = rank["user_id"].as_i64().unwrap_or_default();
            output.push_str(&format!(
                "  {}. {} - {}\n",
                rank["rank"],
                self.name(id),
                rank["score"]
            ));
        }
        output.push_str(RULE);
        output
    }
}

fn user(data: &Value) -> i64 {
    data["user_id"].as_i64().unwrap_or_default()
}

fn str_of(value: &Value, key: &str) -> String {
    value[key].as_str().unwrap_or_default().to_string()
}

fn array<'a>(value: &'a Value, key: &str) -> &'a [Value] {
    value[key].as_array().map(Vec::as_slice).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn frame(value: Value) -> IncomingFrame {
        serde_json::from_value(value).unwrap()
    }

    fn connected(formatter: &mut MessageFormatter) {
        formatter.format(&frame(json!({
            "type": "connected",
            "data": {"user_id": 1, "nickname": "민수"},
            "timestamp": 0
        })));
    }

    #[test]
    fn test_connected_sets_current_user() {
        // テスト項目: connected を受け取ると自分のユーザー ID が記録される
        // given (前提条件):
        let mut formatter = MessageFormatter::new();

        // when (操作):
        connected(&mut formatter);

        // then (期待する結果):
        assert_eq!(formatter.me(), 1);
    }

    #[test]
    fn test_room_state_lists_participants_and_marks_me() {
        // テスト項目: ルーム状態の参加者一覧で自分に (me) が付く
        // given (前提条件):
        let mut formatter = MessageFormatter::new();
        connected(&mut formatter);
        let room = frame(json!({
            "type": "room_joined",
            "data": {
                "room_id": 3, "title": "방", "status": "WAITING", "game_mode": "CLASSIC",
                "max_players": 8, "turn_time_limit_s": 30, "max_rounds": 10,
                "participants": [
                    {"user_id": 1, "nickname": "민수", "status": "READY", "is_owner": true,
                     "score": 0, "joined_at": 0, "inventory": {}},
                    {"user_id": 2, "nickname": "지연", "status": "WAITING", "is_owner": false,
                     "score": 0, "joined_at": 0, "inventory": {}}
                ]
            },
            "timestamp": 0
        }));

        // when (操作):
        let text = formatter.format(&room).unwrap();

        // then (期待する結果):
        assert!(text.contains("민수 (me) *owner*"));
        assert!(text.contains("지연 - WAITING"));
    }

    #[test]
    fn test_turn_started_for_me() {
        // テスト項目: 自分の手番開始は "Your turn!" と表示される
        // given (前提条件):
        let mut formatter = MessageFormatter::new();
        connected(&mut formatter);
        let turn = frame(json!({
            "type": "turn_started",
            "data": {"user_id": 1, "last_char": "과", "round": 2, "deadline": 30000},
            "timestamp": 10000
        }));

        // when (操作):
        let text = formatter.format(&turn).unwrap();

        // then (期待する結果):
        assert_eq!(text, "[round 2] Your turn! Start with '과' (20.0s)");
    }

    #[test]
    fn test_timer_tick_only_shown_near_my_deadline() {
        // テスト項目: タイマーは自分の手番の残り 5 秒以下のときだけ表示される
        // given (前提条件):
        let mut formatter = MessageFormatter::new();
        connected(&mut formatter);
        let tick = |user_id: i64, remaining_s: u64| {
            frame(json!({
                "type": "timer_tick",
                "data": {"user_id": user_id, "remaining_s": remaining_s, "remaining_ms": 0},
                "timestamp": 0
            }))
        };

        // when (操作):
        let early = formatter.format(&tick(1, 12));
        let late = formatter.format(&tick(1, 3));
        let other = formatter.format(&tick(2, 3));

        // then (期待する結果):
        assert!(early.is_none());
        assert_eq!(late.as_deref(), Some("... 3s left"));
        assert!(other.is_none());
    }

    #[test]
    fn test_word_accepted_with_definition() {
        // テスト項目: 受理された単語が得点と語義付きで表示される
        // given (前提条件):
        let mut formatter = MessageFormatter::new();
        connected(&mut formatter);
        let accepted = frame(json!({
            "type": "word_accepted",
            "data": {
                "user_id": 1, "word": "사과", "definition": "apple",
                "score_breakdown": {"total": 14}, "total_score": 14
            },
            "timestamp": 0
        }));

        // when (操作):
        let text = formatter.format(&accepted).unwrap();

        // then (期待する結果):
        assert_eq!(text, "민수 (me) played '사과' +14 (total 14)\n    apple");
    }

    #[test]
    fn test_error_frame() {
        // テスト項目: エラーフレームがコードとメッセージ付きで表示される
        // given (前提条件):
        let mut formatter = MessageFormatter::new();
        let error = frame(json!({
            "type": "error",
            "data": {"code": "not_your_turn", "message": "wait for your turn"},
            "timestamp": 0
        }));

        // when (操作):
        let text = formatter.format(&error).unwrap();

        // then (期待する結果):
        assert_eq!(text, "Error [not_your_turn]: wait for your turn");
    }

    #[test]
    fn test_unknown_frame_is_shown_raw() {
        // テスト項目: 未知の type はそのまま表示される
        // given (前提条件):
        let mut formatter = MessageFormatter::new();

        // when (操作):
        let text = formatter.format(&frame(json!({"type": "mystery", "data": {"x": 1}})));

        // then (期待する結果):
        assert_eq!(text.as_deref(), Some(r#"[mystery] {"x":1}"#));
    }
}
