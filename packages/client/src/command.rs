//! Input line parsing.
//!
//! Slash commands map to control messages; any other line is submitted
//! as a word.

use serde::Serialize;
use thiserror::Error;

pub const GAME_MODES: [&str; 4] = ["CLASSIC", "BLITZ", "MARATHON", "SPEED"];

pub const HELP_TEXT: &str = "\
Commands:
  /create <title> [mode]   create a room (mode: classic, blitz, marathon, speed)
  /join <room_id>          join a room
  /leave                   leave the current room
  /ready                   toggle ready
  /start                   start the game (owner)
  /end                     end the game (owner)
  /item <item_id> [user]   use an item, optionally on a target user id
  /chat <text>             send a chat message
  /ping                    measure latency
  /help                    show this help
  /quit                    exit
Any other line is submitted as a word.
";

/// Message sent to the server
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum OutgoingMessage {
    Ping {
        t: i64,
    },
    CreateRoom {
        title: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        game_mode: Option<String>,
    },
    JoinRoom {
        room_id: u64,
    },
    LeaveRoom,
    ToggleReady,
    StartGame,
    SubmitWord {
        word: String,
    },
    UseItem {
        item_id: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        target_user_id: Option<i64>,
    },
    Chat {
        text: String,
    },
    EndGame,
}

#[derive(Debug, Serialize)]
struct OutgoingEnvelope<'a> {
    #[serde(flatten)]
    message: &'a OutgoingMessage,
    request_id: String,
}

impl OutgoingMessage {
    /// Serialize with a request id attached
    pub fn to_json(&self, request_id: u64) -> Result<String, serde_json::Error> {
        serde_json::to_string(&OutgoingEnvelope {
            message: self,
            request_id: format!("c-{request_id}"),
        })
    }
}

/// Parsed input line
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Send(OutgoingMessage),
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum InputError {
    #[error("unknown command '/{0}', type /help")]
    UnknownCommand(String),

    #[error("usage: {0}")]
    MissingArgument(&'static str),

    #[error("'{0}' is not a valid room id")]
    InvalidRoomId(String),

    #[error("'{0}' is not a valid user id")]
    InvalidUserId(String),
}

/// Parse one trimmed input line. `now` stamps ping requests.
pub fn parse_input(line: &str, now: i64) -> Result<Command, InputError> {
    let Some(rest) = line.strip_prefix('/') else {
        return Ok(Command::Send(OutgoingMessage::SubmitWord {
            word: line.to_string(),
        }));
    };

    let (name, args) = match rest.split_once(char::is_whitespace) {
        Some((name, args)) => (name, args.trim()),
        None => (rest, ""),
    };

    let message = match name {
        "help" | "h" => return Ok(Command::Help),
        "quit" | "exit" | "q" => return Ok(Command::Quit),
        "ping" => OutgoingMessage::Ping { t: now },
        "create" => parse_create(args)?,
        "join" => {
            if args.is_empty() {
                return Err(InputError::MissingArgument("/join <room_id>"));
            }
            let room_id = args
                .parse()
                .map_err(|_| InputError::InvalidRoomId(args.to_string()))?;
            OutgoingMessage::JoinRoom { room_id }
        }
        "leave" => OutgoingMessage::LeaveRoom,
        "ready" => OutgoingMessage::ToggleReady,
        "start" => OutgoingMessage::StartGame,
        "end" => OutgoingMessage::EndGame,
        "item" => parse_item(args)?,
        "chat" | "c" => {
            if args.is_empty() {
                return Err(InputError::MissingArgument("/chat <text>"));
            }
            OutgoingMessage::Chat {
                text: args.to_string(),
            }
        }
        other => return Err(InputError::UnknownCommand(other.to_string())),
    };

    Ok(Command::Send(message))
}

fn parse_create(args: &str) -> Result<OutgoingMessage, InputError> {
    if args.is_empty() {
        return Err(InputError::MissingArgument("/create <title> [mode]"));
    }

    // A trailing mode name is split off the title.
    if let Some((title, last)) = args.rsplit_once(char::is_whitespace) {
        let mode = last.to_uppercase();
        if GAME_MODES.contains(&mode.as_str()) {
            return Ok(OutgoingMessage::CreateRoom {
                title: title.trim().to_string(),
                game_mode: Some(mode),
            });
        }
    }

    Ok(OutgoingMessage::CreateRoom {
        title: args.to_string(),
        game_mode: None,
    })
}

fn parse_item(args: &str) -> Result<OutgoingMessage, InputError> {
    let mut parts = args.split_whitespace();
    let Some(item_id) = parts.next() else {
        return Err(InputError::MissingArgument("/item <item_id> [user_id]"));
    };
    let target_user_id = match parts.next() {
        Some(raw) => Some(
            raw.parse()
                .map_err(|_| InputError::InvalidUserId(raw.to_string()))?,
        ),
        None => None,
    };

    Ok(OutgoingMessage::UseItem {
        item_id: item_id.to_string(),
        target_user_id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_line_is_submitted_as_word() {
        // テスト項目: スラッシュで始まらない入力は単語として送信される
        // given (前提条件):
        let line = "사과";

        // when (操作):
        let command = parse_input(line, 0).unwrap();

        // then (期待する結果):
        assert_eq!(
            command,
            Command::Send(OutgoingMessage::SubmitWord {
                word: "사과".to_string()
            })
        );
    }

    #[test]
    fn test_create_with_trailing_mode() {
        // テスト項目: /create の末尾がモード名なら title から分離される
        // given (前提条件):
        let line = "/create 즐거운 방 blitz";

        // when (操作):
        let command = parse_input(line, 0).unwrap();

        // then (期待する結果):
        assert_eq!(
            command,
            Command::Send(OutgoingMessage::CreateRoom {
                title: "즐거운 방".to_string(),
                game_mode: Some("BLITZ".to_string()),
            })
        );
    }

    #[test]
    fn test_create_without_mode_keeps_whole_title() {
        // テスト項目: モード名がなければ引数全体が title になる
        // given (前提条件):
        let line = "/create friday night";

        // when (操作):
        let command = parse_input(line, 0).unwrap();

        // then (期待する結果):
        assert_eq!(
            command,
            Command::Send(OutgoingMessage::CreateRoom {
                title: "friday night".to_string(),
                game_mode: None,
            })
        );
    }

    #[test]
    fn test_join_requires_numeric_room_id() {
        // テスト項目: /join の引数が数値でなければエラーになる
        // given (前提条件):
        let line = "/join abc";

        // when (操作):
        let result = parse_input(line, 0);

        // then (期待する結果):
        assert_eq!(result, Err(InputError::InvalidRoomId("abc".to_string())));
        assert_eq!(
            parse_input("/join", 0),
            Err(InputError::MissingArgument("/join <room_id>"))
        );
    }

    #[test]
    fn test_item_with_target() {
        // テスト項目: /item は対象ユーザー ID を任意で受け付ける
        // given (前提条件):
        let line = "/item skip_turn 42";

        // when (操作):
        let command = parse_input(line, 0).unwrap();

        // then (期待する結果):
        assert_eq!(
            command,
            Command::Send(OutgoingMessage::UseItem {
                item_id: "skip_turn".to_string(),
                target_user_id: Some(42),
            })
        );
    }

    #[test]
    fn test_unknown_command() {
        // テスト項目: 未知のコマンドはエラーになる
        // given (前提条件):
        let line = "/dance";

        // when (操作):
        let result = parse_input(line, 0);

        // then (期待する結果):
        assert_eq!(result, Err(InputError::UnknownCommand("dance".to_string())));
    }

    #[test]
    fn test_outgoing_json_shape() {
        // テスト項目: 送信メッセージが type/data/request_id の形でシリアライズされる
        // given (前提条件):
        let word = OutgoingMessage::SubmitWord {
            word: "과일".to_string(),
        };
        let ready = OutgoingMessage::ToggleReady;

        // when (操作):
        let word_json: serde_json::Value =
            serde_json::from_str(&word.to_json(3).unwrap()).unwrap();
        let ready_json: serde_json::Value =
            serde_json::from_str(&ready.to_json(4).unwrap()).unwrap();

        // then (期待する結果):
        assert_eq!(
            word_json,
            serde_json::json!({"type": "submit_word", "data": {"word": "과일"}, "request_id": "c-3"})
        );
        assert_eq!(ready_json["type"], "toggle_ready");
        assert_eq!(ready_json["request_id"], "c-4");
    }
}
