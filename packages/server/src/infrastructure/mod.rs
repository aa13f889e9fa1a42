//! Infrastructure 層
//!
//! ドメイン層が定義した trait の具体的な実装と、外部とのデータ変換を提供します。
//!
//! - `repository`: セッションストア
//! - `message_pusher`: WebSocket へのイベント送信
//! - `identity`: ゲスト用 Identity Provider
//! - `loader`: 辞書とアイテムカタログの読み込み
//! - `dto`: WebSocket / HTTP の DTO と変換

pub mod dto;
pub mod identity;
pub mod loader;
pub mod message_pusher;
pub mod repository;
