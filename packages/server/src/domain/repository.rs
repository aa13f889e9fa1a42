//! Repository trait 定義
//!
//! ドメイン層が必要とするデータアクセスのインターフェースを定義します。
//! 具体的な実装は Infrastructure 層が提供します（依存性の逆転）。

use async_trait::async_trait;

use super::{
    entity::Session,
    error::{IdentityError, RepositoryError},
    value_object::{Nickname, SessionToken, Timestamp, UserId},
};

/// Session Repository trait
///
/// トークンからセッションを引くためのストア。作成時に同じユーザーの
/// 既存セッションは無効化される。
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// 新しいセッションを発行
    async fn create(&self, user_id: UserId, nickname: Nickname, now: Timestamp) -> Session;

    /// トークンに対応する有効なセッションを取得
    async fn get(&self, token: &SessionToken, now: Timestamp) -> Result<Session, RepositoryError>;

    /// セッションを削除
    async fn delete(&self, token: &SessionToken) -> Result<(), RepositoryError>;

    /// 期限切れのセッションを削除し、削除した件数を返す
    async fn purge_expired(&self, now: Timestamp) -> usize;
}

/// Identity provider trait
///
/// ニックネームからユーザー ID を解決する外部サービスの抽象化。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn authenticate(&self, nickname: &Nickname) -> Result<UserId, IdentityError>;
}
