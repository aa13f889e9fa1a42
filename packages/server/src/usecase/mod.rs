//! UseCase 層
//!
//! ドメインの操作を組み合わせ、UI 層から呼ばれる単位の処理を提供します。

pub mod authenticate;
pub mod error;
pub mod login;
pub mod room;
pub mod room_manager;

#[cfg(test)]
pub(crate) mod test_support;

pub use authenticate::AuthenticateUseCase;
pub use error::{AuthError, LoginError, RoomManagerError};
pub use login::{LoginUseCase, RetryPolicy};
pub use room::RoomHandle;
pub use room_manager::{RoomLimits, RoomManager};
