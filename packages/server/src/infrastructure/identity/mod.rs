//! Identity Provider 実装

pub mod guest;

pub use guest::GuestIdentityProvider;
