//! Realtime Korean word-chain game server.
//!
//! Layers follow the dependency direction ui → usecase → domain, with
//! infrastructure implementing the domain's traits.

pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;
