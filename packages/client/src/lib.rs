//! Terminal client for the kkutu word-chain server.

pub mod command;
pub mod domain;
pub mod error;
pub mod formatter;
mod login;
mod runner;
mod session;
mod ui;

pub use runner::{ClientOptions, run_client};
