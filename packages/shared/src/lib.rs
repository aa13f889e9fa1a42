//! Utilities shared by the kkutu server and client.

pub mod logger;
pub mod time;
