//! Server configuration from command-line flags and `KKUTU_*` environment variables.

use std::{path::PathBuf, time::Duration};

use clap::Parser;

use crate::{
    domain::{GameMode, ModeTable},
    ui::{HubConfig, RateLimitConfig},
    usecase::RoomLimits,
};

#[derive(Parser, Debug, Clone)]
#[command(name = "kkutu-server")]
#[command(about = "Realtime Korean word-chain game server", long_about = None)]
pub struct ServerConfig {
    /// Host address to bind the server to
    #[arg(short = 'H', long, env = "KKUTU_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, env = "KKUTU_PORT", default_value_t = 8080)]
    pub port: u16,

    /// Default log level (RUST_LOG overrides)
    #[arg(long, env = "KKUTU_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Session lifetime in seconds
    #[arg(long, env = "KKUTU_SESSION_TTL_SECS", default_value_t = 86_400)]
    pub session_ttl_secs: u64,

    /// Turn time limit for CLASSIC rooms
    #[arg(long, env = "KKUTU_DEFAULT_TURN_SECS", default_value_t = 30)]
    pub default_turn_secs: u64,

    #[arg(long, env = "KKUTU_BLITZ_TURN_SECS", default_value_t = 10)]
    pub blitz_turn_secs: u64,

    #[arg(long, env = "KKUTU_MARATHON_TURN_SECS", default_value_t = 45)]
    pub marathon_turn_secs: u64,

    #[arg(long, env = "KKUTU_SPEED_TURN_SECS", default_value_t = 15)]
    pub speed_turn_secs: u64,

    /// Inbound frames allowed per window and socket
    #[arg(long, env = "KKUTU_RATE_LIMIT_MESSAGES", default_value_t = 30)]
    pub rate_limit_messages: usize,

    #[arg(long, env = "KKUTU_RATE_LIMIT_WINDOW_SECS", default_value_t = 60)]
    pub rate_limit_window_secs: u64,

    #[arg(long, env = "KKUTU_MAX_ROOMS", default_value_t = 100)]
    pub max_rooms: usize,

    /// Waiting rooms a single user may own at once
    #[arg(long, env = "KKUTU_MAX_ROOMS_PER_OWNER", default_value_t = 3)]
    pub max_rooms_per_owner: usize,

    /// Silence on a socket before a heartbeat ping is sent
    #[arg(long, env = "KKUTU_IDLE_TIMEOUT_SECS", default_value_t = 60)]
    pub idle_timeout_secs: u64,

    /// Delay between game over and the room returning to WAITING
    #[arg(long, env = "KKUTU_GRACE_SECS", default_value_t = 10)]
    pub grace_secs: u64,

    /// Dictionary TSV (bundled data when absent)
    #[arg(long, env = "KKUTU_DICTIONARY_PATH")]
    pub dictionary_path: Option<PathBuf>,

    /// Item catalog JSON (bundled data when absent)
    #[arg(long, env = "KKUTU_ITEM_CATALOG_PATH")]
    pub item_catalog_path: Option<PathBuf>,
}

impl ServerConfig {
    pub fn mode_table(&self) -> ModeTable {
        ModeTable::default()
            .with_turn_time(GameMode::Classic, self.default_turn_secs)
            .with_turn_time(GameMode::Blitz, self.blitz_turn_secs)
            .with_turn_time(GameMode::Marathon, self.marathon_turn_secs)
            .with_turn_time(GameMode::Speed, self.speed_turn_secs)
    }

    pub fn room_limits(&self) -> RoomLimits {
        RoomLimits {
            max_rooms: self.max_rooms,
            max_rooms_per_owner: self.max_rooms_per_owner,
            grace_period: Duration::from_secs(self.grace_secs),
        }
    }

    pub fn hub_config(&self) -> HubConfig {
        HubConfig {
            rate_limit: RateLimitConfig {
                max_messages: self.rate_limit_messages.max(1),
                window: Duration::from_secs(self.rate_limit_window_secs.max(1)),
            },
            idle_timeout: Duration::from_secs(self.idle_timeout_secs.max(1)),
        }
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_secs)
    }
}
