//! Terminal client for the kkutu word-chain server.
//!
//! Logs in as a guest, connects over WebSocket and reads commands from stdin.
//! A plain line is submitted as a word; `/help` lists the other commands.
//! Reconnects on disconnection (max 5 attempts with 5 second interval).
//!
//! Run with:
//! ```not_rust
//! cargo run --bin kkutu-client -- --nickname 민수
//! cargo run --bin kkutu-client -- -n 지연 --room 1
//! ```

use clap::Parser;

use kkutu_client::{ClientOptions, run_client};
use kkutu_shared::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "kkutu-client")]
#[command(about = "Terminal client for the kkutu word-chain game", long_about = None)]
struct Args {
    /// Nickname to log in with
    #[arg(short = 'n', long)]
    nickname: String,

    /// Server base URL
    #[arg(short = 's', long, default_value = "http://127.0.0.1:8080")]
    server: String,

    /// Room to join right after connecting
    #[arg(short = 'r', long)]
    room: Option<u64>,
}

#[tokio::main]
async fn main() {
    setup_logger(env!("CARGO_BIN_NAME"), "info");

    let args = Args::parse();

    let options = ClientOptions {
        server: args.server,
        nickname: args.nickname,
        room_id: args.room,
    };

    if let Err(e) = run_client(options).await {
        tracing::error!("Client error: {}", e);
        std::process::exit(1);
    }
}
