//! Realtime Korean word-chain game server.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin kkutu-server
//! cargo run --bin kkutu-server -- --host 0.0.0.0 --port 3000
//! ```

use std::{sync::Arc, time::Duration};

use clap::Parser;
use kkutu_server::{
    config::ServerConfig,
    domain::{IdentityProvider, MessagePusher, SessionRepository, Timestamp},
    infrastructure::{
        identity::GuestIdentityProvider,
        loader::{load_item_catalog, load_lexicon},
        message_pusher::WebSocketMessagePusher,
        repository::InMemorySessionRepository,
    },
    ui::{AppState, Server},
    usecase::{AuthenticateUseCase, LoginUseCase, RetryPolicy, RoomManager},
};
use kkutu_shared::{
    logger::setup_logger,
    time::{Clock, SystemClock},
};

const SESSION_PURGE_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() {
    let config = ServerConfig::parse();

    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), &config.log_level);

    // Initialize dependencies in order:
    // 1. Static data (dictionary, item catalog)
    // 2. Repository, identity provider and MessagePusher
    // 3. UseCases
    // 4. Background tasks
    // 5. Server

    // 1. Load static data
    let lexicon = match load_lexicon(config.dictionary_path.as_deref()) {
        Ok(lexicon) => Arc::new(lexicon),
        Err(e) => {
            tracing::error!("Failed to load dictionary: {}", e);
            std::process::exit(1);
        }
    };
    let catalog = match load_item_catalog(config.item_catalog_path.as_deref()) {
        Ok(catalog) => Arc::new(catalog),
        Err(e) => {
            tracing::error!("Failed to load item catalog: {}", e);
            std::process::exit(1);
        }
    };

    // 2. Create collaborators
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let sessions: Arc<dyn SessionRepository> =
        Arc::new(InMemorySessionRepository::new(config.session_ttl()));
    let identity: Arc<dyn IdentityProvider> = Arc::new(GuestIdentityProvider::new());
    let message_pusher: Arc<dyn MessagePusher> =
        Arc::new(WebSocketMessagePusher::new(Arc::clone(&clock)));

    // 3. Create UseCases
    let login_usecase = Arc::new(LoginUseCase::new(
        identity,
        Arc::clone(&sessions),
        Arc::clone(&clock),
        RetryPolicy::default(),
    ));
    let authenticate_usecase = Arc::new(AuthenticateUseCase::new(
        Arc::clone(&sessions),
        Arc::clone(&clock),
    ));
    let room_manager = Arc::new(RoomManager::new(
        lexicon,
        catalog,
        config.mode_table(),
        config.room_limits(),
        Arc::clone(&message_pusher),
        Arc::clone(&clock),
    ));

    // 4. Purge expired sessions every minute
    {
        let sessions = Arc::clone(&sessions);
        let clock = Arc::clone(&clock);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(SESSION_PURGE_INTERVAL);
            loop {
                interval.tick().await;
                let purged = sessions
                    .purge_expired(Timestamp::new(clock.now_millis()))
                    .await;
                if purged > 0 {
                    tracing::info!(purged, "Purged expired sessions");
                }
            }
        });
    }

    // 5. Create and run the server
    let state = Arc::new(AppState {
        login_usecase,
        authenticate_usecase,
        room_manager,
        message_pusher,
        clock,
        hub: config.hub_config(),
    });
    let server = Server::new(state);
    if let Err(e) = server.run(&config.host, config.port).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
