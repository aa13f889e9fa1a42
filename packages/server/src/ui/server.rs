//! Server execution logic.

use std::{future::Future, sync::Arc, time::Duration};

use axum::{
    Router,
    routing::{get, post},
};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use super::{
    handler::{
        create_session, delete_session, get_room_detail, get_rooms, health_check,
        room_websocket_handler, websocket_handler,
    },
    signal::shutdown_signal,
    state::AppState,
};
use crate::usecase::room::actor::CLOSE_GOING_AWAY;

/// How long rooms get to deliver `server_shutdown` before sockets are cut
const ROOM_SHUTDOWN_WAIT: Duration = Duration::from_secs(5);

/// Word-chain game server
///
/// # Example
///
/// ```ignore
/// let server = Server::new(Arc::new(app_state));
/// server.run("127.0.0.1", 8080).await?;
/// ```
pub struct Server {
    state: Arc<AppState>,
}

impl Server {
    pub fn new(state: Arc<AppState>) -> Self {
        Self { state }
    }

    pub fn router(&self) -> Router {
        Router::new()
            // WebSocket エンドポイント
            .route("/ws", get(websocket_handler))
            .route("/ws/rooms/{room_id}", get(room_websocket_handler))
            // HTTP エンドポイント
            .route("/api/health", get(health_check))
            .route("/api/session", post(create_session).delete(delete_session))
            .route("/api/rooms", get(get_rooms))
            .route("/api/rooms/{room_id}", get(get_room_detail))
            .layer(TraceLayer::new_for_http())
            .with_state(Arc::clone(&self.state))
    }

    /// Bind `host:port` and serve until Ctrl+C / SIGTERM
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind to the specified address or
    /// if there's an error during server execution.
    pub async fn run(self, host: &str, port: u16) -> Result<(), Box<dyn std::error::Error>> {
        let bind_addr = format!("{}:{}", host, port);
        let listener = TcpListener::bind(&bind_addr).await?;

        tracing::info!("Word-chain server listening on {}", listener.local_addr()?);
        tracing::info!("Connect to: ws://{}/ws", bind_addr);
        tracing::info!("Press Ctrl+C to shutdown gracefully");

        self.serve(listener, shutdown_signal()).await
    }

    /// Serve on an already bound listener until `shutdown` resolves.
    ///
    /// Rooms are told about the shutdown and every socket is closed with
    /// 1001 before the listener stops.
    pub async fn serve(
        self,
        listener: TcpListener,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let app = self.router();
        let state = Arc::clone(&self.state);

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                shutdown.await;
                state.room_manager.shutdown(ROOM_SHUTDOWN_WAIT).await;
                state
                    .message_pusher
                    .disconnect_all(CLOSE_GOING_AWAY, "server shutdown")
                    .await;
            })
            .await?;

        tracing::info!("Server shutdown complete");

        Ok(())
    }
}
