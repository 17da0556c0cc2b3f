//! HTTP server
//!
//! One axum router carries the JSON API together with the health and
//! Prometheus endpoints. The server shuts down gracefully on a broadcast
//! signal.

use crate::api::handlers;
use crate::service::AppState;
use anyhow::{Context, Result};
use axum::extract::{MatchedPath, Request, State};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{get, post};
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

/// Build the application router
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/api/sessions", post(handlers::submit_session))
        .route("/api/sessions/{id}", get(handlers::get_session))
        .route("/api/players/{name}", get(handlers::get_player))
        .route(
            "/api/players/{name}/sessions",
            get(handlers::get_player_sessions),
        )
        .route("/api/players/{name}/card", get(handlers::get_player_card))
        .route("/api/leaderboard/{scope}", get(handlers::get_leaderboard))
        .route(
            "/api/venues",
            get(handlers::list_venues).post(handlers::register_venue),
        )
        .route("/api/skeecaptain/apply", post(handlers::apply_skeecaptain))
        .route(
            "/api/skeecaptain/applications",
            get(handlers::list_applications),
        )
        .route("/health", get(handlers::health))
        .route("/ready", get(handlers::ready))
        .route("/metrics", get(handlers::metrics))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            track_requests,
        ))
        .with_state(state)
}

/// Record request duration by matched route
async fn track_requests(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());
    let method = request.method().clone();

    let timer = state.metrics().start_timer();
    let response = next.run(request).await;
    let elapsed = timer.stop();

    state
        .metrics()
        .record_request(&route, response.status().as_u16(), elapsed);
    debug!(
        "{} {} -> {} in {:.2}ms",
        method,
        route,
        response.status().as_u16(),
        elapsed.as_secs_f64() * 1000.0
    );

    response
}

/// HTTP server serving the skeeboard API
pub struct ApiServer {
    state: Arc<AppState>,
    shutdown_tx: broadcast::Sender<()>,
}

impl ApiServer {
    pub fn new(state: Arc<AppState>) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        Self { state, shutdown_tx }
    }

    /// Bind and serve until [`ApiServer::stop`] is called
    pub async fn start(&self) -> Result<()> {
        let addr: SocketAddr = self
            .state
            .config()
            .bind_address()
            .parse()
            .context("Invalid HTTP server address")?;

        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind {}", addr))?;
        self.serve(listener).await
    }

    /// Serve on an already bound listener
    pub async fn serve(&self, listener: TcpListener) -> Result<()> {
        let app = router(self.state.clone());
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        info!("HTTP server listening on http://{}", listener.local_addr()?);

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.recv().await;
                info!("HTTP server shutdown signal received");
            })
            .await?;

        info!("HTTP server stopped");
        Ok(())
    }

    /// Signal the server to stop accepting connections
    pub fn stop(&self) {
        info!("Stopping HTTP server...");

        if let Err(e) = self.shutdown_tx.send(()) {
            warn!("Failed to send shutdown signal to HTTP server: {}", e);
        }
    }
}
