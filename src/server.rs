//! HTTP server assembly: router construction and the serve loop.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::DefaultBodyLimit;
use axum::response::Redirect;
use axum::routing::get;
use axum::Router;
use tokio::signal;
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

use crate::admin;
use crate::routes;
use crate::state::AppState;

/// Build the combined HTTP router with the public site and admin UI.
pub fn http_router(state: Arc<AppState>) -> Router {
    let max_body = state.config.http.max_upload_bytes;

    let router = Router::new()
        .route("/", get(routes::index))
        .route("/leaderboard", get(routes::leaderboard))
        .route("/history", get(routes::history))
        .route("/profile/{user_id}", get(routes::profile))
        .route("/meter/{run_id}", get(routes::meter))
        .route(
            "/upload",
            get(routes::upload_form).post(routes::upload_submit),
        )
        .route("/video/{run_id}", get(routes::video))
        .route("/avatar/{user_id}", get(routes::avatar))
        .with_state(Arc::clone(&state));

    // Handle both /admin and /admin/ by redirecting to dashboard
    router
        .route("/admin", get(|| async { Redirect::to("/admin/dashboard") }))
        .route("/admin/", get(|| async { Redirect::to("/admin/dashboard") }))
        .nest("/admin", admin::admin_router(state))
        .layer(DefaultBodyLimit::max(max_body))
        .layer(TraceLayer::new_for_http())
}

/// Run the HTTP server until a shutdown signal arrives.
pub async fn run(state: Arc<AppState>, listen_addr: SocketAddr) -> Result<()> {
    // Spawn expired session cleanup task
    let sweep_state = Arc::clone(&state);
    tokio::spawn(async move {
        let sweep_interval = std::time::Duration::from_secs(300);
        let mut ticker = tokio::time::interval(sweep_interval);

        loop {
            ticker.tick().await;
            let removed = sweep_state.sessions.cleanup_expired().await;
            if removed > 0 {
                debug!("Removed {} expired admin sessions", removed);
            }
        }
    });

    let app = http_router(state);

    let listener = tokio::net::TcpListener::bind(listen_addr)
        .await
        .with_context(|| format!("Failed to bind {listen_addr}"))?;

    info!(addr = %listen_addr, "HTTP server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    Ok(())
}

/// Wait for a shutdown signal (SIGTERM or SIGINT/Ctrl-C).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl-C");
        }
        _ = terminate => {
            info!("Received SIGTERM");
        }
    }
}
