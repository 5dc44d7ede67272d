//! Serve command: preview the bundle in a browser

use anyhow::{Context, Result};
use axum::{extract::State, http::StatusCode, response::Html, routing::get, Router};
use console::style;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Default preview port
pub const DEFAULT_PORT: u16 = 9000;

/// Build the preview router. The bundle is read on every request so a rebuild
/// shows up without restarting.
pub fn router(bundle: PathBuf) -> Router {
    Router::new()
        .route("/", get(serve_bundle))
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(bundle))
}

async fn serve_bundle(State(bundle): State<Arc<PathBuf>>) -> Result<Html<String>, (StatusCode, String)> {
    match tokio::fs::read_to_string(bundle.as_ref()).await {
        Ok(html) => Ok(Html(html)),
        Err(e) => {
            tracing::warn!(path = %bundle.display(), error = %e, "bundle unavailable");
            Err((
                StatusCode::NOT_FOUND,
                format!("Bundle {} not found. Run `keydesk inline` first.", bundle.display()),
            ))
        }
    }
}

/// Run the serve command until interrupted
pub async fn run(bundle: PathBuf, port: u16, open_browser: bool) -> Result<()> {
    if !bundle.exists() {
        tracing::warn!(path = %bundle.display(), "bundle does not exist yet");
    }

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    let url = format!("http://{}", addr);
    println!(
        "Serving {} on {}",
        style(bundle.display()).cyan(),
        style(&url).green()
    );

    if open_browser {
        if let Err(e) = open::that(&url) {
            tracing::warn!("Failed to open browser: {}", e);
        }
    }

    axum::serve(listener, router(bundle))
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
        })
        .await
        .context("Preview server failed")?;

    Ok(())
}
