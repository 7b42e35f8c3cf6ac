//! HTTP surface: `POST /analyze` and `GET /analyze`.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::{routing::post, Router};

use crate::candidates::CandidateSource;
use crate::matcher::Matcher;
use crate::store::PhraseStore;
use writes::PendingWrites;

/// How long shutdown waits for background inserts.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

mod dto;
mod error;
mod handlers;
mod writes;


/// Everything a request needs. Built once at startup and cloned per request.
#[derive(Clone)]
pub struct AppState {
    pub(crate) candidates: Arc<dyn CandidateSource>,
    pub(crate) store: Arc<dyn PhraseStore>,
    pub(crate) matcher: Matcher,
    pub(crate) writes: PendingWrites,
}

impl AppState {
    pub fn new(
        candidates: Arc<dyn CandidateSource>,
        store: Arc<dyn PhraseStore>,
        matcher: Matcher,
    ) -> Self {
        Self {
            candidates,
            store,
            matcher,
            writes: PendingWrites::default(),
        }
    }
}

pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route(
            "/analyze",
            post(handlers::analyze).get(handlers::phrase_counts),
        )
        .with_state(state)
}

/// Bind and serve until Ctrl+C.
pub async fn serve(state: AppState, addr: SocketAddr) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind HTTP server at {addr}"))?;

    serve_until(listener, state, async {
        let _ = tokio::signal::ctrl_c().await;
        tracing::info!("shutting down");
    })
    .await
}

/// Serve on `listener` until `shutdown` resolves, then wait for the inserts
/// of already-answered requests.
pub async fn serve_until<F>(
    listener: tokio::net::TcpListener,
    state: AppState,
    shutdown: F,
) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let writes = state.writes.clone();
    tracing::info!(
        addr = %listener.local_addr()?,
        candidates = %state.candidates.describe(),
        value = %state.matcher.value,
        lexical = %state.matcher.lexical,
        "server started"
    );

    axum::serve(listener, app_router(state))
        .with_graceful_shutdown(shutdown)
        .await
        .context("HTTP server failed")?;

    let pending = writes.in_flight();
    if pending > 0 {
        tracing::info!(pending, "waiting for background inserts");
    }
    if tokio::time::timeout(DRAIN_TIMEOUT, writes.drain()).await.is_err() {
        tracing::error!(
            pending = writes.in_flight(),
            "gave up waiting for background inserts; their texts are lost"
        );
    }
    Ok(())
}
