// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! HTTP server for development with live reload and routing support.
//!
//! Every page URL gets the same HTML shell; routing happens in the browser
//! through the generated `router.js`. The server only has to hand out
//! compiled modules, public assets and the live-reload socket.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::{
    extract::{Path as UrlPath, Query, State, WebSocketUpgrade},
    http::{header, StatusCode, Uri},
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use brisk::RecompileScheduler;
use serde::Deserialize;
use serde_json::json;
use tower_http::services::ServeDir;

use super::assets::{content_type, resolve_under};
use super::livereload::handle_websocket;
use super::shell::{render_dev_shell, HMR_CLIENT_JS, HMR_CLIENT_PATH, HMR_PATH};
use crate::config::Config;

/// URL of the route table inspection endpoint.
pub const ROUTES_PATH: &str = "/__brisk/routes";

/// Shared application state for the development server.
pub struct AppState {
    /// Compile scheduler; owns the broadcaster and the published routes.
    pub scheduler: Arc<RecompileScheduler>,
    /// Application configuration.
    pub config: Config,
    /// Compiled output root served under `/compiled`.
    pub out_dir: PathBuf,
    /// Public assets served under `/public`.
    pub public_dir: PathBuf,
}

impl AppState {
    /// Builds state for the project at `root`.
    pub fn new(scheduler: Arc<RecompileScheduler>, config: Config, root: &Path) -> Self {
        let out_dir = config.paths.out_dir(root);
        let public_dir = config.paths.public_dir(root);
        Self {
            scheduler,
            config,
            out_dir,
            public_dir,
        }
    }
}

/// Builds the application router.
pub fn create_router(state: Arc<AppState>) -> Router {
    let public = ServeDir::new(&state.public_dir);

    Router::new()
        .route(HMR_PATH, get(livereload_handler))
        .route(HMR_CLIENT_PATH, get(hmr_client_handler))
        .route(ROUTES_PATH, get(routes_handler))
        .route("/compiled/*path", get(compiled_handler))
        .nest_service("/public", public)
        .fallback(fallback_handler)
        .with_state(state)
}

/// Creates and starts the development HTTP server.
pub async fn create_server(addr: &str, state: Arc<AppState>) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on {}", addr);
    axum::serve(listener, create_router(state)).await?;
    Ok(())
}

async fn livereload_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let scheduler = state.scheduler.clone();
    ws.on_upgrade(move |socket| handle_websocket(socket, scheduler))
}

async fn hmr_client_handler() -> Response {
    (
        [
            (header::CONTENT_TYPE, "application/javascript"),
            (header::CACHE_CONTROL, "no-store"),
        ],
        HMR_CLIENT_JS,
    )
        .into_response()
}

/// Query for the route inspection endpoint.
#[derive(Debug, Deserialize)]
pub struct RoutesQuery {
    /// URL path to resolve.
    pub path: Option<String>,
}

async fn routes_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RoutesQuery>,
) -> Response {
    let table = state.scheduler.routes();
    match query.path {
        Some(path) => {
            let matched = table.match_path(&path);
            Json(json!({ "path": path, "match": matched })).into_response()
        }
        None => Json(json!({
            "routes": &*table,
            "collisions": table.collisions(),
        }))
        .into_response(),
    }
}

async fn compiled_handler(
    State(state): State<Arc<AppState>>,
    UrlPath(path): UrlPath<String>,
) -> Response {
    serve_compiled(&state, &path).await
}

/// Files (any path with a `.`) come from the output root; everything else
/// gets the shell.
async fn fallback_handler(State(state): State<Arc<AppState>>, uri: Uri) -> Response {
    let path = uri.path();
    if path.contains('.') {
        return serve_compiled(&state, path).await;
    }

    let has_router = !state.scheduler.routes().is_empty();
    Html(render_dev_shell(&state.config, has_router)).into_response()
}

async fn serve_compiled(state: &AppState, request_path: &str) -> Response {
    let Some(file) = resolve_under(&state.out_dir, request_path) else {
        return not_found();
    };

    match tokio::fs::read(&file).await {
        Ok(bytes) => (
            [
                (header::CONTENT_TYPE, content_type(&file)),
                (header::CACHE_CONTROL, "no-store"),
            ],
            bytes,
        )
            .into_response(),
        Err(e) => {
            tracing::debug!("Not serving {}: {}", file.display(), e);
            not_found()
        }
    }
}

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, "File not found").into_response()
}
