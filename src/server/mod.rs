//! HTTP server: index, articles, assets, health and refresh

mod views;

use anyhow::Result;
use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::{Request, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use notify_debouncer_mini::{new_debouncer, notify::RecursiveMode};
use serde::Deserialize;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::services::ServeFile;
use tower_http::trace::TraceLayer;

use crate::content::{paginate, recent, HealthStatus};
use crate::error::BlogError;
use crate::Blog;

/// Number of posts in the index sidebar
const SIDEBAR_POSTS: usize = 10;

type SharedBlog = Arc<Blog>;

/// HTTP status for a pipeline error
fn status_for(err: &BlogError) -> StatusCode {
    match err {
        BlogError::PostNotFound(_) | BlogError::AssetNotFound(_) => StatusCode::NOT_FOUND,
        // Same answer as a missing file, whether or not the target exists
        BlogError::PathTraversalRejected(_) => StatusCode::NOT_FOUND,
        BlogError::InvalidPageNumber(_) => StatusCode::BAD_REQUEST,
        BlogError::RepositoryUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Error page for `err`, titled like the rest of the site
fn error_response(err: BlogError, site_title: &str) -> Response {
    let status = status_for(&err);
    if status.is_server_error() {
        tracing::error!("{}", err.chain());
    } else {
        tracing::debug!("{}", err);
    }
    (status, Html(views::error(site_title, status))).into_response()
}

/// Build the application router
pub fn router(blog: SharedBlog) -> Router {
    let assets_route = format!("{}/*path", blog.config.assets_url_prefix.trim_end_matches('/'));

    Router::new()
        .route("/", get(index_handler))
        .route("/pistlar/:slug", get(article_handler))
        .route("/pistlar/:slug/", get(article_handler))
        .route(&assets_route, get(asset_handler))
        .route("/health", get(health_handler))
        .route("/refresh", post(refresh_handler))
        .fallback(fallback_handler)
        .layer(TraceLayer::new_for_http())
        .with_state(blog)
}

/// Start the server
pub async fn start(blog: SharedBlog, ip: &str, port: u16, watch: bool) -> Result<()> {
    // Parse address - handle "localhost" specially
    let bind_ip = if ip == "localhost" { "127.0.0.1" } else { ip };
    let addr: SocketAddr = format!("{}:{}", bind_ip, port).parse()?;

    if let Some(secs) = blog.config.refresh_ttl_secs {
        tokio::spawn(refresh_periodically(blog.clone(), Duration::from_secs(secs)));
        tracing::info!("Checking for changed posts every {}s", secs);
    }

    if watch {
        let watched = blog.clone();
        tokio::task::spawn_blocking(move || {
            if let Err(e) = watch_posts(&watched) {
                tracing::error!("File watcher error: {}", e);
            }
        });
    }

    let app = router(blog);

    println!("Server running at http://{}:{}", ip, port);
    if watch {
        println!("Watching posts for changes...");
    }
    println!("Press Ctrl+C to stop.");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}

/// Rescan on a fixed interval, skipping unchanged trees
async fn refresh_periodically(blog: SharedBlog, period: Duration) {
    let mut interval = tokio::time::interval(period);
    // The first tick fires immediately and the initial scan already ran
    interval.tick().await;

    loop {
        interval.tick().await;
        let blog = blog.clone();
        match tokio::task::spawn_blocking(move || blog.repository().refresh_if_changed()).await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => tracing::warn!("Periodic refresh failed: {}", e),
            Err(e) => tracing::error!("Periodic refresh task panicked: {}", e),
        }
    }
}

/// Watch the posts directory and refresh after changes settle
fn watch_posts(blog: &Blog) -> Result<()> {
    let (tx, rx) = std::sync::mpsc::channel();

    // Create debouncer to avoid multiple rapid rescans
    let mut debouncer = new_debouncer(Duration::from_millis(500), tx)?;
    let root = blog.repository().root();
    debouncer.watcher().watch(root, RecursiveMode::Recursive)?;
    tracing::debug!("Watching: {:?}", root);

    loop {
        match rx.recv() {
            Ok(Ok(events)) => {
                // Editors and VCS touch hidden files constantly
                let relevant = events.iter().any(|e| {
                    e.path
                        .strip_prefix(root)
                        .unwrap_or(&e.path)
                        .components()
                        .all(|c| !c.as_os_str().to_string_lossy().starts_with('.'))
                        && !e.path.to_string_lossy().ends_with('~')
                });
                if !relevant {
                    continue;
                }

                for event in &events {
                    tracing::debug!("File changed: {}", event.path.display());
                }
                if let Err(e) = blog.repository().refresh_if_changed() {
                    tracing::warn!("Refresh after change failed: {}", e);
                }
            }
            Ok(Err(e)) => {
                tracing::error!("Watch error: {:?}", e);
            }
            Err(e) => {
                tracing::error!("Channel error: {:?}", e);
                break;
            }
        }
    }

    Ok(())
}

#[derive(Debug, Deserialize)]
struct IndexQuery {
    page: Option<i64>,
}

async fn index_handler(
    State(blog): State<SharedBlog>,
    Query(query): Query<IndexQuery>,
) -> Result<Html<String>, Response> {
    // One snapshot for both the page and the sidebar
    let snapshot = blog.repository().list_all();
    let page = paginate(snapshot.posts(), query.page.unwrap_or(1), blog.config.page_size)
        .map_err(|e| error_response(e, &blog.config.site_title))?;
    let sidebar = recent(snapshot.posts(), SIDEBAR_POSTS);

    Ok(Html(views::index(&blog.config.site_title, &page, &sidebar)))
}

async fn article_handler(
    State(blog): State<SharedBlog>,
    Path(slug): Path<String>,
) -> Result<Html<String>, Response> {
    let post = blog
        .get_post(&slug)
        .map_err(|e| error_response(e, &blog.config.site_title))?;
    Ok(Html(views::article(&blog.config.site_title, &post)))
}

async fn asset_handler(State(blog): State<SharedBlog>, request: Request<Body>) -> Response {
    match serve_asset(&blog, request).await {
        Ok(response) => response,
        Err(e) => error_response(e, &blog.config.site_title),
    }
}

async fn serve_asset(blog: &Blog, request: Request<Body>) -> Result<Response, BlogError> {
    // Resolve the raw path so percent-encoding is decoded exactly once
    let prefix = blog.config.assets_url_prefix.trim_end_matches('/');
    let raw = request
        .uri()
        .path()
        .strip_prefix(prefix)
        .unwrap_or_default()
        .to_string();
    let file = blog.resolve_asset(&raw)?;

    let mut service = ServeFile::new(&file);
    match service.try_call(request).await {
        Ok(response) => Ok(response.into_response()),
        Err(e) => Err(BlogError::Io { path: file, source: e }),
    }
}

async fn health_handler(State(blog): State<SharedBlog>) -> Json<HealthStatus> {
    Json(blog.health_status())
}

async fn refresh_handler(State(blog): State<SharedBlog>) -> Result<Json<HealthStatus>, Response> {
    let refreshing = blog.clone();
    let result = tokio::task::spawn_blocking(move || refreshing.refresh())
        .await
        .map_err(|e| {
            tracing::error!("Refresh task panicked: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        })?;

    result
        .map(Json)
        .map_err(|e| error_response(e, &blog.config.site_title))
}

async fn fallback_handler(State(blog): State<SharedBlog>) -> Response {
    let status = StatusCode::NOT_FOUND;
    (status, Html(views::error(&blog.config.site_title, status))).into_response()
}
