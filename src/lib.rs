use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub mod api;
pub mod feed;
pub mod filters;
pub mod ingest;
pub mod repository;
pub mod startup_checks;
pub mod store;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub app: AppConfig,
    pub storage: StorageConfig,
    pub database: DatabaseConfig,
    pub images: ImagesConfig,
    pub feed: FeedConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Upper bound for a whole request body, all multipart parts included.
    pub max_request_bytes: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    pub name: String,
    pub log_level: String,
    /// Workspace used when a request names none.
    pub default_workspace: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageConfig {
    pub content_directory: PathBuf,
    /// Remove on-disk artifacts along with the metadata row.
    pub cascade_delete: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub busy_timeout_seconds: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ImagesConfig {
    pub thumbnail_width: u32,
    pub preview_max_width: u32,
    pub jpeg_quality: u8,
    pub max_upload_bytes: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FeedConfig {
    pub default_page_size: u32,
    pub max_page_size: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            max_request_bytes: 100 * 1024 * 1024,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            name: "Wasabi".to_string(),
            log_level: "info".to_string(),
            default_workspace: "default".to_string(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            content_directory: PathBuf::from("out"),
            cascade_delete: false,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://wasabi.db".to_string(),
            max_connections: 5,
            busy_timeout_seconds: 5,
        }
    }
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            thumbnail_width: 600,
            preview_max_width: 800,
            jpeg_quality: 85,
            max_upload_bytes: 25 * 1024 * 1024,
        }
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            default_page_size: 20,
            max_page_size: 100,
        }
    }
}

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
};
use std::sync::Arc;
use thiserror::Error;
use tower_http::trace::TraceLayer;

use feed::FeedService;
use filters::{FilterRegistry, FilterResolver};
use ingest::Ingestor;
use repository::{Repository, RepositoryError};
use store::{ContentStore, StoreError};

#[derive(Debug, Error)]
pub enum InitError {
    #[error("Database initialization failed: {0}")]
    Repository(#[from] RepositoryError),
    #[error("Content store initialization failed: {0}")]
    Store(#[from] StoreError),
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub repository: Repository,
    pub store: ContentStore,
    pub resolver: Arc<FilterResolver>,
    pub feed: FeedService,
    pub ingestor: Ingestor,
}

impl AppState {
    /// Connect the database, prepare the content directory and wire the
    /// services together.
    pub async fn new(config: Config) -> Result<Self, InitError> {
        let repository = Repository::connect(&config.database).await?;
        let store = ContentStore::new(config.storage.content_directory.clone());
        store.ensure()?;

        let registry = Arc::new(FilterRegistry::builtin());
        let resolver = Arc::new(FilterResolver::new(registry));

        let feed = FeedService::new(
            repository.clone(),
            config.feed.clone(),
            config.app.default_workspace.clone(),
        );
        let ingestor = Ingestor::new(
            store.clone(),
            repository.clone(),
            resolver.clone(),
            config.images.clone(),
            config.app.default_workspace.clone(),
        );

        Ok(Self {
            config: Arc::new(config),
            repository,
            store,
            resolver,
            feed,
            ingestor,
        })
    }
}

pub async fn create_app(config: Config) -> Result<Router, InitError> {
    let app_state = AppState::new(config).await?;
    Ok(router(app_state))
}

pub fn router(app_state: AppState) -> Router {
    let body_limit = app_state.config.server.max_request_bytes;

    Router::new()
        .route("/list", get(feed::list_handler))
        .route("/json/{id}", get(feed::record_handler))
        .route("/tags", get(feed::tags_handler))
        .route("/stats", get(feed::stats_handler))
        .route("/filters", get(feed::filters_handler))
        .route("/thumbnail/{hash}", get(api::thumbnail_handler))
        .route("/out/{file}", get(api::artifact_handler))
        .route("/image", post(ingest::upload_handler))
        .route("/form", post(ingest::form_handler))
        .route("/preview", post(ingest::preview_handler))
        .route("/{id}/like", post(api::like_handler))
        .route("/{id}/share", post(api::share_handler))
        .route("/{id}/comment", post(api::comment_handler))
        .route("/{id}", delete(api::delete_handler))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    let method = request.method();
                    let uri = request.uri();
                    let matched_path = request
                        .extensions()
                        .get::<axum::extract::MatchedPath>()
                        .map(|matched_path| matched_path.as_str());

                    tracing::info_span!(
                        "http_request",
                        method = %method,
                        uri = %uri,
                        matched_path,
                    )
                })
                .on_request(|request: &axum::http::Request<_>, _span: &tracing::Span| {
                    let method = request.method();
                    let uri = request.uri();
                    let headers = request.headers();
                    let user_agent = headers
                        .get("user-agent")
                        .and_then(|h| h.to_str().ok())
                        .unwrap_or("-");
                    let referer = headers
                        .get("referer")
                        .and_then(|h| h.to_str().ok())
                        .unwrap_or("-");

                    tracing::info!(
                        target: "access_log",
                        method = %method,
                        path = %uri.path(),
                        query = ?uri.query(),
                        user_agent = %user_agent,
                        referer = %referer,
                        "request"
                    );
                })
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     _span: &tracing::Span| {
                        let status = response.status();
                        let size = response
                            .headers()
                            .get("content-length")
                            .and_then(|h| h.to_str().ok())
                            .unwrap_or("-");

                        tracing::info!(
                            target: "access_log",
                            status = %status,
                            size = %size,
                            latency_ms = %latency.as_millis(),
                            "response"
                        );
                    },
                ),
        )
        .with_state(app_state)
}
