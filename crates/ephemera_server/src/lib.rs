//! HTTP server wiring for Ephemera (routes, shared state, process lifecycle).

/// HTTP error mapping for API handlers.
pub mod error;
/// HTTP handlers for file, paste and viewer endpoints.
pub mod handlers;

pub use ephemera_core::{
    config, models, ttl, AppError, Config, Database, ExpirySweeper, FileManager, FsBlobStore,
    OpContext, PasteManager, DEFAULT_PORT,
};

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use ephemera_core::sweep::Sweep;
use ephemera_core::StorageError;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};

const CONTENT_SECURITY_POLICY: &str =
    "default-src 'none'; frame-ancestors 'none'; base-uri 'none'; form-action 'none'";

/// Multipart framing allowance on top of the configured upload size.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Shared state passed to HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    pub files: Arc<FileManager>,
    pub pastes: Arc<PasteManager>,
    pub config: Arc<Config>,
}

impl AppState {
    /// Construct shared application state from already-wired managers.
    pub fn new(config: Config, files: FileManager, pastes: PasteManager) -> Self {
        Self {
            files: Arc::new(files),
            pastes: Arc::new(pastes),
            config: Arc::new(config),
        }
    }

    /// Open the redb metadata store and blob directory named by `config` and
    /// wire both lifecycle managers to them.
    ///
    /// # Errors
    /// Returns an error when the database cannot be created or opened.
    pub fn open(config: Config) -> Result<Self, StorageError> {
        let db = Arc::new(Database::new(&config.db_path)?);
        let blobs = Arc::new(FsBlobStore::new(&config.blob_dir));
        let files = FileManager::new(db.clone(), blobs);
        let pastes = PasteManager::new(db).with_max_content_size(config.max_paste_size);
        tracing::info!(db = %config.db_path, blobs = %config.blob_dir, "Storage opened");
        Ok(Self::new(config, files, pastes))
    }

    /// Per-request context bounded by the configured storage timeout.
    pub fn request_context(&self) -> OpContext {
        OpContext::with_timeout(self.config.storage_timeout)
    }

    /// Expiry sweeper over both managers using the configured interval.
    pub fn sweeper(&self) -> ExpirySweeper {
        ExpirySweeper::new(
            vec![
                self.files.clone() as Arc<dyn Sweep>,
                self.pastes.clone() as Arc<dyn Sweep>,
            ],
            self.config.sweep_interval,
            self.config.storage_timeout,
        )
    }
}

/// Create the application router with all routes and middleware.
///
/// # Arguments
/// - `state`: Shared application state.
/// - `allow_public_access`: Whether to allow cross-origin requests from any origin.
pub fn create_app(state: AppState, allow_public_access: bool) -> Router {
    let cors_port = state.config.port;
    create_app_with_cors_port(state, allow_public_access, cors_port)
}

/// Resolve the listener address from the `BIND` override and security policy.
///
/// # Returns
/// A socket address that stays on loopback unless public access is enabled.
pub fn resolve_bind_address(config: &Config, allow_public_access: bool) -> SocketAddr {
    let default_bind = SocketAddr::from(([127, 0, 0, 1], config.port));
    let requested = match std::env::var("BIND") {
        Ok(value) => match value.trim().parse::<SocketAddr>() {
            Ok(addr) => addr,
            Err(err) => {
                tracing::warn!(
                    "Invalid BIND='{}': {}. Falling back to {}",
                    value,
                    err,
                    default_bind
                );
                default_bind
            }
        },
        Err(_) => default_bind,
    };

    if allow_public_access || requested.ip().is_loopback() {
        return requested;
    }

    tracing::warn!(
        "Non-loopback bind {} requested without ALLOW_PUBLIC_ACCESS; forcing 127.0.0.1",
        requested
    );
    SocketAddr::from(([127, 0, 0, 1], requested.port()))
}

fn cors_layer(allow_public_access: bool, cors_port: u16) -> CorsLayer {
    let methods = [Method::GET, Method::POST, Method::DELETE];
    if allow_public_access {
        return CorsLayer::new()
            .allow_origin(tower_http::cors::Any)
            .allow_methods(methods)
            .allow_headers(tower_http::cors::Any);
    }

    let origins: Vec<HeaderValue> = ["localhost", "127.0.0.1"]
        .iter()
        .filter_map(|host| HeaderValue::from_str(&format!("http://{}:{}", host, cors_port)).ok())
        .collect();
    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(methods)
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
}

fn create_app_with_cors_port(state: AppState, allow_public_access: bool, cors_port: u16) -> Router {
    let body_limit = state
        .config
        .max_upload_size
        .saturating_add(MULTIPART_OVERHEAD)
        .max(state.config.max_paste_size);

    Router::new()
        .route("/health", get(handlers::view::health))
        .route("/api/file", post(handlers::files::upload_file))
        .route(
            "/api/file/:id",
            get(handlers::files::download_file).delete(handlers::files::delete_file),
        )
        .route("/api/file/:id/info", get(handlers::files::file_info))
        .route("/api/paste", post(handlers::pastes::create_paste))
        .route(
            "/api/paste/:id",
            get(handlers::pastes::get_paste).delete(handlers::pastes::delete_paste),
        )
        .route("/api/paste/:id/raw", get(handlers::pastes::get_raw_paste))
        .route("/api/view/:id", get(handlers::view::view_content))
        .with_state(state)
        .layer(
            tower::ServiceBuilder::new()
                .layer(DefaultBodyLimit::max(body_limit))
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(cors_layer(allow_public_access, cors_port))
                .layer(SetResponseHeaderLayer::overriding(
                    header::CONTENT_SECURITY_POLICY,
                    HeaderValue::from_static(CONTENT_SECURITY_POLICY),
                ))
                .layer(SetResponseHeaderLayer::overriding(
                    header::X_CONTENT_TYPE_OPTIONS,
                    HeaderValue::from_static("nosniff"),
                ))
                .layer(SetResponseHeaderLayer::overriding(
                    header::X_FRAME_OPTIONS,
                    HeaderValue::from_static("DENY"),
                )),
        )
}

fn listener_cors_port(listener: &tokio::net::TcpListener, fallback_port: u16) -> u16 {
    listener
        .local_addr()
        .map(|addr| addr.port())
        .unwrap_or(fallback_port)
}

/// Run the Axum server with graceful shutdown support.
///
/// # Errors
/// Returns any I/O error produced by `axum::serve`.
pub async fn serve_router(
    listener: tokio::net::TcpListener,
    state: AppState,
    allow_public_access: bool,
    shutdown_signal: impl Future<Output = ()> + Send + 'static,
) -> Result<(), std::io::Error> {
    let cors_port = listener_cors_port(&listener, state.config.port);
    let app = create_app_with_cors_port(state, allow_public_access, cors_port);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await
}

/// Open storage, start the expiry sweeper and serve until `shutdown` resolves.
///
/// The sweeper is cancelled and awaited after the listener stops.
///
/// # Errors
/// Storage open, bind and serve failures.
pub async fn run(
    config: Config,
    allow_public_access: bool,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    let state = AppState::open(config.clone())?;

    let bind_addr = resolve_bind_address(&config, allow_public_access);
    if !bind_addr.ip().is_loopback() {
        tracing::warn!(
            "Binding to non-localhost address: {} - ensure proper security measures are in place",
            bind_addr
        );
    }
    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    let actual_addr = listener.local_addr().unwrap_or(bind_addr);
    tracing::info!("Ephemera running at http://{}", actual_addr);

    let cancel = CancellationToken::new();
    let sweeper = state.sweeper().spawn(cancel.clone());

    let serve_result = serve_router(listener, state, allow_public_access, shutdown).await;

    cancel.cancel();
    if let Err(err) = sweeper.await {
        tracing::error!("Expiry sweeper task failed: {}", err);
    }

    serve_result?;
    Ok(())
}

/// Resolves on Ctrl+C, or SIGTERM on unix.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!("Failed to install SIGTERM handler: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("Shutdown signal received");
}
