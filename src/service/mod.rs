//! # Service Facade
//!
//! The HTTP surface of the spectro service: argument decoding, the
//! profile/context registry, and dispatch into the dataset, alignment,
//! and rendering engines.  All endpoints live under `/spec`.
//!
//! Requests are cooperative tasks on the tokio event loop; they suspend
//! at form-body ingestion, spectrum file reads, and outbound catalog
//! calls.  Within one request the iteration over an identifier list is
//! strictly sequential so output order equals expanded input order and
//! failure attribution stays simple.

mod error;
mod params;
mod routes;


use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::catalog::CatalogClient;
use crate::config::{Config, ConfigError, ResolvedProfile};
use crate::dataset::Registry;

pub use error::SvcError;
pub use params::Params;

/// Largest accepted form body; identifier lists can run long.
const MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

/// Process-wide service state, immutable after startup except for the
/// debug toggle (racy by design).
pub struct AppState {
    /// Parsed configuration snapshot
    pub config: Config,
    /// Dataset strategies by context name
    pub registry: Registry,
    /// The deployment profile this process runs under
    pub profile: ResolvedProfile,
    /// Process-wide debug flag, flipped by `/debug`
    pub debug: AtomicBool,
}

impl AppState {
    /// Assemble state from a configuration snapshot.
    pub fn new(config: Config, profile_name: &str) -> Result<Arc<AppState>, ConfigError> {
        let profile = config.resolve_profile(profile_name)?;
        let catalog = Arc::new(CatalogClient::new(&profile.catalog_url, profile.timeout));
        let registry = Registry::new(
            config.contexts.keys().cloned(),
            &profile.cache_root,
            &profile.fits_root,
            catalog,
        );
        Ok(Arc::new(AppState {
            config,
            registry,
            profile,
            debug: AtomicBool::new(false),
        }))
    }
}

/// Build the `/spec` router over shared state.
pub fn router(state: Arc<AppState>) -> Router {
    let api = Router::new()
        .route("/", get(routes::root))
        .route("/ping", get(routes::ping))
        .route("/available", get(routes::available))
        .route("/shutdown", get(routes::shutdown))
        .route("/debug", get(routes::toggle_debug))
        .route("/profiles", get(routes::profiles))
        .route("/contexts", get(routes::contexts))
        .route("/catalogs", get(routes::catalogs))
        .route("/validate", get(routes::validate))
        .route("/query", get(routes::query))
        .route("/preview", get(routes::preview))
        .route("/getSpec", post(routes::get_spec))
        .route("/plotGrid", post(routes::plot_grid))
        .route("/listSpan", post(routes::list_span))
        .route("/stackedImage", post(routes::stacked_image))
        .with_state(state);

    Router::new()
        .nest("/spec", api)
        .layer(TraceLayer::new_for_http())
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
}

/// Bind and serve until shutdown.
pub async fn serve(state: Arc<AppState>, host: &str, port: u16) -> anyhow::Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind((host, port)).await?;
    log::info!("serving spectro service on {host}:{port}");
    axum::serve(listener, app).await?;
    Ok(())
}
