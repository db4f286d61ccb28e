//! HTTP server for tod-server

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::http::header::{AUTHORIZATION, CACHE_CONTROL, CONTENT_TYPE};
use axum::http::{HeaderValue, Method};
use axum::Router;
use tod_core::{DedupStore, MemoryDedupStore};
use tod_generator::{
    load_assets, CardGenerator, FileDedupStore, GenerationProvider, GeneratorError, Pause,
    Provider, ProviderError, ProviderKind, TokioPause,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::config::ServerConfig;
use crate::routes;

/// Application state shared across handlers
pub struct AppState<P, W> {
    /// `None` when the provider credential is missing
    pub generator: Option<Arc<CardGenerator<P, W>>>,
    pub dedup: Arc<dyn DedupStore>,
    pub provider_kind: ProviderKind,
    pub category_chars_max: usize,
    pub diagnostics: bool,
}

impl<P: GenerationProvider, W: Pause> AppState<P, W> {
    /// Name reported by health checks.
    pub fn provider_name(&self) -> &'static str {
        match self.generator {
            Some(ref generator) => generator.provider().name(),
            None => self.provider_kind.name(),
        }
    }
}

/// Build production state from configuration.
///
/// A missing API key is not fatal: the service starts and answers 500 to
/// card requests until it is configured.
pub fn build_state(
    config: &ServerConfig,
) -> Result<AppState<Provider, TokioPause>, GeneratorError> {
    let (validator, catalog) =
        load_assets(config.rules_path.as_deref(), config.catalog_path.as_deref())?;

    let settings = config.provider_settings();
    let generator = match Provider::from_settings(&settings) {
        Ok(provider) => Some(Arc::new(CardGenerator::new(
            provider,
            TokioPause,
            validator,
            catalog,
            config.generator_config(),
        ))),
        Err(ProviderError::MissingApiKey(var)) => {
            warn!("{} is not set, card requests will fail", var);
            None
        }
        Err(e) => return Err(e.into()),
    };

    let dedup: Arc<dyn DedupStore> = if config.dedup.enabled {
        Arc::new(FileDedupStore::open(&config.dedup.path, config.dedup.entries_max))
    } else {
        Arc::new(MemoryDedupStore::new())
    };

    Ok(AppState {
        generator,
        dedup,
        provider_kind: settings.kind,
        category_chars_max: config.category_chars_max,
        diagnostics: config.diagnostics,
    })
}

/// Build the router with CORS, no-cache and request tracing.
pub fn router<P, W>(state: Arc<AppState<P, W>>, route: &str) -> Router
where
    P: GenerationProvider + 'static,
    W: Pause + 'static,
{
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION]);

    Router::new()
        .merge(routes::card_routes::<P, W>(route))
        .merge(routes::health_routes::<P, W>())
        .with_state(state)
        .layer(cors)
        .layer(SetResponseHeaderLayer::overriding(
            CACHE_CONTROL,
            HeaderValue::from_static("no-cache"),
        ))
        .layer(TraceLayer::new_for_http())
}

/// Run the HTTP server until Ctrl-C.
pub async fn run(config: ServerConfig) -> Result<()> {
    let state = Arc::new(build_state(&config)?);
    info!(
        provider = state.provider_name(),
        dedup = %config.dedup.path.display(),
        "Card service ready"
    );

    let app = router(state, &config.route);

    let listener = tokio::net::TcpListener::bind(&config.bind)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind))?;
    info!("Listening on http://{}{}", config.bind, config.route);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}
