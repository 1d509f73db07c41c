//! # ledgerlens: document-intake extraction service
//!
//! `ledgerlens` exposes a single HTTP endpoint, `POST /api/process-file`, that
//! accepts an uploaded spreadsheet, PDF, or image, extracts a bounded text
//! excerpt from it, forwards the excerpt to Google's generative-language API
//! with a fixed extraction prompt, and relays the parsed invoice/product/
//! customer data (or the raw reply text when it isn't valid JSON) back to the
//! caller.
//!
//! The service is a pass-through adapter: it holds no durable state, requires
//! no authentication, and handles each request as an independent linear
//! pipeline — receive upload, branch on MIME type, extract an excerpt, call
//! the model, best-effort parse the reply, respond. Spreadsheet parsing is
//! delegated to [calamine], PDF text extraction to [pdf-extract], and the
//! model call goes through the [`providers::ExtractionProvider`] seam so it
//! can be swapped or mocked in tests.
//!
//! [calamine]: https://github.com/tafia/calamine
//! [pdf-extract]: https://github.com/jrmuizel/pdf-extract
//!
//! ## Quick Start
//!
//! ```no_run
//! use clap::Parser;
//! use ledgerlens::{Application, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let args = ledgerlens::config::Args::parse();
//!     let config = Config::load(&args)?;
//!
//!     ledgerlens::telemetry::init_telemetry()?;
//!
//!     Application::new(config)?
//!         .serve(async {
//!             tokio::signal::ctrl_c().await.expect("Failed to listen for Ctrl+C");
//!         })
//!         .await
//! }
//! ```

pub mod api;
pub mod config;
pub mod errors;
pub mod extract;
pub mod providers;
pub mod reply;
pub mod telemetry;

#[cfg(test)]
mod test;

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderName, HeaderValue, header};
use axum::{Router, routing::get, routing::post};
use bon::Builder;
use tokio::net::TcpListener;
use tower_http::{
    cors::CorsLayer,
    set_header::SetResponseHeaderLayer,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{Level, info};

pub use config::Config;
use config::CorsOrigin;
use providers::{ExtractionProvider, gemini::GeminiProvider};

/// Application state shared across all request handlers.
///
/// Read-only after startup: the configuration and the extraction provider are
/// built once and cloned into each handler invocation.
#[derive(Clone, Builder)]
pub struct AppState {
    pub config: Config,
    pub provider: Arc<dyn ExtractionProvider>,
}

/// Create CORS layer from configuration
fn create_cors_layer(config: &Config) -> anyhow::Result<CorsLayer> {
    // tower-http panics if `*` is passed to `AllowOrigin::list`; the wildcard
    // must go through `AllowOrigin::any()` instead.
    let allow_origin = if config.cors.allowed_origins.contains(&CorsOrigin::Wildcard) {
        tower_http::cors::AllowOrigin::any()
    } else {
        let mut origins = Vec::new();
        for origin in &config.cors.allowed_origins {
            if let CorsOrigin::Url(url) = origin {
                origins.push(url.as_str().parse::<HeaderValue>()?);
            }
        }
        tower_http::cors::AllowOrigin::list(origins)
    };

    Ok(CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(tower_http::cors::Any)
        .allow_headers(tower_http::cors::Any))
}

/// Build the application router with all endpoints and middleware.
///
/// Routes:
/// - `POST /api/process-file` - the upload endpoint
/// - `GET /healthz` - liveness check
///
/// Every response carries no-store/no-cache directives, applied process-wide.
/// The request body limit follows `max_upload_bytes`; with no limit configured
/// uploads of any size are accepted and held fully in memory.
pub fn build_router(state: AppState) -> anyhow::Result<Router> {
    let body_limit = match state.config.max_upload_bytes {
        Some(max) => DefaultBodyLimit::max(max),
        None => DefaultBodyLimit::disable(),
    };

    let cors_layer = create_cors_layer(&state.config)?;

    let router = Router::new()
        .route("/healthz", get(|| async { "OK" }))
        .route("/api/process-file", post(api::handlers::process::process_file))
        .with_state(state)
        .layer(body_limit)
        // Caching is explicitly disabled on every response
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store, no-cache, must-revalidate, proxy-revalidate"),
        ))
        .layer(SetResponseHeaderLayer::overriding(header::PRAGMA, HeaderValue::from_static("no-cache")))
        .layer(SetResponseHeaderLayer::overriding(header::EXPIRES, HeaderValue::from_static("0")))
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("surrogate-control"),
            HeaderValue::from_static("no-store"),
        ))
        .layer(cors_layer)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        );

    Ok(router)
}

/// Main application struct that owns the router and configuration.
///
/// # Lifecycle
///
/// 1. **Create**: [`Application::new`] builds the provider, state, and router
/// 2. **Serve**: [`Application::serve`] binds a TCP port and handles requests
///    until the shutdown future resolves
pub struct Application {
    router: Router,
    config: Config,
}

impl Application {
    /// Create a new application instance from configuration.
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let provider: Arc<dyn ExtractionProvider> = Arc::new(GeminiProvider::new(&config.gemini));

        let state = AppState::builder().config(config.clone()).provider(provider).build();
        let router = build_router(state)?;

        Ok(Self { router, config })
    }

    /// Convert application into a test server (for tests)
    #[cfg(test)]
    pub fn into_test_server(self) -> axum_test::TestServer {
        axum_test::TestServer::new(self.router).expect("Failed to create test server")
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!("Server listening on http://{}", bind_addr);

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await?;

        Ok(())
    }
}
