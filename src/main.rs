//! Clinic Booking Forms Backend
//!
//! Serves the booking and contact forms of the clinic website: drafts, validation,
//! available slots and submission to the external booking API.

mod api;
mod availability;
mod booking_api;
mod clock;
mod config;
mod db;
mod errors;
mod forms;
mod models;
mod session;
mod validation;
mod workflow;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    routing::{delete, get, patch, post},
    Router,
};
use tokio_util::sync::CancellationToken;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use booking_api::HttpBookingApi;
use clock::{Clock, SystemClock};
use config::Config;
use db::Repository;
use forms::FormStore;
use models::ServiceCatalog;
use session::SessionFlags;
use workflow::SubmissionWorkflow;

/// How often expired submission flags are purged.
const FLAG_SWEEP_INTERVAL: Duration = Duration::from_secs(1);
/// Forms untouched this long are unmounted.
const FORM_IDLE_MINUTES: i64 = 120;
const FORM_PRUNE_INTERVAL: Duration = Duration::from_secs(60);

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub forms: Arc<FormStore>,
    pub flags: Arc<SessionFlags>,
    pub catalog: Arc<ServiceCatalog>,
    pub clock: Arc<dyn Clock>,
    pub config: Arc<Config>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting clinic booking forms backend");
    tracing::info!("Database path: {:?}", config.db_path);
    tracing::info!("Booking API: {}", config.api_base_url);
    tracing::info!("Identifier assignment: {}", config.id_assignment);
    tracing::info!("Date input: {}", config.variant.date_input);
    tracing::info!("Bind address: {}", config.bind_addr);

    // Initialize database
    let pool = db::init_database(&config.db_path).await?;
    let repo = Arc::new(Repository::new(pool));

    // Load service catalog
    let catalog = match &config.catalog_path {
        Some(path) => ServiceCatalog::from_file(path)?,
        None => ServiceCatalog::bundled()?,
    };
    tracing::info!("Service catalog loaded with {} services", catalog.services().len());

    let api = HttpBookingApi::new(&config.api_base_url, config.api_timeout)?;
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let state = build_state(config.clone(), Arc::new(api), catalog, repo, clock);

    // Background maintenance
    let shutdown = CancellationToken::new();
    let sweeper = session::spawn_flag_sweeper(
        state.flags.clone(),
        FLAG_SWEEP_INTERVAL,
        shutdown.clone(),
    );
    let pruner = forms::spawn_idle_pruner(
        state.forms.clone(),
        chrono::Duration::minutes(FORM_IDLE_MINUTES),
        FORM_PRUNE_INTERVAL,
        shutdown.clone(),
    );

    // Build router
    let app = create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    let stop = shutdown.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::warn!("Failed to listen for shutdown signal: {}", e);
            }
            stop.cancel();
        })
        .await?;

    shutdown.cancel();
    sweeper.await.ok();
    pruner.await.ok();
    tracing::info!("Server stopped");

    Ok(())
}

/// Wire the shared services together.
pub fn build_state(
    config: Config,
    api: Arc<dyn booking_api::BookingApi>,
    catalog: ServiceCatalog,
    repo: Arc<Repository>,
    clock: Arc<dyn Clock>,
) -> AppState {
    let catalog = Arc::new(catalog);
    let flags = Arc::new(SessionFlags::new(
        repo,
        clock.clone(),
        config.banner_duration,
    ));
    let workflow = SubmissionWorkflow::new(
        api,
        catalog.clone(),
        config.variant.clone(),
        config.id_assignment,
        clock.clone(),
    );
    let forms = Arc::new(FormStore::new(workflow, flags.clone(), clock.clone()));

    AppState {
        forms,
        flags,
        catalog,
        clock,
        config: Arc::new(config),
    }
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // API routes
    let api_routes = Router::new()
        // Catalog and availability
        .route("/services", get(api::list_services))
        .route("/availability", get(api::get_availability))
        // Booking forms
        .route("/forms", post(api::mount_form))
        .route("/forms/{id}", get(api::get_form))
        .route("/forms/{id}", delete(api::unmount_form))
        .route("/forms/{id}/fields", patch(api::set_form_field))
        .route("/forms/{id}/submit", post(api::submit_form))
        .route("/forms/{id}/modal/dismiss", post(api::dismiss_modal))
        // Submission flags
        .route("/sessions/{client_id}/flag", delete(api::clear_submission_flag))
        // Contact
        .route("/contact", post(api::send_contact_message));

    // Health check
    let health_routes = Router::new().route("/health", get(health_check));

    Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}
