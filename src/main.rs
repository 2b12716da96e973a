//! Publication Hub - Main Entry Point

use std::net::SocketAddr;
use std::sync::Arc;

use tower_http::trace::TraceLayer;

use publication_hub_backend::{
    api,
    config::Config,
    db,
    error::Result,
    repository::PostgresArtefactStore,
    services::{
        file_generation::DisabledFileGenerator,
        publication_file_service::PublicationFileService,
        publication_service::PublicationService,
        scheduler_service,
        search_extraction::JsonSearchExtractor,
    },
    storage, telemetry,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = Config::from_env()?;

    // Initialize tracing; the guard flushes pending spans on shutdown
    let _otel_guard = telemetry::init_tracing(config.otel_endpoint.as_deref(), "publication-hub");
    tracing::info!("Starting Publication Hub");

    // Connect to database
    let db_pool = db::create_pool(&config.database_url).await?;
    tracing::info!("Connected to database");

    // Run migrations
    sqlx::migrate!("./migrations").run(&db_pool).await?;
    tracing::info!("Database migrations complete");

    // Blob storage for payloads and rendered files
    let blob = storage::from_config(&config).await?;
    tracing::info!(backend = %config.storage_backend, "Blob storage ready");

    // Wire services
    let store = Arc::new(PostgresArtefactStore::new(db_pool));
    let publication_service = Arc::new(PublicationService::new(
        store.clone(),
        Arc::new(JsonSearchExtractor),
        blob.clone(),
    ));
    let file_service = Arc::new(PublicationFileService::new(
        blob.clone(),
        Arc::new(DisabledFileGenerator),
    ));

    // Spawn background schedulers (activation sweep, daily maintenance)
    scheduler_service::spawn_all(
        store,
        file_service.clone(),
        blob,
        config.clone(),
    );

    // Build router
    let state = Arc::new(api::AppState::new(publication_service, file_service));
    let app = api::routes::create_router(state).layer(TraceLayer::new_for_http());

    // Start server
    let addr: SocketAddr = config.bind_address.parse()?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
