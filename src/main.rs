use std::sync::Arc;

use metrics_exporter_prometheus::PrometheusBuilder;
use tracing_subscriber::EnvFilter;

use document_intake::app_state::{AppState, IntakeLimits};
use document_intake::config::AppConfig;
use document_intake::db::{self, store::PgStore};
use document_intake::routes;
use document_intake::sequencer::Sequencer;
use document_intake::services::extraction::client::AnalysisClient;
use document_intake::services::notify::WebhookClient;
use document_intake::services::pipeline::{JobProcessor, Services};
use document_intake::services::storage::S3Store;

#[tokio::main]
async fn main() {
    // Initialize structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    // Load configuration from environment
    let config = AppConfig::from_env().expect("Failed to load configuration from environment");

    tracing::info!("Initializing document-intake server");

    let prometheus_handle = PrometheusBuilder::new()
        .install_recorder()
        .expect("Failed to install Prometheus metrics recorder");
    let prometheus_handle = Arc::new(prometheus_handle);
    routes::metrics::describe();

    tracing::info!(
        attempts = config.db_connect_retries,
        "Connecting to PostgreSQL database"
    );
    let db_pool = db::connect_with_retry(
        &config.database_url,
        config.db_connect_retries,
        config.db_retry_delay(),
    )
    .await
    .expect("Failed to connect to database");

    tracing::info!("Running database migrations");
    db::run_migrations(&db_pool)
        .await
        .expect("Failed to run database migrations");

    tracing::info!(bucket = %config.s3_bucket, region = %config.s3_region, "Initializing S3 storage client");
    let storage = S3Store::new(
        &config.s3_bucket,
        &config.s3_region,
        &config.s3_endpoint,
        &config.s3_access_key,
        &config.s3_secret_key,
    )
    .expect("Failed to initialize S3 client");

    let extraction = AnalysisClient::new(&config.extraction_endpoint, &config.extraction_api_token);
    let notifier = WebhookClient::new(&config.document_webhook_url, &config.expenditure_webhook_url);
    let persistence = Arc::new(PgStore::new(db_pool));

    let services = Services {
        storage: Arc::new(storage),
        extraction: Arc::new(extraction),
        persistence: persistence.clone(),
        notifier: Arc::new(notifier),
    };
    let processor = JobProcessor::new(services, config.poll_policy());

    let (sequencer, _sequencer_task) =
        Sequencer::spawn(Arc::new(processor), config.sequencer_config());

    let limits = IntakeLimits {
        max_files: config.max_upload_files,
        max_body_bytes: config.max_upload_bytes,
    };
    let state = AppState::new(persistence, sequencer, limits);
    let app = routes::router(state, Some(prometheus_handle));

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app)
        .await
        .expect("Server error");
}
