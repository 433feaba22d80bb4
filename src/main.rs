use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::http::HeaderValue;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use deepfake_detector_server::detection::classifier::{InputShape, ServingClassifier};
use deepfake_detector_server::detection::ffmpeg::FfmpegDecoder;
use deepfake_detector_server::{open_database, router, AppState, Config, Detector};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "deepfake_detector_server=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Deepfake Detector Server...");

    // Load configuration
    let config = Config::from_env().map_err(|e| anyhow::anyhow!(e))?;

    tracing::info!(
        "Environment: {}, Server: {}",
        config.environment,
        config.server_address()
    );

    // Open database
    let db = open_database(&config.database_path)?;

    // Load the classifier; without it no detection is possible, so abort
    let shape = InputShape::rgb(config.frame_count, config.frame_size);
    let classifier = ServingClassifier::load(
        &config.classifier_url,
        shape,
        Duration::from_secs(config.classifier_timeout_secs),
    )
    .await
    .map_err(|e| anyhow::anyhow!("Classifier failed to load: {e}"))?;

    let decoder = FfmpegDecoder::new(config.ffmpeg_path.clone(), config.ffprobe_path.clone());
    let detector = Detector::from_config(&config, Arc::new(decoder), Arc::new(classifier));

    // Configure CORS
    let origins = config
        .allowed_origins
        .iter()
        .map(|s| s.parse::<HeaderValue>())
        .collect::<Result<Vec<_>, _>>()?;
    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([axum::http::Method::GET, axum::http::Method::POST])
        .allow_headers(Any);

    let log_requests = config.log_requests;
    let addr: SocketAddr = config.server_address().parse()?;

    // Build router
    let state = AppState::new(db, config, detector);
    let mut app = router(state).layer(cors);
    if log_requests {
        app = app.layer(TraceLayer::new_for_http());
    }

    // Start server
    tracing::info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
