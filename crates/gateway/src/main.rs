use common::TelemetryGuard;
use gateway::{AppState, ClassifierCell, GatewayConfig, logging::setup_logging, serve};
use inference::Classifier;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = GatewayConfig::from_env()?;

    // The telemetry guard installs its own subscriber with the OTLP layers.
    let _telemetry = match config.otel_endpoint.as_ref() {
        Some(endpoint) => Some(TelemetryGuard::init(
            "gateway",
            endpoint,
            config.environment,
        )?),
        None => {
            setup_logging(&config);
            None
        }
    };

    tracing::info!(config = ?config, "Loaded configuration");

    let inference_config = config.inference.clone();
    let cell = ClassifierCell::new(move || Classifier::load(&inference_config));
    let state = AppState::new(cell);

    if config.eager_load {
        if let Err(e) = state.classifier.get_or_load().await {
            tracing::error!(error = %e, "Eager model load failed, retrying on first request");
        }
    }

    serve(&config.addr, config.body_limit_bytes, state).await
}
