use crate::error::ApiError;
use crate::state::AppState;
use axum::{
    Json, Router,
    body::Bytes,
    extract::{DefaultBodyLimit, State, rejection::BytesRejection},
    routing::{get, post},
};
use inference::{ClassificationResult, ModelInfo};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub model_loaded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<ModelInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<usize>,
}

pub fn router(state: AppState, body_limit_bytes: usize) -> Router {
    Router::new()
        .route("/", post(classify_handler))
        .route("/classify", post(classify_handler))
        .route("/health", get(health_handler))
        .layer(DefaultBodyLimit::max(body_limit_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Classify the raw image bytes carried in the request body.
pub async fn classify_handler(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<ClassificationResult>, ApiError> {
    let started = Instant::now();
    let result = match body {
        Ok(body) => classify(&state, body).await,
        Err(rejection) => Err(ApiError::from(rejection)),
    };
    state.metrics.record(&result, started.elapsed());

    result.map(Json)
}

async fn classify(state: &AppState, body: Bytes) -> Result<ClassificationResult, ApiError> {
    if body.is_empty() {
        return Err(ApiError::EmptyBody);
    }

    let classifier = state.classifier.get_or_load().await?;
    let size = body.len();

    let result = tokio::task::spawn_blocking(move || classifier.classify(&body)).await??;

    tracing::info!(
        bytes = size,
        label = %result.label,
        confidence = result.confidence,
        index = result.index,
        "Classified image"
    );

    Ok(result)
}

pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let classifier = state.classifier.get();

    Json(HealthResponse {
        status: "healthy".to_string(),
        model_loaded: classifier.is_some(),
        model: classifier.as_ref().map(|c| c.info()),
        labels: classifier.as_ref().map(|c| c.labels().len()),
    })
}

/// Bind `addr` and serve until ctrl-c.
pub async fn serve(addr: &str, body_limit_bytes: usize, state: AppState) -> anyhow::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(addr = %listener.local_addr()?, "Gateway listening");

    axum::serve(listener, router(state, body_limit_bytes))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
