//! Browser demo: test single reviews or score an uploaded CSV file.

use crate::analysis::classify_table;
use crate::core::{CsvFormat, InferenceConfig, ReviewError};
use crate::models::{ModelChoice, SentimentModel};
use crate::pipelines::sentiment_analysis::{
    SentimentAnalysisModel, SentimentAnalysisPipeline, SentimentAnalysisPipelineBuilder,
};
use crate::reviews::{demo_download_name, parse_reviews, write_scored};
use axum::{
    body::Bytes,
    extract::{rejection::JsonRejection, DefaultBodyLimit, Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

const INDEX_HTML: &str = include_str!("index.html");
const MAX_UPLOAD_BYTES: usize = 32 * 1024 * 1024;

#[derive(Clone, Default)]
pub struct DemoState {
    pub format: CsvFormat,
    pub inference: InferenceConfig,
}

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Internal(String),
}

impl From<ReviewError> for ApiError {
    fn from(err: ReviewError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message).into_response(),
            ApiError::Internal(message) => {
                tracing::error!("{message}");
                (StatusCode::INTERNAL_SERVER_ERROR, message).into_response()
            }
        }
    }
}

#[derive(Deserialize)]
struct ClassifyRequest {
    text: String,
    #[serde(default)]
    model: ModelChoice,
}

#[derive(Serialize)]
struct ClassifyResponse {
    label: String,
    score: f32,
    model: ModelChoice,
}

#[derive(Deserialize)]
struct CsvQuery {
    #[serde(default)]
    model: ModelChoice,
}

/// Models the demo can serve: anything selected by [`ModelChoice`].
pub trait DemoModel:
    SentimentAnalysisModel<Options = ModelChoice> + Clone + Send + Sync + 'static
{
}

impl<M> DemoModel for M where
    M: SentimentAnalysisModel<Options = ModelChoice> + Clone + Send + Sync + 'static
{
}

async fn load_pipeline<M: DemoModel>(
    state: &DemoState,
    model: ModelChoice,
) -> Result<SentimentAnalysisPipeline<M>, ApiError> {
    let mut builder = SentimentAnalysisPipelineBuilder::<M>::new(model)
        .device_request(state.inference.device.clone());
    if let Some(batch_size) = state.inference.batch_size {
        builder = builder.batch_size(batch_size);
    }
    builder
        .build()
        .await
        .map_err(|e| ApiError::Internal(format!("Error loading model: {e:#}")))
}

fn inference_error(err: impl std::fmt::Display) -> ApiError {
    ApiError::Internal(format!("Error during sentiment analysis: {err:#}"))
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn health() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

async fn classify<M: DemoModel>(
    State(state): State<DemoState>,
    payload: Result<Json<ClassifyRequest>, JsonRejection>,
) -> Result<Json<ClassifyResponse>, ApiError> {
    let Json(request) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    if request.text.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "Review text must not be empty.".to_string(),
        ));
    }

    let pipeline = load_pipeline::<M>(&state, request.model).await?;
    let text = request.text;
    let result = tokio::task::spawn_blocking(move || pipeline.predict(&text))
        .await
        .map_err(inference_error)?
        .map_err(inference_error)?;

    tracing::info!(model = %request.model, label = %result.label, score = result.score, "classified review");
    Ok(Json(ClassifyResponse {
        label: result.label,
        score: result.score,
        model: request.model,
    }))
}

async fn classify_csv<M: DemoModel>(
    State(state): State<DemoState>,
    Query(query): Query<CsvQuery>,
    body: Bytes,
) -> Result<Response, ApiError> {
    let table = parse_reviews(&body, &state.format)?;
    table.reviews()?;

    let pipeline = load_pipeline::<M>(&state, query.model).await?;
    let (table, results) = tokio::task::spawn_blocking(move || {
        classify_table(&pipeline, &table, |_| {}).map(|results| (table, results))
    })
    .await
    .map_err(inference_error)?
    .map_err(inference_error)?;

    let reviews = table.reviews()?;
    let mut csv = Vec::new();
    write_scored(&mut csv, &reviews, &results)
        .map_err(|e| ApiError::Internal(format!("Error writing results: {e}")))?;

    tracing::info!(model = %query.model, reviews = results.len(), "classified uploaded file");
    let disposition = format!(
        "attachment; filename=\"{}\"",
        demo_download_name(query.model)
    );
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        csv,
    )
        .into_response())
}

/// The demo routes backed by the pretrained checkpoints.
pub fn router(state: DemoState) -> Router {
    router_with::<SentimentModel>(state)
}

/// The demo routes backed by model type `M`.
pub fn router_with<M: DemoModel>(state: DemoState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/api/classify", post(classify::<M>))
        .route("/api/classify-csv", post(classify_csv::<M>))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state)
}

/// Serve the demo until Ctrl-C.
pub async fn serve(addr: SocketAddr, state: DemoState) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("demo listening on http://{}", listener.local_addr()?);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::warn!("failed to listen for shutdown signal: {e}");
            }
        })
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let response = router(DemoState::default())
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "OK");
    }

    #[tokio::test]
    async fn index_offers_both_models() {
        let response = router(DemoState::default())
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let html = body_text(response).await;
        assert!(html.contains("value=\"distilbert\" checked"));
        assert!(html.contains("value=\"roberta\""));
    }

    #[tokio::test]
    async fn empty_single_review_is_rejected() {
        let request = Request::builder()
            .method("POST")
            .uri("/api/classify")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"text": "   ", "model": "roberta"}"#))
            .unwrap();
        let response = router(DemoState::default()).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn csv_without_review_column_is_rejected() {
        let request = Request::builder()
            .method("POST")
            .uri("/api/classify-csv?model=distilbert")
            .body(Body::from("id;text\n1;Great\n"))
            .unwrap();
        let response = router(DemoState::default()).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_text(response).await, "CSV must contain a 'review' column.");
    }

    #[tokio::test]
    async fn csv_with_missing_reviews_is_rejected() {
        let request = Request::builder()
            .method("POST")
            .uri("/api/classify-csv")
            .body(Body::from("id;review\n1;Great\n2;\n"))
            .unwrap();
        let response = router(DemoState::default()).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_text(response).await.starts_with("Some reviews are missing"));
    }

    #[tokio::test]
    async fn unknown_model_in_json_is_rejected() {
        let request = Request::builder()
            .method("POST")
            .uri("/api/classify")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"text": "nice", "model": "gpt"}"#))
            .unwrap();
        let response = router(DemoState::default()).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_text(response).await.contains("not supported"));
    }

    #[tokio::test]
    async fn unknown_model_is_rejected() {
        let request = Request::builder()
            .method("POST")
            .uri("/api/classify-csv?model=gpt")
            .body(Body::from("review\nGreat\n"))
            .unwrap();
        let response = router(DemoState::default()).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
