//! HTTP API over a shared [`AutomaticTranslator`].

use crate::config::DEFAULT_CONCURRENCY;
use crate::error::{AutotranslateError, Result};
use crate::translate::{AutomaticTranslator, ProviderStatus, TranslationOptions, TranslationResult};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

#[derive(Clone)]
pub struct AppState {
    pub translator: Arc<AutomaticTranslator>,
    /// Parallel texts per `/translate/batch` request.
    pub concurrency: usize,
}

impl AppState {
    pub fn new(translator: Arc<AutomaticTranslator>) -> Self {
        Self {
            translator,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    providers: Vec<String>,
    timestamp: String,
}

#[derive(Serialize)]
struct ProvidersResponse {
    providers: Vec<String>,
}

#[derive(Serialize)]
struct AllProvidersResponse {
    providers: Vec<ProviderStatus>,
    total: usize,
    available: usize,
}

#[derive(Serialize)]
struct TranslateResponse {
    success: bool,
    #[serde(flatten)]
    result: TranslationResult,
}

#[derive(Serialize)]
struct BatchResponse {
    success: bool,
    results: Vec<TranslationResult>,
}

#[derive(Serialize)]
struct ResetResponse {
    success: bool,
    message: &'static str,
    providers: Vec<String>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    success: Option<bool>,
    error: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn bad_request(message: impl Into<String>) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            success: None,
            error: message.into(),
        }),
    )
}

fn translation_failed(err: AutotranslateError) -> ApiError {
    let status = if err.is_precondition() {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    (
        status,
        Json(ErrorResponse {
            success: Some(false),
            error: err.to_string(),
        }),
    )
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/providers", get(list_providers))
        .route("/providers/all", get(list_all_providers))
        .route("/providers/reset", post(reset_providers))
        .route("/translate", post(translate))
        .route("/translate/batch", post(translate_batch))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bind `0.0.0.0:port` and serve until the process is stopped.
pub async fn serve(state: AppState, port: u16) -> Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("Translation API server running on http://localhost:{}", port);
    info!(
        "Available providers: {}",
        state.translator.list_available().join(", ")
    );

    axum::serve(listener, router(state)).await?;
    Ok(())
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        providers: state.translator.list_available(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

async fn list_providers(State(state): State<AppState>) -> Json<ProvidersResponse> {
    Json(ProvidersResponse {
        providers: state.translator.list_available(),
    })
}

async fn list_all_providers(State(state): State<AppState>) -> Json<AllProvidersResponse> {
    let providers = state.translator.list_all();
    let available = providers.iter().filter(|p| p.available).count();
    Json(AllProvidersResponse {
        total: providers.len(),
        available,
        providers,
    })
}

async fn reset_providers(State(state): State<AppState>) -> Json<ResetResponse> {
    state.translator.reset_rotation();
    Json(ResetResponse {
        success: true,
        message: "Providers reset successfully",
        providers: state.translator.list_available(),
    })
}

async fn translate(
    State(state): State<AppState>,
    body: std::result::Result<Json<Value>, JsonRejection>,
) -> std::result::Result<Json<TranslateResponse>, ApiError> {
    let Json(body) = body.map_err(|e| bad_request(e.body_text()))?;

    let text = match body.get("text") {
        Some(Value::String(text)) if !text.is_empty() => text.as_str(),
        _ => return Err(bad_request("Text is required and must be a string")),
    };
    let options = parse_options(&body)?;

    let result = state
        .translator
        .translate(text, &options)
        .await
        .map_err(|e| {
            error!("Translation error: {}", e);
            translation_failed(e)
        })?;

    Ok(Json(TranslateResponse {
        success: true,
        result,
    }))
}

async fn translate_batch(
    State(state): State<AppState>,
    body: std::result::Result<Json<Value>, JsonRejection>,
) -> std::result::Result<Json<BatchResponse>, ApiError> {
    let Json(body) = body.map_err(|e| bad_request(e.body_text()))?;

    let texts: Vec<&str> = match body.get("texts") {
        Some(Value::Array(items)) => items
            .iter()
            .map(Value::as_str)
            .collect::<Option<_>>()
            .ok_or_else(|| bad_request("texts must be an array of strings"))?,
        _ => return Err(bad_request("texts must be an array of strings")),
    };
    let options = parse_options(&body)?;

    let results = state
        .translator
        .translate_batch(&texts, &options, state.concurrency)
        .await
        .map_err(|e| {
            error!("Batch translation error: {}", e);
            translation_failed(e)
        })?;

    Ok(Json(BatchResponse {
        success: true,
        results,
    }))
}

/// Shared option fields of both translate bodies.
fn parse_options(body: &Value) -> std::result::Result<TranslationOptions, ApiError> {
    let target = match body.get("targetLanguage") {
        Some(Value::String(target)) if !target.is_empty() => target,
        _ => return Err(bad_request("targetLanguage is required and must be a string")),
    };

    let mut options = TranslationOptions::new(target.as_str());
    options.source_language = non_empty_str(body.get("sourceLanguage"));
    options.specific_provider = non_empty_str(body.get("provider"));
    options.chunk_size = body.get("chunkSize").and_then(parse_chunk_size);
    Ok(options)
}

fn non_empty_str(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Accepts `120` or `"120"`. A string is read up to its first non-digit;
/// anything unusable leaves the chunk size to its default.
fn parse_chunk_size(value: &Value) -> Option<usize> {
    let size = match value {
        Value::Number(n) => n.as_u64().map(|n| n as usize),
        Value::String(s) => {
            let digits: String = s
                .trim_start()
                .chars()
                .take_while(|c| c.is_ascii_digit())
                .collect();
            digits.parse().ok()
        }
        _ => None,
    };
    size.filter(|&n| n > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_chunk_size() {
        assert_eq!(parse_chunk_size(&json!(120)), Some(120));
        assert_eq!(parse_chunk_size(&json!("80")), Some(80));
        assert_eq!(parse_chunk_size(&json!("64px")), Some(64));
        assert_eq!(parse_chunk_size(&json!("abc")), None);
        assert_eq!(parse_chunk_size(&json!(0)), None);
        assert_eq!(parse_chunk_size(&json!(-5)), None);
        assert_eq!(parse_chunk_size(&json!(true)), None);
    }

    #[test]
    fn test_parse_options() {
        let body = json!({
            "text": "Hello",
            "targetLanguage": "es",
            "sourceLanguage": "en",
            "chunkSize": "100",
            "provider": "Lingva"
        });
        let options = parse_options(&body).unwrap();
        assert_eq!(options.target_language, "es");
        assert_eq!(options.source_language.as_deref(), Some("en"));
        assert_eq!(options.chunk_size, Some(100));
        assert_eq!(options.specific_provider.as_deref(), Some("Lingva"));
    }

    #[test]
    fn test_parse_options_requires_target() {
        let (status, Json(body)) = parse_options(&json!({"targetLanguage": 5})).unwrap_err();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.error, "targetLanguage is required and must be a string");

        assert!(parse_options(&json!({"targetLanguage": ""})).is_err());
    }

    #[test]
    fn test_precondition_errors_are_bad_requests() {
        let (status, Json(body)) = translation_failed(AutotranslateError::EmptyText);
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.success, Some(false));

        let (status, _) = translation_failed(AutotranslateError::ProviderRateLimited("X".into()));
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
