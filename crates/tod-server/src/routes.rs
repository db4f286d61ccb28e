//! API routes for tod-server

use std::any::Any;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use serde_json::{Map, Value};
use tod_core::{CardRequest, CardSource, GeneratedCard, ValidationResult};
use tod_generator::{CardOutcome, GenerationProvider, Pause};
use tracing::{error, info, warn};

use crate::server::AppState;

type AppStateArc<P, W> = Arc<AppState<P, W>>;

/// Accepted spellings of each request field, preferred first.
const CONTENT_TYPE_FIELDS: [&str; 2] = ["contentType", "type"];
const DIFFICULTY_FIELDS: [&str; 2] = ["difficultyLevel", "level"];
const CATEGORY_FIELDS: [&str; 1] = ["category"];

// ============================================================================
// Response bodies
// ============================================================================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CardResponse {
    success: bool,
    card: String,
    source: CardSource,
    timestamp: String,
    content_type: String,
    difficulty_level: String,
    category: String,
    attempts: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    validation: Option<ValidationBody>,
    #[serde(skip_serializing_if = "Option::is_none")]
    debug: Option<DebugBody>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ValidationBody {
    is_valid: bool,
    violations: Vec<ViolationBody>,
    #[serde(skip_serializing_if = "Option::is_none")]
    score: Option<f64>,
}

#[derive(Serialize)]
struct ViolationBody {
    rule: &'static str,
    message: String,
}

impl From<&ValidationResult> for ValidationBody {
    fn from(result: &ValidationResult) -> Self {
        Self {
            is_valid: result.is_valid,
            violations: result
                .violations
                .iter()
                .map(|v| ViolationBody {
                    rule: v.rule.id(),
                    message: v.message.clone(),
                })
                .collect(),
            score: result.score,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DebugBody {
    raw_text: Option<String>,
    cleaned_text: Option<String>,
    validation_errors: Vec<String>,
}

impl From<&CardOutcome> for DebugBody {
    fn from(outcome: &CardOutcome) -> Self {
        let last = outcome.last_attempt();
        Self {
            raw_text: last.and_then(|a| a.raw_text.clone()),
            cleaned_text: last.and_then(|a| a.cleaned_text.clone()),
            validation_errors: last
                .and_then(|a| a.validation.as_ref())
                .map(|v| v.violations.iter().map(|v| v.format()).collect())
                .unwrap_or_default(),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorResponse {
    success: bool,
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    received: Option<Map<String, Value>>,
}

/// A request field under the spelling the caller used for it.
struct Field {
    key: &'static str,
    value: Value,
}

impl Field {
    /// First present, non-null spelling, or the preferred one with `null`.
    fn lookup(body: &Value, names: &[&'static str]) -> Self {
        debug_assert!(!names.is_empty(), "Field needs at least one spelling");

        let found = names
            .iter()
            .filter_map(|name| body.get(*name).map(|value| (*name, value)))
            .find(|(_, value)| !value.is_null());

        match found {
            Some((key, value)) => Self {
                key,
                value: value.clone(),
            },
            None => Self {
                key: names[0],
                value: Value::Null,
            },
        }
    }

    /// The value as a non-blank string.
    fn as_str(&self) -> Option<&str> {
        self.value.as_str().filter(|s| !s.trim().is_empty())
    }
}

/// Request fields echoed back exactly as sent.
fn received(fields: &[Field]) -> Map<String, Value> {
    fields
        .iter()
        .map(|field| (field.key.to_string(), field.value.clone()))
        .collect()
}

fn error_response(
    status: StatusCode,
    error: impl Into<String>,
    received: Option<Map<String, Value>>,
) -> Response {
    let body = ErrorResponse {
        success: false,
        error: error.into(),
        method: None,
        received,
    };
    (status, Json(body)).into_response()
}

// ============================================================================
// Card Routes
// ============================================================================

pub fn card_routes<P, W>(route: &str) -> Router<AppStateArc<P, W>>
where
    P: GenerationProvider + 'static,
    W: Pause + 'static,
{
    Router::new().route(
        route,
        post(create_card::<P, W>)
            .options(preflight)
            .fallback(method_not_allowed),
    )
}

async fn preflight() -> StatusCode {
    StatusCode::OK
}

async fn method_not_allowed(method: Method) -> Response {
    let body = ErrorResponse {
        success: false,
        error: "Only POST method allowed".to_string(),
        method: Some(method.to_string()),
        received: None,
    };
    (StatusCode::METHOD_NOT_ALLOWED, Json(body)).into_response()
}

async fn create_card<P, W>(State(state): State<AppStateArc<P, W>>, body: Bytes) -> Response
where
    P: GenerationProvider + 'static,
    W: Pause + 'static,
{
    // Anything that is not a JSON object has no fields.
    let body: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    let fields = [
        Field::lookup(&body, &CONTENT_TYPE_FIELDS),
        Field::lookup(&body, &DIFFICULTY_FIELDS),
        Field::lookup(&body, &CATEGORY_FIELDS),
    ];

    let (content_type, difficulty_level, category) = match (
        fields[0].as_str(),
        fields[1].as_str(),
        fields[2].as_str(),
    ) {
        (Some(t), Some(l), Some(c)) => (t.to_string(), l.to_string(), c.to_string()),
        _ => {
            warn!("Rejecting request with missing fields");
            return error_response(
                StatusCode::BAD_REQUEST,
                "Missing required fields: contentType, difficultyLevel, category",
                Some(received(&fields)),
            );
        }
    };

    let request = match CardRequest::parse(
        &content_type,
        &difficulty_level,
        &category,
        state.category_chars_max,
    ) {
        Ok(request) => request,
        Err(e) => {
            warn!("Rejecting request: {}", e);
            return error_response(
                StatusCode::BAD_REQUEST,
                e.to_string(),
                Some(received(&fields)),
            );
        }
    };

    let Some(generator) = state.generator.clone() else {
        error!("Card requested but provider credential is missing");
        return error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("{} API key not configured on server", state.provider_kind.label()),
            None,
        );
    };

    info!(
        content_type = request.content_type.name(),
        level = request.difficulty_level.name(),
        category = %request.category,
        "Card requested"
    );

    // Run the pipeline on its own task so a panic becomes a JoinError.
    let task = {
        let generator = Arc::clone(&generator);
        let dedup = Arc::clone(&state.dedup);
        let request = request.clone();
        tokio::spawn(async move { generator.generate(&request, dedup.as_ref()).await })
    };

    let response = match task.await {
        Ok(outcome) => {
            info!(
                source = outcome.card.source.name(),
                attempts = outcome.card.attempts_count,
                "Card served"
            );
            let debug = state.diagnostics.then(|| DebugBody::from(&outcome));
            card_response(outcome.card, content_type, difficulty_level, category, debug, None)
        }
        Err(e) => {
            let message = if e.is_panic() {
                panic_message(e.into_panic())
            } else {
                e.to_string()
            };
            error!("Card pipeline failed: {}", message);

            let card = generator.fallback_after_error(&request, state.dedup.as_ref());
            card_response(
                card,
                request.content_type.name().to_string(),
                request.difficulty_level.name().to_string(),
                request.category.clone(),
                None,
                Some(message),
            )
        }
    };

    (StatusCode::OK, Json(response)).into_response()
}

fn card_response(
    card: GeneratedCard,
    content_type: String,
    difficulty_level: String,
    category: String,
    debug: Option<DebugBody>,
    error: Option<String>,
) -> CardResponse {
    CardResponse {
        success: true,
        validation: card.validation.as_ref().map(ValidationBody::from),
        attempts: card.attempts_count,
        card: card.text,
        source: card.source,
        timestamp: chrono::Utc::now().to_rfc3339(),
        content_type,
        difficulty_level,
        category,
        debug,
        error,
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "internal error".to_string()
    }
}

// ============================================================================
// Health Routes
// ============================================================================

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    provider: &'static str,
}

pub fn health_routes<P, W>() -> Router<AppStateArc<P, W>>
where
    P: GenerationProvider + 'static,
    W: Pause + 'static,
{
    Router::new().route("/healthz", get(health_check::<P, W>))
}

async fn health_check<P, W>(State(state): State<AppStateArc<P, W>>) -> Json<HealthResponse>
where
    P: GenerationProvider + 'static,
    W: Pause + 'static,
{
    Json(HealthResponse {
        status: "ok",
        provider: state.provider_name(),
    })
}
