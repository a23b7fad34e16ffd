//! HTTP endpoints
//!
//! REST surface over the conversation engine. Turns go through
//! `POST /api/sessions/:id/turns`; everything else is session management,
//! capability inspection, and history/analytics reads.

use axum::{
    extract::{Json, Path, Query, State},
    http::{HeaderValue, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use polyglot_agent::{TurnOutcome, TurnRequest};
use polyglot_core::{
    AudioClip, BackendUsage, CapabilityMap, IntentLabel, Language, Mode, OperationKind, TurnRecord,
};
use serde::{Deserialize, Serialize};
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    let cors_layer = build_cors_layer(
        &state.settings.server.cors_origins,
        state.settings.server.cors_enabled,
    );

    Router::new()
        // Session endpoints
        .route("/api/sessions", post(create_session))
        .route("/api/sessions/:id/turns", post(submit_turn))
        .route("/api/sessions/:id/reset", post(reset_session))
        // Capability endpoints
        .route("/api/capabilities", get(get_capabilities))
        .route("/api/capabilities/refresh", post(refresh_capabilities))
        // History and analytics
        .route("/api/history/:session_id", get(get_history))
        .route("/api/translations", get(get_translations))
        .route("/api/analytics", get(get_analytics))
        // Health check
        .route("/health", get(health_check))
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(cors_layer)
        .with_state(state)
}

/// Build CORS layer from configured origins
///
/// - cors_enabled false: permissive (development only)
/// - empty origin list: localhost:3000
fn build_cors_layer(origins: &[String], enabled: bool) -> CorsLayer {
    if !enabled {
        tracing::warn!("CORS is disabled, allowing all origins (not for production)");
        return CorsLayer::permissive();
    }

    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| {
            let value = origin.parse::<HeaderValue>().ok();
            if value.is_none() {
                tracing::warn!(origin, "invalid CORS origin, skipping");
            }
            value
        })
        .collect();

    let allowed = if parsed.is_empty() {
        tracing::info!("no CORS origins configured, defaulting to localhost:3000");
        match "http://localhost:3000".parse::<HeaderValue>() {
            Ok(value) => vec![value],
            Err(_) => return CorsLayer::permissive(),
        }
    } else {
        parsed
    };

    CorsLayer::new()
        .allow_origin(allowed)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

fn error_response(status: StatusCode, message: impl Into<String>) -> (StatusCode, Json<ErrorBody>) {
    (
        status,
        Json(ErrorBody {
            error: message.into(),
        }),
    )
}

/// Create a session with the configured defaults
async fn create_session(State(state): State<AppState>) -> (StatusCode, Json<serde_json::Value>) {
    let session_id = state.engine.create_session();
    (
        StatusCode::CREATED,
        Json(serde_json::json!({ "session_id": session_id })),
    )
}

/// One turn submitted over HTTP; exactly one of `text` or `audio`
#[derive(Debug, Deserialize)]
struct TurnBody {
    text: Option<String>,
    audio: Option<AudioClip>,
    #[serde(default)]
    mode: Mode,
    target_language: Option<Language>,
    source_language: Option<Language>,
    #[serde(default)]
    speak: bool,
}

#[derive(Debug, Serialize)]
struct TurnReply {
    session_id: String,
    sequence: u64,
    input: String,
    input_language: Language,
    intent: IntentLabel,
    response: String,
    response_language: Language,
    degraded: bool,
    fallback_occurred: bool,
    backends: BackendUsage,
    #[serde(skip_serializing_if = "Option::is_none")]
    audio: Option<AudioClip>,
}

/// Submit a turn
async fn submit_turn(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(body): Json<TurnBody>,
) -> Result<Json<TurnReply>, (StatusCode, Json<ErrorBody>)> {
    let mut request = match (body.text, body.audio) {
        (Some(text), None) => TurnRequest::text(text),
        (None, Some(clip)) => TurnRequest::audio(clip),
        _ => {
            return Err(error_response(
                StatusCode::BAD_REQUEST,
                "provide exactly one of `text` or `audio`",
            ))
        }
    };
    request.mode = body.mode;
    request.target_language = body.target_language;
    request.source_language = body.source_language;
    request.speak = body.speak;

    match state.engine.submit_turn(&session_id, request).await {
        TurnOutcome::Completed(result) => {
            let turn = result.turn;
            Ok(Json(TurnReply {
                session_id,
                sequence: turn.sequence,
                input: turn.input,
                input_language: turn.input_language,
                intent: turn.intent,
                response: turn.response,
                response_language: turn.response_language,
                degraded: turn.degraded,
                fallback_occurred: turn.fallback_occurred,
                backends: turn.backends,
                audio: result.audio,
            }))
        }
        TurnOutcome::Cancelled { .. } => Err(error_response(
            StatusCode::CONFLICT,
            "session was reset while the turn was in flight",
        )),
    }
}

/// Reset a session
async fn reset_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> StatusCode {
    if state.engine.reset_session(&session_id) {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}

#[derive(Debug, Serialize)]
struct CapabilitiesReply {
    capabilities: CapabilityMap,
    usable: serde_json::Map<String, serde_json::Value>,
}

fn capabilities_reply(map: CapabilityMap) -> Json<CapabilitiesReply> {
    let mut usable = serde_json::Map::new();
    for operation in OperationKind::ALL {
        usable.insert(
            operation.as_str().to_string(),
            serde_json::Value::Bool(map.has_usable(operation)),
        );
    }
    Json(CapabilitiesReply {
        capabilities: map,
        usable,
    })
}

/// Current capability map (probe snapshot)
async fn get_capabilities(State(state): State<AppState>) -> Json<CapabilitiesReply> {
    capabilities_reply(state.engine.router().capabilities())
}

/// Re-probe the environment; a model installed since startup shows up here
async fn refresh_capabilities(State(state): State<AppState>) -> Json<CapabilitiesReply> {
    capabilities_reply(state.engine.router().refresh_capabilities().await)
}

/// Persisted turn records for one session
async fn get_history(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<Vec<TurnRecord>>, (StatusCode, Json<ErrorBody>)> {
    match state.engine.history().load(Some(&session_id)).await {
        Ok(records) => Ok(Json(records)),
        Err(e) => {
            tracing::error!(error = %e, "failed to load history");
            Err(error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "failed to load history",
            ))
        }
    }
}

#[derive(Debug, Deserialize)]
struct TranslationsQuery {
    #[serde(default = "default_translations_limit")]
    limit: usize,
}

fn default_translations_limit() -> usize {
    20
}

/// Most recent translation log lines, newest first
async fn get_translations(
    State(state): State<AppState>,
    Query(query): Query<TranslationsQuery>,
) -> Result<Json<Vec<String>>, (StatusCode, Json<ErrorBody>)> {
    match state.engine.translations().recent(query.limit).await {
        Ok(lines) => Ok(Json(lines)),
        Err(e) => {
            tracing::error!(error = %e, "failed to load translation log");
            Err(error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "failed to load translation log",
            ))
        }
    }
}

#[derive(Debug, Deserialize)]
struct AnalyticsQuery {
    session_id: Option<String>,
}

/// Aggregate usage counters, optionally for a single session
async fn get_analytics(
    State(state): State<AppState>,
    Query(query): Query<AnalyticsQuery>,
) -> impl IntoResponse {
    Json(state.engine.get_snapshot(query.session_id.as_deref()))
}

/// Health check reporting per-operation capability
///
/// The process is healthy even when operations are degraded; what is
/// missing shows up in the checks so an operator can see what to install.
async fn health_check(State(state): State<AppState>) -> Json<serde_json::Value> {
    let map = state.engine.router().capabilities();
    let mut checks = serde_json::Map::new();
    for operation in OperationKind::ALL {
        let usable = map.has_usable(operation);
        checks.insert(
            operation.as_str().to_string(),
            serde_json::json!({
                "status": if usable { "ok" } else { "degraded" },
                "reasons": if usable { Vec::new() } else { map.reasons(operation) },
            }),
        );
    }
    let all_usable = OperationKind::ALL.iter().all(|op| map.has_usable(*op));
    Json(serde_json::json!({
        "status": if all_usable { "healthy" } else { "degraded" },
        "version": env!("CARGO_PKG_VERSION"),
        "checks": checks,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;

    async fn test_state() -> AppState {
        let dir = tempfile::tempdir().unwrap().into_path();
        let mut settings = Settings::default();
        settings.storage.history_path = dir.join("history.jsonl");
        settings.storage.translations_path = dir.join("translations.txt");
        AppState::build(settings).await.unwrap()
    }

    #[tokio::test]
    async fn test_router_creation() {
        let state = test_state().await;
        let _ = create_router(state);
    }

    #[tokio::test]
    async fn test_turn_requires_exactly_one_input() {
        let state = test_state().await;
        let body = TurnBody {
            text: None,
            audio: None,
            mode: Mode::Auto,
            target_language: None,
            source_language: None,
            speak: false,
        };
        let err = submit_turn(State(state), Path("s-1".to_string()), Json(body))
            .await
            .unwrap_err();
        assert_eq!(err.0, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_text_turn_with_no_backends_degrades() {
        let state = test_state().await;
        let body = TurnBody {
            text: Some("hello there".to_string()),
            audio: None,
            mode: Mode::Auto,
            target_language: None,
            source_language: None,
            speak: false,
        };
        let reply = submit_turn(State(state), Path("s-1".to_string()), Json(body))
            .await
            .unwrap();
        assert!(reply.0.degraded);
        assert_eq!(reply.0.sequence, 0);
        assert!(!reply.0.response.is_empty());
    }

    #[tokio::test]
    async fn test_reset_unknown_session_is_not_found() {
        let state = test_state().await;
        let status = reset_session(State(state), Path("missing".to_string())).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_create_then_reset_session() {
        let state = test_state().await;
        let (status, body) = create_session(State(state.clone())).await;
        assert_eq!(status, StatusCode::CREATED);
        let id = body.0["session_id"].as_str().unwrap().to_string();
        let status = reset_session(State(state), Path(id)).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
    }
}
