//! HTTP webhook receiver for Slack Events API and interactivity requests.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header::CONTENT_TYPE, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use shipit_core::current_unix_timestamp;

use crate::slack_signature::{
    verify_slack_request, SLACK_SIGNATURE_HEADER, SLACK_TIMESTAMP_HEADER,
};

use super::interaction_handler::DeployInteractionHandler;
use super::slack_payloads::{
    decode_form_payload, normalize_event_callback, normalize_interaction_payload,
    InboundInteraction,
};
use super::plan_interaction;

pub(crate) struct SlackWebhookState {
    pub(crate) handler: Arc<DeployInteractionHandler>,
    pub(crate) signing_secret: String,
    pub(crate) max_skew_seconds: u64,
}

pub(crate) fn build_webhook_router(state: Arc<SlackWebhookState>, events_path: &str) -> Router {
    Router::new()
        .route(events_path, post(handle_slack_request))
        .route("/healthz", get(handle_webhook_health))
        .with_state(state)
}

async fn handle_webhook_health() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({"status":"ok"})))
}

fn error_response(status: StatusCode, code: &str, message: &str) -> Response {
    (
        status,
        Json(json!({"error":{"code":code,"message":message}})),
    )
        .into_response()
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> &'a str {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .unwrap_or("")
}

async fn handle_slack_request(
    State(state): State<Arc<SlackWebhookState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if let Err(error) = verify_slack_request(
        &body,
        header_str(&headers, SLACK_SIGNATURE_HEADER),
        header_str(&headers, SLACK_TIMESTAMP_HEADER),
        &state.signing_secret,
        current_unix_timestamp(),
        state.max_skew_seconds,
    ) {
        tracing::warn!(error = %error, "rejected slack request with invalid signature");
        return error_response(
            StatusCode::UNAUTHORIZED,
            "invalid_signature",
            "slack request signature verification failed",
        );
    }

    let content_type = header_str(&headers, CONTENT_TYPE.as_str()).to_ascii_lowercase();
    if content_type.starts_with("application/x-www-form-urlencoded") {
        return handle_interaction_body(&state, &body);
    }
    handle_event_body(&state, &body)
}

fn handle_event_body(state: &SlackWebhookState, body: &[u8]) -> Response {
    let payload = match serde_json::from_slice::<Value>(body) {
        Ok(payload) => payload,
        Err(error) => {
            tracing::warn!(error = %error, "invalid slack events payload json");
            return error_response(
                StatusCode::BAD_REQUEST,
                "parse_failed",
                "invalid slack events payload",
            );
        }
    };

    if payload["type"].as_str() == Some("url_verification") {
        let challenge = payload["challenge"].as_str().unwrap_or_default();
        return (StatusCode::OK, Json(json!({ "challenge": challenge }))).into_response();
    }

    match normalize_event_callback(&payload) {
        Ok(Some(interaction)) => dispatch(state, interaction),
        Ok(None) => StatusCode::OK.into_response(),
        Err(error) => {
            tracing::warn!(error = %error, "failed to normalize slack event callback");
            StatusCode::OK.into_response()
        }
    }
}

fn handle_interaction_body(state: &SlackWebhookState, body: &[u8]) -> Response {
    let payload = match decode_form_payload(body) {
        Ok(payload) => payload,
        Err(error) => {
            tracing::warn!(error = %error, "invalid slack interactivity body");
            return error_response(
                StatusCode::BAD_REQUEST,
                "parse_failed",
                "invalid slack interactivity payload",
            );
        }
    };
    match normalize_interaction_payload(&payload) {
        Ok(Some(interaction)) => dispatch(state, interaction),
        Ok(None) => StatusCode::OK.into_response(),
        Err(error) => {
            tracing::warn!(error = %error, "failed to normalize slack interaction payload");
            StatusCode::OK.into_response()
        }
    }
}

fn dispatch(state: &SlackWebhookState, interaction: InboundInteraction) -> Response {
    tracing::debug!(kind = interaction.kind(), "received slack interaction");
    let plan = plan_interaction(&state.handler, interaction);
    let response = match plan.ack_payload() {
        Some(ack) => (StatusCode::OK, Json(ack)).into_response(),
        None => StatusCode::OK.into_response(),
    };
    plan.spawn(Arc::clone(&state.handler));
    response
}
