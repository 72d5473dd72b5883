//! Slack Socket Mode transport for local development.

use std::{sync::Arc, time::Duration};

use anyhow::{Context, Result};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio_tungstenite::{connect_async, tungstenite::Message as WsMessage};

use super::interaction_handler::DeployInteractionHandler;
use super::slack_api_client::SlackApiClient;
use super::slack_payloads::{
    normalize_event_callback, normalize_interaction_payload, InboundInteraction,
};
use super::{plan_interaction, InteractionPlan};

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct SlackSocketEnvelope {
    /// Absent on `hello` and `disconnect` frames.
    #[serde(default)]
    pub(crate) envelope_id: Option<String>,
    #[serde(rename = "type")]
    pub(crate) envelope_type: String,
    #[serde(default)]
    pub(crate) payload: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SocketSessionEnd {
    Shutdown,
    Closed,
    Disconnect,
}

impl SocketSessionEnd {
    fn as_str(self) -> &'static str {
        match self {
            Self::Shutdown => "shutdown",
            Self::Closed => "closed",
            Self::Disconnect => "disconnect",
        }
    }
}

pub(crate) async fn run_socket_mode_loop(
    slack: &SlackApiClient,
    handler: Arc<DeployInteractionHandler>,
    reconnect_delay: Duration,
) -> Result<()> {
    loop {
        match slack.open_socket_connection().await {
            Ok(socket_url) => {
                tracing::info!("slack socket mode connected");
                match run_socket_session(&handler, &socket_url).await {
                    Ok(SocketSessionEnd::Shutdown) => {
                        tracing::info!("slack socket mode shutdown requested");
                        return Ok(());
                    }
                    Ok(end) => tracing::info!(reason = end.as_str(), "slack socket session ended"),
                    Err(error) => tracing::warn!(error = %error, "slack socket session error"),
                }
            }
            Err(error) => {
                tracing::warn!(error = %error, "failed to open slack socket connection");
            }
        }

        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("slack socket mode shutdown requested");
                return Ok(());
            }
            _ = tokio::time::sleep(reconnect_delay) => {}
        }
    }
}

async fn run_socket_session(
    handler: &Arc<DeployInteractionHandler>,
    socket_url: &str,
) -> Result<SocketSessionEnd> {
    let (stream, _response) = connect_async(socket_url)
        .await
        .context("failed to connect slack socket mode websocket")?;
    let (mut sink, mut source) = stream.split();

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                return Ok(SocketSessionEnd::Shutdown);
            }
            maybe_message = source.next() => {
                let Some(message_result) = maybe_message else {
                    return Ok(SocketSessionEnd::Closed);
                };
                let message = message_result.context("failed reading slack websocket message")?;
                if matches!(message, WsMessage::Close(_)) {
                    return Ok(SocketSessionEnd::Closed);
                }
                let envelope = match parse_socket_envelope(message) {
                    Ok(Some(envelope)) => envelope,
                    Ok(None) => continue,
                    Err(error) => {
                        tracing::warn!(error = %error, "dropping unreadable slack socket frame");
                        continue;
                    }
                };
                if envelope.envelope_type == "disconnect" {
                    return Ok(SocketSessionEnd::Disconnect);
                }

                let plan = plan_socket_envelope(handler, &envelope);
                if let Some(envelope_id) = envelope.envelope_id.as_deref() {
                    let ack = render_socket_ack(envelope_id, plan.ack_payload().as_ref());
                    sink.send(WsMessage::Text(ack.into()))
                        .await
                        .context("failed to send slack socket ack")?;
                }
                plan.spawn(Arc::clone(handler));
            }
        }
    }
}

pub(crate) fn parse_socket_envelope(message: WsMessage) -> Result<Option<SlackSocketEnvelope>> {
    let text = match message {
        WsMessage::Text(text) => text.to_string(),
        WsMessage::Binary(bytes) => {
            String::from_utf8(bytes.to_vec()).context("invalid utf-8 slack socket payload")?
        }
        WsMessage::Ping(_) | WsMessage::Pong(_) | WsMessage::Close(_) | WsMessage::Frame(_) => {
            return Ok(None)
        }
    };
    let envelope = serde_json::from_str::<SlackSocketEnvelope>(&text)
        .context("failed to parse slack socket envelope")?;
    Ok(Some(envelope))
}

pub(crate) fn normalize_socket_envelope(
    envelope: &SlackSocketEnvelope,
) -> Result<Option<InboundInteraction>> {
    match envelope.envelope_type.as_str() {
        "events_api" => normalize_event_callback(&envelope.payload),
        "interactive" => normalize_interaction_payload(&envelope.payload),
        _ => Ok(None),
    }
}

pub(crate) fn plan_socket_envelope(
    handler: &DeployInteractionHandler,
    envelope: &SlackSocketEnvelope,
) -> InteractionPlan {
    match normalize_socket_envelope(envelope) {
        Ok(Some(interaction)) => {
            tracing::debug!(
                kind = interaction.kind(),
                envelope_id = envelope.envelope_id.as_deref().unwrap_or_default(),
                "received slack interaction"
            );
            plan_interaction(handler, interaction)
        }
        Ok(None) => InteractionPlan::Ignore,
        Err(error) => {
            tracing::warn!(
                envelope_type = %envelope.envelope_type,
                error = %error,
                "failed to normalize slack socket envelope"
            );
            InteractionPlan::Ignore
        }
    }
}

pub(crate) fn render_socket_ack(envelope_id: &str, payload: Option<&Value>) -> String {
    match payload {
        Some(payload) => json!({ "envelope_id": envelope_id, "payload": payload }).to_string(),
        None => json!({ "envelope_id": envelope_id }).to_string(),
    }
}
