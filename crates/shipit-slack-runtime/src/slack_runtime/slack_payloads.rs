//! Normalization of inbound Slack payloads into deploy interactions.

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;

use crate::slack_helpers::non_empty;

use super::slack_blocks::{
    DEPLOYMENT_PASSWORD_ACTION_ID, DEPLOYMENT_PASSWORD_BLOCK_ID, DEPLOY_BUTTON_ACTION_ID,
    DEPLOY_CONFIRMATION_CALLBACK_ID,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct MentionEvent {
    pub(crate) user_id: String,
    pub(crate) channel_id: String,
    pub(crate) text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ControlActivation {
    pub(crate) trigger_id: String,
    pub(crate) user_id: String,
    pub(crate) channel_id: Option<String>,
    pub(crate) message_ts: Option<String>,
}

#[derive(Clone, PartialEq, Eq)]
pub(crate) struct DialogSubmission {
    pub(crate) user_id: String,
    pub(crate) password: Option<String>,
    pub(crate) private_metadata: Option<String>,
}

impl std::fmt::Debug for DialogSubmission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DialogSubmission")
            .field("user_id", &self.user_id)
            .field("private_metadata", &self.private_metadata)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum InboundInteraction {
    Mention(MentionEvent),
    ControlActivated(ControlActivation),
    DialogSubmitted(DialogSubmission),
}

impl InboundInteraction {
    pub(crate) fn kind(&self) -> &'static str {
        match self {
            Self::Mention(_) => "app_mention",
            Self::ControlActivated(_) => "block_actions",
            Self::DialogSubmitted(_) => "view_submission",
        }
    }
}

#[derive(Debug, Deserialize)]
struct SlackEventCallbackEnvelope {
    #[serde(rename = "type")]
    callback_type: String,
    #[serde(default)]
    event: Option<SlackEventPayload>,
}

#[derive(Debug, Deserialize)]
struct SlackEventPayload {
    #[serde(rename = "type")]
    event_type: String,
    #[serde(default)]
    subtype: Option<String>,
    #[serde(default)]
    bot_id: Option<String>,
    #[serde(default)]
    user: Option<String>,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    channel: Option<String>,
}

/// Normalizes an Events API `event_callback` body.
///
/// Returns `Ok(None)` for events the deploy bot does not react to.
pub(crate) fn normalize_event_callback(payload: &Value) -> Result<Option<InboundInteraction>> {
    let callback = serde_json::from_value::<SlackEventCallbackEnvelope>(payload.clone())
        .context("failed to decode slack event callback payload")?;
    if callback.callback_type != "event_callback" {
        return Ok(None);
    }
    let Some(event) = callback.event else {
        return Ok(None);
    };
    if event.event_type != "app_mention" {
        return Ok(None);
    }
    if event.subtype.as_deref() == Some("bot_message") || event.bot_id.is_some() {
        return Ok(None);
    }
    let Some(user_id) = non_empty(event.user.as_deref()) else {
        return Ok(None);
    };
    let Some(channel_id) = non_empty(event.channel.as_deref()) else {
        return Ok(None);
    };
    Ok(Some(InboundInteraction::Mention(MentionEvent {
        user_id,
        channel_id,
        text: event.text.unwrap_or_default(),
    })))
}

#[derive(Debug, Default, Deserialize)]
struct SlackIdRef {
    #[serde(default)]
    id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SlackBlockAction {
    #[serde(default)]
    action_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct SlackMessageRef {
    #[serde(default)]
    ts: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct SlackContainerRef {
    #[serde(default)]
    channel_id: Option<String>,
    #[serde(default)]
    message_ts: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SlackInteractionPayload {
    #[serde(rename = "type")]
    interaction_type: String,
    #[serde(default)]
    trigger_id: Option<String>,
    #[serde(default)]
    user: SlackIdRef,
    #[serde(default)]
    channel: Option<SlackIdRef>,
    #[serde(default)]
    message: Option<SlackMessageRef>,
    #[serde(default)]
    container: Option<SlackContainerRef>,
    #[serde(default)]
    actions: Vec<SlackBlockAction>,
    #[serde(default)]
    view: Option<SlackViewPayload>,
}

#[derive(Debug, Deserialize)]
struct SlackViewPayload {
    #[serde(default)]
    callback_id: Option<String>,
    #[serde(default)]
    private_metadata: Option<String>,
    #[serde(default)]
    state: Option<SlackViewState>,
}

#[derive(Debug, Deserialize)]
struct SlackViewState {
    #[serde(default)]
    values: Value,
}

/// Normalizes an interactivity payload (`block_actions` or `view_submission`).
pub(crate) fn normalize_interaction_payload(payload: &Value) -> Result<Option<InboundInteraction>> {
    let interaction = serde_json::from_value::<SlackInteractionPayload>(payload.clone())
        .context("failed to decode slack interaction payload")?;
    let Some(user_id) = non_empty(interaction.user.id.as_deref()) else {
        return Ok(None);
    };

    match interaction.interaction_type.as_str() {
        "block_actions" => {
            let clicked_deploy = interaction
                .actions
                .iter()
                .any(|action| action.action_id.as_deref() == Some(DEPLOY_BUTTON_ACTION_ID));
            if !clicked_deploy {
                return Ok(None);
            }
            let Some(trigger_id) = non_empty(interaction.trigger_id.as_deref()) else {
                return Ok(None);
            };
            let container = interaction.container.unwrap_or_default();
            let channel_id = interaction
                .channel
                .and_then(|channel| non_empty(channel.id.as_deref()))
                .or_else(|| non_empty(container.channel_id.as_deref()));
            let message_ts = interaction
                .message
                .and_then(|message| non_empty(message.ts.as_deref()))
                .or_else(|| non_empty(container.message_ts.as_deref()));
            Ok(Some(InboundInteraction::ControlActivated(
                ControlActivation {
                    trigger_id,
                    user_id,
                    channel_id,
                    message_ts,
                },
            )))
        }
        "view_submission" => {
            let Some(view) = interaction.view else {
                return Ok(None);
            };
            if view.callback_id.as_deref() != Some(DEPLOY_CONFIRMATION_CALLBACK_ID) {
                return Ok(None);
            }
            let password = view.state.as_ref().and_then(|state| {
                state.values[DEPLOYMENT_PASSWORD_BLOCK_ID][DEPLOYMENT_PASSWORD_ACTION_ID]["value"]
                    .as_str()
                    .map(ToOwned::to_owned)
            });
            Ok(Some(InboundInteraction::DialogSubmitted(DialogSubmission {
                user_id,
                password,
                private_metadata: view.private_metadata,
            })))
        }
        _ => Ok(None),
    }
}

/// Extracts and decodes the `payload=` field of a form-encoded interactivity body.
pub(crate) fn decode_form_payload(body: &[u8]) -> Result<Value> {
    let raw = form_urlencoded::parse(body)
        .find(|(key, _)| key == "payload")
        .map(|(_, value)| value.into_owned())
        .context("slack interactivity body is missing the payload field")?;
    serde_json::from_str::<Value>(&raw).context("slack interactivity payload is not valid json")
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{
        decode_form_payload, normalize_event_callback, normalize_interaction_payload,
        ControlActivation, InboundInteraction, MentionEvent,
    };

    fn block_actions_payload() -> serde_json::Value {
        json!({
            "type": "block_actions",
            "trigger_id": "T1",
            "user": { "id": "U1" },
            "channel": { "id": "C1" },
            "message": { "ts": "123.45" },
            "actions": [{ "action_id": "deploy_button", "value": "click_me_123" }],
        })
    }

    #[test]
    fn unit_normalize_event_callback_extracts_app_mention() {
        let payload = json!({
            "type": "event_callback",
            "event": {
                "type": "app_mention",
                "user": "U1",
                "channel": "C1",
                "text": "<@UBOT> deploy",
                "ts": "1.1",
            },
        });
        let interaction = normalize_event_callback(&payload)
            .expect("normalize")
            .expect("mention");
        assert_eq!(
            interaction,
            InboundInteraction::Mention(MentionEvent {
                user_id: "U1".to_string(),
                channel_id: "C1".to_string(),
                text: "<@UBOT> deploy".to_string(),
            })
        );
    }

    #[test]
    fn regression_normalize_event_callback_ignores_bot_and_userless_events() {
        let bot = json!({
            "type": "event_callback",
            "event": { "type": "app_mention", "subtype": "bot_message", "user": "U1", "channel": "C1" },
        });
        assert!(normalize_event_callback(&bot).expect("normalize").is_none());

        let userless = json!({
            "type": "event_callback",
            "event": { "type": "app_mention", "channel": "C1" },
        });
        assert!(normalize_event_callback(&userless).expect("normalize").is_none());

        let other = json!({
            "type": "event_callback",
            "event": { "type": "reaction_added", "user": "U1" },
        });
        assert!(normalize_event_callback(&other).expect("normalize").is_none());
    }

    #[test]
    fn unit_normalize_block_actions_captures_channel_and_message_ts() {
        let interaction = normalize_interaction_payload(&block_actions_payload())
            .expect("normalize")
            .expect("activation");
        assert_eq!(
            interaction,
            InboundInteraction::ControlActivated(ControlActivation {
                trigger_id: "T1".to_string(),
                user_id: "U1".to_string(),
                channel_id: Some("C1".to_string()),
                message_ts: Some("123.45".to_string()),
            })
        );
    }

    #[test]
    fn functional_normalize_block_actions_falls_back_to_container_ids() {
        let payload = json!({
            "type": "block_actions",
            "trigger_id": "T2",
            "user": { "id": "U2" },
            "container": { "channel_id": "C2", "message_ts": "9.9" },
            "actions": [{ "action_id": "deploy_button" }],
        });
        let Some(InboundInteraction::ControlActivated(activation)) =
            normalize_interaction_payload(&payload).expect("normalize")
        else {
            panic!("expected control activation");
        };
        assert_eq!(activation.channel_id.as_deref(), Some("C2"));
        assert_eq!(activation.message_ts.as_deref(), Some("9.9"));
    }

    #[test]
    fn regression_normalize_block_actions_ignores_unrelated_actions() {
        let mut payload = block_actions_payload();
        payload["actions"] = json!([{ "action_id": "something_else" }]);
        assert!(normalize_interaction_payload(&payload)
            .expect("normalize")
            .is_none());
    }

    #[test]
    fn unit_normalize_view_submission_reads_password_and_metadata() {
        let payload = json!({
            "type": "view_submission",
            "user": { "id": "U1" },
            "view": {
                "callback_id": "deploy_confirmation_view",
                "private_metadata": "{\"channelId\":\"C1\"}",
                "state": { "values": {
                    "deployment_password_block": {
                        "deployment_password": { "type": "plain_text_input", "value": "hunter2" }
                    }
                }},
            },
        });
        let Some(InboundInteraction::DialogSubmitted(submission)) =
            normalize_interaction_payload(&payload).expect("normalize")
        else {
            panic!("expected dialog submission");
        };
        assert_eq!(submission.password.as_deref(), Some("hunter2"));
        assert_eq!(
            submission.private_metadata.as_deref(),
            Some("{\"channelId\":\"C1\"}")
        );
        assert!(!format!("{submission:?}").contains("hunter2"));
    }

    #[test]
    fn regression_normalize_view_submission_tolerates_missing_password_value() {
        let payload = json!({
            "type": "view_submission",
            "user": { "id": "U1" },
            "view": { "callback_id": "deploy_confirmation_view", "state": { "values": {} } },
        });
        let Some(InboundInteraction::DialogSubmitted(submission)) =
            normalize_interaction_payload(&payload).expect("normalize")
        else {
            panic!("expected dialog submission");
        };
        assert_eq!(submission.password, None);
        assert_eq!(submission.private_metadata, None);
    }

    #[test]
    fn unit_decode_form_payload_reads_urlencoded_json() {
        let body = b"payload=%7B%22type%22%3A%22block_actions%22%7D";
        let payload = decode_form_payload(body).expect("decode");
        assert_eq!(payload["type"], "block_actions");
        assert!(decode_form_payload(b"token=abc").is_err());
    }
}
