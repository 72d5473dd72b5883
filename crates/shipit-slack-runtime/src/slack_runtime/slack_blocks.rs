use serde_json::{json, Value};

pub(crate) const DEPLOY_BUTTON_ACTION_ID: &str = "deploy_button";
pub(crate) const DEPLOY_BUTTON_VALUE: &str = "click_me_123";
pub(crate) const DEPLOY_CONFIRMATION_CALLBACK_ID: &str = "deploy_confirmation_view";
pub(crate) const DEPLOYMENT_PASSWORD_BLOCK_ID: &str = "deployment_password_block";
pub(crate) const DEPLOYMENT_PASSWORD_ACTION_ID: &str = "deployment_password";
pub(crate) const INVALID_PASSWORD_MESSAGE: &str = "Invalid deployment password. Please try again.";
pub(crate) const DEPLOYMENT_STARTING_MESSAGE: &str = "Starting deployment process...";

pub(crate) fn render_mention_prompt_text(user_id: &str) -> String {
    format!("Hello <@{user_id}>, click here to deploy!")
}

pub(crate) fn render_mention_prompt_blocks(user_id: &str) -> Value {
    json!([
        {
            "type": "section",
            "text": {
                "type": "mrkdwn",
                "text": render_mention_prompt_text(user_id),
            },
            "accessory": {
                "type": "button",
                "text": {
                    "type": "plain_text",
                    "text": "Deploy",
                    "emoji": true,
                },
                "value": DEPLOY_BUTTON_VALUE,
                "action_id": DEPLOY_BUTTON_ACTION_ID,
            },
        }
    ])
}

/// Modal asking for the deployment password; `private_metadata` rides along unchanged.
pub(crate) fn render_confirmation_modal(private_metadata: Option<&str>) -> Value {
    let mut view = json!({
        "type": "modal",
        "callback_id": DEPLOY_CONFIRMATION_CALLBACK_ID,
        "title": { "type": "plain_text", "text": "Deployment Confirmation", "emoji": true },
        "submit": { "type": "plain_text", "text": "Deploy", "emoji": true },
        "close": { "type": "plain_text", "text": "Cancel", "emoji": true },
        "blocks": [
            {
                "type": "section",
                "text": {
                    "type": "mrkdwn",
                    "text": "Please enter the deployment password to confirm:",
                },
            },
            {
                "type": "input",
                "block_id": DEPLOYMENT_PASSWORD_BLOCK_ID,
                "element": {
                    "type": "plain_text_input",
                    "action_id": DEPLOYMENT_PASSWORD_ACTION_ID,
                    "placeholder": { "type": "plain_text", "text": "Enter password" },
                    "is_password": true,
                },
                "label": { "type": "plain_text", "text": "Password", "emoji": true },
            },
        ],
    });
    if let Some(private_metadata) = private_metadata {
        view["private_metadata"] = Value::String(private_metadata.to_string());
    }
    view
}

pub(crate) fn render_password_rejection_ack() -> Value {
    json!({
        "response_action": "errors",
        "errors": {
            DEPLOYMENT_PASSWORD_BLOCK_ID: INVALID_PASSWORD_MESSAGE,
        },
    })
}

pub(crate) fn render_confirmed_prompt_text(user_id: &str) -> String {
    format!(":white_check_mark: Deployment confirmed by <@{user_id}>.")
}

/// Replaces the prompt blocks so the button cannot be clicked again.
pub(crate) fn render_confirmed_prompt_blocks(user_id: &str) -> Value {
    json!([
        {
            "type": "section",
            "text": {
                "type": "mrkdwn",
                "text": render_confirmed_prompt_text(user_id),
            },
        }
    ])
}

pub(crate) fn render_deployment_started_text(user_id: &str) -> String {
    format!("Deployment triggered by <@{user_id}>! :rocket:\nIt will take about 10 minutes.")
}

pub(crate) fn render_deployment_started_blocks(user_id: &str) -> Value {
    json!([
        {
            "type": "section",
            "text": {
                "type": "mrkdwn",
                "text": format!(":white_check_mark: {}", render_deployment_started_text(user_id)),
            },
        }
    ])
}

pub(crate) fn render_deployment_failure_text(error: &str) -> String {
    format!("Failed to start deployment: {error}")
}

pub(crate) fn render_dialog_open_failure_text(error: &str) -> String {
    format!("Could not open the deployment confirmation dialog: {error}")
}

#[cfg(test)]
mod tests {
    use super::{
        render_confirmation_modal, render_deployment_started_blocks, render_mention_prompt_blocks,
        render_password_rejection_ack, DEPLOYMENT_PASSWORD_ACTION_ID, DEPLOYMENT_PASSWORD_BLOCK_ID,
    };

    #[test]
    fn unit_mention_prompt_mentions_user_and_carries_deploy_button() {
        let blocks = render_mention_prompt_blocks("U1");
        assert_eq!(
            blocks[0]["text"]["text"],
            "Hello <@U1>, click here to deploy!"
        );
        assert_eq!(blocks[0]["accessory"]["action_id"], "deploy_button");
        assert_eq!(blocks[0]["accessory"]["text"]["text"], "Deploy");
    }

    #[test]
    fn unit_confirmation_modal_masks_password_input() {
        let view = render_confirmation_modal(Some(r#"{"channelId":"C1"}"#));
        assert_eq!(view["callback_id"], "deploy_confirmation_view");
        assert_eq!(view["private_metadata"], r#"{"channelId":"C1"}"#);
        let input = &view["blocks"][1];
        assert_eq!(input["block_id"], DEPLOYMENT_PASSWORD_BLOCK_ID);
        assert_eq!(input["element"]["action_id"], DEPLOYMENT_PASSWORD_ACTION_ID);
        assert_eq!(input["element"]["is_password"], true);

        let bare = render_confirmation_modal(None);
        assert!(bare.get("private_metadata").is_none());
    }

    #[test]
    fn unit_password_rejection_ack_targets_password_block() {
        let ack = render_password_rejection_ack();
        assert_eq!(ack["response_action"], "errors");
        assert_eq!(
            ack["errors"]["deployment_password_block"],
            "Invalid deployment password. Please try again."
        );
    }

    #[test]
    fn unit_deployment_started_blocks_prefix_checkmark() {
        let blocks = render_deployment_started_blocks("U7");
        let text = blocks[0]["text"]["text"].as_str().unwrap_or_default();
        assert!(text.starts_with(":white_check_mark: Deployment triggered by <@U7>! :rocket:"));
    }
}
