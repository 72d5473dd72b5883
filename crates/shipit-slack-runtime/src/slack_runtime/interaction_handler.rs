//! Deploy interaction flow: mention prompt, confirmation modal, trigger, report.

use anyhow::Result;
use serde_json::Value;

use crate::deploy_trigger::{DeploymentReceipt, DeploymentTrigger};
use crate::slack_helpers::{truncate_for_slack, SLACK_TEXT_MAX_CHARS};

use super::deploy_context::{DeployDialogMetadata, DeployRequestContext};
use super::slack_api_client::SlackApiClient;
use super::slack_blocks::{
    render_confirmation_modal, render_confirmed_prompt_blocks, render_confirmed_prompt_text,
    render_deployment_failure_text, render_deployment_started_blocks,
    render_deployment_started_text, render_dialog_open_failure_text,
    render_mention_prompt_blocks, render_mention_prompt_text, render_password_rejection_ack,
    DEPLOYMENT_STARTING_MESSAGE,
};
use super::slack_payloads::{ControlActivation, DialogSubmission, MentionEvent};
use super::DeployConfirmationMode;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum DeploymentOutcome {
    Delivered(DeploymentReceipt),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum DialogDecision {
    Accepted(DeployRequestContext),
    Rejected(Value),
}

#[derive(Debug, Clone, PartialEq)]
/// What the bot did in response to a deploy button click.
pub(crate) enum ControlActivationReport {
    DialogOpened,
    DialogFailed,
    Deployed(DeploymentOutcome),
}

#[derive(Clone)]
pub(crate) struct DeployInteractionHandler {
    slack: SlackApiClient,
    trigger: DeploymentTrigger,
    deployment_password: String,
    confirmation_mode: DeployConfirmationMode,
}

impl DeployInteractionHandler {
    pub(crate) fn new(
        slack: SlackApiClient,
        trigger: DeploymentTrigger,
        deployment_password: String,
        confirmation_mode: DeployConfirmationMode,
    ) -> Self {
        Self {
            slack,
            trigger,
            deployment_password,
            confirmation_mode,
        }
    }

    /// Posts the deploy prompt. Failures are logged and swallowed.
    pub(crate) async fn on_mention(&self, event: &MentionEvent) {
        tracing::debug!(
            channel = %event.channel_id,
            user = %event.user_id,
            text = %event.text,
            "received app mention"
        );
        let blocks = render_mention_prompt_blocks(&event.user_id);
        match self
            .slack
            .post_message(
                &event.channel_id,
                &render_mention_prompt_text(&event.user_id),
                Some(&blocks),
            )
            .await
        {
            Ok(posted) => tracing::info!(
                channel = %posted.channel,
                ts = %posted.ts,
                user = %event.user_id,
                "posted deploy prompt"
            ),
            Err(error) => tracing::error!(
                channel = %event.channel_id,
                user = %event.user_id,
                error = %error,
                "failed to post deploy prompt"
            ),
        }
    }

    pub(crate) async fn on_control_activated(
        &self,
        activation: &ControlActivation,
    ) -> ControlActivationReport {
        let context = DeployRequestContext {
            user_id: activation.user_id.clone(),
            channel_id: activation.channel_id.clone(),
            message_ts: activation.message_ts.clone(),
        };
        if self.confirmation_mode == DeployConfirmationMode::None {
            tracing::info!(
                user = %activation.user_id,
                "deploy confirmation disabled; triggering immediately"
            );
            let outcome = self.run_deployment(&context).await;
            return ControlActivationReport::Deployed(outcome);
        }

        match self.open_confirmation_dialog(activation, &context).await {
            Ok(view_id) => {
                tracing::info!(
                    user = %activation.user_id,
                    view_id = %view_id,
                    "opened deploy confirmation dialog"
                );
                ControlActivationReport::DialogOpened
            }
            Err(error) => {
                tracing::error!(
                    user = %activation.user_id,
                    error = %error,
                    "failed to open deploy confirmation dialog"
                );
                if let Some(channel_id) = activation.channel_id.as_deref() {
                    let text = render_dialog_open_failure_text(&error.to_string());
                    if let Err(notice_error) = self
                        .slack
                        .post_ephemeral(channel_id, &activation.user_id, &text)
                        .await
                    {
                        tracing::warn!(
                            channel = %channel_id,
                            user = %activation.user_id,
                            error = %notice_error,
                            "failed to send dialog failure notice"
                        );
                    }
                }
                ControlActivationReport::DialogFailed
            }
        }
    }

    async fn open_confirmation_dialog(
        &self,
        activation: &ControlActivation,
        context: &DeployRequestContext,
    ) -> Result<String> {
        let private_metadata = context
            .dialog_metadata()
            .map(|metadata| metadata.encode())
            .transpose()?;
        let view = render_confirmation_modal(private_metadata.as_deref());
        self.slack.open_view(&activation.trigger_id, &view).await
    }

    /// Checks the submitted password; never performs outbound calls.
    pub(crate) fn evaluate_dialog_submission(&self, submission: &DialogSubmission) -> DialogDecision {
        let matches = submission
            .password
            .as_deref()
            .is_some_and(|password| !password.is_empty() && password == self.deployment_password);
        if !matches {
            tracing::info!(
                user = %submission.user_id,
                "rejected deploy confirmation with invalid password"
            );
            return DialogDecision::Rejected(render_password_rejection_ack());
        }

        let context = match DeployDialogMetadata::decode(submission.private_metadata.as_deref()) {
            Ok(metadata) => DeployRequestContext::from_metadata(&submission.user_id, metadata),
            Err(error) => {
                tracing::warn!(
                    user = %submission.user_id,
                    error = %error,
                    "deploy context unavailable; reporting to user directly"
                );
                DeployRequestContext::direct_only(&submission.user_id)
            }
        };
        DialogDecision::Accepted(context)
    }

    /// Announces the start, fires the trigger once, and reports the outcome.
    pub(crate) async fn run_deployment(&self, context: &DeployRequestContext) -> DeploymentOutcome {
        if let Err(error) = self
            .slack
            .post_message(&context.user_id, DEPLOYMENT_STARTING_MESSAGE, None)
            .await
        {
            tracing::warn!(
                user = %context.user_id,
                error = %error,
                "failed to send deployment start notice"
            );
        }

        let outcome = match self.trigger.trigger().await {
            Ok(receipt) => {
                tracing::info!(
                    user = %context.user_id,
                    endpoint = %self.trigger.endpoint(),
                    status = receipt.status,
                    elapsed_ms = receipt.elapsed_ms,
                    "deployment trigger delivered"
                );
                DeploymentOutcome::Delivered(receipt)
            }
            Err(error) => {
                tracing::error!(
                    user = %context.user_id,
                    endpoint = %self.trigger.endpoint(),
                    error = %error,
                    "deployment trigger failed"
                );
                DeploymentOutcome::Failed(error.to_string())
            }
        };
        self.report_outcome(context, &outcome).await;
        outcome
    }

    pub(crate) async fn report_outcome(
        &self,
        context: &DeployRequestContext,
        outcome: &DeploymentOutcome,
    ) {
        match outcome {
            DeploymentOutcome::Delivered(_) => self.report_success(context).await,
            DeploymentOutcome::Failed(error) => {
                let text = truncate_for_slack(
                    &render_deployment_failure_text(error),
                    SLACK_TEXT_MAX_CHARS,
                );
                self.notify_user_privately(context, &text).await;
            }
        }
    }

    async fn report_success(&self, context: &DeployRequestContext) {
        let user_id = context.user_id.as_str();
        let Some(channel_id) = context.channel_id.as_deref() else {
            self.notify_user_privately(context, &render_deployment_started_text(user_id))
                .await;
            return;
        };

        if let Some(message_ts) = context.message_ts.as_deref() {
            let blocks = render_confirmed_prompt_blocks(user_id);
            if let Err(error) = self
                .slack
                .update_message(
                    channel_id,
                    message_ts,
                    &render_confirmed_prompt_text(user_id),
                    Some(&blocks),
                )
                .await
            {
                tracing::warn!(
                    channel = %channel_id,
                    ts = %message_ts,
                    error = %error,
                    "failed to update deploy prompt"
                );
            }
        }

        let blocks = render_deployment_started_blocks(user_id);
        if let Err(error) = self
            .slack
            .post_message(
                channel_id,
                &render_deployment_started_text(user_id),
                Some(&blocks),
            )
            .await
        {
            tracing::error!(
                channel = %channel_id,
                user = %user_id,
                error = %error,
                "failed to post deployment confirmation"
            );
        }
    }

    /// Ephemeral in the originating channel when known, otherwise a direct message.
    async fn notify_user_privately(&self, context: &DeployRequestContext, text: &str) {
        if let Some(channel_id) = context.channel_id.as_deref() {
            match self
                .slack
                .post_ephemeral(channel_id, &context.user_id, text)
                .await
            {
                Ok(_) => return,
                Err(error) => tracing::warn!(
                    channel = %channel_id,
                    user = %context.user_id,
                    error = %error,
                    "ephemeral notice failed; falling back to direct message"
                ),
            }
        }
        if let Err(error) = self.slack.post_message(&context.user_id, text, None).await {
            tracing::error!(
                user = %context.user_id,
                error = %error,
                "failed to send direct message to user"
            );
        }
    }
}
