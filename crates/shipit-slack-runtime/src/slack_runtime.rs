//! Slack deploy bot runtime: interaction dispatch plus Socket Mode and HTTP transports.

use std::{sync::Arc, time::Duration};

use anyhow::{anyhow, Context, Result};
use axum::Router;
use serde_json::Value;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use crate::deploy_trigger::DeploymentTrigger;

mod deploy_context;
mod interaction_handler;
mod slack_api_client;
mod slack_blocks;
mod slack_payloads;
mod socket_mode;
mod webhook_server;

pub use deploy_context::{DeployContextError, DeployDialogMetadata, DeployRequestContext};

use interaction_handler::{DeployInteractionHandler, DialogDecision};
use slack_api_client::SlackApiClient;
use slack_payloads::{ControlActivation, InboundInteraction, MentionEvent};
use socket_mode::run_socket_mode_loop;
use webhook_server::{build_webhook_router, SlackWebhookState};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
/// Whether clicking the deploy button requires the password modal.
pub enum DeployConfirmationMode {
    #[default]
    Modal,
    None,
}

impl DeployConfirmationMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Modal => "modal",
            Self::None => "none",
        }
    }
}

#[derive(Clone)]
/// Runtime configuration shared by both Slack transports.
pub struct DeployBotRuntimeConfig {
    pub api_base: String,
    pub bot_token: String,
    pub app_token: Option<String>,
    pub signing_secret: Option<String>,
    pub deployment_password: String,
    pub deploy_endpoint: String,
    pub deployment_key: String,
    pub deploy_request_timeout_ms: u64,
    pub confirmation_mode: DeployConfirmationMode,
    pub request_timeout_ms: u64,
    pub retry_max_attempts: usize,
    pub retry_base_delay_ms: u64,
    pub http_bind: String,
    pub http_events_path: String,
    pub signature_max_skew_seconds: u64,
    pub reconnect_delay: Duration,
}

impl std::fmt::Debug for DeployBotRuntimeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeployBotRuntimeConfig")
            .field("api_base", &self.api_base)
            .field("deploy_endpoint", &self.deploy_endpoint)
            .field("confirmation_mode", &self.confirmation_mode)
            .field("http_bind", &self.http_bind)
            .field("http_events_path", &self.http_events_path)
            .finish_non_exhaustive()
    }
}

/// How an inbound interaction is acknowledged and what work follows the ack.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum InteractionPlan {
    Ignore,
    PostPrompt(MentionEvent),
    Activate(ControlActivation),
    Deploy(DeployRequestContext),
    Reject(Value),
}

impl InteractionPlan {
    /// Body returned to Slack; `None` means an empty ack.
    pub(crate) fn ack_payload(&self) -> Option<Value> {
        match self {
            Self::Reject(errors) => Some(errors.clone()),
            _ => None,
        }
    }

    /// Runs the follow-up work on its own task once the ack is on its way.
    pub(crate) fn spawn(self, handler: Arc<DeployInteractionHandler>) -> Option<JoinHandle<()>> {
        match self {
            Self::Ignore | Self::Reject(_) => None,
            Self::PostPrompt(event) => Some(tokio::spawn(async move {
                handler.on_mention(&event).await;
            })),
            Self::Activate(activation) => Some(tokio::spawn(async move {
                handler.on_control_activated(&activation).await;
            })),
            Self::Deploy(context) => Some(tokio::spawn(async move {
                handler.run_deployment(&context).await;
            })),
        }
    }
}

pub(crate) fn plan_interaction(
    handler: &DeployInteractionHandler,
    interaction: InboundInteraction,
) -> InteractionPlan {
    match interaction {
        InboundInteraction::Mention(event) => InteractionPlan::PostPrompt(event),
        InboundInteraction::ControlActivated(activation) => InteractionPlan::Activate(activation),
        InboundInteraction::DialogSubmitted(submission) => {
            match handler.evaluate_dialog_submission(&submission) {
                DialogDecision::Accepted(context) => InteractionPlan::Deploy(context),
                DialogDecision::Rejected(errors) => InteractionPlan::Reject(errors),
            }
        }
    }
}

fn build_slack_client(config: &DeployBotRuntimeConfig) -> Result<SlackApiClient> {
    SlackApiClient::new(
        config.api_base.clone(),
        config.app_token.clone(),
        config.bot_token.clone(),
        config.request_timeout_ms,
        config.retry_max_attempts,
        config.retry_base_delay_ms,
    )
}

fn build_interaction_handler(
    config: &DeployBotRuntimeConfig,
    slack: SlackApiClient,
) -> Result<DeployInteractionHandler> {
    let trigger = DeploymentTrigger::new(
        &config.deploy_endpoint,
        &config.deployment_key,
        config.deploy_request_timeout_ms,
    )
    .context("failed to configure deployment trigger")?;
    Ok(DeployInteractionHandler::new(
        slack,
        trigger,
        config.deployment_password.clone(),
        config.confirmation_mode,
    ))
}

/// Connects to Slack over Socket Mode and serves interactions until Ctrl-C.
pub async fn run_socket_mode_bridge(config: DeployBotRuntimeConfig) -> Result<()> {
    let slack = build_slack_client(&config)?;
    let handler = Arc::new(build_interaction_handler(&config, slack.clone())?);
    tracing::info!(
        confirmation = config.confirmation_mode.as_str(),
        deploy_endpoint = %config.deploy_endpoint,
        "starting slack deploy bot in socket mode"
    );
    run_socket_mode_loop(&slack, handler, config.reconnect_delay).await
}

/// Builds the axum router serving Slack requests at `http_events_path` plus `/healthz`.
///
/// Hosts that manage their own listener can mount this router directly.
pub fn build_slack_webhook_router(config: &DeployBotRuntimeConfig) -> Result<Router> {
    let signing_secret = config
        .signing_secret
        .as_deref()
        .map(str::trim)
        .filter(|secret| !secret.is_empty())
        .ok_or_else(|| anyhow!("slack http mode requires a signing secret"))?
        .to_string();
    let slack = build_slack_client(config)?;
    let handler = Arc::new(build_interaction_handler(config, slack)?);
    let state = Arc::new(SlackWebhookState {
        handler,
        signing_secret,
        max_skew_seconds: config.signature_max_skew_seconds,
    });
    Ok(build_webhook_router(state, &config.http_events_path))
}

/// Serves the Slack webhook router on `http_bind` until Ctrl-C.
pub async fn run_http_webhook_server(config: DeployBotRuntimeConfig) -> Result<()> {
    let app = build_slack_webhook_router(&config)?;
    let listener = TcpListener::bind(config.http_bind.as_str())
        .await
        .with_context(|| format!("failed to bind {}", config.http_bind))?;
    let local_addr = listener
        .local_addr()
        .context("failed to resolve slack webhook bound address")?;
    tracing::info!(
        addr = %local_addr,
        events_path = %config.http_events_path,
        confirmation = config.confirmation_mode.as_str(),
        "slack deploy bot listening in http mode"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
        .context("slack webhook server exited unexpectedly")?;
    tracing::info!("slack webhook server stopped");
    Ok(())
}
