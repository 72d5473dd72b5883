//! Slack deploy bot runtime.
//!
//! Posts a "Deploy" prompt when the bot is mentioned, gates the click behind a
//! password modal, fires the deployment webhook once, and reports the outcome
//! back to the originating channel. Served over Slack Socket Mode or as an
//! axum HTTP webhook router.

pub mod deploy_trigger;
mod slack_helpers;
mod slack_runtime;
pub mod slack_signature;

pub use deploy_trigger::{
    DeploymentReceipt, DeploymentTrigger, DeploymentTriggerError, DEPLOYMENT_KEY_HEADER,
};
pub use slack_runtime::{
    build_slack_webhook_router, run_http_webhook_server, run_socket_mode_bridge,
    DeployBotRuntimeConfig, DeployConfirmationMode, DeployContextError, DeployDialogMetadata,
    DeployRequestContext,
};
pub use slack_signature::{
    sign_slack_request, verify_slack_request, SLACK_SIGNATURE_HEADER, SLACK_TIMESTAMP_HEADER,
};
