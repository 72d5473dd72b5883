use clap::Parser;

use crate::{CliDeployConfirmationMode, CliTransportMode};

fn parse_positive_u64(value: &str) -> Result<u64, String> {
    let parsed = value
        .parse::<u64>()
        .map_err(|error| format!("failed to parse integer: {error}"))?;
    if parsed == 0 {
        return Err("value must be greater than 0".to_string());
    }
    Ok(parsed)
}

#[derive(Debug, Parser)]
#[command(
    name = "shipit",
    about = "Slack bot that triggers a deployment webhook behind a password-confirmed button",
    version
)]
/// Command-line and environment configuration for the deploy bot.
pub struct Cli {
    #[arg(
        long = "transport-mode",
        env = "SHIPIT_TRANSPORT_MODE",
        value_enum,
        default_value_t = CliTransportMode::Socket,
        help = "Slack transport: socket (outbound Socket Mode for local development) or http (webhook server for production)"
    )]
    pub transport_mode: CliTransportMode,

    #[arg(
        long = "slack-signing-secret",
        env = "SLACK_SIGNING_SECRET",
        hide_env_values = true,
        help = "Slack signing secret used to verify inbound webhook requests (http mode)"
    )]
    pub slack_signing_secret: Option<String>,

    #[arg(
        long = "slack-bot-token",
        env = "SLACK_BOT_TOKEN",
        hide_env_values = true,
        help = "Slack bot token for Web API (xoxb-...)"
    )]
    pub slack_bot_token: Option<String>,

    #[arg(
        long = "slack-app-token",
        env = "SLACK_APP_TOKEN",
        hide_env_values = true,
        help = "Slack Socket Mode app token (xapp-...)"
    )]
    pub slack_app_token: Option<String>,

    #[arg(
        long = "deployment-password",
        env = "DEPLOYMENT_PASSWORD",
        hide_env_values = true,
        help = "Shared password users must enter to confirm a deployment"
    )]
    pub deployment_password: Option<String>,

    #[arg(
        long = "deploy-api-endpoint",
        env = "DEPLOY_API_ENDPOINT",
        help = "Deployment webhook URL that receives the trigger POST"
    )]
    pub deploy_api_endpoint: Option<String>,

    #[arg(
        long = "deployment-key",
        env = "DEPLOYMENT_KEY",
        hide_env_values = true,
        help = "Value sent in the x-deployment-key header of the trigger request"
    )]
    pub deployment_key: Option<String>,

    #[arg(
        long = "deploy-confirmation",
        env = "SHIPIT_DEPLOY_CONFIRMATION",
        value_enum,
        default_value_t = CliDeployConfirmationMode::Modal,
        help = "Deploy button behavior: modal (password dialog) or none (trigger immediately)"
    )]
    pub deploy_confirmation: CliDeployConfirmationMode,

    #[arg(
        long = "deploy-request-timeout-ms",
        env = "SHIPIT_DEPLOY_REQUEST_TIMEOUT_MS",
        default_value_t = 0,
        help = "Timeout for the deployment trigger request in milliseconds (0 disables the timeout)"
    )]
    pub deploy_request_timeout_ms: u64,

    #[arg(
        long = "slack-api-base",
        env = "SHIPIT_SLACK_API_BASE",
        default_value = "https://slack.com/api",
        help = "Slack Web API base URL"
    )]
    pub slack_api_base: String,

    #[arg(
        long = "slack-request-timeout-ms",
        env = "SHIPIT_SLACK_REQUEST_TIMEOUT_MS",
        default_value_t = 10_000,
        value_parser = parse_positive_u64,
        help = "Timeout for Slack Web API requests in milliseconds"
    )]
    pub slack_request_timeout_ms: u64,

    #[arg(
        long = "slack-retry-max-attempts",
        env = "SHIPIT_SLACK_RETRY_MAX_ATTEMPTS",
        default_value_t = 3,
        help = "Maximum attempts for retryable slack api failures (429/5xx/transport)"
    )]
    pub slack_retry_max_attempts: usize,

    #[arg(
        long = "slack-retry-base-delay-ms",
        env = "SHIPIT_SLACK_RETRY_BASE_DELAY_MS",
        default_value_t = 500,
        help = "Base backoff delay in milliseconds for slack api retries"
    )]
    pub slack_retry_base_delay_ms: u64,

    #[arg(
        long = "http-bind",
        env = "SHIPIT_HTTP_BIND",
        default_value = "0.0.0.0:3000",
        help = "Socket address the webhook server binds in http mode"
    )]
    pub http_bind: String,

    #[arg(
        long = "http-events-path",
        env = "SHIPIT_HTTP_EVENTS_PATH",
        default_value = "/slack/events",
        help = "Request path receiving Slack events and interactivity payloads"
    )]
    pub http_events_path: String,

    #[arg(
        long = "signature-max-skew-seconds",
        env = "SHIPIT_SIGNATURE_MAX_SKEW_SECONDS",
        default_value_t = 300,
        help = "Maximum age of signed Slack requests in seconds (0 disables the check)"
    )]
    pub signature_max_skew_seconds: u64,

    #[arg(
        long = "socket-reconnect-delay-ms",
        env = "SHIPIT_SOCKET_RECONNECT_DELAY_MS",
        default_value_t = 1_000,
        value_parser = parse_positive_u64,
        help = "Delay before reconnecting after socket/session errors"
    )]
    pub socket_reconnect_delay_ms: u64,
}
