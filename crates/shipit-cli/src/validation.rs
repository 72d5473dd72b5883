use std::time::Duration;

use anyhow::{anyhow, bail, Result};
use shipit_slack_runtime::DeployBotRuntimeConfig;

use crate::Cli;

fn resolve_non_empty_cli_value(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(ToOwned::to_owned)
}

fn require_cli_value(value: Option<&str>, flag: &str, env: &str) -> Result<String> {
    match resolve_non_empty_cli_value(value) {
        Some(value) => Ok(value),
        None => bail!("{flag} (or {env}) is required"),
    }
}

/// Rejects flag combinations the deploy bot cannot run with.
pub fn validate_cli(cli: &Cli) -> Result<()> {
    require_cli_value(cli.slack_bot_token.as_deref(), "--slack-bot-token", "SLACK_BOT_TOKEN")?;
    require_cli_value(
        cli.deployment_password.as_deref(),
        "--deployment-password",
        "DEPLOYMENT_PASSWORD",
    )?;
    let endpoint = require_cli_value(
        cli.deploy_api_endpoint.as_deref(),
        "--deploy-api-endpoint",
        "DEPLOY_API_ENDPOINT",
    )?;
    if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
        bail!("--deploy-api-endpoint must be an http:// or https:// url");
    }
    require_cli_value(cli.deployment_key.as_deref(), "--deployment-key", "DEPLOYMENT_KEY")?;

    if cli.transport_mode.is_socket() {
        require_cli_value(cli.slack_app_token.as_deref(), "--slack-app-token", "SLACK_APP_TOKEN")
            .map_err(|error| anyhow!("{error} when --transport-mode=socket"))?;
    }
    if cli.transport_mode.is_http() {
        require_cli_value(
            cli.slack_signing_secret.as_deref(),
            "--slack-signing-secret",
            "SLACK_SIGNING_SECRET",
        )
        .map_err(|error| anyhow!("{error} when --transport-mode=http"))?;
        if !cli.http_events_path.starts_with('/') {
            bail!("--http-events-path must start with '/'");
        }
        if cli.http_events_path.trim() == "/healthz" {
            bail!("--http-events-path cannot be /healthz");
        }
        if cli.http_bind.trim().is_empty() {
            bail!("--http-bind cannot be empty");
        }
    }

    if resolve_non_empty_cli_value(Some(&cli.slack_api_base)).is_none() {
        bail!("--slack-api-base cannot be empty");
    }
    if cli.slack_retry_max_attempts == 0 {
        bail!("--slack-retry-max-attempts must be greater than 0");
    }
    if cli.slack_retry_base_delay_ms == 0 {
        bail!("--slack-retry-base-delay-ms must be greater than 0");
    }

    Ok(())
}

/// Builds the runtime configuration from a validated `Cli`.
pub fn build_runtime_config(cli: &Cli) -> Result<DeployBotRuntimeConfig> {
    validate_cli(cli)?;
    Ok(DeployBotRuntimeConfig {
        api_base: cli.slack_api_base.trim().to_string(),
        bot_token: require_cli_value(
            cli.slack_bot_token.as_deref(),
            "--slack-bot-token",
            "SLACK_BOT_TOKEN",
        )?,
        app_token: resolve_non_empty_cli_value(cli.slack_app_token.as_deref()),
        signing_secret: resolve_non_empty_cli_value(cli.slack_signing_secret.as_deref()),
        // Exact comparison; surrounding whitespace in the configured value is kept.
        deployment_password: cli.deployment_password.clone().unwrap_or_default(),
        deploy_endpoint: require_cli_value(
            cli.deploy_api_endpoint.as_deref(),
            "--deploy-api-endpoint",
            "DEPLOY_API_ENDPOINT",
        )?,
        deployment_key: require_cli_value(
            cli.deployment_key.as_deref(),
            "--deployment-key",
            "DEPLOYMENT_KEY",
        )?,
        deploy_request_timeout_ms: cli.deploy_request_timeout_ms,
        confirmation_mode: cli.deploy_confirmation.into(),
        request_timeout_ms: cli.slack_request_timeout_ms,
        retry_max_attempts: cli.slack_retry_max_attempts,
        retry_base_delay_ms: cli.slack_retry_base_delay_ms,
        http_bind: cli.http_bind.trim().to_string(),
        http_events_path: cli.http_events_path.trim().to_string(),
        signature_max_skew_seconds: cli.signature_max_skew_seconds,
        reconnect_delay: Duration::from_millis(cli.socket_reconnect_delay_ms),
    })
}
