use anyhow::Result;
use clap::Parser;
use shipit_cli::{build_runtime_config, Cli, CliTransportMode};
use shipit_slack_runtime::{run_http_webhook_server, run_socket_mode_bridge};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();
    let cli = Cli::parse();
    let config = build_runtime_config(&cli)?;

    tracing::info!(
        transport = cli.transport_mode.as_str(),
        "starting shipit deploy bot"
    );
    match cli.transport_mode {
        CliTransportMode::Socket => run_socket_mode_bridge(config).await,
        CliTransportMode::Http => run_http_webhook_server(config).await,
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}
