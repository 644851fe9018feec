use checklist::{api, config::Config, telemetry};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    telemetry::init_tracing();

    tracing::info!("Starting checklist backend...");

    let config = Config::from_env()?;
    tracing::debug!(?config, "loaded configuration");

    api::server::start_server(&config).await
}
