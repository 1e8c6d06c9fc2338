use inscription_recovery::api::server;
use inscription_recovery::RecoveryConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    // Set RUST_LOG=debug for per-input detail
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = RecoveryConfig::from_env();

    log::info!(
        "Starting inscription recovery server on {} ({})",
        config.bind_address,
        config.bitcoin_network
    );
    server::start_server(config).await?;
    Ok(())
}
