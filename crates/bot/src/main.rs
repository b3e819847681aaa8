use anyhow::Context;
use dotenv::dotenv;

use tinkerscout_bot::app;
use tinkerscout_bot::updates::UpdatePoller;
use tinkerscout_infra::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    tinkerscout_observability::init();

    let config = Config::from_env().context("invalid configuration")?;
    let app = app::build(&config).await?;

    let scheduler = config.scheduler()?.spawn(app.orchestrator.clone());
    let poller = UpdatePoller::default().spawn(app.telegram.clone(), app.registration.clone());

    tracing::info!("tinkerscout running; press Ctrl+C to stop");
    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;

    tracing::info!("shutting down");
    poller.shutdown().await;
    scheduler.shutdown().await;
    Ok(())
}
