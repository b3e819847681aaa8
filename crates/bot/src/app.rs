use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};

use tinkerscout_ai::{GeminiClient, IntelligenceClient};
use tinkerscout_infra::catalog::{CatalogStore, InMemoryCatalogStore, PostgresCatalogStore};
use tinkerscout_infra::db;
use tinkerscout_infra::directory::{
    InMemoryRecipientDirectory, PostgresRecipientDirectory, RecipientDirectory,
};
use tinkerscout_infra::notify::{Notifier, TelegramChannel};
use tinkerscout_infra::scan::ScanOrchestrator;
use tinkerscout_infra::Config;

use crate::registration::RegistrationHandler;

/// Everything the process runs, wired from `Config`.
pub struct App {
    pub orchestrator: Arc<ScanOrchestrator>,
    pub registration: RegistrationHandler,
    pub telegram: TelegramChannel,
}

pub async fn build(config: &Config) -> anyhow::Result<App> {
    let (catalog, directory) = build_stores(config).await?;

    let intelligence: Arc<dyn IntelligenceClient> =
        Arc::new(GeminiClient::new(config.gemini()).context("failed to build Gemini client")?);
    let telegram = TelegramChannel::new(config.telegram()).context("failed to build Telegram client")?;
    let notifier = Notifier::new(Arc::new(telegram.clone()));

    let orchestrator = ScanOrchestrator::new(intelligence, catalog, directory.clone(), notifier.clone())
        .with_variant(config.scan_variant)
        .with_upstream_timeout(config.upstream_timeout);

    info!(
        variant = config.scan_variant.as_str(),
        model = %config.gemini_model,
        schedule = %config.scan_schedule,
        "tinkerscout wired"
    );

    Ok(App {
        orchestrator: Arc::new(orchestrator),
        registration: RegistrationHandler::new(directory, notifier),
        telegram,
    })
}

async fn build_stores(
    config: &Config,
) -> anyhow::Result<(Arc<dyn CatalogStore>, Arc<dyn RecipientDirectory>)> {
    match &config.database_url {
        Some(url) => {
            let pool = db::connect(url).await.context("failed to connect to Postgres")?;
            db::ensure_schema(&pool).await.context("failed to create schema")?;
            info!("using Postgres stores");
            let catalog: Arc<dyn CatalogStore> = Arc::new(PostgresCatalogStore::new(pool.clone()));
            let directory: Arc<dyn RecipientDirectory> = Arc::new(PostgresRecipientDirectory::new(pool));
            Ok((catalog, directory))
        }
        None => {
            warn!("DATABASE_URL not set; using in-memory stores (state is lost on restart)");
            let catalog: Arc<dyn CatalogStore> = Arc::new(InMemoryCatalogStore::new());
            let directory: Arc<dyn RecipientDirectory> = Arc::new(InMemoryRecipientDirectory::new());
            Ok((catalog, directory))
        }
    }
}
