use anyhow::Context;
use motog_store::{app_config::Config, DbClient};
use motog_worker::build_engine;
use tokio::sync::watch;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "motog_worker=debug,motog_boost=debug,motog_store=info,motog=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().context("Failed to load config")?;

    let db = DbClient::new(&config.database)
        .await
        .context("Failed to connect to Postgres")?;
    db.migrate().await.context("Failed to run migrations")?;

    let engine = build_engine(&db, &config);
    tracing::info!(
        "Starting MOTOG boost worker (conflict policy {:?}, sweep every {}s)",
        engine.ledger.conflict_policy(),
        config.sweeper.interval_secs
    );
    let packages = engine.catalog.list_packages().await?;
    tracing::info!("{} boost packages on offer", packages.len());

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let sweeper = engine.sweeper.clone();
    let sweeper_task = tokio::spawn(async move { sweeper.run(shutdown_rx).await });

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;
    tracing::info!("Shutdown requested, waiting for sweeper to finish");

    shutdown_tx.send(true).context("Sweeper exited early")?;
    sweeper_task.await.context("Sweeper task panicked")?;

    db.pool.close().await;
    tracing::info!("Worker stopped");
    Ok(())
}
