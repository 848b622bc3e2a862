use std::sync::Arc;

use motog_boost::{BoostEngine, EnginePorts};
use motog_core::SystemClock;
use motog_store::app_config::Config;
use motog_store::{
    DbClient, LogEventPublisher, PostgresBoostLedgerRepository, PostgresListingDirectory,
    PostgresPackageRepository,
};

/// Wire the engine against Postgres and the wall clock
pub fn build_engine(db: &DbClient, config: &Config) -> BoostEngine {
    let ports = EnginePorts {
        packages: Arc::new(PostgresPackageRepository::new(db.pool.clone())),
        ledger: Arc::new(PostgresBoostLedgerRepository::new(db.pool.clone())),
        listings: Arc::new(PostgresListingDirectory::new(db.pool.clone())),
        clock: Arc::new(SystemClock),
        events: Arc::new(LogEventPublisher::new()),
    };
    BoostEngine::new(ports, config)
}
