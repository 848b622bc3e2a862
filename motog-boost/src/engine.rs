use motog_core::{BoostLedgerRepository, Clock, EventPublisher, ListingDirectory, PackageRepository};
use motog_store::app_config::Config;
use std::sync::Arc;
use std::time::Duration;

use crate::catalog::PackageCatalog;
use crate::expiry::ExpirySweeper;
use crate::ledger::BoostLedger;
use crate::resolver::ActivationResolver;
use crate::ranking::VisibilityRanker;

/// Collaborators the engine is built on
#[derive(Clone)]
pub struct EnginePorts {
    pub packages: Arc<dyn PackageRepository>,
    pub ledger: Arc<dyn BoostLedgerRepository>,
    pub listings: Arc<dyn ListingDirectory>,
    pub clock: Arc<dyn Clock>,
    pub events: Arc<dyn EventPublisher>,
}

/// All boost components wired against one set of ports
pub struct BoostEngine {
    pub catalog: PackageCatalog,
    pub ledger: BoostLedger,
    pub resolver: Arc<ActivationResolver>,
    pub ranker: VisibilityRanker,
    pub sweeper: Arc<ExpirySweeper>,
}

impl BoostEngine {
    pub fn new(ports: EnginePorts, config: &Config) -> Self {
        let resolver = Arc::new(ActivationResolver::new(
            ports.ledger.clone(),
            ports.listings.clone(),
            ports.clock.clone(),
        ));

        Self {
            catalog: PackageCatalog::new(ports.packages.clone()),
            ledger: BoostLedger::new(
                ports.packages.clone(),
                ports.ledger.clone(),
                ports.listings.clone(),
                ports.clock.clone(),
                ports.events.clone(),
                config.ledger.conflict_policy,
            ),
            ranker: VisibilityRanker::new(resolver.clone(), config.ranking.clone()),
            resolver,
            sweeper: Arc::new(ExpirySweeper::new(
                ports.ledger,
                ports.clock,
                ports.events,
                config.sweeper.batch_size,
                Duration::from_secs(config.sweeper.interval_secs),
            )),
        }
    }
}
