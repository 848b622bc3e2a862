use motog_core::{BoostLedgerRepository, Clock, EventPublisher};
use motog_shared::models::events::{BoostEvent, BoostExpiredEvent};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::error::BoostResult;

/// Persists `active -> expired` for boosts whose window has closed.
///
/// Reads already treat overdue entries as expired, so the sweeper only
/// changes what is stored, never what callers observe.
pub struct ExpirySweeper {
    ledger: Arc<dyn BoostLedgerRepository>,
    clock: Arc<dyn Clock>,
    events: Arc<dyn EventPublisher>,
    batch_size: usize,
    interval: Duration,
}

impl ExpirySweeper {
    pub fn new(
        ledger: Arc<dyn BoostLedgerRepository>,
        clock: Arc<dyn Clock>,
        events: Arc<dyn EventPublisher>,
        batch_size: usize,
        interval: Duration,
    ) -> Self {
        Self {
            ledger,
            clock,
            events,
            batch_size: batch_size.max(1),
            interval: interval.max(Duration::from_millis(1)),
        }
    }

    /// Expire everything due as of now. Returns the ids transitioned by this
    /// call; a second call with no time passing returns nothing.
    pub async fn sweep_once(&self) -> BoostResult<Vec<Uuid>> {
        let now = self.clock.now();
        let mut expired_ids = Vec::new();

        loop {
            let batch = self.ledger.expire_due(now, self.batch_size).await?;
            let batch_len = batch.len();

            for purchase in batch {
                let event = BoostEvent::Expired(BoostExpiredEvent {
                    purchase_id: purchase.id,
                    owner_id: purchase.owner_id,
                    expired_at: purchase.expires_at.timestamp(),
                    timestamp: now.timestamp(),
                });
                if let Err(e) = self.events.publish(&event).await {
                    warn!("Failed to publish expiry of {}: {}", purchase.id, e);
                }
                expired_ids.push(purchase.id);
            }

            if batch_len < self.batch_size {
                break;
            }
        }

        Ok(expired_ids)
    }

    /// Sweep on every tick until `shutdown` flips to true or its sender is
    /// dropped. A sweep in progress always runs to completion.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!("Expiry sweeper started (interval {:?}, batch {})", self.interval, self.batch_size);

        loop {
            if *shutdown.borrow() {
                break;
            }

            tokio::select! {
                biased;
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    continue;
                }
                _ = ticker.tick() => {}
            }

            match self.sweep_once().await {
                Ok(ids) if !ids.is_empty() => info!("Expired {} boosts", ids.len()),
                Ok(_) => debug!("No boosts due"),
                // Nothing was written; the same rows are due again next tick
                Err(e) => error!("Expiry sweep failed, retrying next cycle: {}", e),
            }
        }

        info!("Expiry sweeper stopped");
    }
}
