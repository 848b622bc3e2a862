use motog_catalog::PackageId;
use motog_core::{BoostLedgerRepository, Clock, ConflictPolicy, EventPublisher, ListingDirectory, PackageRepository};
use motog_ledger::{BoostPurchase, BoostStatus, ListingId, OwnerId};
use motog_shared::models::events::{BoostCancelledEvent, BoostEvent, BoostPurchasedEvent};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{BoostError, BoostResult};

/// Purchase, cancellation and lookup of boosts
#[derive(Clone)]
pub struct BoostLedger {
    packages: Arc<dyn PackageRepository>,
    ledger: Arc<dyn BoostLedgerRepository>,
    listings: Arc<dyn ListingDirectory>,
    clock: Arc<dyn Clock>,
    events: Arc<dyn EventPublisher>,
    policy: ConflictPolicy,
}

impl BoostLedger {
    pub fn new(
        packages: Arc<dyn PackageRepository>,
        ledger: Arc<dyn BoostLedgerRepository>,
        listings: Arc<dyn ListingDirectory>,
        clock: Arc<dyn Clock>,
        events: Arc<dyn EventPublisher>,
        policy: ConflictPolicy,
    ) -> Self {
        Self { packages, ledger, listings, clock, events, policy }
    }

    pub fn conflict_policy(&self) -> ConflictPolicy {
        self.policy
    }

    /// Record a paid boost. Payment is assumed to have cleared already.
    pub async fn purchase(
        &self,
        owner_id: OwnerId,
        package_id: PackageId,
        target_listing_id: Option<ListingId>,
    ) -> BoostResult<BoostPurchase> {
        let package = self
            .packages
            .get_package(package_id)
            .await?
            .ok_or(BoostError::PackageNotFound(package_id))?;

        if !package.is_active {
            return Err(BoostError::PackageUnavailable(package_id));
        }

        let purchase = BoostPurchase::new(owner_id, &package, target_listing_id, self.clock.now())?;

        if let Some(listing_id) = purchase.target_listing_id {
            let owner = self.listings.owner_of(listing_id).await?;
            if owner != Some(owner_id) {
                warn!("Owner {} tried to boost listing {} they do not own", owner_id, listing_id);
                return Err(BoostError::ListingNotOwned { listing_id, owner_id });
            }
        }

        let superseded = self.ledger.insert_purchase(&purchase, self.policy).await?;
        for replaced in superseded {
            info!("Boost {} superseded by {}", replaced.id, purchase.id);
            self.emit(BoostEvent::Cancelled(BoostCancelledEvent {
                purchase_id: replaced.id,
                owner_id: replaced.owner_id,
                timestamp: purchase.purchased_at.timestamp(),
            }))
            .await;
        }

        info!(
            "Boost {} purchased: owner={} package={} scope={} expires_at={}",
            purchase.id, owner_id, package_id, purchase.scope, purchase.expires_at
        );
        self.emit(BoostEvent::Purchased(BoostPurchasedEvent {
            purchase_id: purchase.id,
            owner_id,
            package_id,
            scope: purchase.scope.to_string(),
            target_listing_id: purchase.target_listing_id,
            price_minor: purchase.price_minor,
            expires_at: purchase.expires_at.timestamp(),
            timestamp: purchase.purchased_at.timestamp(),
        }))
        .await;

        Ok(purchase)
    }

    /// Active → Cancelled. Fails with `AlreadyTerminal` for anything that is
    /// no longer live, including an entry whose window has closed but which
    /// the sweeper has not reached yet.
    pub async fn cancel(&self, purchase_id: Uuid) -> BoostResult<BoostPurchase> {
        let now = self.clock.now();
        let stored = self
            .ledger
            .get_purchase(purchase_id)
            .await?
            .ok_or(BoostError::PurchaseNotFound(purchase_id))?;

        let status = stored.effective_status(now);
        if status.is_terminal() {
            return Err(BoostError::AlreadyTerminal { purchase_id, status });
        }

        match self.ledger.cancel_purchase(purchase_id, now).await? {
            Some(cancelled) => {
                info!("Boost {} cancelled", purchase_id);
                self.emit(BoostEvent::Cancelled(BoostCancelledEvent {
                    purchase_id,
                    owner_id: cancelled.owner_id,
                    timestamp: now.timestamp(),
                }))
                .await;
                Ok(cancelled)
            }
            None => {
                // Lost a race with another cancel, a replace or the sweeper
                let status = self
                    .ledger
                    .get_purchase(purchase_id)
                    .await?
                    .map(|p| p.effective_status(now))
                    .unwrap_or(BoostStatus::Cancelled);
                Err(BoostError::AlreadyTerminal { purchase_id, status })
            }
        }
    }

    /// Live boosts of every scope owned by `owner_id`, most recent first
    pub async fn list_active_for_owner(&self, owner_id: OwnerId) -> BoostResult<Vec<BoostPurchase>> {
        let now = self.clock.now();
        let mut purchases = self.ledger.list_live_for_owner(owner_id, now).await?;
        purchases.retain(|p| p.is_live(now));
        Ok(purchases)
    }

    /// A ledger entry with its status as of now
    pub async fn get_purchase(&self, purchase_id: Uuid) -> BoostResult<BoostPurchase> {
        let now = self.clock.now();
        let mut purchase = self
            .ledger
            .get_purchase(purchase_id)
            .await?
            .ok_or(BoostError::PurchaseNotFound(purchase_id))?;

        if purchase.status == BoostStatus::Active && !purchase.is_live(now) {
            purchase.status = BoostStatus::Expired;
            purchase.ended_at = Some(purchase.expires_at);
        }
        Ok(purchase)
    }

    async fn emit(&self, event: BoostEvent) {
        if let Err(e) = self.events.publish(&event).await {
            warn!("Failed to publish {} for {}: {}", event.event_type(), event.purchase_id(), e);
        }
    }
}
