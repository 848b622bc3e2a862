use chrono::{DateTime, Utc};
use motog_catalog::{PackageId, PackageScope};
use motog_core::{BoostLedgerRepository, Clock, ListingDirectory};
use motog_ledger::{BoostPurchase, ListingId, OwnerId};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{BoostError, BoostResult};

/// The one boost elevating a listing at a given instant
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EffectiveBoost {
    pub listing_id: ListingId,
    pub purchase: BoostPurchase,
}

impl EffectiveBoost {
    pub fn purchase_id(&self) -> Uuid {
        self.purchase.id
    }

    pub fn package_id(&self) -> PackageId {
        self.purchase.package_id
    }

    pub fn scope(&self) -> PackageScope {
        self.purchase.scope
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.purchase.expires_at
    }
}

/// Picks the winner among candidates of one tier: latest expiry, then most
/// recent purchase, then highest id.
pub fn pick_effective<'a, I>(candidates: I, now: DateTime<Utc>) -> Option<&'a BoostPurchase>
where
    I: IntoIterator<Item = &'a BoostPurchase>,
{
    candidates
        .into_iter()
        .filter(|p| p.is_live(now))
        .max_by_key(|p| (p.expires_at, p.purchased_at, p.id))
}

/// Maps ledger entries onto listings. Nothing is cached: bundle membership
/// follows whatever the listing store says at query time.
pub struct ActivationResolver {
    ledger: Arc<dyn BoostLedgerRepository>,
    listings: Arc<dyn ListingDirectory>,
    clock: Arc<dyn Clock>,
}

impl ActivationResolver {
    pub fn new(
        ledger: Arc<dyn BoostLedgerRepository>,
        listings: Arc<dyn ListingDirectory>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self { ledger, listings, clock }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Effective boost for `listing_id`, owned by `owner_id`, as of now
    pub async fn resolve(&self, listing_id: ListingId, owner_id: OwnerId) -> BoostResult<Option<EffectiveBoost>> {
        self.resolve_at(listing_id, owner_id, self.clock.now()).await
    }

    pub async fn resolve_at(
        &self,
        listing_id: ListingId,
        owner_id: OwnerId,
        now: DateTime<Utc>,
    ) -> BoostResult<Option<EffectiveBoost>> {
        if let Some(direct) = self.resolve_direct(listing_id, now).await? {
            return Ok(Some(direct));
        }
        let bundles = self.live_bundles(owner_id, now).await?;
        Ok(Self::pick_bundle(listing_id, &bundles, now))
    }

    /// Same as `resolve`, with the owner looked up in the listing store.
    /// Unknown listings have no boost.
    pub async fn resolve_listing(&self, listing_id: ListingId) -> BoostResult<Option<EffectiveBoost>> {
        self.resolve_listing_at(listing_id, self.clock.now()).await
    }

    pub async fn resolve_listing_at(
        &self,
        listing_id: ListingId,
        now: DateTime<Utc>,
    ) -> BoostResult<Option<EffectiveBoost>> {
        match self.listings.owner_of(listing_id).await? {
            Some(owner_id) => self.resolve_at(listing_id, owner_id, now).await,
            None => Ok(None),
        }
    }

    /// Every listing the seller currently owns with its effective boost
    pub async fn boosted_listings_for_owner(
        &self,
        owner_id: OwnerId,
    ) -> BoostResult<Vec<(ListingId, Option<EffectiveBoost>)>> {
        let now = self.clock.now();
        let listing_ids = self.listings.listings_of(owner_id).await?;
        let bundles = self.live_bundles(owner_id, now).await?;

        let mut resolved = Vec::with_capacity(listing_ids.len());
        for listing_id in listing_ids {
            let boost = match self.resolve_direct(listing_id, now).await? {
                Some(direct) => Some(direct),
                None => Self::pick_bundle(listing_id, &bundles, now),
            };
            resolved.push((listing_id, boost));
        }
        Ok(resolved)
    }

    /// Listings a ledger entry is the effective boost for right now.
    /// Empty once the entry is terminal.
    pub async fn covered_listings(&self, purchase_id: Uuid) -> BoostResult<Vec<ListingId>> {
        let now = self.clock.now();
        let purchase = self
            .ledger
            .get_purchase(purchase_id)
            .await?
            .ok_or(BoostError::PurchaseNotFound(purchase_id))?;

        if !purchase.is_live(now) {
            return Ok(Vec::new());
        }

        let candidates = match (purchase.scope, purchase.target_listing_id) {
            (PackageScope::SingleListing, Some(listing_id)) => vec![listing_id],
            (PackageScope::SingleListing, None) => Vec::new(),
            (PackageScope::Bundle, _) => self.listings.listings_of(purchase.owner_id).await?,
        };

        let bundles = self.live_bundles(purchase.owner_id, now).await?;
        let mut covered = Vec::new();
        for listing_id in candidates {
            let boost = match self.resolve_direct(listing_id, now).await? {
                Some(direct) => Some(direct),
                None => Self::pick_bundle(listing_id, &bundles, now),
            };
            if boost.map(|b| b.purchase_id()) == Some(purchase_id) {
                covered.push(listing_id);
            }
        }
        Ok(covered)
    }

    async fn resolve_direct(&self, listing_id: ListingId, now: DateTime<Utc>) -> BoostResult<Option<EffectiveBoost>> {
        let direct = self.ledger.list_live_for_listing(listing_id, now).await?;
        let winner = pick_effective(
            direct
                .iter()
                .filter(|p| p.is_direct() && p.target_listing_id == Some(listing_id)),
            now,
        );
        Ok(winner.map(|p| EffectiveBoost {
            listing_id,
            purchase: p.clone(),
        }))
    }

    async fn live_bundles(&self, owner_id: OwnerId, now: DateTime<Utc>) -> BoostResult<Vec<BoostPurchase>> {
        let mut owned = self.ledger.list_live_for_owner(owner_id, now).await?;
        owned.retain(|p| !p.is_direct());
        Ok(owned)
    }

    fn pick_bundle(listing_id: ListingId, bundles: &[BoostPurchase], now: DateTime<Utc>) -> Option<EffectiveBoost> {
        pick_effective(bundles, now).map(|p| EffectiveBoost {
            listing_id,
            purchase: p.clone(),
        })
    }
}
