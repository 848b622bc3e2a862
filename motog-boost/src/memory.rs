use async_trait::async_trait;
use chrono::{DateTime, Utc};
use motog_catalog::{BoostPackage, CatalogError, PackageId, PackageScope};
use motog_core::{
    BoostLedgerRepository, ConflictPolicy, ListingDirectory, PackageRepository, RepositoryError,
    RepositoryResult,
};
use motog_ledger::{BoostPurchase, BoostStatus, ListingId, OwnerId};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Mutex;
use uuid::Uuid;

/// In-process catalog, ledger and listing directory.
///
/// Each ledger operation holds the ledger lock for its whole
/// check-and-write, which gives the same atomicity the Postgres store gets
/// from its transaction.
#[derive(Default)]
pub struct InMemoryStore {
    packages: Mutex<BTreeMap<PackageId, BoostPackage>>,
    purchases: Mutex<HashMap<Uuid, BoostPurchase>>,
    // listing id -> owner id
    listings: Mutex<HashMap<ListingId, OwnerId>>,
    failures: AtomicUsize,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-loaded with the same three packages the migration seeds
    pub async fn with_seed_catalog() -> Result<Self, CatalogError> {
        let store = Self::new();
        store
            .add_package(BoostPackage::new(1, "Single Listing Boost - 7 Days", 7, 19900, PackageScope::SingleListing)?)
            .await;
        store
            .add_package(BoostPackage::new(2, "Single Listing Boost - 30 Days", 30, 49900, PackageScope::SingleListing)?)
            .await;
        store
            .add_package(BoostPackage::new(3, "Seller Bundle Boost - 30 Days", 30, 149900, PackageScope::Bundle)?)
            .await;
        Ok(store)
    }

    pub async fn add_package(&self, package: BoostPackage) {
        self.packages.lock().await.insert(package.id, package);
    }

    pub async fn add_listing(&self, listing_id: ListingId, owner_id: OwnerId) {
        self.listings.lock().await.insert(listing_id, owner_id);
    }

    pub async fn remove_listing(&self, listing_id: ListingId) {
        self.listings.lock().await.remove(&listing_id);
    }

    /// Make the next `count` sweeps fail with a backend error
    pub fn inject_failures(&self, count: usize) {
        self.failures.store(count, Ordering::SeqCst);
    }

    /// Stored row regardless of status, for assertions
    pub async fn stored(&self, id: Uuid) -> Option<BoostPurchase> {
        self.purchases.lock().await.get(&id).cloned()
    }

    fn take_failure(&self) -> RepositoryResult<()> {
        let injected = self
            .failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        match injected {
            Ok(_) => Err(RepositoryError::backend(std::io::Error::new(
                std::io::ErrorKind::Other,
                "injected storage failure",
            ))),
            Err(_) => Ok(()),
        }
    }
}

fn is_live(purchase: &BoostPurchase, now: DateTime<Utc>) -> bool {
    purchase.status == BoostStatus::Active && purchase.expires_at > now
}

fn newest_first(mut purchases: Vec<BoostPurchase>) -> Vec<BoostPurchase> {
    purchases.sort_by(|a, b| {
        b.purchased_at
            .cmp(&a.purchased_at)
            .then_with(|| b.id.cmp(&a.id))
    });
    purchases
}

#[async_trait]
impl PackageRepository for InMemoryStore {
    async fn get_package(&self, id: PackageId) -> RepositoryResult<Option<BoostPackage>> {
        Ok(self.packages.lock().await.get(&id).cloned())
    }

    async fn list_packages(&self) -> RepositoryResult<Vec<BoostPackage>> {
        Ok(self
            .packages
            .lock()
            .await
            .values()
            .filter(|p| p.is_active)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl BoostLedgerRepository for InMemoryStore {
    async fn insert_purchase(
        &self,
        purchase: &BoostPurchase,
        policy: ConflictPolicy,
    ) -> RepositoryResult<Vec<BoostPurchase>> {
        let mut purchases = self.purchases.lock().await;
        let mut superseded = Vec::new();

        if let Some(listing_id) = purchase.target_listing_id {
            let live: Vec<BoostPurchase> = purchases
                .values()
                .filter(|p| p.target_listing_id == Some(listing_id) && is_live(p, purchase.purchased_at))
                .cloned()
                .collect();

            if let Some(existing) = newest_first(live).into_iter().map(|p| p.id).next() {
                match policy {
                    ConflictPolicy::Reject => {
                        return Err(RepositoryError::Conflict { listing_id, existing });
                    }
                    ConflictPolicy::Replace => {
                        for p in purchases.values_mut() {
                            if p.target_listing_id == Some(listing_id) && is_live(p, purchase.purchased_at) {
                                p.status = BoostStatus::Cancelled;
                                p.ended_at = Some(purchase.purchased_at);
                                superseded.push(p.clone());
                            }
                        }
                    }
                }
            }
        }

        purchases.insert(purchase.id, purchase.clone());
        Ok(superseded)
    }

    async fn get_purchase(&self, id: Uuid) -> RepositoryResult<Option<BoostPurchase>> {
        Ok(self.purchases.lock().await.get(&id).cloned())
    }

    async fn cancel_purchase(
        &self,
        id: Uuid,
        now: DateTime<Utc>,
    ) -> RepositoryResult<Option<BoostPurchase>> {
        let mut purchases = self.purchases.lock().await;
        match purchases.get_mut(&id) {
            Some(p) if is_live(p, now) => {
                p.status = BoostStatus::Cancelled;
                p.ended_at = Some(now);
                Ok(Some(p.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn list_live_for_owner(
        &self,
        owner_id: OwnerId,
        now: DateTime<Utc>,
    ) -> RepositoryResult<Vec<BoostPurchase>> {
        let purchases = self.purchases.lock().await;
        Ok(newest_first(
            purchases
                .values()
                .filter(|p| p.owner_id == owner_id && is_live(p, now))
                .cloned()
                .collect(),
        ))
    }

    async fn list_live_for_listing(
        &self,
        listing_id: ListingId,
        now: DateTime<Utc>,
    ) -> RepositoryResult<Vec<BoostPurchase>> {
        let purchases = self.purchases.lock().await;
        Ok(newest_first(
            purchases
                .values()
                .filter(|p| p.target_listing_id == Some(listing_id) && is_live(p, now))
                .cloned()
                .collect(),
        ))
    }

    async fn expire_due(
        &self,
        now: DateTime<Utc>,
        limit: usize,
    ) -> RepositoryResult<Vec<BoostPurchase>> {
        self.take_failure()?;

        let mut purchases = self.purchases.lock().await;
        let mut due: Vec<&mut BoostPurchase> = purchases
            .values_mut()
            .filter(|p| p.status == BoostStatus::Active && p.expires_at <= now)
            .collect();
        due.sort_by_key(|p| p.expires_at);

        let mut expired = Vec::new();
        for p in due.into_iter().take(limit) {
            p.expire(now).map_err(|e| RepositoryError::Corrupt(e.to_string()))?;
            expired.push(p.clone());
        }
        Ok(expired)
    }
}

#[async_trait]
impl ListingDirectory for InMemoryStore {
    async fn owner_of(&self, listing_id: ListingId) -> RepositoryResult<Option<OwnerId>> {
        Ok(self.listings.lock().await.get(&listing_id).copied())
    }

    async fn listings_of(&self, owner_id: OwnerId) -> RepositoryResult<Vec<ListingId>> {
        let mut ids: Vec<ListingId> = self
            .listings
            .lock()
            .await
            .iter()
            .filter(|(_, owner)| **owner == owner_id)
            .map(|(listing, _)| *listing)
            .collect();
        ids.sort();
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()
    }

    async fn direct(store: &InMemoryStore, listing: ListingId, at: DateTime<Utc>) -> BoostPurchase {
        let package = store.get_package(1).await.unwrap().unwrap();
        BoostPurchase::new(7, &package, Some(listing), at).unwrap()
    }

    #[tokio::test]
    async fn test_reject_second_live_direct_boost() {
        let store = InMemoryStore::with_seed_catalog().await.unwrap();
        let listing = 42;

        let first = direct(&store, listing, t0()).await;
        store.insert_purchase(&first, ConflictPolicy::Reject).await.unwrap();

        let second = direct(&store, listing, t0() + Duration::hours(1)).await;
        let err = store.insert_purchase(&second, ConflictPolicy::Reject).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict { existing, .. } if existing == first.id));
        assert!(store.stored(second.id).await.is_none());

        // Once the first has run out the listing is free again
        let later = direct(&store, listing, first.expires_at).await;
        assert!(store.insert_purchase(&later, ConflictPolicy::Reject).await.is_ok());
    }

    #[tokio::test]
    async fn test_replace_supersedes_live_direct_boost() {
        let store = InMemoryStore::with_seed_catalog().await.unwrap();
        let listing = 42;

        let first = direct(&store, listing, t0()).await;
        store.insert_purchase(&first, ConflictPolicy::Replace).await.unwrap();

        let at = t0() + Duration::hours(1);
        let second = direct(&store, listing, at).await;
        let superseded = store.insert_purchase(&second, ConflictPolicy::Replace).await.unwrap();

        assert_eq!(superseded.len(), 1);
        assert_eq!(superseded[0].id, first.id);
        assert_eq!(superseded[0].status, BoostStatus::Cancelled);
        let old = store.stored(first.id).await.unwrap();
        assert_eq!(old, superseded[0]);
        assert_eq!(old.ended_at, Some(at));
    }

    #[tokio::test]
    async fn test_expire_due_respects_limit_and_order() {
        let store = InMemoryStore::with_seed_catalog().await.unwrap();
        let a = direct(&store, 41, t0()).await;
        let b = direct(&store, 42, t0() + Duration::hours(1)).await;
        store.insert_purchase(&a, ConflictPolicy::Reject).await.unwrap();
        store.insert_purchase(&b, ConflictPolicy::Reject).await.unwrap();

        let now = t0() + Duration::days(30);
        let first = store.expire_due(now, 1).await.unwrap();
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].id, a.id);

        let rest = store.expire_due(now, 10).await.unwrap();
        assert_eq!(rest.len(), 1);
        assert_eq!(rest[0].id, b.id);
        assert!(store.expire_due(now, 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_listing_directory() {
        let store = InMemoryStore::new();
        let owner = 7;
        let listing = 42;

        store.add_listing(listing, owner).await;
        assert_eq!(store.owner_of(listing).await.unwrap(), Some(owner));
        assert_eq!(store.listings_of(owner).await.unwrap(), vec![listing]);

        store.remove_listing(listing).await;
        assert_eq!(store.owner_of(listing).await.unwrap(), None);
        assert!(store.listings_of(owner).await.unwrap().is_empty());
    }
}
