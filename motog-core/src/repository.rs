use async_trait::async_trait;
use chrono::{DateTime, Utc};
use motog_catalog::{BoostPackage, PackageId};
use motog_ledger::{BoostPurchase, ListingId, OwnerId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What to do when a single-listing purchase lands on a listing that already
/// has a live direct boost
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ConflictPolicy {
    /// Fail the newcomer with `RepositoryError::Conflict`
    #[default]
    Reject,
    /// Last writer wins: the live direct boost is cancelled in the same
    /// transaction as the insert
    Replace,
}

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("Listing {listing_id} already has live boost {existing}")]
    Conflict { listing_id: ListingId, existing: Uuid },

    #[error("Stored record is malformed: {0}")]
    Corrupt(String),

    #[error("Storage backend error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl RepositoryError {
    pub fn backend<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Backend(Box::new(err))
    }
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Read-only access to the boost package catalog
#[async_trait]
pub trait PackageRepository: Send + Sync {
    async fn get_package(&self, id: PackageId) -> RepositoryResult<Option<BoostPackage>>;

    /// Purchasable packages, ordered by id
    async fn list_packages(&self) -> RepositoryResult<Vec<BoostPackage>>;
}

/// Durable record of boost purchases
#[async_trait]
pub trait BoostLedgerRepository: Send + Sync {
    /// Persist a new active purchase.
    ///
    /// For single-listing purchases the check for a live direct boost on the
    /// same listing (as of `purchase.purchased_at`) and the insert are one
    /// atomic step. Returns the rows cancelled under `ConflictPolicy::Replace`,
    /// as stored after cancellation.
    async fn insert_purchase(
        &self,
        purchase: &BoostPurchase,
        policy: ConflictPolicy,
    ) -> RepositoryResult<Vec<BoostPurchase>>;

    /// Stored row as-is (status is not adjusted for elapsed windows)
    async fn get_purchase(&self, id: Uuid) -> RepositoryResult<Option<BoostPurchase>>;

    /// Active → Cancelled, applied only while the row is active and its
    /// window is still open at `now`. `None` when no transition happened.
    async fn cancel_purchase(
        &self,
        id: Uuid,
        now: DateTime<Utc>,
    ) -> RepositoryResult<Option<BoostPurchase>>;

    /// Live purchases of any scope owned by `owner_id`, newest first
    async fn list_live_for_owner(
        &self,
        owner_id: OwnerId,
        now: DateTime<Utc>,
    ) -> RepositoryResult<Vec<BoostPurchase>>;

    /// Live single-listing purchases targeting `listing_id`, newest first
    async fn list_live_for_listing(
        &self,
        listing_id: ListingId,
        now: DateTime<Utc>,
    ) -> RepositoryResult<Vec<BoostPurchase>>;

    /// Persist Active → Expired for up to `limit` rows whose window closed at
    /// or before `now`. Returns the rows that were transitioned.
    async fn expire_due(
        &self,
        now: DateTime<Utc>,
        limit: usize,
    ) -> RepositoryResult<Vec<BoostPurchase>>;
}

/// The marketplace's listing store, as seen by bundle resolution
#[async_trait]
pub trait ListingDirectory: Send + Sync {
    async fn owner_of(&self, listing_id: ListingId) -> RepositoryResult<Option<OwnerId>>;

    async fn listings_of(&self, owner_id: OwnerId) -> RepositoryResult<Vec<ListingId>>;
}
