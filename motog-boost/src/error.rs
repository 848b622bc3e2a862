use motog_catalog::{PackageId, PackageScope};
use motog_core::RepositoryError;
use motog_ledger::{BoostStatus, LedgerError, ListingId, OwnerId};
use uuid::Uuid;

/// Everything the engine reports back to its caller
#[derive(Debug, thiserror::Error)]
pub enum BoostError {
    #[error("Boost package not found: {0}")]
    PackageNotFound(PackageId),

    #[error("Boost purchase not found: {0}")]
    PurchaseNotFound(Uuid),

    #[error("Boost package {0} is no longer offered")]
    PackageUnavailable(PackageId),

    #[error("Package scope {scope} does not accept target listing {target_listing_id:?}")]
    InvalidScopeTarget {
        scope: PackageScope,
        target_listing_id: Option<ListingId>,
    },

    #[error("Listing {listing_id} is not owned by {owner_id}")]
    ListingNotOwned { listing_id: ListingId, owner_id: OwnerId },

    #[error("Boost {purchase_id} is already {status}")]
    AlreadyTerminal {
        purchase_id: Uuid,
        status: BoostStatus,
    },

    #[error("Listing {listing_id} already has live boost {existing}")]
    Conflict { listing_id: ListingId, existing: Uuid },

    #[error("Ledger rule violated: {0}")]
    Ledger(LedgerError),

    #[error("Storage error: {0}")]
    Storage(RepositoryError),
}

impl BoostError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, BoostError::PackageNotFound(_) | BoostError::PurchaseNotFound(_))
    }

    /// Storage failures are transient; everything else is a caller error
    pub fn is_retryable(&self) -> bool {
        matches!(self, BoostError::Storage(RepositoryError::Backend(_)))
    }
}

impl From<RepositoryError> for BoostError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Conflict { listing_id, existing } => {
                BoostError::Conflict { listing_id, existing }
            }
            other => BoostError::Storage(other),
        }
    }
}

impl From<LedgerError> for BoostError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::InvalidScopeTarget { scope, target_listing_id } => {
                BoostError::InvalidScopeTarget { scope, target_listing_id }
            }
            LedgerError::AlreadyTerminal { purchase_id, status } => {
                BoostError::AlreadyTerminal { purchase_id, status }
            }
            other => BoostError::Ledger(other),
        }
    }
}

pub type BoostResult<T> = Result<T, BoostError>;
