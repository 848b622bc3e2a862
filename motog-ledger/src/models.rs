use chrono::{DateTime, Utc};
use motog_catalog::{BoostPackage, CatalogError, PackageId, PackageScope};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Marketplace `users.id`
pub type OwnerId = i32;

/// Marketplace `vehicle_listings.id`
pub type ListingId = i32;

/// Ledger entry status. Only ever moves forward out of `Active`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum BoostStatus {
    Active,
    Expired,
    Cancelled,
}

impl BoostStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BoostStatus::Active => "active",
            BoostStatus::Expired => "expired",
            BoostStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, BoostStatus::Active)
    }
}

impl fmt::Display for BoostStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BoostStatus {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(BoostStatus::Active),
            "expired" => Ok(BoostStatus::Expired),
            "cancelled" => Ok(BoostStatus::Cancelled),
            other => Err(LedgerError::UnknownStatus(other.to_string())),
        }
    }
}

/// One purchased boost
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BoostPurchase {
    pub id: Uuid,
    pub owner_id: OwnerId,
    pub package_id: PackageId,
    /// Copied from the package so resolution never needs the catalog
    pub scope: PackageScope,
    pub target_listing_id: Option<ListingId>,
    pub price_minor: i64,
    pub purchased_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub status: BoostStatus,
    pub ended_at: Option<DateTime<Utc>>,
}

impl BoostPurchase {
    /// Build a new active entry for `package`.
    ///
    /// A target listing is required for single-listing packages and
    /// forbidden for bundles.
    pub fn new(
        owner_id: OwnerId,
        package: &BoostPackage,
        target_listing_id: Option<ListingId>,
        purchased_at: DateTime<Utc>,
    ) -> Result<Self, LedgerError> {
        if package.scope.requires_target() != target_listing_id.is_some() {
            return Err(LedgerError::InvalidScopeTarget {
                scope: package.scope,
                target_listing_id,
            });
        }

        let expires_at = package.expiry_for(purchased_at)?;

        Ok(Self {
            id: Uuid::new_v4(),
            owner_id,
            package_id: package.id,
            scope: package.scope,
            target_listing_id,
            price_minor: package.price_minor,
            purchased_at,
            expires_at,
            status: BoostStatus::Active,
            ended_at: None,
        })
    }

    /// Status as observed at `now`: an active entry past its window reads
    /// as expired even before the sweeper has persisted it.
    pub fn effective_status(&self, now: DateTime<Utc>) -> BoostStatus {
        match self.status {
            BoostStatus::Active if now >= self.expires_at => BoostStatus::Expired,
            status => status,
        }
    }

    /// Whether this entry elevates anything at `now`
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.effective_status(now) == BoostStatus::Active
    }

    pub fn is_direct(&self) -> bool {
        self.scope == PackageScope::SingleListing
    }

    /// Active → Cancelled
    pub fn cancel(&mut self, now: DateTime<Utc>) -> Result<(), LedgerError> {
        let current = self.effective_status(now);
        if current.is_terminal() {
            return Err(LedgerError::AlreadyTerminal {
                purchase_id: self.id,
                status: current,
            });
        }

        self.status = BoostStatus::Cancelled;
        self.ended_at = Some(now);
        Ok(())
    }

    /// Active → Expired, only once the window has elapsed
    pub fn expire(&mut self, now: DateTime<Utc>) -> Result<(), LedgerError> {
        if self.status.is_terminal() {
            return Err(LedgerError::AlreadyTerminal {
                purchase_id: self.id,
                status: self.status,
            });
        }
        if now < self.expires_at {
            return Err(LedgerError::NotYetDue {
                purchase_id: self.id,
                expires_at: self.expires_at,
            });
        }

        self.status = BoostStatus::Expired;
        self.ended_at = Some(self.expires_at);
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("Package scope {scope} does not accept target listing {target_listing_id:?}")]
    InvalidScopeTarget {
        scope: PackageScope,
        target_listing_id: Option<ListingId>,
    },

    #[error("Boost {purchase_id} is already {status}")]
    AlreadyTerminal {
        purchase_id: Uuid,
        status: BoostStatus,
    },

    #[error("Boost {purchase_id} does not expire until {expires_at}")]
    NotYetDue {
        purchase_id: Uuid,
        expires_at: DateTime<Utc>,
    },

    #[error("Unknown boost status: {0}")]
    UnknownStatus(String),

    #[error(transparent)]
    Catalog(#[from] CatalogError),
}
