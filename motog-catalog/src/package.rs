use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub type PackageId = i32;

/// Which listings a boost package elevates
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PackageScope {
    /// One listing, named at purchase time
    SingleListing,
    /// Every listing the buyer owns while the boost runs
    Bundle,
}

impl PackageScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            PackageScope::SingleListing => "single_listing",
            PackageScope::Bundle => "bundle",
        }
    }

    pub fn requires_target(&self) -> bool {
        matches!(self, PackageScope::SingleListing)
    }
}

impl fmt::Display for PackageScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PackageScope {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "single_listing" => Ok(PackageScope::SingleListing),
            "bundle" => Ok(PackageScope::Bundle),
            other => Err(CatalogError::UnknownScope(other.to_string())),
        }
    }
}

/// A purchasable boost, seeded once and never mutated
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BoostPackage {
    pub id: PackageId,
    pub name: String,
    pub duration_days: i32,
    /// Price in minor currency units (paise)
    pub price_minor: i64,
    pub currency: String,
    pub scope: PackageScope,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl BoostPackage {
    pub fn new(
        id: PackageId,
        name: impl Into<String>,
        duration_days: i32,
        price_minor: i64,
        scope: PackageScope,
    ) -> Result<Self, CatalogError> {
        let package = Self {
            id,
            name: name.into(),
            duration_days,
            price_minor,
            currency: "INR".to_string(),
            scope,
            is_active: true,
            created_at: Utc::now(),
        };
        package.validate()?;
        Ok(package)
    }

    /// Check the catalog invariants (positive duration, non-negative price)
    pub fn validate(&self) -> Result<(), CatalogError> {
        if self.duration_days <= 0 {
            return Err(CatalogError::InvalidDuration {
                package_id: self.id,
                duration_days: self.duration_days,
            });
        }
        if self.price_minor < 0 {
            return Err(CatalogError::NegativePrice {
                package_id: self.id,
                price_minor: self.price_minor,
            });
        }
        Ok(())
    }

    pub fn duration(&self) -> Duration {
        Duration::days(i64::from(self.duration_days))
    }

    /// Expiry instant of a boost of this package bought at `purchased_at`
    pub fn expiry_for(&self, purchased_at: DateTime<Utc>) -> Result<DateTime<Utc>, CatalogError> {
        self.validate()?;
        purchased_at
            .checked_add_signed(self.duration())
            .ok_or(CatalogError::ExpiryOverflow(self.id))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Unknown package scope: {0}")]
    UnknownScope(String),

    #[error("Package {package_id} has non-positive duration {duration_days}")]
    InvalidDuration {
        package_id: PackageId,
        duration_days: i32,
    },

    #[error("Package {package_id} has negative price {price_minor}")]
    NegativePrice {
        package_id: PackageId,
        price_minor: i64,
    },

    #[error("Expiry out of range for package {0}")]
    ExpiryOverflow(PackageId),
}
