use motog_catalog::{BoostPackage, PackageId};
use motog_core::PackageRepository;
use std::sync::Arc;

use crate::error::{BoostError, BoostResult};

/// Read-only view of the boost packages on offer
#[derive(Clone)]
pub struct PackageCatalog {
    packages: Arc<dyn PackageRepository>,
}

impl PackageCatalog {
    pub fn new(packages: Arc<dyn PackageRepository>) -> Self {
        Self { packages }
    }

    /// Look up a package by id, retired ones included
    pub async fn get_package(&self, id: PackageId) -> BoostResult<BoostPackage> {
        self.packages
            .get_package(id)
            .await?
            .ok_or(BoostError::PackageNotFound(id))
    }

    /// Packages a seller can buy right now
    pub async fn list_packages(&self) -> BoostResult<Vec<BoostPackage>> {
        Ok(self.packages.list_packages().await?)
    }
}
