pub mod package;

pub use package::{BoostPackage, CatalogError, PackageId, PackageScope};
