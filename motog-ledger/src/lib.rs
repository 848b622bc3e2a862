pub mod models;

pub use models::{BoostPurchase, BoostStatus, LedgerError, ListingId, OwnerId};
