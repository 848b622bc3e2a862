pub mod error;
pub mod memory;
pub mod catalog;
pub mod ledger;
pub mod resolver;
pub mod ranking;
pub mod expiry;
pub mod engine;

pub use error::{BoostError, BoostResult};
pub use memory::InMemoryStore;
pub use catalog::PackageCatalog;
pub use ledger::BoostLedger;
pub use resolver::{ActivationResolver, EffectiveBoost};
pub use ranking::{RankWeight, RankedListing, VisibilityRanker};
pub use expiry::ExpirySweeper;
pub use engine::{BoostEngine, EnginePorts};
