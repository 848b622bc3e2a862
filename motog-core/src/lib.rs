pub mod clock;
pub mod events;
pub mod repository;

pub use clock::{Clock, ManualClock, SystemClock};
pub use events::{EventPublisher, NoopPublisher};
pub use repository::{
    BoostLedgerRepository, ConflictPolicy, ListingDirectory, PackageRepository, RepositoryError,
    RepositoryResult,
};
