pub mod app_config;
pub mod database;
pub mod catalog_repo;
pub mod boost_repo;
pub mod listing_repo;
pub mod events;

pub use database::DbClient;
pub use catalog_repo::PostgresPackageRepository;
pub use boost_repo::PostgresBoostLedgerRepository;
pub use listing_repo::PostgresListingDirectory;
pub use events::LogEventPublisher;
