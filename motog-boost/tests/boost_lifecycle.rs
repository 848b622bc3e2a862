use chrono::{DateTime, Duration, TimeZone, Utc};
use motog_boost::{BoostEngine, BoostError, EnginePorts, InMemoryStore, RankWeight};
use motog_catalog::PackageScope;
use motog_core::{ConflictPolicy, ManualClock, NoopPublisher};
use motog_ledger::BoostStatus;
use motog_store::app_config::{Config, DatabaseConfig, LedgerConfig, RankingConfig, SweeperConfig};
use std::sync::Arc;

const WEEK_SINGLE: i32 = 1;
const MONTH_SINGLE: i32 = 2;
const MONTH_BUNDLE: i32 = 3;

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 7, 15, 10, 0, 0).unwrap()
}

fn config(policy: ConflictPolicy) -> Config {
    Config {
        database: DatabaseConfig {
            url: "postgres://unused".to_string(),
            max_connections: 1,
        },
        ledger: LedgerConfig { conflict_policy: policy },
        ranking: RankingConfig::default(),
        sweeper: SweeperConfig::default(),
    }
}

async fn engine(policy: ConflictPolicy) -> (Arc<InMemoryStore>, Arc<ManualClock>, BoostEngine) {
    let store = Arc::new(InMemoryStore::with_seed_catalog().await.unwrap());
    let clock = Arc::new(ManualClock::new(t0()));
    let ports = EnginePorts {
        packages: store.clone(),
        ledger: store.clone(),
        listings: store.clone(),
        clock: clock.clone(),
        events: Arc::new(NoopPublisher),
    };
    (store, clock, BoostEngine::new(ports, &config(policy)))
}

#[tokio::test]
async fn test_expiry_is_purchase_plus_duration() {
    let (store, _clock, engine) = engine(ConflictPolicy::Reject).await;
    let owner = 7;
    let listing = 42;
    store.add_listing(listing, owner).await;

    for (package_id, target) in [(WEEK_SINGLE, Some(listing)), (MONTH_BUNDLE, None)] {
        let package = engine.catalog.get_package(package_id).await.unwrap();
        let purchase = engine.ledger.purchase(owner, package_id, target).await.unwrap();
        assert_eq!(purchase.expires_at, purchase.purchased_at + Duration::days(package.duration_days.into()));
        assert!(purchase.expires_at > purchase.purchased_at);
    }
}

#[tokio::test]
async fn test_target_round_trips_by_scope() {
    let (store, _clock, engine) = engine(ConflictPolicy::Reject).await;
    let owner = 7;
    let listing = 42;
    store.add_listing(listing, owner).await;

    let single = engine.ledger.purchase(owner, WEEK_SINGLE, Some(listing)).await.unwrap();
    let bundle = engine.ledger.purchase(owner, MONTH_BUNDLE, None).await.unwrap();

    let single = engine.ledger.get_purchase(single.id).await.unwrap();
    let bundle = engine.ledger.get_purchase(bundle.id).await.unwrap();
    assert_eq!(single.scope, PackageScope::SingleListing);
    assert_eq!(single.target_listing_id, Some(listing));
    assert_eq!(bundle.scope, PackageScope::Bundle);
    assert_eq!(bundle.target_listing_id, None);
}

#[tokio::test]
async fn test_resolution_is_idempotent() {
    let (store, _clock, engine) = engine(ConflictPolicy::Reject).await;
    let owner = 7;
    let listing = 42;
    store.add_listing(listing, owner).await;
    engine.ledger.purchase(owner, MONTH_BUNDLE, None).await.unwrap();

    let first = engine.resolver.resolve(listing, owner).await.unwrap();
    let second = engine.resolver.resolve(listing, owner).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(engine.ranker.rank(listing).await.unwrap(), engine.ranker.rank(listing).await.unwrap());
}

#[tokio::test]
async fn test_single_listing_beats_longer_bundle() {
    let (store, clock, engine) = engine(ConflictPolicy::Reject).await;
    let owner = 7;
    let listing = 42;
    store.add_listing(listing, owner).await;

    // Bundle has 30 days left, the direct boost only 2
    let bundle = engine.ledger.purchase(owner, MONTH_BUNDLE, None).await.unwrap();
    clock.set(t0() - Duration::days(5));
    let direct = engine.ledger.purchase(owner, WEEK_SINGLE, Some(listing)).await.unwrap();
    clock.set(t0());
    assert_eq!(direct.expires_at - t0(), Duration::days(2));

    let effective = engine.resolver.resolve(listing, owner).await.unwrap().unwrap();
    assert_eq!(effective.purchase_id(), direct.id);
    assert_ne!(effective.purchase_id(), bundle.id);
    assert_eq!(engine.ranker.rank(listing).await.unwrap().tier, RankingConfig::default().single_listing_tier);
}

#[tokio::test]
async fn test_expiry_boundary() {
    let (store, clock, engine) = engine(ConflictPolicy::Reject).await;
    let owner = 7;
    let listing = 42;
    store.add_listing(listing, owner).await;
    let purchase = engine.ledger.purchase(owner, WEEK_SINGLE, Some(listing)).await.unwrap();
    let expires_at = purchase.expires_at;

    clock.set(expires_at - Duration::seconds(1));
    let effective = engine.resolver.resolve(listing, owner).await.unwrap();
    assert_eq!(effective.map(|b| b.purchase_id()), Some(purchase.id));
    assert!(engine.ranker.rank(listing).await.unwrap().is_boosted());
    assert_eq!(engine.ledger.list_active_for_owner(owner).await.unwrap().len(), 1);

    // Not swept yet, still invisible
    clock.set(expires_at + Duration::seconds(1));
    assert!(engine.resolver.resolve(listing, owner).await.unwrap().is_none());
    assert_eq!(engine.ranker.rank(listing).await.unwrap(), RankWeight::UNBOOSTED);
    assert!(engine.ledger.list_active_for_owner(owner).await.unwrap().is_empty());
    assert_eq!(store.stored(purchase.id).await.unwrap().status, BoostStatus::Active);

    // Sweeping changes storage, not what readers see
    assert_eq!(engine.sweeper.sweep_once().await.unwrap(), vec![purchase.id]);
    assert_eq!(store.stored(purchase.id).await.unwrap().status, BoostStatus::Expired);
    assert!(engine.resolver.resolve(listing, owner).await.unwrap().is_none());
}

#[tokio::test]
async fn test_bundle_covers_listings_created_later() {
    let (store, clock, engine) = engine(ConflictPolicy::Reject).await;
    let owner = 7;
    let existing = 41;
    store.add_listing(existing, owner).await;

    let bundle = engine.ledger.purchase(owner, MONTH_BUNDLE, None).await.unwrap();

    clock.advance(Duration::days(3));
    let fresh = 43;
    store.add_listing(fresh, owner).await;

    for listing in [existing, fresh] {
        let effective = engine.resolver.resolve_listing(listing).await.unwrap().unwrap();
        assert_eq!(effective.purchase_id(), bundle.id);
    }

    let boosted = engine.resolver.boosted_listings_for_owner(owner).await.unwrap();
    assert_eq!(boosted.len(), 2);
    assert!(boosted.iter().all(|(_, b)| b.as_ref().map(|b| b.purchase_id()) == Some(bundle.id)));

    // Another seller's listing is untouched
    let stranger = 99;
    store.add_listing(stranger, owner + 1).await;
    assert!(engine.resolver.resolve_listing(stranger).await.unwrap().is_none());
}

#[tokio::test]
async fn test_cancellation_is_immediate_and_final() {
    let (store, _clock, engine) = engine(ConflictPolicy::Reject).await;
    let owner = 7;
    let listing = 42;
    store.add_listing(listing, owner).await;
    let purchase = engine.ledger.purchase(owner, MONTH_SINGLE, Some(listing)).await.unwrap();

    engine.ledger.cancel(purchase.id).await.unwrap();

    assert!(engine.ledger.list_active_for_owner(owner).await.unwrap().is_empty());
    assert!(engine.resolver.resolve(listing, owner).await.unwrap().is_none());
    assert!(engine.resolver.covered_listings(purchase.id).await.unwrap().is_empty());
    assert!(matches!(
        engine.ledger.cancel(purchase.id).await,
        Err(BoostError::AlreadyTerminal { status: BoostStatus::Cancelled, .. })
    ));

    // A cancelled direct boost frees the listing
    assert!(engine.ledger.purchase(owner, WEEK_SINGLE, Some(listing)).await.is_ok());
}

#[tokio::test]
async fn test_replace_policy_last_writer_wins() {
    let (store, clock, engine) = engine(ConflictPolicy::Replace).await;
    let owner = 7;
    let listing = 42;
    store.add_listing(listing, owner).await;

    let first = engine.ledger.purchase(owner, WEEK_SINGLE, Some(listing)).await.unwrap();
    clock.advance(Duration::hours(2));
    let second = engine.ledger.purchase(owner, MONTH_SINGLE, Some(listing)).await.unwrap();

    let effective = engine.resolver.resolve(listing, owner).await.unwrap().unwrap();
    assert_eq!(effective.purchase_id(), second.id);
    assert_eq!(engine.ledger.get_purchase(first.id).await.unwrap().status, BoostStatus::Cancelled);
}

#[tokio::test]
async fn test_package_listing() {
    let (_store, _clock, engine) = engine(ConflictPolicy::Reject).await;
    let packages = engine.catalog.list_packages().await.unwrap();

    assert_eq!(packages.len(), 3);
    assert_eq!(packages.iter().filter(|p| p.scope == PackageScope::Bundle).count(), 1);
    assert!(packages.iter().all(|p| p.duration_days > 0 && p.price_minor >= 0));
}
