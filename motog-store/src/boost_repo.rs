use async_trait::async_trait;
use chrono::{DateTime, Utc};
use motog_catalog::PackageScope;
use motog_core::{BoostLedgerRepository, ConflictPolicy, RepositoryError, RepositoryResult};
use motog_ledger::{BoostPurchase, BoostStatus, ListingId, OwnerId};
use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

pub struct PostgresBoostLedgerRepository {
    pool: PgPool,
}

impl PostgresBoostLedgerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct PurchaseRow {
    id: Uuid,
    owner_id: OwnerId,
    package_id: i32,
    scope: String,
    target_listing_id: Option<ListingId>,
    price_minor: i64,
    purchased_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    status: String,
    ended_at: Option<DateTime<Utc>>,
}

const PURCHASE_COLUMNS: &str = r#"
    id, owner_id, package_id, scope, target_listing_id, price_minor,
    purchased_at, expires_at, status, ended_at
"#;

impl TryFrom<PurchaseRow> for BoostPurchase {
    type Error = RepositoryError;

    fn try_from(row: PurchaseRow) -> Result<Self, Self::Error> {
        let corrupt = |e: &dyn std::fmt::Display| {
            RepositoryError::Corrupt(format!("boost_purchases.{}: {}", row.id, e))
        };

        let scope: PackageScope = row.scope.parse().map_err(|e| corrupt(&e))?;
        let status: BoostStatus = row.status.parse().map_err(|e| corrupt(&e))?;

        if scope.requires_target() != row.target_listing_id.is_some() {
            return Err(corrupt(&"target listing does not match scope"));
        }

        Ok(BoostPurchase {
            id: row.id,
            owner_id: row.owner_id,
            package_id: row.package_id,
            scope,
            target_listing_id: row.target_listing_id,
            price_minor: row.price_minor,
            purchased_at: row.purchased_at,
            expires_at: row.expires_at,
            status,
            ended_at: row.ended_at,
        })
    }
}

fn into_purchases(rows: Vec<PurchaseRow>) -> RepositoryResult<Vec<BoostPurchase>> {
    rows.into_iter().map(BoostPurchase::try_from).collect()
}

#[async_trait]
impl BoostLedgerRepository for PostgresBoostLedgerRepository {
    async fn insert_purchase(
        &self,
        purchase: &BoostPurchase,
        policy: ConflictPolicy,
    ) -> RepositoryResult<Vec<BoostPurchase>> {
        let mut tx = self.pool.begin().await.map_err(RepositoryError::backend)?;
        let mut superseded = Vec::new();

        if let Some(listing_id) = purchase.target_listing_id {
            // Serializes concurrent direct purchases for one listing until commit
            sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1, 0))")
                .bind(format!("boost_listing:{listing_id}"))
                .execute(&mut *tx)
                .await
                .map_err(RepositoryError::backend)?;

            let live: Vec<Uuid> = sqlx::query_scalar(
                r#"
                SELECT id FROM boost_purchases
                WHERE target_listing_id = $1 AND status = 'active' AND expires_at > $2
                ORDER BY purchased_at DESC
                "#,
            )
            .bind(listing_id)
            .bind(purchase.purchased_at)
            .fetch_all(&mut *tx)
            .await
            .map_err(RepositoryError::backend)?;

            if let Some(existing) = live.first().copied() {
                match policy {
                    ConflictPolicy::Reject => {
                        warn!("Rejecting boost for listing {}: {} is live", listing_id, existing);
                        return Err(RepositoryError::Conflict { listing_id, existing });
                    }
                    ConflictPolicy::Replace => {
                        let rows = sqlx::query_as::<_, PurchaseRow>(&format!(
                            r#"
                            UPDATE boost_purchases
                            SET status = 'cancelled', ended_at = $2
                            WHERE id = ANY($1) AND status = 'active'
                            RETURNING {PURCHASE_COLUMNS}
                            "#
                        ))
                        .bind(live.as_slice())
                        .bind(purchase.purchased_at)
                        .fetch_all(&mut *tx)
                        .await
                        .map_err(RepositoryError::backend)?;

                        info!("Superseded boosts {:?} on listing {}", live, listing_id);
                        superseded = into_purchases(rows)?;
                    }
                }
            }
        }

        sqlx::query(
            r#"
            INSERT INTO boost_purchases
                (id, owner_id, package_id, scope, target_listing_id, price_minor,
                 purchased_at, expires_at, status, ended_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(purchase.id)
        .bind(purchase.owner_id)
        .bind(purchase.package_id)
        .bind(purchase.scope.as_str())
        .bind(purchase.target_listing_id)
        .bind(purchase.price_minor)
        .bind(purchase.purchased_at)
        .bind(purchase.expires_at)
        .bind(purchase.status.as_str())
        .bind(purchase.ended_at)
        .execute(&mut *tx)
        .await
        .map_err(RepositoryError::backend)?;

        tx.commit().await.map_err(RepositoryError::backend)?;
        Ok(superseded)
    }

    async fn get_purchase(&self, id: Uuid) -> RepositoryResult<Option<BoostPurchase>> {
        let row = sqlx::query_as::<_, PurchaseRow>(&format!(
            "SELECT {PURCHASE_COLUMNS} FROM boost_purchases WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(RepositoryError::backend)?;

        row.map(BoostPurchase::try_from).transpose()
    }

    async fn cancel_purchase(
        &self,
        id: Uuid,
        now: DateTime<Utc>,
    ) -> RepositoryResult<Option<BoostPurchase>> {
        let row = sqlx::query_as::<_, PurchaseRow>(&format!(
            r#"
            UPDATE boost_purchases
            SET status = 'cancelled', ended_at = $2
            WHERE id = $1 AND status = 'active' AND expires_at > $2
            RETURNING {PURCHASE_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(RepositoryError::backend)?;

        row.map(BoostPurchase::try_from).transpose()
    }

    async fn list_live_for_owner(
        &self,
        owner_id: OwnerId,
        now: DateTime<Utc>,
    ) -> RepositoryResult<Vec<BoostPurchase>> {
        let rows = sqlx::query_as::<_, PurchaseRow>(&format!(
            r#"
            SELECT {PURCHASE_COLUMNS} FROM boost_purchases
            WHERE owner_id = $1 AND status = 'active' AND expires_at > $2
            ORDER BY purchased_at DESC, id DESC
            "#
        ))
        .bind(owner_id)
        .bind(now)
        .fetch_all(&self.pool)
        .await
        .map_err(RepositoryError::backend)?;

        into_purchases(rows)
    }

    async fn list_live_for_listing(
        &self,
        listing_id: ListingId,
        now: DateTime<Utc>,
    ) -> RepositoryResult<Vec<BoostPurchase>> {
        let rows = sqlx::query_as::<_, PurchaseRow>(&format!(
            r#"
            SELECT {PURCHASE_COLUMNS} FROM boost_purchases
            WHERE target_listing_id = $1 AND status = 'active' AND expires_at > $2
            ORDER BY purchased_at DESC, id DESC
            "#
        ))
        .bind(listing_id)
        .bind(now)
        .fetch_all(&self.pool)
        .await
        .map_err(RepositoryError::backend)?;

        into_purchases(rows)
    }

    async fn expire_due(
        &self,
        now: DateTime<Utc>,
        limit: usize,
    ) -> RepositoryResult<Vec<BoostPurchase>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);

        let rows = sqlx::query_as::<_, PurchaseRow>(&format!(
            r#"
            UPDATE boost_purchases
            SET status = 'expired', ended_at = expires_at
            WHERE status = 'active' AND id IN (
                SELECT id FROM boost_purchases
                WHERE status = 'active' AND expires_at <= $1
                ORDER BY expires_at
                LIMIT $2
                FOR UPDATE SKIP LOCKED
            )
            RETURNING {PURCHASE_COLUMNS}
            "#
        ))
        .bind(now)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(RepositoryError::backend)?;

        into_purchases(rows)
    }
}
