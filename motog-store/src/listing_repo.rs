use async_trait::async_trait;
use motog_core::{ListingDirectory, RepositoryError, RepositoryResult};
use motog_ledger::{ListingId, OwnerId};
use sqlx::PgPool;

/// Reads listing ownership from the marketplace's `vehicle_listings` table
/// (`id`, `user_id` are INTEGER). Soft-deleted listings (`is_active = FALSE`)
/// are treated as gone; a NULL flag counts as active, like the column default.
pub struct PostgresListingDirectory {
    pool: PgPool,
}

impl PostgresListingDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ListingDirectory for PostgresListingDirectory {
    async fn owner_of(&self, listing_id: ListingId) -> RepositoryResult<Option<OwnerId>> {
        // `user_id` is nullable upstream; an orphaned listing has no owner
        let owner: Option<Option<OwnerId>> = sqlx::query_scalar(
            r#"
            SELECT user_id FROM vehicle_listings
            WHERE id = $1 AND COALESCE(is_active, TRUE)
            "#,
        )
        .bind(listing_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(RepositoryError::backend)?;

        Ok(owner.flatten())
    }

    async fn listings_of(&self, owner_id: OwnerId) -> RepositoryResult<Vec<ListingId>> {
        sqlx::query_scalar(
            r#"
            SELECT id FROM vehicle_listings
            WHERE user_id = $1 AND COALESCE(is_active, TRUE)
            ORDER BY id
            "#,
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .map_err(RepositoryError::backend)
    }
}
