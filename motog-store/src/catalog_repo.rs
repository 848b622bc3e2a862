use async_trait::async_trait;
use chrono::{DateTime, Utc};
use motog_catalog::{BoostPackage, PackageId, PackageScope};
use motog_core::{PackageRepository, RepositoryError, RepositoryResult};
use sqlx::PgPool;

pub struct PostgresPackageRepository {
    pool: PgPool,
}

impl PostgresPackageRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// `price` is NUMERIC(10,2) in the catalog; it is read back in paise.
// `is_active` and `created_at` are nullable in the marketplace's own schema.
#[derive(sqlx::FromRow)]
struct PackageRow {
    id: i32,
    name: String,
    duration_days: i32,
    price_minor: i64,
    scope: String,
    is_active: bool,
    created_at: DateTime<Utc>,
}

const PACKAGE_COLUMNS: &str = r#"
    id, name, duration_days, (price * 100)::BIGINT AS price_minor,
    type AS scope, COALESCE(is_active, TRUE) AS is_active,
    COALESCE(created_at, NOW()) AS created_at
"#;

impl TryFrom<PackageRow> for BoostPackage {
    type Error = RepositoryError;

    fn try_from(row: PackageRow) -> Result<Self, Self::Error> {
        let scope: PackageScope = row
            .scope
            .parse()
            .map_err(|e| RepositoryError::Corrupt(format!("boost_packages.{}: {}", row.id, e)))?;

        let package = BoostPackage {
            id: row.id,
            name: row.name,
            duration_days: row.duration_days,
            price_minor: row.price_minor,
            currency: "INR".to_string(),
            scope,
            is_active: row.is_active,
            created_at: row.created_at,
        };
        package
            .validate()
            .map_err(|e| RepositoryError::Corrupt(e.to_string()))?;

        Ok(package)
    }
}

#[async_trait]
impl PackageRepository for PostgresPackageRepository {
    async fn get_package(&self, id: PackageId) -> RepositoryResult<Option<BoostPackage>> {
        let row = sqlx::query_as::<_, PackageRow>(&format!(
            "SELECT {PACKAGE_COLUMNS} FROM boost_packages WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(RepositoryError::backend)?;

        row.map(BoostPackage::try_from).transpose()
    }

    async fn list_packages(&self) -> RepositoryResult<Vec<BoostPackage>> {
        let rows = sqlx::query_as::<_, PackageRow>(&format!(
            "SELECT {PACKAGE_COLUMNS} FROM boost_packages WHERE COALESCE(is_active, TRUE) ORDER BY id"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(RepositoryError::backend)?;

        rows.into_iter().map(BoostPackage::try_from).collect()
    }
}
