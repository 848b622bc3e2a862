use motog_catalog::PackageScope;
use motog_ledger::ListingId;
use motog_store::app_config::RankingConfig;
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::BoostResult;
use crate::resolver::{ActivationResolver, EffectiveBoost};

/// Sort key handed to the search layer. Compares by tier first, then by
/// package weight; larger means more visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct RankWeight {
    pub tier: u32,
    pub package_weight: i64,
}

impl RankWeight {
    pub const UNBOOSTED: RankWeight = RankWeight { tier: 0, package_weight: 0 };

    pub fn is_boosted(&self) -> bool {
        self.tier > 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankedListing {
    pub listing_id: ListingId,
    pub weight: RankWeight,
    pub purchase_id: Option<Uuid>,
}

/// Turns effective boosts into ranking weights
pub struct VisibilityRanker {
    resolver: Arc<ActivationResolver>,
    config: RankingConfig,
}

impl VisibilityRanker {
    pub fn new(resolver: Arc<ActivationResolver>, config: RankingConfig) -> Self {
        Self { resolver, config }
    }

    pub fn weight_for(&self, boost: Option<&EffectiveBoost>) -> RankWeight {
        let Some(boost) = boost else {
            return RankWeight::UNBOOSTED;
        };

        let tier = match boost.scope() {
            PackageScope::SingleListing => self.config.single_listing_tier,
            PackageScope::Bundle => self.config.bundle_tier,
        };
        let package_weight = if self.config.weigh_by_price {
            boost.purchase.price_minor
        } else {
            0
        };

        RankWeight { tier, package_weight }
    }

    /// Current weight of one listing
    pub async fn rank(&self, listing_id: ListingId) -> BoostResult<RankWeight> {
        let boost = self.resolver.resolve_listing(listing_id).await?;
        Ok(self.weight_for(boost.as_ref()))
    }

    /// Rank a page of listings against a single instant, most visible first.
    /// Listings with equal weight keep their input order.
    pub async fn rank_listings(&self, listing_ids: &[ListingId]) -> BoostResult<Vec<RankedListing>> {
        let now = self.resolver.now();

        let mut ranked = Vec::with_capacity(listing_ids.len());
        for &listing_id in listing_ids {
            let boost = self.resolver.resolve_listing_at(listing_id, now).await?;
            ranked.push(RankedListing {
                listing_id,
                weight: self.weight_for(boost.as_ref()),
                purchase_id: boost.map(|b| b.purchase_id()),
            });
        }

        ranked.sort_by(|a, b| b.weight.cmp(&a.weight));
        Ok(ranked)
    }
}
