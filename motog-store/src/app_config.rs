use motog_core::ConflictPolicy;
use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    #[serde(default)]
    pub ledger: LedgerConfig,
    #[serde(default)]
    pub ranking: RankingConfig,
    #[serde(default)]
    pub sweeper: SweeperConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 { 5 }

#[derive(Debug, Deserialize, Clone, Default)]
pub struct LedgerConfig {
    #[serde(default)]
    pub conflict_policy: ConflictPolicy,
}

/// Weights fed into `RankWeight`. Higher tier sorts first.
#[derive(Debug, Deserialize, Clone)]
pub struct RankingConfig {
    #[serde(default = "default_single_listing_tier")]
    pub single_listing_tier: u32,
    #[serde(default = "default_bundle_tier")]
    pub bundle_tier: u32,
    /// Break ties inside a tier by the package price
    #[serde(default = "default_weigh_by_price")]
    pub weigh_by_price: bool,
}

fn default_single_listing_tier() -> u32 { 2 }
fn default_bundle_tier() -> u32 { 1 }
fn default_weigh_by_price() -> bool { true }

impl RankingConfig {
    /// Tier 0 is reserved for unboosted listings
    pub fn validate(&self) -> Result<(), config::ConfigError> {
        for (key, tier) in [
            ("ranking.single_listing_tier", self.single_listing_tier),
            ("ranking.bundle_tier", self.bundle_tier),
        ] {
            if tier == 0 {
                return Err(config::ConfigError::Message(format!(
                    "{key} must be at least 1, 0 is the unboosted tier"
                )));
            }
        }
        Ok(())
    }
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            single_listing_tier: default_single_listing_tier(),
            bundle_tier: default_bundle_tier(),
            weigh_by_price: default_weigh_by_price(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct SweeperConfig {
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

fn default_interval_secs() -> u64 { 60 }
fn default_batch_size() -> usize { 500 }

impl Default for SweeperConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            batch_size: default_batch_size(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            // Start off by merging in the "default" configuration file
            .add_source(config::File::with_name("config/default"))
            // Per-environment overrides, optional
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Local overrides, never checked in
            .add_source(config::File::with_name("config/local").required(false))
            // Eg.. `MOTOG__DATABASE__URL=postgres://...`
            .add_source(config::Environment::with_prefix("MOTOG").separator("__"))
            .build()?;

        let config: Config = s.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), config::ConfigError> {
        self.ranking.validate()
    }
}
