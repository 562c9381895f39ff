use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, File, FileFormat};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct WalletConfig {
    pub api: ApiConfig,
    pub chain: ChainConfig,
    #[serde(default)]
    pub feed: FeedConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub enrichment: EnrichmentConfig,
}

impl WalletConfig {
    pub fn load() -> Result<Self> {
        let configured_path = std::env::var("WALLET_STORE_CONFIG")
            .unwrap_or_else(|_| "config/wallet.toml".to_string());
        assert!(
            !configured_path.is_empty(),
            "Configuration path must be non-empty"
        );
        assert!(
            configured_path.len() < 4096,
            "Configuration path length exceeds hard limit"
        );

        let mut builder = Config::builder()
            .add_source(File::new(&configured_path, FileFormat::Toml).required(true));

        if let Ok(env_override) = std::env::var("WALLET_STORE_ENV") {
            if !env_override.is_empty() {
                let env_file = format!("config/wallet.{}.toml", env_override);
                if Path::new(&env_file).exists() {
                    builder = builder.add_source(File::new(&env_file, FileFormat::Toml));
                }
            }
        }

        Self::from_builder(builder, &configured_path)
    }

    pub fn from_toml(source: &str) -> Result<Self> {
        let builder = Config::builder().add_source(File::from_str(source, FileFormat::Toml));
        Self::from_builder(builder, "<inline>")
    }

    fn from_builder(builder: ConfigBuilder<DefaultState>, origin: &str) -> Result<Self> {
        let settings = builder
            .build()
            .map_err(|err| map_config_error(err, origin))?;
        let config: Self = settings
            .try_deserialize()
            .context("Failed to deserialize wallet configuration")?;

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.api.base_url.is_empty() {
            bail!("api.base_url must be specified");
        }
        if self.api.chain_api_url.is_empty() {
            bail!("api.chain_api_url must be specified");
        }
        self.api.ensure_bounds()?;
        self.chain.ensure_bounds()?;
        self.feed.ensure_bounds()?;
        self.cache.ensure_bounds()?;
        self.enrichment.ensure_bounds()?;
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Liker Land backend serving sessions, followees and email.
    pub base_url: String,
    /// Chain REST endpoint serving NFT events, classes and balances.
    pub chain_api_url: String,
    pub request_timeout_ms: Option<u64>,
}

impl ApiConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms.unwrap_or(10_000))
    }

    fn ensure_bounds(&self) -> Result<()> {
        let millis = self.request_timeout().as_millis();
        if !(100..=60_000).contains(&millis) {
            bail!("api.request_timeout_ms must be between 100 and 60000, got {millis}");
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChainConfig {
    pub chain_id: String,
    #[serde(default = "ChainConfig::default_min_denom")]
    pub min_denom: String,
    pub login_message: String,
    /// Address the NFT API uses to deliver purchases; drives sale classification.
    pub platform_wallet: String,
}

impl ChainConfig {
    fn default_min_denom() -> String {
        "nanolike".to_string()
    }

    fn ensure_bounds(&self) -> Result<()> {
        for (label, value) in [
            ("chain.chain_id", &self.chain_id),
            ("chain.min_denom", &self.min_denom),
            ("chain.login_message", &self.login_message),
            ("chain.platform_wallet", &self.platform_wallet),
        ] {
            if value.trim().is_empty() {
                bail!("{label} must be non-empty");
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeedConfig {
    #[serde(default = "FeedConfig::default_event_limit")]
    pub event_limit: usize,
}

impl FeedConfig {
    const fn default_event_limit() -> usize {
        100
    }

    fn ensure_bounds(&self) -> Result<()> {
        if self.event_limit == 0 || self.event_limit > 1_000 {
            bail!(
                "feed.event_limit must be between 1 and 1000, got {}",
                self.event_limit
            );
        }
        Ok(())
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            event_limit: Self::default_event_limit(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub profiles_max_capacity: u64,
    pub profiles_ttl_seconds: u64,
    pub classes_max_capacity: u64,
    pub classes_ttl_seconds: u64,
}

impl CacheConfig {
    fn ensure_bounds(&self) -> Result<()> {
        if self.profiles_max_capacity < 10 || self.classes_max_capacity < 10 {
            bail!("cache capacities must be at least 10");
        }
        if self.profiles_ttl_seconds > 86_400 || self.classes_ttl_seconds > 86_400 {
            bail!("cache TTL cannot exceed one day");
        }
        Ok(())
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            profiles_max_capacity: 2_048,
            profiles_ttl_seconds: 600,
            classes_max_capacity: 4_096,
            classes_ttl_seconds: 3_600,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct EnrichmentConfig {
    #[serde(default = "EnrichmentConfig::default_queue_capacity")]
    pub queue_capacity: usize,
}

impl EnrichmentConfig {
    const fn default_queue_capacity() -> usize {
        256
    }

    fn ensure_bounds(&self) -> Result<()> {
        if self.queue_capacity == 0 || self.queue_capacity > 65_536 {
            bail!(
                "enrichment.queue_capacity must be between 1 and 65536, got {}",
                self.queue_capacity
            );
        }
        Ok(())
    }
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            queue_capacity: Self::default_queue_capacity(),
        }
    }
}

fn map_config_error(err: ConfigError, path: &str) -> anyhow::Error {
    match err {
        ConfigError::NotFound(_) => ConfigError::NotFound(path.to_string()).into(),
        other => anyhow::Error::new(other).context(format!("Failed to read configuration {path}")),
    }
}
