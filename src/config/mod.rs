use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use config::{Config, ConfigError, File, FileFormat};
use serde::Deserialize;
use url::Url;

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    pub server: ServerConfig,
    pub indexer: IndexerConfig,
    pub enrichment: EnrichmentConfig,
}

impl ApiConfig {
    pub fn load() -> Result<Self> {
        let configured_path = std::env::var("MARKETPLACE_API_CONFIG")
            .unwrap_or_else(|_| "config/api.toml".to_string());
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

        if let Ok(env_override) = std::env::var("MARKETPLACE_API_ENV") {
            if !env_override.is_empty() {
                let env_file = format!("config/api.{}.toml", env_override);
                if Path::new(&env_file).exists() {
                    builder = builder.add_source(File::new(&env_file, FileFormat::Toml));
                }
            }
        }

        let settings = builder
            .build()
            .map_err(|err| map_config_error(err, &configured_path))?;
        let config: Self = settings
            .try_deserialize()
            .context("Failed to deserialize API configuration")?;

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        assert!(
            self.server.port > 0,
            "Server port must be greater than zero"
        );
        self.indexer.ensure_bounds()?;
        self.enrichment.ensure_bounds()?;
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: Option<IpAddr>,
    pub port: u16,
}

impl ServerConfig {
    pub fn address(&self) -> SocketAddr {
        let host = self.host.unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST));
        assert!(self.port != 0, "HTTP port cannot be zero");
        assert!(self.port < 65535, "HTTP port must be below 65535");
        SocketAddr::new(host, self.port)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct IndexerConfig {
    pub endpoint: String,
    pub request_timeout_ms: Option<u64>,
}

impl IndexerConfig {
    pub fn request_timeout(&self) -> Duration {
        let millis = self.request_timeout_ms.unwrap_or(10_000);
        assert!(millis >= 100, "Indexer timeout must be at least 100ms");
        assert!(millis <= 60_000, "Indexer timeout cannot exceed 60 seconds");
        Duration::from_millis(millis)
    }

    pub fn ensure_bounds(&self) -> Result<()> {
        Url::parse(&self.endpoint)
            .with_context(|| format!("Indexer endpoint is not a valid URL: {}", self.endpoint))?;
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct EnrichmentConfig {
    pub profile_service_url: String,
    pub request_timeout_ms: Option<u64>,
}

impl EnrichmentConfig {
    pub fn request_timeout(&self) -> Duration {
        let millis = self.request_timeout_ms.unwrap_or(5_000);
        assert!(millis >= 100, "Enrichment timeout must be at least 100ms");
        assert!(
            millis <= 60_000,
            "Enrichment timeout cannot exceed 60 seconds"
        );
        Duration::from_millis(millis)
    }

    pub fn ensure_bounds(&self) -> Result<()> {
        Url::parse(&self.profile_service_url).with_context(|| {
            format!(
                "Profile service endpoint is not a valid URL: {}",
                self.profile_service_url
            )
        })?;
        Ok(())
    }
}

fn map_config_error(err: ConfigError, path: &str) -> ConfigError {
    match err {
        ConfigError::NotFound(_) => ConfigError::NotFound(path.to_string()),
        other => other,
    }
}
