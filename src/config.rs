use std::path::PathBuf;

use anyhow::Result;
use config::{Config, Environment, File};
use serde::Deserialize;

/// Default backend origin when nothing else is configured.
pub const DEFAULT_API_URL: &str = "http://localhost:3000";

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub network: NetworkConfig,
    pub auth: AuthConfig,
    pub google: GoogleConfig,
    pub bidding: BiddingConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApiConfig {
    pub base_url: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct NetworkConfig {
    pub request_timeout_secs: u64,
    pub connect_timeout_secs: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: 30,
            connect_timeout_secs: 10,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AuthConfig {
    /// Raw `Cookie` header value copied from a signed-in browser session.
    pub session_cookie: Option<String>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct GoogleConfig {
    /// OAuth client id for the tenant calendar sync.
    pub client_id: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BiddingConfig {
    pub max_offers_per_listing: u32,
    /// Offers closer than this to the suggested minimum still read as weak.
    pub weak_margin: f64,
}

impl Default for BiddingConfig {
    fn default() -> Self {
        Self {
            max_offers_per_listing: 3,
            weak_margin: 8000.0,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    pub session_file: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            session_file: default_data_dir().join("session.json"),
        }
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("rent-desk")
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        // Load .env file (silently ignore if not present - production uses env vars directly)
        let _ = dotenvy::dotenv();

        let api_url =
            std::env::var("RENTDESK_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());

        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("rent-desk");

        let session_file = default_data_dir().join("session.json");

        let builder = Config::builder()
            // 1. Defaults
            .set_default("api.base_url", api_url)?
            .set_default("network.request_timeout_secs", 30)?
            .set_default("network.connect_timeout_secs", 10)?
            .set_default("auth.session_cookie", None::<String>)?
            .set_default("google.client_id", None::<String>)?
            .set_default("bidding.max_offers_per_listing", 3)?
            .set_default("bidding.weak_margin", 8000.0)?
            .set_default(
                "storage.session_file",
                session_file.to_string_lossy().to_string(),
            )?
            // 2. Local config file (optional, lowest priority)
            .add_source(File::from(PathBuf::from("config.toml")).required(false))
            // 3. User config directory (optional, overrides local)
            .add_source(File::from(config_dir.join("config.toml")).required(false))
            // 4. Environment variables (RENTDESK__API__BASE_URL=...)
            .add_source(Environment::with_prefix("RENTDESK").separator("__"));

        let s = builder.build()?;
        Ok(s.try_deserialize()?)
    }
}
