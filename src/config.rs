use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use ::config::{Config, Environment, File};
use moka::future::Cache;
use sea_orm::Database;
use serde::Deserialize;
use tracing::{debug, info};

use crate::schemas::AppState;

const DEFAULT_DATABASE_URL: &str = "sqlite://recipebook.db?mode=rwc";
const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:3000";

/// Runtime settings.
///
/// Sources, lowest priority first: built-in defaults, an optional
/// `recipebook.{toml,yaml,json}` file in the working directory, then
/// `RECIPEBOOK_*` environment variables (`RECIPEBOOK_MEDIA_ROOT`, ...).
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub database_url: String,
    pub bind_address: String,
    /// Directory holding uploaded files
    pub media_root: PathBuf,
    /// How long a token to user mapping stays cached
    pub token_cache_ttl_secs: u64,
}

impl Settings {
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let settings = Config::builder()
            .set_default("database_url", DEFAULT_DATABASE_URL)?
            .set_default("bind_address", DEFAULT_BIND_ADDRESS)?
            .set_default("media_root", "media")?
            .set_default("token_cache_ttl_secs", 300)?
            .add_source(File::with_name("recipebook").required(false))
            .add_source(Environment::with_prefix("RECIPEBOOK"))
            .build()
            .context("Failed to read configuration")?;

        let settings: Settings = settings
            .try_deserialize()
            .context("Invalid configuration")?;
        debug!("Loaded settings: {:?}", settings);
        Ok(settings)
    }

    /// Applies command line overrides on top of the loaded values.
    pub fn with_overrides(mut self, database_url: Option<String>, bind_address: Option<String>) -> Self {
        if let Some(database_url) = database_url {
            self.database_url = database_url;
        }
        if let Some(bind_address) = bind_address {
            self.bind_address = bind_address;
        }
        self
    }
}

/// Initialize application state from settings
pub async fn initialize_app_state(settings: &Settings) -> Result<AppState> {
    info!("Connecting to database: {}", settings.database_url);
    let db = Database::connect(&settings.database_url)
        .await
        .with_context(|| format!("Failed to connect to {}", settings.database_url))?;

    tokio::fs::create_dir_all(&settings.media_root)
        .await
        .with_context(|| format!("Failed to create media root {}", settings.media_root.display()))?;
    debug!("Media root: {}", settings.media_root.display());

    let token_cache = Cache::builder()
        .max_capacity(10_000)
        .time_to_live(Duration::from_secs(settings.token_cache_ttl_secs))
        .build();

    Ok(AppState {
        db,
        token_cache,
        media_root: settings.media_root.clone(),
    })
}
