//! Configuration loader

use config::{Config, Environment, File};
use rust_decimal::Decimal;
use std::path::Path;

use super::types::{AppConfig, EntitlementConfig, SessionSettings, VenueConfig};
use crate::common::errors::{Result, TraderError};
use crate::common::types::Currency;

/// Load configuration from file and environment variables
///
/// Priority (highest to lowest):
/// 1. Environment variables (prefixed with TRADER__, `__` separated)
/// 2. Configuration file (TOML format)
/// 3. Default values
pub fn load_config(config_path: Option<&str>) -> Result<AppConfig> {
    let mut builder = Config::builder();

    if let Some(path) = config_path {
        if Path::new(path).exists() {
            builder = builder.add_source(File::with_name(path).required(false));
        }
    }

    builder = builder.add_source(
        Environment::with_prefix("TRADER")
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder
        .build()
        .map_err(|e| TraderError::Configuration(e.to_string()))?;

    let config: AppConfig = config
        .try_deserialize()
        .map_err(|e| TraderError::Configuration(e.to_string()))?;

    validate(config)
}

/// Load configuration from flat environment variables only
pub fn load_from_env() -> Result<AppConfig> {
    dotenvy::dotenv().ok();

    let venue = VenueConfig {
        websocket_url: std::env::var("TRADER_WS_URL")
            .unwrap_or_else(|_| VenueConfig::default().websocket_url),
        app_id: std::env::var("TRADER_APP_ID").unwrap_or_else(|_| VenueConfig::default().app_id),
        ..VenueConfig::default()
    };

    let session = match std::env::var("TRADER_API_TOKEN") {
        Ok(api_token) => Some(SessionSettings {
            owner: std::env::var("TRADER_OWNER").unwrap_or_else(|_| "operator".to_string()),
            api_token,
            currency: match std::env::var("TRADER_CURRENCY") {
                Ok(code) => code.parse()?,
                Err(_) => Currency::default(),
            },
            initial_stake: decimal_var("TRADER_STAKE")?,
            target_profit: decimal_var("TRADER_TARGET_PROFIT")?,
        }),
        Err(_) => None,
    };

    let entitlements = EntitlementConfig {
        url: std::env::var("TRADER_ENTITLEMENT_URL").ok(),
        allowed: Vec::new(),
    };

    validate(AppConfig {
        venue,
        session,
        entitlements,
        settings: super::types::AppSettings::default(),
    })
}

/// Reject values the scheduler and transport cannot run with
fn validate(config: AppConfig) -> Result<AppConfig> {
    if config.settings.tick_interval_ms == 0 {
        return Err(TraderError::Configuration(
            "settings.tick_interval_ms must be greater than 0".to_string(),
        ));
    }
    if config.venue.request_timeout_seconds == 0 {
        return Err(TraderError::Configuration(
            "venue.request_timeout_seconds must be greater than 0".to_string(),
        ));
    }
    Ok(config)
}

fn decimal_var(name: &str) -> Result<Decimal> {
    let raw = std::env::var(name)
        .map_err(|_| TraderError::Configuration(format!("{} is not set", name)))?;
    raw.trim()
        .parse()
        .map_err(|e| TraderError::Configuration(format!("{}: {}", name, e)))
}
