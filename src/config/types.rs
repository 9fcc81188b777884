//! Configuration types

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::common::errors::Result;
use crate::common::types::Currency;
use crate::session::state::SessionConfig;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    /// Venue connection configuration
    #[serde(default)]
    pub venue: VenueConfig,
    /// Session parameters delivered before the session starts
    #[serde(default)]
    pub session: Option<SessionSettings>,
    /// Entitlement collaborator configuration
    #[serde(default)]
    pub entitlements: EntitlementConfig,
    /// General application settings
    #[serde(default)]
    pub settings: AppSettings,
}

/// Venue websocket configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VenueConfig {
    /// WebSocket URL, without the app id query
    #[serde(default = "default_websocket_url")]
    pub websocket_url: String,
    /// Registered application id
    #[serde(default = "default_app_id")]
    pub app_id: String,
    /// Instrument traded by the session
    #[serde(default = "default_symbol")]
    pub symbol: String,
    /// Upper bound for every venue call, in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
}

impl Default for VenueConfig {
    fn default() -> Self {
        Self {
            websocket_url: default_websocket_url(),
            app_id: default_app_id(),
            symbol: default_symbol(),
            request_timeout_seconds: default_request_timeout(),
        }
    }
}

fn default_websocket_url() -> String {
    "wss://ws.derivws.com/websockets/v3".to_string()
}

fn default_app_id() -> String {
    "1089".to_string()
}

fn default_symbol() -> String {
    "R_100".to_string()
}

fn default_request_timeout() -> u64 {
    10
}

/// Session parameters as supplied by the interface layer
#[derive(Clone, Serialize, Deserialize)]
pub struct SessionSettings {
    /// Identity of the operator; also the notification target
    pub owner: String,
    /// Venue API token
    pub api_token: String,
    #[serde(default)]
    pub currency: Currency,
    pub initial_stake: Decimal,
    pub target_profit: Decimal,
}

impl std::fmt::Debug for SessionSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionSettings")
            .field("owner", &self.owner)
            .field("api_token", &"<redacted>")
            .field("currency", &self.currency)
            .field("initial_stake", &self.initial_stake)
            .field("target_profit", &self.target_profit)
            .finish()
    }
}

impl SessionSettings {
    /// Validate and convert into a session configuration
    pub fn to_session_config(&self) -> Result<SessionConfig> {
        SessionConfig::new(
            self.api_token.clone(),
            self.currency,
            self.initial_stake,
            self.target_profit,
        )
    }
}

/// Where entitlement answers come from
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct EntitlementConfig {
    /// Base URL of an HTTP entitlement service
    #[serde(default)]
    pub url: Option<String>,
    /// Identities permitted when no service is configured
    #[serde(default)]
    pub allowed: Vec<String>,
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSettings {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Scheduler tick period in milliseconds
    #[serde(default = "default_tick_interval")]
    pub tick_interval_ms: u64,
    /// Extra delay after a failed tick in milliseconds
    #[serde(default = "default_retry_delay")]
    pub retry_delay_ms: u64,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            tick_interval_ms: default_tick_interval(),
            retry_delay_ms: default_retry_delay(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_tick_interval() -> u64 {
    1000
}

fn default_retry_delay() -> u64 {
    1000
}
