//! EngulfingTrader Library
//!
//! An automated short-duration trading session for a binary-options
//! websocket venue: a three-tick reversal signal opens barrier contracts,
//! settlement drives a loss-recovery stake progression, and the session
//! stops on a losing streak or once a profit target is reached.

pub mod common;
pub mod config;
pub mod interface;
pub mod session;
pub mod strategy;
pub mod venue;

// Re-export commonly used types
pub use common::errors::{Result, TraderError};
pub use common::traits::{EntitlementCheck, Notifier, VenueClient, VenueConnector};
pub use common::types::{
    ContractRef, Currency, Direction, OpenContract, OrderRequest, SettlementResult, StopReason,
};
pub use config::types::AppConfig;
pub use interface::{
    AllowAll, ChannelNotifier, HttpEntitlementChecker, InMemoryEntitlements, LogNotifier,
    NullNotifier,
};
pub use session::{
    Scheduler, SchedulerConfig, SchedulerTask, SessionConfig, SessionEvent, SessionHandle,
    SessionPhase, SessionState, TickOutcome,
};
pub use strategy::{detect, Ledger, RiskPolicy, StrategyParams, TickWindow, Verdict};
pub use venue::{WebSocketConnector, WebSocketVenueClient};
