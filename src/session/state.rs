//! Session configuration, session state and the shared handle guarding it
//!
//! The scheduler is the only writer of [`SessionState`] while a session is
//! running. The interface layer may configure a session while it is idle,
//! read snapshots at any time, and latch a stop request that the scheduler
//! consumes on its next tick.

use rust_decimal::Decimal;
use std::sync::{Arc, Mutex};
use tokio::sync::RwLock;

use crate::common::errors::{Result, TraderError};
use crate::common::types::{Currency, OpenContract, StopReason};
use crate::strategy::{Ledger, STAKE_DECIMALS};

/// Immutable parameters of one session
#[derive(Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Venue API token
    pub credential: String,
    pub currency: Currency,
    pub initial_stake: Decimal,
    pub target_profit: Decimal,
}

impl SessionConfig {
    /// Validate and build a session configuration
    pub fn new(
        credential: impl Into<String>,
        currency: Currency,
        initial_stake: Decimal,
        target_profit: Decimal,
    ) -> Result<Self> {
        let credential = credential.into();
        if credential.trim().is_empty() {
            return Err(TraderError::InvalidSession("credential is empty".to_string()));
        }
        // Orders carry the stake at STAKE_DECIMALS places; anything smaller goes out as zero.
        let min_stake = Decimal::new(1, STAKE_DECIMALS);
        if initial_stake < min_stake {
            return Err(TraderError::InvalidSession(format!(
                "initial stake must be at least {}, got {}",
                min_stake, initial_stake
            )));
        }
        if target_profit <= Decimal::ZERO {
            return Err(TraderError::InvalidSession(format!(
                "target profit must be positive, got {}",
                target_profit
            )));
        }
        Ok(Self {
            credential,
            currency,
            initial_stake,
            target_profit,
        })
    }
}

// Keep the API token out of logs.
impl std::fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionConfig")
            .field("credential", &"<redacted>")
            .field("currency", &self.currency)
            .field("initial_stake", &self.initial_stake)
            .field("target_profit", &self.target_profit)
            .finish()
    }
}

/// Scheduler phase derived from the session state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// No session running
    Idle,
    /// Running, watching ticks for an entry
    AwaitingEntry,
    /// Running, a contract awaits settlement
    Trading,
}

impl std::fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionPhase::Idle => write!(f, "IDLE"),
            SessionPhase::AwaitingEntry => write!(f, "AWAITING_ENTRY"),
            SessionPhase::Trading => write!(f, "TRADING"),
        }
    }
}

/// Mutable record of one session
///
/// `is_trading` is derived from the open contract, so the two can never
/// disagree; `reset` drops the contract together with the running flag.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    running: bool,
    config: Option<SessionConfig>,
    ledger: Ledger,
    open_contract: Option<OpenContract>,
    owner: Option<String>,
}

impl SessionState {
    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_trading(&self) -> bool {
        self.open_contract.is_some()
    }

    pub fn config(&self) -> Option<&SessionConfig> {
        self.config.as_ref()
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn current_stake(&self) -> Decimal {
        self.ledger.current_stake
    }

    pub fn cumulative_profit(&self) -> Decimal {
        self.ledger.cumulative_profit
    }

    pub fn wins(&self) -> u32 {
        self.ledger.wins
    }

    pub fn losses(&self) -> u32 {
        self.ledger.losses
    }

    pub fn consecutive_losses(&self) -> u32 {
        self.ledger.consecutive_losses
    }

    pub fn open_contract(&self) -> Option<&OpenContract> {
        self.open_contract.as_ref()
    }

    /// Notification target and entitlement identity
    pub fn owner(&self) -> Option<&str> {
        self.owner.as_deref()
    }

    pub fn phase(&self) -> SessionPhase {
        match (self.running, self.is_trading()) {
            (false, _) => SessionPhase::Idle,
            (true, false) => SessionPhase::AwaitingEntry,
            (true, true) => SessionPhase::Trading,
        }
    }

    /// One-line status for the interface layer
    pub fn status_line(&self) -> String {
        format!(
            "{} | stake: {} | wins: {} | losses: {} | consecutive losses: {} | profit: {}",
            self.phase(),
            self.ledger.current_stake,
            self.ledger.wins,
            self.ledger.losses,
            self.ledger.consecutive_losses,
            self.ledger.cumulative_profit,
        )
    }

    fn start(&mut self, owner: String, config: SessionConfig) {
        *self = SessionState {
            running: true,
            ledger: Ledger::opening(config.initial_stake),
            config: Some(config),
            open_contract: None,
            owner: Some(owner),
        };
    }

    pub(crate) fn record_open(&mut self, contract: OpenContract) {
        self.open_contract = Some(contract);
    }

    pub(crate) fn record_settlement(&mut self, ledger: Ledger) {
        self.ledger = ledger;
        self.open_contract = None;
    }

    pub(crate) fn reset(&mut self) {
        *self = SessionState::default();
    }
}

/// Cloneable, guarded handle to the single session record
#[derive(Debug, Clone, Default)]
pub struct SessionHandle {
    state: Arc<RwLock<SessionState>>,
    stop_request: Arc<Mutex<Option<StopReason>>>,
}

impl SessionHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a session for `owner`; rejected unless the session is idle
    pub async fn configure(&self, owner: impl Into<String>, config: SessionConfig) -> Result<()> {
        let mut state = self.state.write().await;
        if state.is_running() {
            return Err(TraderError::SessionActive);
        }
        // A stop requested while idle must not end the next session.
        self.lock_stop_request().take();
        state.start(owner.into(), config);
        Ok(())
    }

    /// Copy of the current state
    pub async fn snapshot(&self) -> SessionState {
        self.state.read().await.clone()
    }

    pub async fn phase(&self) -> SessionPhase {
        self.state.read().await.phase()
    }

    pub async fn is_running(&self) -> bool {
        self.state.read().await.is_running()
    }

    /// Ask the scheduler to end the session on its next tick
    ///
    /// The first reason latched wins until the scheduler consumes it.
    pub fn request_stop(&self, reason: StopReason) {
        let mut pending = self.lock_stop_request();
        if pending.is_none() {
            *pending = Some(reason);
        }
    }

    pub(crate) fn take_stop_request(&self) -> Option<StopReason> {
        self.lock_stop_request().take()
    }

    /// Apply one atomic transition to the session record
    pub(crate) async fn update<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut SessionState) -> R,
    {
        let mut state = self.state.write().await;
        f(&mut state)
    }

    fn lock_stop_request(&self) -> std::sync::MutexGuard<'_, Option<StopReason>> {
        self.stop_request
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
