//! Common test utilities and fixtures

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use engulfing_trader::common::errors::{Result, TraderError};
use engulfing_trader::common::traits::{Notifier, VenueClient, VenueConnector};
use engulfing_trader::common::types::{ContractRef, Currency, OrderRequest, SettlementResult};
use engulfing_trader::session::{SessionConfig, SessionEvent};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Scripted venue behavior shared by every connection a [`FakeConnector`] opens
#[derive(Default)]
struct Script {
    fail_connects: usize,
    fail_auth: bool,
    ticks: VecDeque<Vec<Decimal>>,
    placements: VecDeque<Result<Option<ContractRef>>>,
    settlements: VecDeque<Result<SettlementResult>>,
    connects: usize,
    closes: usize,
    orders: Vec<OrderRequest>,
    polled: Vec<ContractRef>,
}

/// Venue connector driven by a script instead of the network
#[derive(Clone, Default)]
pub struct FakeConnector {
    script: Arc<Mutex<Script>>,
}

impl FakeConnector {
    pub fn new() -> Self {
        Self::default()
    }

    fn with<R>(&self, f: impl FnOnce(&mut Script) -> R) -> R {
        f(&mut self.script.lock().unwrap())
    }

    /// Fail the next `n` connection attempts
    pub fn fail_connects(&self, n: usize) {
        self.with(|s| s.fail_connects = n);
    }

    pub fn fail_auth(&self, fail: bool) {
        self.with(|s| s.fail_auth = fail);
    }

    /// Queue the prices returned by the next tick fetch
    pub fn push_ticks(&self, prices: &[Decimal]) {
        self.with(|s| s.ticks.push_back(prices.to_vec()));
    }

    pub fn push_placement(&self, result: Result<Option<ContractRef>>) {
        self.with(|s| s.placements.push_back(result));
    }

    pub fn push_settlement(&self, result: Result<SettlementResult>) {
        self.with(|s| s.settlements.push_back(result));
    }

    pub fn connects(&self) -> usize {
        self.with(|s| s.connects)
    }

    pub fn closes(&self) -> usize {
        self.with(|s| s.closes)
    }

    pub fn orders(&self) -> Vec<OrderRequest> {
        self.with(|s| s.orders.clone())
    }

    pub fn polled(&self) -> Vec<ContractRef> {
        self.with(|s| s.polled.clone())
    }
}

#[async_trait]
impl VenueConnector for FakeConnector {
    type Client = FakeVenueClient;

    async fn connect(&self) -> Result<FakeVenueClient> {
        self.with(|s| {
            if s.fail_connects > 0 {
                s.fail_connects -= 1;
                return Err(TraderError::WebSocketConnection("refused".to_string()));
            }
            s.connects += 1;
            Ok(())
        })?;
        Ok(FakeVenueClient {
            script: self.script.clone(),
        })
    }
}

pub struct FakeVenueClient {
    script: Arc<Mutex<Script>>,
}

impl FakeVenueClient {
    fn with<R>(&self, f: impl FnOnce(&mut Script) -> R) -> R {
        f(&mut self.script.lock().unwrap())
    }
}

#[async_trait]
impl VenueClient for FakeVenueClient {
    async fn authorize(&mut self, _credential: &str) -> Result<()> {
        if self.with(|s| s.fail_auth) {
            return Err(TraderError::Authentication("InvalidToken".to_string()));
        }
        Ok(())
    }

    async fn fetch_recent_ticks(&mut self, _symbol: &str, _count: usize) -> Result<Vec<Decimal>> {
        Ok(self.with(|s| s.ticks.pop_front().unwrap_or_default()))
    }

    async fn quote_and_place(&mut self, order: &OrderRequest) -> Result<Option<ContractRef>> {
        self.with(|s| {
            s.orders.push(order.clone());
            s.placements.pop_front().unwrap_or(Ok(None))
        })
    }

    async fn poll_settlement(&mut self, contract: ContractRef) -> Result<SettlementResult> {
        self.with(|s| {
            s.polled.push(contract);
            s.settlements.pop_front().unwrap_or(Ok(SettlementResult {
                is_expired: false,
                profit: Decimal::ZERO,
            }))
        })
    }

    async fn close(&mut self) {
        self.with(|s| s.closes += 1);
    }
}

/// Notifier that keeps every event it receives
#[derive(Clone, Default)]
pub struct RecordingNotifier {
    events: Arc<Mutex<Vec<(String, SessionEvent)>>>,
}

impl RecordingNotifier {
    pub fn events(&self) -> Vec<(String, SessionEvent)> {
        self.events.lock().unwrap().clone()
    }

    pub fn session_ends(&self) -> usize {
        self.events()
            .iter()
            .filter(|(_, e)| matches!(e, SessionEvent::SessionEnded(_)))
            .count()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, target: &str, event: &SessionEvent) {
        self.events
            .lock()
            .unwrap()
            .push((target.to_string(), event.clone()));
    }
}

/// Session configuration used across scenarios
pub fn session_config(initial_stake: Decimal, target_profit: Decimal) -> SessionConfig {
    SessionConfig::new("test-token", Currency::Usd, initial_stake, target_profit).unwrap()
}

/// Fixed starting instant for clock-driven scenarios
pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()
}

pub fn at(seconds: i64) -> DateTime<Utc> {
    t0() + chrono::Duration::seconds(seconds)
}

pub fn settled(profit: Decimal) -> Result<SettlementResult> {
    Ok(SettlementResult {
        is_expired: true,
        profit,
    })
}

/// Dip then close above the first tick: an `Up` signal (CALL)
pub fn up_reversal() -> [Decimal; 3] {
    [dec!(100.20), dec!(100.10), dec!(100.30)]
}

/// Spike then close below the first tick: a `Down` signal (PUT)
pub fn down_reversal() -> [Decimal; 3] {
    [dec!(100.20), dec!(100.30), dec!(100.10)]
}

/// Steady climb with no reversal
pub fn trending() -> [Decimal; 3] {
    [dec!(100.10), dec!(100.20), dec!(100.30)]
}
