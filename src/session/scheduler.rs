//! Tick-driven session scheduler
//!
//! Each tick performs at most one step of the session state machine:
//!
//! ```text
//!   Idle ──configure──► AwaitingEntry ──placed──► Trading
//!                          ▲      │                  │
//!                          │      └─ revoked ─┐      │ settled
//!                          └──── continue ────┼──────┘
//!                                             ▼
//!                                          Stopped ──reset──► Idle
//! ```
//!
//! Faults inside a tick never escape: they are reported as
//! [`TickOutcome::Recovered`], the held connection is discarded and the
//! run loop waits an extra retry delay before the next tick.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, sleep, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use super::events::{FinalReport, SessionEvent, SettlementReport};
use super::poller::{PollOutcome, SettlementPoller};
use super::state::{SessionConfig, SessionHandle, SessionPhase, SessionState};
use crate::common::errors::{Result, TraderError};
use crate::common::traits::{EntitlementCheck, Notifier, VenueClient, VenueConnector};
use crate::common::types::{OpenContract, StopReason};
use crate::config::types::AppConfig;
use crate::strategy::{RiskPolicy, StrategyParams, TickWindow, Verdict, TICK_WINDOW_LEN};

/// What a single tick did
#[derive(Debug)]
pub enum TickOutcome {
    /// No session running
    Idle,
    /// Ticks under-filled or no reversal pattern
    NoSignal,
    /// Signal seen but the venue offered no proposal, no contract id, or rejected the order
    MissedOpportunity,
    /// Contract bought
    Placed(OpenContract),
    /// Contract still inside its maturity wait
    AwaitingMaturity,
    /// Contract polled but not yet expired
    Pending,
    /// Contract settled and the session continues
    Settled { won: bool, profit: Decimal },
    /// Session terminated during this tick
    Stopped(StopReason),
    /// Tick failed; connection discarded
    Recovered(TraderError),
}

/// Timing and instrument settings for the scheduler
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub symbol: String,
    pub tick_interval: Duration,
    pub retry_delay: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            symbol: "R_100".to_string(),
            tick_interval: Duration::from_secs(1),
            retry_delay: Duration::from_secs(1),
        }
    }
}

/// Shortest tick period the run loop accepts
const MIN_TICK_INTERVAL: Duration = Duration::from_millis(1);

impl SchedulerConfig {
    pub fn from_app(config: &AppConfig) -> Self {
        Self {
            symbol: config.venue.symbol.clone(),
            tick_interval: Duration::from_millis(config.settings.tick_interval_ms)
                .max(MIN_TICK_INTERVAL),
            retry_delay: Duration::from_millis(config.settings.retry_delay_ms),
        }
    }
}

/// Owns the venue connection and drives the session record
pub struct Scheduler<C: VenueConnector> {
    connector: C,
    session: SessionHandle,
    entitlements: Arc<dyn EntitlementCheck>,
    notifier: Arc<dyn Notifier>,
    params: StrategyParams,
    poller: SettlementPoller,
    config: SchedulerConfig,
    connection: Option<C::Client>,
}

impl<C: VenueConnector + 'static> Scheduler<C> {
    pub fn new(
        connector: C,
        session: SessionHandle,
        entitlements: Arc<dyn EntitlementCheck>,
        notifier: Arc<dyn Notifier>,
        config: SchedulerConfig,
    ) -> Self {
        let params = StrategyParams::default();
        Self {
            connector,
            session,
            entitlements,
            notifier,
            poller: SettlementPoller::new(params.maturity_wait),
            params,
            config,
            connection: None,
        }
    }

    /// Replace the strategy constants
    pub fn with_params(mut self, params: StrategyParams) -> Self {
        self.poller = SettlementPoller::new(params.maturity_wait);
        self.params = params;
        self
    }

    pub fn session(&self) -> &SessionHandle {
        &self.session
    }

    /// Whether an entry connection is currently held
    pub fn has_connection(&self) -> bool {
        self.connection.is_some()
    }

    /// Run one tick at the current wall-clock time
    pub async fn tick(&mut self) -> TickOutcome {
        self.tick_at(Utc::now()).await
    }

    /// Run one tick as if the clock read `now`
    pub async fn tick_at(&mut self, now: DateTime<Utc>) -> TickOutcome {
        if let Some(reason) = self.session.take_stop_request() {
            if self.stop_session(reason).await {
                return TickOutcome::Stopped(reason);
            }
        }

        let snapshot = self.session.snapshot().await;
        let result = match snapshot.phase() {
            SessionPhase::Idle => {
                self.drop_connection().await;
                return TickOutcome::Idle;
            }
            SessionPhase::AwaitingEntry => self.seek_entry(&snapshot, now).await,
            SessionPhase::Trading => self.check_settlement(&snapshot, now).await,
        };

        match result {
            Ok(outcome) => outcome,
            Err(err) => {
                if err.is_transport() {
                    warn!("Tick failed, dropping venue connection: {}", err);
                } else {
                    error!("Tick failed, dropping venue connection: {}", err);
                }
                self.drop_connection().await;
                TickOutcome::Recovered(err)
            }
        }
    }

    async fn seek_entry(&mut self, snapshot: &SessionState, now: DateTime<Utc>) -> Result<TickOutcome> {
        let config = session_config(snapshot)?;
        let owner = snapshot.owner().unwrap_or_default().to_string();

        self.ensure_connection(&config.credential).await?;
        let client = self.connection.as_mut().ok_or_else(|| {
            TraderError::WebSocketConnection("no venue connection".to_string())
        })?;

        let prices = client
            .fetch_recent_ticks(&self.config.symbol, TICK_WINDOW_LEN)
            .await?;
        let Some(window) = TickWindow::from_recent(&prices) else {
            debug!("Only {} ticks available, waiting", prices.len());
            return Ok(TickOutcome::NoSignal);
        };
        let Some(direction) = window.signal() else {
            return Ok(TickOutcome::NoSignal);
        };
        info!(%direction, prices = ?window.prices(), "Reversal signal");

        if !self.entitlements.is_authorized(&owner).await? {
            warn!(owner = %owner, "Entitlement revoked, ending session");
            self.stop_session(StopReason::AccessRevoked).await;
            return Ok(TickOutcome::Stopped(StopReason::AccessRevoked));
        }

        let order = self.params.order_for(
            direction,
            snapshot.current_stake(),
            config.currency,
            &self.config.symbol,
        );
        let client = self.connection.as_mut().ok_or_else(|| {
            TraderError::WebSocketConnection("no venue connection".to_string())
        })?;

        match client.quote_and_place(&order).await {
            Ok(Some(contract_id)) => {
                let open = OpenContract::new(contract_id, now);
                let recorded = open.clone();
                self.session.update(move |s| s.record_open(recorded)).await;
                // Placement connections are one-shot.
                self.drop_connection().await;

                info!(contract = %contract_id, stake = %order.amount, "Contract placed");
                self.notifier.notify(
                    &owner,
                    &SessionEvent::SignalDetected {
                        direction,
                        contract_id,
                        stake: order.amount,
                    },
                );
                Ok(TickOutcome::Placed(open))
            }
            Ok(None) => Ok(TickOutcome::MissedOpportunity),
            Err(err) if err.is_order_rejection() => {
                warn!("Order not placed: {}", err);
                Ok(TickOutcome::MissedOpportunity)
            }
            Err(err) => Err(err),
        }
    }

    async fn check_settlement(
        &mut self,
        snapshot: &SessionState,
        now: DateTime<Utc>,
    ) -> Result<TickOutcome> {
        let config = session_config(snapshot)?;
        let Some(open) = snapshot.open_contract() else {
            return Ok(TickOutcome::Idle);
        };

        let settlement = match self
            .poller
            .poll(&self.connector, &config.credential, open, now)
            .await?
        {
            PollOutcome::NotDue => return Ok(TickOutcome::AwaitingMaturity),
            PollOutcome::Pending => return Ok(TickOutcome::Pending),
            PollOutcome::Settled(settlement) => settlement,
        };

        let policy = RiskPolicy::new(config.initial_stake, config.target_profit, &self.params);
        let outcome = self
            .session
            .update(move |s| {
                let outcome = policy.apply(s.ledger(), settlement.profit);
                s.record_settlement(outcome.ledger.clone());
                outcome
            })
            .await;

        let owner = snapshot.owner().unwrap_or_default();
        info!(
            won = outcome.won,
            profit = %settlement.profit,
            cumulative = %outcome.ledger.cumulative_profit,
            next_stake = %outcome.ledger.current_stake,
            "Settlement applied"
        );
        self.notifier.notify(
            owner,
            &SessionEvent::ContractSettled(SettlementReport {
                won: outcome.won,
                profit: settlement.profit,
                wins: outcome.ledger.wins,
                losses: outcome.ledger.losses,
                consecutive_losses: outcome.ledger.consecutive_losses,
                cumulative_profit: outcome.ledger.cumulative_profit,
                next_stake: outcome.ledger.current_stake,
            }),
        );

        match outcome.verdict {
            Verdict::Continue => Ok(TickOutcome::Settled {
                won: outcome.won,
                profit: settlement.profit,
            }),
            Verdict::Stop(reason) => {
                self.stop_session(reason).await;
                Ok(TickOutcome::Stopped(reason))
            }
        }
    }

    /// End the running session with `reason`
    ///
    /// Emits the final report and resets the record. Returns `false` without
    /// side effects when no session is running.
    pub async fn stop_session(&mut self, reason: StopReason) -> bool {
        let finished = self
            .session
            .update(|s| {
                if !s.is_running() {
                    return None;
                }
                if let Some(open) = s.open_contract() {
                    warn!(contract = %open.contract_id, "Stopping with an unsettled contract");
                }
                let report = FinalReport::from_state(s, reason);
                let owner = s.owner().unwrap_or_default().to_string();
                s.reset();
                Some((owner, report))
            })
            .await;

        self.drop_connection().await;

        match finished {
            Some((owner, report)) => {
                info!(
                    reason = %report.reason,
                    wins = report.wins,
                    losses = report.losses,
                    net_profit = %report.net_profit,
                    "Session ended"
                );
                self.notifier
                    .notify(&owner, &SessionEvent::SessionEnded(report));
                true
            }
            None => {
                debug!("Stop requested ({}) but no session is running", reason);
                false
            }
        }
    }

    async fn ensure_connection(&mut self, credential: &str) -> Result<()> {
        if self.connection.is_some() {
            return Ok(());
        }

        let mut client = self.connector.connect().await?;
        if let Err(err) = client.authorize(credential).await {
            client.close().await;
            return Err(err);
        }
        self.connection = Some(client);
        Ok(())
    }

    async fn drop_connection(&mut self) {
        if let Some(mut client) = self.connection.take() {
            client.close().await;
        }
    }

    /// Drive ticks until `shutdown` flips to `true` or its sender is dropped
    ///
    /// A running session is stopped manually on the way out.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        // interval() panics on a zero period
        let mut ticker = interval(self.config.tick_interval.max(MIN_TICK_INTERVAL));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(symbol = %self.config.symbol, "Scheduler started");

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let TickOutcome::Recovered(err) = self.tick().await {
                        debug!("Backing off {:?} after: {}", self.config.retry_delay, err);
                        sleep(self.config.retry_delay).await;
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        self.stop_session(StopReason::Manual).await;
        self.drop_connection().await;
        info!("Scheduler stopped");
    }

    /// Start the run loop on the tokio runtime
    pub fn spawn(self) -> SchedulerTask {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(self.run(shutdown_rx));
        SchedulerTask {
            handle,
            shutdown: shutdown_tx,
        }
    }
}

fn session_config(snapshot: &SessionState) -> Result<SessionConfig> {
    snapshot.config().cloned().ok_or_else(|| {
        TraderError::InvalidSession("running session without configuration".to_string())
    })
}

/// Handle to a spawned scheduler
pub struct SchedulerTask {
    handle: JoinHandle<()>,
    shutdown: watch::Sender<bool>,
}

impl SchedulerTask {
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Signal the loop to stop and wait for it to finish
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        if let Err(e) = self.handle.await {
            error!("Scheduler task failed: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::traits::{
        MockEntitlementCheck, MockNotifier, MockVenueClient, MockVenueConnector,
    };
    use crate::common::types::{ContractRef, Currency, SettlementResult};
    use rust_decimal_macros::dec;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Connector handing out pre-built mock clients in order
    fn connector(clients: Vec<MockVenueClient>) -> MockVenueConnector {
        let queue = Mutex::new(VecDeque::from(clients));
        let mut connector = MockVenueConnector::new();
        connector.expect_connect().returning(move || {
            queue
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| TraderError::WebSocketConnection("refused".into()))
        });
        connector
    }

    fn entry_client(prices: Vec<Decimal>, contract: Option<u64>) -> MockVenueClient {
        let mut client = MockVenueClient::new();
        client.expect_authorize().returning(|_| Ok(()));
        client
            .expect_fetch_recent_ticks()
            .returning(move |_, _| Ok(prices.clone()));
        client
            .expect_quote_and_place()
            .returning(move |_| Ok(contract.map(ContractRef)));
        client.expect_close().returning(|| ());
        client
    }

    fn settlement_client(profit: Decimal) -> MockVenueClient {
        let mut client = MockVenueClient::new();
        client.expect_authorize().returning(|_| Ok(()));
        client.expect_poll_settlement().returning(move |_| {
            Ok(SettlementResult {
                is_expired: true,
                profit,
            })
        });
        client.expect_close().times(1).returning(|| ());
        client
    }

    fn allow_all() -> Arc<dyn EntitlementCheck> {
        let mut check = MockEntitlementCheck::new();
        check.expect_is_authorized().returning(|_| Ok(true));
        Arc::new(check)
    }

    fn quiet_notifier() -> Arc<dyn Notifier> {
        let mut notifier = MockNotifier::new();
        notifier.expect_notify().returning(|_, _| ());
        Arc::new(notifier)
    }

    async fn running_session(stake: Decimal, target: Decimal) -> SessionHandle {
        let session = SessionHandle::new();
        session
            .configure(
                "42",
                SessionConfig::new("token", Currency::Usd, stake, target).unwrap(),
            )
            .await
            .unwrap();
        session
    }

    #[tokio::test]
    async fn test_idle_tick_does_nothing() {
        let mut connector = MockVenueConnector::new();
        connector.expect_connect().never();
        let mut scheduler = Scheduler::new(
            connector,
            SessionHandle::new(),
            allow_all(),
            quiet_notifier(),
            SchedulerConfig::default(),
        );
        assert!(matches!(scheduler.tick().await, TickOutcome::Idle));
    }

    #[tokio::test]
    async fn test_no_pattern_keeps_connection() {
        let session = running_session(dec!(10), dec!(50)).await;
        let mut client = MockVenueClient::new();
        client.expect_authorize().times(1).returning(|_| Ok(()));
        client
            .expect_fetch_recent_ticks()
            .times(2)
            .returning(|_, _| Ok(vec![dec!(1), dec!(2), dec!(3)]));
        client.expect_quote_and_place().never();
        client.expect_close().returning(|| ());

        let mut scheduler = Scheduler::new(
            connector(vec![client]),
            session.clone(),
            allow_all(),
            quiet_notifier(),
            SchedulerConfig::default(),
        );

        assert!(matches!(scheduler.tick().await, TickOutcome::NoSignal));
        assert!(scheduler.has_connection());
        assert!(matches!(scheduler.tick().await, TickOutcome::NoSignal));
        assert_eq!(session.phase().await, SessionPhase::AwaitingEntry);
    }

    #[tokio::test]
    async fn test_revoked_entitlement_stops_session() {
        let session = running_session(dec!(10), dec!(50)).await;
        let mut client = MockVenueClient::new();
        client.expect_authorize().returning(|_| Ok(()));
        client
            .expect_fetch_recent_ticks()
            .returning(|_, _| Ok(vec![dec!(100), dec!(99), dec!(101)]));
        client.expect_quote_and_place().never();
        client.expect_close().returning(|| ());

        let mut check = MockEntitlementCheck::new();
        check
            .expect_is_authorized()
            .withf(|identity| identity == "42")
            .returning(|_| Ok(false));

        let mut notifier = MockNotifier::new();
        notifier
            .expect_notify()
            .withf(|target, event| {
                target == "42"
                    && matches!(
                        event,
                        SessionEvent::SessionEnded(FinalReport {
                            reason: StopReason::AccessRevoked,
                            ..
                        })
                    )
            })
            .times(1)
            .returning(|_, _| ());

        let mut scheduler = Scheduler::new(
            connector(vec![client]),
            session.clone(),
            Arc::new(check),
            Arc::new(notifier),
            SchedulerConfig::default(),
        );

        assert!(matches!(
            scheduler.tick().await,
            TickOutcome::Stopped(StopReason::AccessRevoked)
        ));
        assert_eq!(session.snapshot().await, SessionState::default());
        assert!(!scheduler.has_connection());
    }

    #[tokio::test]
    async fn test_signal_places_contract_and_settles() {
        let session = running_session(dec!(10), dec!(5)).await;
        let placement = entry_client(vec![dec!(100), dec!(99), dec!(101)], Some(31337));

        let mut scheduler = Scheduler::new(
            connector(vec![placement, settlement_client(dec!(9.5))]),
            session.clone(),
            allow_all(),
            quiet_notifier(),
            SchedulerConfig::default(),
        );

        let t0 = Utc::now();
        let placed = scheduler.tick_at(t0).await;
        assert!(matches!(placed, TickOutcome::Placed(ref open) if open.contract_id == ContractRef(31337)));
        assert!(!scheduler.has_connection());
        assert_eq!(session.phase().await, SessionPhase::Trading);

        assert!(matches!(
            scheduler.tick_at(t0 + chrono::Duration::seconds(10)).await,
            TickOutcome::AwaitingMaturity
        ));

        let settled = scheduler.tick_at(t0 + chrono::Duration::seconds(18)).await;
        assert!(matches!(
            settled,
            TickOutcome::Stopped(StopReason::TargetReached)
        ));
        assert!(!session.is_running().await);
    }

    #[test]
    fn test_zero_tick_interval_is_clamped() {
        let mut app = AppConfig::default();
        app.settings.tick_interval_ms = 0;
        let config = SchedulerConfig::from_app(&app);
        assert_eq!(config.tick_interval, MIN_TICK_INTERVAL);
        assert_eq!(config.symbol, "R_100");
    }

    #[tokio::test]
    async fn test_zero_interval_run_loop_survives() {
        let session = running_session(dec!(10), dec!(50)).await;
        let mut client = MockVenueClient::new();
        client.expect_authorize().returning(|_| Ok(()));
        client
            .expect_fetch_recent_ticks()
            .returning(|_, _| Ok(Vec::new()));
        client.expect_close().returning(|| ());

        let config = SchedulerConfig {
            tick_interval: Duration::ZERO,
            ..SchedulerConfig::default()
        };
        let task = Scheduler::new(
            connector(vec![client]),
            session.clone(),
            allow_all(),
            quiet_notifier(),
            config,
        )
        .spawn();

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!task.is_finished());
        task.shutdown().await;
        assert!(!session.is_running().await);
    }

    #[tokio::test]
    async fn test_fetch_count_matches_detector_window() {
        let session = running_session(dec!(10), dec!(50)).await;
        let mut client = MockVenueClient::new();
        client.expect_authorize().returning(|_| Ok(()));
        client
            .expect_fetch_recent_ticks()
            .withf(|symbol, count| symbol == "R_100" && *count == TICK_WINDOW_LEN)
            .times(1)
            .returning(|_, _| Ok(vec![dec!(1), dec!(2), dec!(3)]));
        client.expect_close().returning(|| ());

        let params = StrategyParams {
            loss_multiplier: dec!(2),
            ..StrategyParams::default()
        };
        let mut scheduler = Scheduler::new(
            connector(vec![client]),
            session,
            allow_all(),
            quiet_notifier(),
            SchedulerConfig::default(),
        )
        .with_params(params);

        assert!(matches!(scheduler.tick().await, TickOutcome::NoSignal));
    }

    #[tokio::test]
    async fn test_connect_failure_is_recovered() {
        let session = running_session(dec!(10), dec!(50)).await;
        let mut scheduler = Scheduler::new(
            connector(Vec::new()),
            session.clone(),
            allow_all(),
            quiet_notifier(),
            SchedulerConfig::default(),
        );

        let outcome = scheduler.tick().await;
        assert!(matches!(
            outcome,
            TickOutcome::Recovered(TraderError::WebSocketConnection(_))
        ));
        assert!(session.is_running().await);
    }

    #[tokio::test]
    async fn test_rejected_order_is_missed_opportunity() {
        let session = running_session(dec!(10), dec!(50)).await;
        let mut client = MockVenueClient::new();
        client.expect_authorize().returning(|_| Ok(()));
        client
            .expect_fetch_recent_ticks()
            .returning(|_, _| Ok(vec![dec!(100), dec!(101), dec!(99)]));
        client
            .expect_quote_and_place()
            .withf(|order| order.contract_type() == "PUT" && order.barrier == "+0.8")
            .returning(|_| Err(TraderError::Order("InvalidBarrier".into())));
        client.expect_close().returning(|| ());

        let mut scheduler = Scheduler::new(
            connector(vec![client]),
            session.clone(),
            allow_all(),
            quiet_notifier(),
            SchedulerConfig::default(),
        );

        assert!(matches!(
            scheduler.tick().await,
            TickOutcome::MissedOpportunity
        ));
        assert!(scheduler.has_connection());
        assert_eq!(session.phase().await, SessionPhase::AwaitingEntry);
    }
}
