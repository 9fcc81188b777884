//! Events emitted to the notification sink

use rust_decimal::Decimal;

use crate::common::types::{ContractRef, Direction, StopReason};
use crate::session::state::SessionState;

/// A status event; `Display` renders the plain-text message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A contract was bought after a reversal signal
    SignalDetected {
        direction: Direction,
        contract_id: ContractRef,
        stake: Decimal,
    },
    /// A contract settled; totals are after applying it
    ContractSettled(SettlementReport),
    /// The session ended
    SessionEnded(FinalReport),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettlementReport {
    pub won: bool,
    pub profit: Decimal,
    pub wins: u32,
    pub losses: u32,
    pub consecutive_losses: u32,
    pub cumulative_profit: Decimal,
    pub next_stake: Decimal,
}

/// Summary sent exactly once when a session terminates
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalReport {
    pub wins: u32,
    pub losses: u32,
    pub net_profit: Decimal,
    pub reason: StopReason,
}

impl FinalReport {
    pub fn from_state(state: &SessionState, reason: StopReason) -> Self {
        Self {
            wins: state.wins(),
            losses: state.losses(),
            net_profit: state.cumulative_profit(),
            reason,
        }
    }
}

impl std::fmt::Display for SessionEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionEvent::SignalDetected {
                direction,
                contract_id,
                stake,
            } => write!(
                f,
                "signal detected {} | contract {} | stake {}",
                direction, contract_id, stake
            ),
            SessionEvent::ContractSettled(report) => write!(
                f,
                "{} ({}) | wins: {} | losses: {} | consecutive losses: {} | total profit: {} | next stake: {}",
                if report.won { "WIN" } else { "LOSS" },
                report.profit,
                report.wins,
                report.losses,
                report.consecutive_losses,
                report.cumulative_profit,
                report.next_stake,
            ),
            SessionEvent::SessionEnded(report) => write!(
                f,
                "session ended: {} | wins: {} | losses: {} | net profit: {}",
                report.reason, report.wins, report.losses, report.net_profit
            ),
        }
    }
}
