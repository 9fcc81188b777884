//! Stake progression and stop decisions after each settlement

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::params::StrategyParams;
use crate::common::types::StopReason;

/// Running totals for one session
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Ledger {
    /// Stake for the next contract
    pub current_stake: Decimal,
    /// Sum of all settled profits (losses are negative)
    pub cumulative_profit: Decimal,
    pub wins: u32,
    pub losses: u32,
    pub consecutive_losses: u32,
}

impl Ledger {
    /// Fresh ledger for a session starting at `initial_stake`
    pub fn opening(initial_stake: Decimal) -> Self {
        Self {
            current_stake: initial_stake,
            ..Self::default()
        }
    }
}

/// Continue trading or end the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Continue,
    Stop(StopReason),
}

/// Ledger and verdict after applying one settlement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RiskOutcome {
    pub ledger: Ledger,
    pub won: bool,
    pub verdict: Verdict,
}

/// Martingale stake policy with stop-loss and take-profit
#[derive(Debug, Clone, PartialEq)]
pub struct RiskPolicy {
    initial_stake: Decimal,
    target_profit: Decimal,
    loss_multiplier: Decimal,
    stop_loss_streak: u32,
}

impl RiskPolicy {
    pub fn new(initial_stake: Decimal, target_profit: Decimal, params: &StrategyParams) -> Self {
        Self {
            initial_stake,
            target_profit,
            loss_multiplier: params.loss_multiplier,
            stop_loss_streak: params.stop_loss_streak,
        }
    }

    /// Apply a settled `profit` to `ledger`
    ///
    /// Stop-loss is evaluated before take-profit, so a settlement that
    /// satisfies both ends the session as a stop-loss.
    pub fn apply(&self, ledger: &Ledger, profit: Decimal) -> RiskOutcome {
        let mut next = ledger.clone();
        let won = profit > Decimal::ZERO;

        if won {
            next.wins += 1;
            next.consecutive_losses = 0;
            next.current_stake = self.initial_stake;
        } else {
            next.losses += 1;
            next.consecutive_losses += 1;
            next.current_stake = ledger.current_stake * self.loss_multiplier;
        }
        next.cumulative_profit += profit;

        let verdict = if next.consecutive_losses >= self.stop_loss_streak {
            Verdict::Stop(StopReason::StopLoss)
        } else if next.cumulative_profit >= self.target_profit {
            Verdict::Stop(StopReason::TargetReached)
        } else {
            Verdict::Continue
        };

        RiskOutcome {
            ledger: next,
            won,
            verdict,
        }
    }
}
