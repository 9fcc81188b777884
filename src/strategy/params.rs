//! Strategy constants for the three-tick reversal martingale

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::time::Duration;

use crate::common::types::{Currency, Direction, OrderRequest};

/// Stake multiplier applied after a losing contract
pub const LOSS_RECOVERY_MULTIPLIER: Decimal = dec!(19);

/// Seconds between placement and the first settlement poll
pub const MATURITY_WAIT_SECS: u64 = 18;

/// Consecutive losses that end the session
pub const STOP_LOSS_STREAK: u32 = 2;

/// Number of ticks the detector looks at
pub const TICK_WINDOW_LEN: usize = 3;

/// Contract duration, in `CONTRACT_DURATION_UNIT`
pub const CONTRACT_DURATION_TICKS: u32 = 5;

/// Venue duration unit for ticks
pub const CONTRACT_DURATION_UNIT: &str = "t";

/// Absolute barrier offset; sign depends on direction
pub const BARRIER_OFFSET: &str = "0.8";

/// Decimal places accepted by the venue for stake amounts
pub const STAKE_DECIMALS: u32 = 2;

/// Tunable view of the strategy constants
///
/// The detector window is fixed at [`TICK_WINDOW_LEN`] and is not part of
/// this set.
#[derive(Debug, Clone, PartialEq)]
pub struct StrategyParams {
    pub loss_multiplier: Decimal,
    pub maturity_wait: Duration,
    pub stop_loss_streak: u32,
    pub duration: u32,
    pub duration_unit: String,
    pub barrier_offset: String,
}

impl Default for StrategyParams {
    fn default() -> Self {
        Self {
            loss_multiplier: LOSS_RECOVERY_MULTIPLIER,
            maturity_wait: Duration::from_secs(MATURITY_WAIT_SECS),
            stop_loss_streak: STOP_LOSS_STREAK,
            duration: CONTRACT_DURATION_TICKS,
            duration_unit: CONTRACT_DURATION_UNIT.to_string(),
            barrier_offset: BARRIER_OFFSET.to_string(),
        }
    }
}

impl StrategyParams {
    /// Build the order for a detected direction at the given stake
    pub fn order_for(
        &self,
        direction: Direction,
        stake: Decimal,
        currency: Currency,
        symbol: &str,
    ) -> OrderRequest {
        OrderRequest {
            direction,
            amount: stake.round_dp(STAKE_DECIMALS),
            currency,
            symbol: symbol.to_string(),
            barrier: direction.barrier(&self.barrier_offset),
            duration: self.duration,
            duration_unit: self.duration_unit.clone(),
        }
    }
}
