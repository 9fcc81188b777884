//! Three-tick reversal ("engulfing") signal

use rust_decimal::Decimal;

use super::params::TICK_WINDOW_LEN;
use crate::common::types::Direction;

/// The three most recent prices, oldest first
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickWindow {
    prices: [Decimal; TICK_WINDOW_LEN],
}

impl TickWindow {
    pub fn new(t1: Decimal, t2: Decimal, t3: Decimal) -> Self {
        Self {
            prices: [t1, t2, t3],
        }
    }

    /// Build a window from the tail of `prices`; `None` until warmed up
    pub fn from_recent(prices: &[Decimal]) -> Option<Self> {
        if prices.len() < TICK_WINDOW_LEN {
            return None;
        }
        let tail = &prices[prices.len() - TICK_WINDOW_LEN..];
        Some(Self::new(tail[0], tail[1], tail[2]))
    }

    pub fn prices(&self) -> &[Decimal; TICK_WINDOW_LEN] {
        &self.prices
    }

    /// Run the detector over this window
    pub fn signal(&self) -> Option<Direction> {
        let [t1, t2, t3] = self.prices;
        detect(t1, t2, t3)
    }
}

/// Detect a reversal from three consecutive prices
///
/// * `Up` when the second tick dips below the first and the third closes above it
/// * `Down` when the second tick rises above the first and the third closes below it
///
/// Any tie with the first price yields no signal.
pub fn detect(t1: Decimal, t2: Decimal, t3: Decimal) -> Option<Direction> {
    if t2 < t1 && t3 > t1 {
        Some(Direction::Up)
    } else if t2 > t1 && t3 < t1 {
        Some(Direction::Down)
    } else {
        None
    }
}
