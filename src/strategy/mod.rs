//! Strategy module: signal detection and stake progression
//!
//! Both halves are pure functions; the scheduler owns all I/O and state.
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │  ENTRY                                       │
//! │  last 3 ticks ──► TickWindow ──► detect()    │
//! │                                   │          │
//! │                     Some(Up|Down) ▼          │
//! │          StrategyParams::order_for(..)       │
//! └──────────────────────────────────────────────┘
//! ┌──────────────────────────────────────────────┐
//! │  SETTLEMENT                                  │
//! │  profit ──► RiskPolicy::apply(ledger)        │
//! │              │                               │
//! │              ▼                               │
//! │   next stake, counters, Continue | Stop      │
//! └──────────────────────────────────────────────┘
//! ```

mod params;
mod risk;
mod signal;

pub use params::{
    StrategyParams, BARRIER_OFFSET, CONTRACT_DURATION_TICKS, CONTRACT_DURATION_UNIT,
    LOSS_RECOVERY_MULTIPLIER, MATURITY_WAIT_SECS, STAKE_DECIMALS, STOP_LOSS_STREAK,
    TICK_WINDOW_LEN,
};
pub use risk::{Ledger, RiskOutcome, RiskPolicy, Verdict};
pub use signal::{detect, TickWindow};
