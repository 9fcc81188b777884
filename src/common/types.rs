//! Unified types shared by the venue client, strategy and session scheduler

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::errors::TraderError;

/// Trade direction produced by the signal detector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    /// Venue contract type for this direction
    pub fn contract_type(&self) -> &'static str {
        match self {
            Direction::Up => "CALL",
            Direction::Down => "PUT",
        }
    }

    /// Relative barrier for this direction, e.g. `-0.8` for Up and `+0.8` for Down
    pub fn barrier(&self, offset: &str) -> String {
        match self {
            Direction::Up => format!("-{}", offset),
            Direction::Down => format!("+{}", offset),
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Up => write!(f, "UP"),
            Direction::Down => write!(f, "DOWN"),
        }
    }
}

/// Account currency used for proposals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    /// Primary account currency
    #[default]
    Usd,
    /// Secondary account currency
    Eur,
}

impl Currency {
    /// Currency code as sent on the wire
    pub fn code(&self) -> &'static str {
        match self {
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
        }
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Currency {
    type Err = TraderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "USD" => Ok(Currency::Usd),
            "EUR" => Ok(Currency::Eur),
            other => Err(TraderError::Configuration(format!(
                "unsupported currency: {}",
                other
            ))),
        }
    }
}

/// Venue-assigned contract identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContractRef(pub u64);

impl std::fmt::Display for ContractRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A contract placed with the venue and awaiting settlement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenContract {
    pub contract_id: ContractRef,
    pub placed_at: DateTime<Utc>,
}

impl OpenContract {
    pub fn new(contract_id: ContractRef, placed_at: DateTime<Utc>) -> Self {
        Self {
            contract_id,
            placed_at,
        }
    }
}

/// Result of a single settlement poll
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettlementResult {
    pub is_expired: bool,
    pub profit: Decimal,
}

/// Why a session was terminated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// Consecutive-loss limit hit
    StopLoss,
    /// Cumulative profit reached the target
    TargetReached,
    /// Entitlement revoked by the access-control collaborator
    AccessRevoked,
    /// Operator asked for the session to stop
    Manual,
}

impl std::fmt::Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StopReason::StopLoss => write!(f, "stop-loss triggered"),
            StopReason::TargetReached => write!(f, "target profit reached"),
            StopReason::AccessRevoked => write!(f, "access revoked"),
            StopReason::Manual => write!(f, "manual stop"),
        }
    }
}

/// Parameters for a single proposal + purchase
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderRequest {
    pub direction: Direction,
    pub amount: Decimal,
    pub currency: Currency,
    pub symbol: String,
    pub barrier: String,
    pub duration: u32,
    pub duration_unit: String,
}

impl OrderRequest {
    pub fn contract_type(&self) -> &'static str {
        self.direction.contract_type()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_contract_parameters() {
        assert_eq!(Direction::Up.contract_type(), "CALL");
        assert_eq!(Direction::Up.barrier("0.8"), "-0.8");
        assert_eq!(Direction::Down.contract_type(), "PUT");
        assert_eq!(Direction::Down.barrier("0.8"), "+0.8");
    }

    #[test]
    fn test_currency_parsing() {
        assert_eq!("usd".parse::<Currency>().unwrap(), Currency::Usd);
        assert_eq!(" EUR ".parse::<Currency>().unwrap(), Currency::Eur);
        assert!("BTC".parse::<Currency>().is_err());
    }

    #[test]
    fn test_currency_serde() {
        let json = serde_json::to_string(&Currency::Eur).unwrap();
        assert_eq!(json, "\"EUR\"");
        let parsed: Currency = serde_json::from_str("\"USD\"").unwrap();
        assert_eq!(parsed, Currency::Usd);
    }
}
