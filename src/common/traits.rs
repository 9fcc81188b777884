//! Trait definitions for the venue connection and the session collaborators

use async_trait::async_trait;

use super::errors::Result;
use super::types::{ContractRef, OrderRequest, SettlementResult};
use crate::session::events::SessionEvent;

#[cfg(test)]
use mockall::automock;

/// One authorized conversation with the trading venue
///
/// A client wraps exactly one wire connection. Any error returned by an
/// operation means the connection must be closed and replaced; the client
/// itself never retries.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait VenueClient: Send {
    /// Authorize the connection with the account's API token
    ///
    /// Must succeed before any other call on this connection.
    async fn authorize(&mut self, credential: &str) -> Result<()>;

    /// Fetch up to `count` most recent tick prices for `symbol`, oldest first
    ///
    /// The venue may return fewer prices than requested.
    async fn fetch_recent_ticks(&mut self, symbol: &str, count: usize) -> Result<Vec<rust_decimal::Decimal>>;

    /// Request a price proposal and buy it at the quoted price
    ///
    /// Returns `Ok(None)` when the venue offers no proposal or the purchase
    /// response carries no contract id.
    async fn quote_and_place(&mut self, order: &OrderRequest) -> Result<Option<ContractRef>>;

    /// Query the current status of a purchased contract
    async fn poll_settlement(&mut self, contract: ContractRef) -> Result<SettlementResult>;

    /// Close the underlying connection; errors are swallowed
    async fn close(&mut self);
}

/// Factory for fresh venue connections
#[cfg_attr(test, automock(type Client = MockVenueClient;))]
#[async_trait]
pub trait VenueConnector: Send + Sync {
    type Client: VenueClient + 'static;

    /// Open a new, not yet authorized, connection
    async fn connect(&self) -> Result<Self::Client>;
}

/// Entitlement collaborator consulted before every placement
#[cfg_attr(test, automock)]
#[async_trait]
pub trait EntitlementCheck: Send + Sync {
    /// Whether `identity` currently holds permission to trade
    async fn is_authorized(&self, identity: &str) -> Result<bool>;
}

/// Sink for plain-text session events
///
/// Delivery is best-effort; implementations must not block and must not
/// report failures back to the caller.
#[cfg_attr(test, automock)]
pub trait Notifier: Send + Sync {
    /// Deliver `event` to the notification target `target`
    fn notify(&self, target: &str, event: &SessionEvent);
}
