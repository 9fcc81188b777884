//! Settlement polling for an open contract

use chrono::{DateTime, Utc};
use std::time::Duration;
use tracing::{debug, info, instrument};

use crate::common::errors::Result;
use crate::common::traits::{VenueClient, VenueConnector};
use crate::common::types::{ContractRef, OpenContract, SettlementResult};

/// What a poll observed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// Maturity wait has not elapsed; the venue was not contacted
    NotDue,
    /// Venue reports the contract as still running
    Pending,
    /// Contract expired with the given result
    Settled(SettlementResult),
}

/// Waits out the maturity delay, then queries settlement on a fresh connection
#[derive(Debug, Clone)]
pub struct SettlementPoller {
    maturity_wait: Duration,
}

impl SettlementPoller {
    pub fn new(maturity_wait: Duration) -> Self {
        Self { maturity_wait }
    }

    /// Whether `contract` may be polled at `now`
    pub fn is_due(&self, contract: &OpenContract, now: DateTime<Utc>) -> bool {
        match (now - contract.placed_at).to_std() {
            Ok(elapsed) => elapsed >= self.maturity_wait,
            // placed_at lies in the future
            Err(_) => false,
        }
    }

    /// Poll `contract` once if due
    ///
    /// The connection opened here is closed before returning, whatever the
    /// outcome of the query.
    #[instrument(skip(self, connector, credential), fields(contract = %contract.contract_id))]
    pub async fn poll<C: VenueConnector>(
        &self,
        connector: &C,
        credential: &str,
        contract: &OpenContract,
        now: DateTime<Utc>,
    ) -> Result<PollOutcome> {
        if !self.is_due(contract, now) {
            return Ok(PollOutcome::NotDue);
        }

        let mut client = connector.connect().await?;
        let result = query(&mut client, credential, contract.contract_id).await;
        client.close().await;

        let settlement = result?;
        if settlement.is_expired {
            info!(profit = %settlement.profit, "Contract settled");
            Ok(PollOutcome::Settled(settlement))
        } else {
            debug!("Contract not yet expired");
            Ok(PollOutcome::Pending)
        }
    }
}

async fn query<V: VenueClient>(
    client: &mut V,
    credential: &str,
    contract_id: ContractRef,
) -> Result<SettlementResult> {
    client.authorize(credential).await?;
    client.poll_settlement(contract_id).await
}
