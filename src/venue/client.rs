//! Venue client and connector over the websocket transport

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};
use url::Url;

use super::messages::*;
use super::websocket::VenueWebSocket;
use crate::common::errors::{Result, TraderError};
use crate::common::traits::{VenueClient, VenueConnector};
use crate::common::types::{ContractRef, OrderRequest, SettlementResult};
use crate::config::types::VenueConfig;

/// Opens fresh venue connections from configuration
#[derive(Debug, Clone)]
pub struct WebSocketConnector {
    url: Url,
    request_timeout: Duration,
}

impl WebSocketConnector {
    pub fn new(config: &VenueConfig) -> Result<Self> {
        Ok(Self {
            url: VenueWebSocket::endpoint(&config.websocket_url, &config.app_id)?,
            request_timeout: Duration::from_secs(config.request_timeout_seconds),
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

#[async_trait]
impl VenueConnector for WebSocketConnector {
    type Client = WebSocketVenueClient;

    async fn connect(&self) -> Result<Self::Client> {
        let ws = VenueWebSocket::connect(&self.url, self.request_timeout).await?;
        Ok(WebSocketVenueClient { ws })
    }
}

/// Venue operations over one websocket connection
pub struct WebSocketVenueClient {
    ws: VenueWebSocket,
}

#[async_trait]
impl VenueClient for WebSocketVenueClient {
    #[instrument(skip_all)]
    async fn authorize(&mut self, credential: &str) -> Result<()> {
        let response = self
            .ws
            .request(&AuthorizeRequest {
                authorize: credential,
            })
            .await?;
        parse_authorize(response)
    }

    #[instrument(skip(self))]
    async fn fetch_recent_ticks(&mut self, symbol: &str, count: usize) -> Result<Vec<Decimal>> {
        let response = self
            .ws
            .request(&TicksHistoryRequest::latest(symbol, count))
            .await?;
        parse_ticks(response)
    }

    #[instrument(skip_all, fields(direction = %order.direction, amount = %order.amount))]
    async fn quote_and_place(&mut self, order: &OrderRequest) -> Result<Option<ContractRef>> {
        let response = self
            .ws
            .request(&ProposalRequest {
                proposal: 1,
                amount: order.amount,
                basis: "stake",
                contract_type: order.contract_type(),
                barrier: &order.barrier,
                currency: order.currency.code(),
                duration: order.duration,
                duration_unit: &order.duration_unit,
                symbol: &order.symbol,
            })
            .await?;

        let Some(proposal) = parse_proposal(response)? else {
            info!("Venue returned no proposal");
            return Ok(None);
        };
        debug!(proposal_id = %proposal.id, ask_price = %proposal.ask_price, "Received proposal");

        let response = self
            .ws
            .request(&BuyRequest {
                buy: &proposal.id,
                price: proposal.ask_price,
            })
            .await?;
        parse_buy(response)
    }

    #[instrument(skip(self))]
    async fn poll_settlement(&mut self, contract: ContractRef) -> Result<SettlementResult> {
        let response = self
            .ws
            .request(&OpenContractRequest {
                proposal_open_contract: 1,
                contract_id: contract.0,
            })
            .await?;
        parse_settlement(response)
    }

    async fn close(&mut self) {
        self.ws.close().await;
    }
}

/// Extract the error payload of a response, if any
fn api_error(value: &Value) -> Result<Option<ApiErrorBody>> {
    let envelope: ResponseEnvelope = serde_json::from_value(value.clone())?;
    Ok(envelope.error)
}

pub(crate) fn parse_authorize(value: Value) -> Result<()> {
    if let Some(error) = api_error(&value)? {
        return Err(TraderError::Authentication(format!(
            "{}: {}",
            error.code, error.message
        )));
    }
    let response: AuthorizeResponse = serde_json::from_value(value)?;
    match response.authorize {
        Some(info) => {
            info!(
                loginid = info.loginid.as_deref().unwrap_or("?"),
                currency = info.currency.as_deref().unwrap_or("?"),
                "Authorized with venue"
            );
            Ok(())
        }
        None => Err(TraderError::InvalidResponse(
            "authorize response without account details".to_string(),
        )),
    }
}

pub(crate) fn parse_ticks(value: Value) -> Result<Vec<Decimal>> {
    if let Some(error) = api_error(&value)? {
        return Err(TraderError::Api {
            code: error.code,
            message: error.message,
        });
    }
    let response: TicksHistoryResponse = serde_json::from_value(value)?;
    Ok(response.history.map(|h| h.prices).unwrap_or_default())
}

pub(crate) fn parse_proposal(value: Value) -> Result<Option<ProposalInfo>> {
    if let Some(error) = api_error(&value)? {
        return Err(TraderError::Order(format!("{}: {}", error.code, error.message)));
    }
    let response: ProposalResponse = serde_json::from_value(value)?;
    Ok(response.proposal)
}

pub(crate) fn parse_buy(value: Value) -> Result<Option<ContractRef>> {
    if let Some(error) = api_error(&value)? {
        return Err(TraderError::Order(format!("{}: {}", error.code, error.message)));
    }
    let response: BuyResponse = serde_json::from_value(value)?;
    let contract = response.buy.and_then(|b| b.contract_id).map(ContractRef);
    if contract.is_none() {
        warn!("Buy response carried no contract id");
    }
    Ok(contract)
}

pub(crate) fn parse_settlement(value: Value) -> Result<SettlementResult> {
    if let Some(error) = api_error(&value)? {
        return Err(TraderError::Api {
            code: error.code,
            message: error.message,
        });
    }
    let response: OpenContractResponse = serde_json::from_value(value)?;
    let info = response.proposal_open_contract.ok_or_else(|| {
        TraderError::InvalidResponse("missing proposal_open_contract".to_string())
    })?;

    let profit = match (info.is_expired, info.profit) {
        (_, Some(profit)) => profit,
        (false, None) => Decimal::ZERO,
        (true, None) => {
            return Err(TraderError::InvalidResponse(
                "expired contract without profit".to_string(),
            ))
        }
    };

    Ok(SettlementResult {
        is_expired: info.is_expired,
        profit,
    })
}
