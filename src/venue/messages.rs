//! Venue wire messages
//!
//! Field names follow the venue's websocket API exactly. The `req_id`
//! correlation field is added by the websocket layer and is not part of
//! these request structs.

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

// ============================================================================
// Requests
// ============================================================================

/// `authorize` request
#[derive(Debug, Clone, Serialize)]
pub struct AuthorizeRequest<'a> {
    pub authorize: &'a str,
}

/// `ticks_history` request for the latest ticks of a symbol
#[derive(Debug, Clone, Serialize)]
pub struct TicksHistoryRequest<'a> {
    pub ticks_history: &'a str,
    pub count: usize,
    pub end: &'static str,
    pub style: &'static str,
    pub adjust_start_time: u8,
}

impl<'a> TicksHistoryRequest<'a> {
    pub fn latest(symbol: &'a str, count: usize) -> Self {
        Self {
            ticks_history: symbol,
            count,
            end: "latest",
            style: "ticks",
            adjust_start_time: 1,
        }
    }
}

/// `proposal` request for a stake-based contract
#[derive(Debug, Clone, Serialize)]
pub struct ProposalRequest<'a> {
    pub proposal: u8,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub basis: &'static str,
    pub contract_type: &'a str,
    pub barrier: &'a str,
    pub currency: &'a str,
    pub duration: u32,
    pub duration_unit: &'a str,
    pub symbol: &'a str,
}

/// `buy` request for a previously quoted proposal
#[derive(Debug, Clone, Serialize)]
pub struct BuyRequest<'a> {
    pub buy: &'a str,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
}

/// `proposal_open_contract` request for one contract
#[derive(Debug, Clone, Serialize)]
pub struct OpenContractRequest {
    pub proposal_open_contract: u8,
    pub contract_id: u64,
}

// ============================================================================
// Responses
// ============================================================================

/// Error payload attached to any failed response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorBody {
    pub code: String,
    pub message: String,
}

/// Fields common to every response
#[derive(Debug, Clone, Deserialize)]
pub struct ResponseEnvelope {
    #[serde(default)]
    pub msg_type: Option<String>,
    #[serde(default)]
    pub req_id: Option<u64>,
    #[serde(default)]
    pub error: Option<ApiErrorBody>,
}

/// Response to `authorize`
#[derive(Debug, Clone, Deserialize)]
pub struct AuthorizeResponse {
    #[serde(default)]
    pub authorize: Option<AuthorizeInfo>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthorizeInfo {
    #[serde(default)]
    pub loginid: Option<String>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub balance: Option<Decimal>,
}

/// Response to `ticks_history` with `style: ticks`
#[derive(Debug, Clone, Deserialize)]
pub struct TicksHistoryResponse {
    #[serde(default)]
    pub history: Option<TickHistory>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TickHistory {
    #[serde(default)]
    pub prices: Vec<Decimal>,
    #[serde(default)]
    pub times: Vec<i64>,
}

/// Response to `proposal`
#[derive(Debug, Clone, Deserialize)]
pub struct ProposalResponse {
    #[serde(default)]
    pub proposal: Option<ProposalInfo>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProposalInfo {
    pub id: String,
    pub ask_price: Decimal,
    #[serde(default)]
    pub payout: Option<Decimal>,
    #[serde(default)]
    pub longcode: Option<String>,
}

/// Response to `buy`
#[derive(Debug, Clone, Deserialize)]
pub struct BuyResponse {
    #[serde(default)]
    pub buy: Option<BuyInfo>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BuyInfo {
    #[serde(default)]
    pub contract_id: Option<u64>,
    #[serde(default)]
    pub buy_price: Option<Decimal>,
    #[serde(default)]
    pub transaction_id: Option<u64>,
}

/// Response to `proposal_open_contract`
#[derive(Debug, Clone, Deserialize)]
pub struct OpenContractResponse {
    #[serde(default)]
    pub proposal_open_contract: Option<OpenContractInfo>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OpenContractInfo {
    #[serde(default)]
    pub contract_id: Option<u64>,
    #[serde(default, deserialize_with = "flag")]
    pub is_expired: bool,
    #[serde(default, deserialize_with = "flag")]
    pub is_sold: bool,
    #[serde(default)]
    pub profit: Option<Decimal>,
    #[serde(default)]
    pub status: Option<String>,
}

/// The venue encodes booleans as `0`/`1`; accept real booleans too.
fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Int(i64),
    }

    Ok(match Flag::deserialize(deserializer)? {
        Flag::Bool(b) => b,
        Flag::Int(i) => i != 0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn test_ticks_history_wire_format() {
        let value = serde_json::to_value(TicksHistoryRequest::latest("R_100", 3)).unwrap();
        assert_eq!(
            value,
            json!({
                "ticks_history": "R_100",
                "count": 3,
                "end": "latest",
                "style": "ticks",
                "adjust_start_time": 1
            })
        );
    }

    #[test]
    fn test_proposal_wire_format() {
        let request = ProposalRequest {
            proposal: 1,
            amount: dec!(10.5),
            basis: "stake",
            contract_type: "CALL",
            barrier: "-0.8",
            currency: "USD",
            duration: 5,
            duration_unit: "t",
            symbol: "R_100",
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            json!({
                "proposal": 1,
                "amount": 10.5,
                "basis": "stake",
                "contract_type": "CALL",
                "barrier": "-0.8",
                "currency": "USD",
                "duration": 5,
                "duration_unit": "t",
                "symbol": "R_100"
            })
        );
    }

    #[test]
    fn test_buy_price_is_numeric() {
        let value = serde_json::to_value(BuyRequest {
            buy: "abc-123",
            price: dec!(10),
        })
        .unwrap();
        assert_eq!(value["buy"], "abc-123");
        assert!(value["price"].is_number());
    }

    #[test]
    fn test_open_contract_flags_accept_ints() {
        let response: OpenContractResponse = serde_json::from_str(
            r#"{"proposal_open_contract": {"contract_id": 42, "is_expired": 1, "is_sold": 0, "profit": -10.0}}"#,
        )
        .unwrap();
        let info = response.proposal_open_contract.unwrap();
        assert!(info.is_expired);
        assert!(!info.is_sold);
        assert_eq!(info.profit, Some(dec!(-10)));
    }

    #[test]
    fn test_envelope_with_error() {
        let envelope: ResponseEnvelope = serde_json::from_str(
            r#"{"msg_type": "authorize", "req_id": 7, "error": {"code": "InvalidToken", "message": "The token is invalid."}}"#,
        )
        .unwrap();
        assert_eq!(envelope.req_id, Some(7));
        assert_eq!(envelope.error.unwrap().code, "InvalidToken");
    }
}
