//! Request DTOs
//!
//! Monetary amounts arrive as decimal strings and are parsed into
//! `Money` here; handlers never see raw floats.

use serde::Deserialize;
use std::str::FromStr;
use tradewind_engine::Beneficiary;
use tradewind_types::{Currency, Money, Result};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub username: String,
    pub wallet_address: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateWalletRequest {
    pub currency: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KycReviewRequest {
    pub approve: bool,
    #[serde(default)]
    pub risk_score: Option<u8>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AmountRequest {
    pub amount: String,
    pub currency: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferRequest {
    pub amount: String,
    pub currency: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateContractRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub buyer_id: String,
    pub seller_id: String,
    #[serde(default)]
    pub mediator_id: Option<String>,
    pub amount: String,
    pub currency: String,
    #[serde(default)]
    pub delivery_terms: String,
    #[serde(default)]
    pub payment_terms: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActorRequest {
    pub actor_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FundRequest {
    pub from_wallet_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShipRequest {
    pub actor_id: String,
    pub logistics_ref: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisputeRequest {
    pub actor_id: String,
    pub reason: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseRequest {
    pub to_wallet_id: String,
    #[serde(rename = "type")]
    pub beneficiary: Beneficiary,
}

/// Parse an `{amount, currency}` pair into `Money`
pub fn parse_money(amount: &str, currency: &str) -> Result<Money> {
    let currency = Currency::from_str(currency)?;
    Money::parse(amount, currency)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn parse_money_rejects_unknown_currency() {
        assert!(parse_money("10.00", "DOGE").is_err());
        assert_eq!(
            parse_money("10.00", "usd").unwrap(),
            Money::new(dec!(10), Currency::USD)
        );
    }

    #[test]
    fn release_request_accepts_front_end_shape() {
        let req: ReleaseRequest = serde_json::from_str(
            r#"{"toWalletId":"8f14e45f-ceea-4673-9ae4-30cf24a021a4","type":"seller"}"#,
        )
        .unwrap();
        assert_eq!(req.beneficiary, Beneficiary::Seller);
    }
}
