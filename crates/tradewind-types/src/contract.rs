//! Trade contract types and the contract status graph
//!
//! A contract moves DRAFT -> AWAITING_FUNDS -> FUNDED -> GOODS_SHIPPED
//! -> GOODS_RECEIVED -> COMPLETED, with DISPUTED and CANCELLED as the
//! off-ramps. The legal edges are encoded in
//! [`ContractStatus::can_transition`]; everything else is rejected.
//! Each successful transition appends one [`Milestone`], giving an
//! append-only audit trail.

use crate::{ContractId, MilestoneId, Money, UserId, WalletId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of a trade contract
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContractStatus {
    Draft,
    AwaitingFunds,
    Funded,
    GoodsShipped,
    GoodsReceived,
    Completed,
    Disputed,
    Cancelled,
}

impl ContractStatus {
    /// Whether `self -> to` is a legal edge of the lifecycle graph
    pub fn can_transition(&self, to: ContractStatus) -> bool {
        use ContractStatus::*;
        matches!(
            (self, to),
            (Draft, AwaitingFunds)
                | (AwaitingFunds, Funded)
                | (Funded, GoodsShipped)
                | (GoodsShipped, GoodsReceived)
                | (GoodsReceived, Completed)
                | (AwaitingFunds, Disputed)
                | (Funded, Disputed)
                | (GoodsShipped, Disputed)
                | (Disputed, Completed)
                | (Disputed, Cancelled)
                | (Draft, Cancelled)
                | (AwaitingFunds, Cancelled)
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

impl fmt::Display for ContractStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Draft => "DRAFT",
            Self::AwaitingFunds => "AWAITING_FUNDS",
            Self::Funded => "FUNDED",
            Self::GoodsShipped => "GOODS_SHIPPED",
            Self::GoodsReceived => "GOODS_RECEIVED",
            Self::Completed => "COMPLETED",
            Self::Disputed => "DISPUTED",
            Self::Cancelled => "CANCELLED",
        };
        f.write_str(s)
    }
}

/// Role a user plays on a contract
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PartyRole {
    Buyer,
    Seller,
    Mediator,
}

/// A contract party
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Party {
    pub user: UserId,
    pub role: PartyRole,
}

/// Commercial terms of the trade
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeTerms {
    pub amount: Money,
    pub delivery_terms: String,
    pub payment_terms: String,
}

/// What a milestone records
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MilestoneKind {
    Finalized,
    Funded,
    Shipped,
    Received,
    Completed,
    Disputed,
    Resolved,
    Cancelled,
}

/// An immutable audit entry appended on each contract transition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Milestone {
    pub id: MilestoneId,
    pub kind: MilestoneKind,
    pub actor: UserId,
    pub details: String,
    pub recorded_at: DateTime<Utc>,
}

impl Milestone {
    pub fn new(kind: MilestoneKind, actor: UserId, details: impl Into<String>) -> Self {
        Self {
            id: MilestoneId::new(),
            kind,
            actor,
            details: details.into(),
            recorded_at: Utc::now(),
        }
    }
}

/// A trade contract
///
/// Never physically deleted; cancellation is a status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contract {
    pub id: ContractId,
    pub title: String,
    pub description: String,
    pub status: ContractStatus,
    pub parties: Vec<Party>,
    pub terms: TradeTerms,
    pub milestones: Vec<Milestone>,
    pub escrow_wallet: Option<WalletId>,
    pub logistics_ref: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Contract {
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        parties: Vec<Party>,
        terms: TradeTerms,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: ContractId::new(),
            title: title.into(),
            description: description.into(),
            status: ContractStatus::Draft,
            parties,
            terms,
            milestones: Vec::new(),
            escrow_wallet: None,
            logistics_ref: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// First party holding the given role
    pub fn party(&self, role: PartyRole) -> Option<UserId> {
        self.parties.iter().find(|p| p.role == role).map(|p| p.user)
    }

    /// Whether the user appears on the contract in any role
    pub fn is_party(&self, user: UserId) -> bool {
        self.parties.iter().any(|p| p.user == user)
    }

    /// Whether the user holds the given role
    pub fn has_role(&self, user: UserId, role: PartyRole) -> bool {
        self.parties
            .iter()
            .any(|p| p.user == user && p.role == role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Currency, Money};
    use rust_decimal_macros::dec;

    fn terms() -> TradeTerms {
        TradeTerms {
            amount: Money::new(dec!(5000), Currency::USD),
            delivery_terms: "FOB Shanghai".into(),
            payment_terms: "Escrow on receipt".into(),
        }
    }

    #[test]
    fn happy_path_edges_are_legal() {
        use ContractStatus::*;
        let path = [Draft, AwaitingFunds, Funded, GoodsShipped, GoodsReceived, Completed];
        for pair in path.windows(2) {
            assert!(pair[0].can_transition(pair[1]), "{} -> {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn illegal_edges_are_rejected() {
        use ContractStatus::*;
        assert!(!Draft.can_transition(Funded));
        assert!(!Funded.can_transition(Completed));
        assert!(!Funded.can_transition(Cancelled));
        assert!(!Completed.can_transition(Disputed));
        assert!(!Cancelled.can_transition(AwaitingFunds));
        assert!(!GoodsReceived.can_transition(Disputed));
    }

    #[test]
    fn dispute_offramps() {
        use ContractStatus::*;
        for from in [AwaitingFunds, Funded, GoodsShipped] {
            assert!(from.can_transition(Disputed));
        }
        assert!(Disputed.can_transition(Completed));
        assert!(Disputed.can_transition(Cancelled));
    }

    #[test]
    fn party_lookup() {
        let buyer = UserId::new();
        let seller = UserId::new();
        let contract = Contract::new(
            "Cotton shipment",
            "200 bales",
            vec![
                Party { user: buyer, role: PartyRole::Buyer },
                Party { user: seller, role: PartyRole::Seller },
            ],
            terms(),
        );
        assert_eq!(contract.party(PartyRole::Buyer), Some(buyer));
        assert_eq!(contract.party(PartyRole::Mediator), None);
        assert!(contract.has_role(seller, PartyRole::Seller));
        assert!(!contract.has_role(seller, PartyRole::Buyer));
        assert_eq!(contract.status, ContractStatus::Draft);
    }

    #[test]
    fn status_serde_matches_front_end_strings() {
        let json = serde_json::to_string(&ContractStatus::GoodsShipped).unwrap();
        assert_eq!(json, "\"GOODS_SHIPPED\"");
        let back: ContractStatus = serde_json::from_str("\"AWAITING_FUNDS\"").unwrap();
        assert_eq!(back, ContractStatus::AwaitingFunds);
    }
}
