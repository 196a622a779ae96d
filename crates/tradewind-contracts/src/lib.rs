//! Tradewind Contracts - the trade contract state machine
//!
//! Advances contracts DRAFT -> AWAITING_FUNDS -> FUNDED ->
//! GOODS_SHIPPED -> GOODS_RECEIVED -> COMPLETED, with DISPUTED and
//! CANCELLED off-ramps. Every successful transition appends exactly one
//! milestone; an illegal attempt returns `InvalidTransition` and
//! changes nothing. Each mutation is one critical section, so contract
//! status never interleaves mid-transition.
//!
//! Funding and release transitions are driven by the transaction
//! engine after the corresponding ledger commit succeeds; everything
//! else is driven directly by the parties through the API.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::RwLock;
use tradewind_types::{
    Contract, ContractId, ContractStatus, DomainError, Milestone, MilestoneKind, Party,
    PartyRole, Result, TradeTerms, UserId, WalletId,
};

/// In-memory contract registry
#[derive(Clone, Default)]
pub struct ContractRegistry {
    contracts: Arc<RwLock<HashMap<ContractId, Contract>>>,
}

impl ContractRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a contract in DRAFT
    ///
    /// Requires a buyer and a seller (distinct users) and a positive
    /// trade amount.
    pub async fn create(
        &self,
        title: impl Into<String>,
        description: impl Into<String>,
        parties: Vec<Party>,
        terms: TradeTerms,
    ) -> Result<Contract> {
        let buyer = parties.iter().find(|p| p.role == PartyRole::Buyer);
        let seller = parties.iter().find(|p| p.role == PartyRole::Seller);
        let (buyer, seller) = match (buyer, seller) {
            (Some(b), Some(s)) => (b, s),
            _ => {
                return Err(DomainError::validation(
                    "contract requires a buyer and a seller",
                ))
            }
        };
        if buyer.user == seller.user {
            return Err(DomainError::validation(
                "buyer and seller must be different users",
            ));
        }
        if !terms.amount.is_positive() {
            return Err(DomainError::InvalidAmount {
                message: "trade amount must be positive".into(),
            });
        }

        let contract = Contract::new(title, description, parties, terms);
        tracing::info!(contract = %contract.id, title = %contract.title, "created contract");
        self.contracts
            .write()
            .await
            .insert(contract.id, contract.clone());
        Ok(contract)
    }

    pub async fn get(&self, id: ContractId) -> Result<Contract> {
        let contracts = self.contracts.read().await;
        contracts
            .get(&id)
            .cloned()
            .ok_or_else(|| DomainError::not_found("Contract", id))
    }

    /// Contracts the user is party to, newest first
    pub async fn list_for_user(&self, user: UserId) -> Vec<Contract> {
        let contracts = self.contracts.read().await;
        let mut owned: Vec<Contract> = contracts
            .values()
            .filter(|c| c.is_party(user))
            .cloned()
            .collect();
        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        owned
    }

    // ── Party-driven transitions ─────────────────────────────────────

    /// DRAFT -> AWAITING_FUNDS, on sign-off by a party
    pub async fn finalize(&self, id: ContractId, actor: UserId) -> Result<Contract> {
        self.transition(id, ContractStatus::AwaitingFunds, actor, |c, actor| {
            if !c.is_party(actor) {
                return Err(DomainError::validation("actor is not a contract party"));
            }
            Ok(Milestone::new(MilestoneKind::Finalized, actor, "contract finalized and signed"))
        })
        .await
    }

    /// FUNDED -> GOODS_SHIPPED; seller only, logistics reference required
    pub async fn mark_shipped(
        &self,
        id: ContractId,
        actor: UserId,
        logistics_ref: &str,
    ) -> Result<Contract> {
        if logistics_ref.trim().is_empty() {
            return Err(DomainError::validation(
                "shipment requires a logistics reference",
            ));
        }
        let logistics_ref = logistics_ref.to_string();
        self.transition(id, ContractStatus::GoodsShipped, actor, move |c, actor| {
            if !c.has_role(actor, PartyRole::Seller) {
                return Err(DomainError::validation("only the seller can mark shipment"));
            }
            c.logistics_ref = Some(logistics_ref.clone());
            Ok(Milestone::new(
                MilestoneKind::Shipped,
                actor,
                format!("goods shipped, logistics ref {logistics_ref}"),
            ))
        })
        .await
    }

    /// GOODS_SHIPPED -> GOODS_RECEIVED; buyer only
    pub async fn confirm_received(&self, id: ContractId, actor: UserId) -> Result<Contract> {
        self.transition(id, ContractStatus::GoodsReceived, actor, |c, actor| {
            if !c.has_role(actor, PartyRole::Buyer) {
                return Err(DomainError::validation("only the buyer can confirm receipt"));
            }
            Ok(Milestone::new(MilestoneKind::Received, actor, "buyer confirmed receipt"))
        })
        .await
    }

    /// AWAITING_FUNDS/FUNDED/GOODS_SHIPPED -> DISPUTED; buyer or seller
    pub async fn raise_dispute(
        &self,
        id: ContractId,
        actor: UserId,
        reason: &str,
    ) -> Result<Contract> {
        let reason = reason.to_string();
        self.transition(id, ContractStatus::Disputed, actor, move |c, actor| {
            if !c.has_role(actor, PartyRole::Buyer) && !c.has_role(actor, PartyRole::Seller) {
                return Err(DomainError::validation(
                    "only the buyer or seller can raise a dispute",
                ));
            }
            Ok(Milestone::new(
                MilestoneKind::Disputed,
                actor,
                format!("dispute raised: {reason}"),
            ))
        })
        .await
    }

    /// DRAFT/AWAITING_FUNDS -> CANCELLED (before any funds moved)
    pub async fn cancel(&self, id: ContractId, actor: UserId) -> Result<Contract> {
        self.transition(id, ContractStatus::Cancelled, actor, |c, actor| {
            if !c.is_party(actor) {
                return Err(DomainError::validation("actor is not a contract party"));
            }
            Ok(Milestone::new(MilestoneKind::Cancelled, actor, "contract cancelled before funding"))
        })
        .await
    }

    // ── Engine-driven transitions ────────────────────────────────────

    /// AWAITING_FUNDS -> FUNDED, recording the escrow wallet.
    /// Called by the transaction engine after the escrow lock commits.
    pub async fn mark_funded(
        &self,
        id: ContractId,
        actor: UserId,
        escrow_wallet: WalletId,
    ) -> Result<Contract> {
        self.transition(id, ContractStatus::Funded, actor, move |c, actor| {
            c.escrow_wallet = Some(escrow_wallet);
            Ok(Milestone::new(
                MilestoneKind::Funded,
                actor,
                format!("escrow funded into {escrow_wallet}"),
            ))
        })
        .await
    }

    /// GOODS_RECEIVED -> COMPLETED or DISPUTED -> COMPLETED/CANCELLED.
    /// Called by the transaction engine after the escrow release
    /// commits; `to` picks the terminal state.
    pub async fn settle(
        &self,
        id: ContractId,
        actor: UserId,
        to: ContractStatus,
        details: &str,
    ) -> Result<Contract> {
        if !to.is_terminal() {
            return Err(DomainError::validation("settlement must reach a terminal state"));
        }
        let details = details.to_string();
        self.transition(id, to, actor, move |c, actor| {
            let kind = if c.status == ContractStatus::Disputed {
                MilestoneKind::Resolved
            } else {
                MilestoneKind::Completed
            };
            Ok(Milestone::new(kind, actor, details.clone()))
        })
        .await
    }

    /// Validate the edge, run the per-transition check, append the
    /// milestone, and flip the status — one critical section.
    async fn transition<F>(
        &self,
        id: ContractId,
        to: ContractStatus,
        actor: UserId,
        prepare: F,
    ) -> Result<Contract>
    where
        F: FnOnce(&mut Contract, UserId) -> Result<Milestone>,
    {
        let mut contracts = self.contracts.write().await;
        let contract = contracts
            .get_mut(&id)
            .ok_or_else(|| DomainError::not_found("Contract", id))?;

        let from = contract.status;
        if !from.can_transition(to) {
            return Err(DomainError::InvalidTransition {
                from: from.to_string(),
                to: to.to_string(),
            });
        }

        // The prepare closure may still veto (role checks). Closures
        // only write side fields after their checks pass, so a veto
        // leaves the contract untouched.
        let milestone = prepare(contract, actor)?;

        tracing::info!(contract = %id, %from, %to, actor = %actor, "contract transition");
        contract.status = to;
        contract.milestones.push(milestone);
        contract.updated_at = Utc::now();
        Ok(contract.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use tradewind_types::{Currency, Money};

    struct Fixture {
        registry: ContractRegistry,
        buyer: UserId,
        seller: UserId,
        mediator: UserId,
        contract: ContractId,
    }

    async fn fixture() -> Fixture {
        let registry = ContractRegistry::new();
        let buyer = UserId::new();
        let seller = UserId::new();
        let mediator = UserId::new();
        let contract = registry
            .create(
                "Steel coils",
                "400t hot-rolled",
                vec![
                    Party { user: buyer, role: PartyRole::Buyer },
                    Party { user: seller, role: PartyRole::Seller },
                    Party { user: mediator, role: PartyRole::Mediator },
                ],
                TradeTerms {
                    amount: Money::new(dec!(5000), Currency::USD),
                    delivery_terms: "CIF Rotterdam".into(),
                    payment_terms: "escrow".into(),
                },
            )
            .await
            .unwrap()
            .id;
        Fixture { registry, buyer, seller, mediator, contract }
    }

    #[tokio::test]
    async fn create_requires_both_trade_parties() {
        let registry = ContractRegistry::new();
        let err = registry
            .create(
                "t",
                "d",
                vec![Party { user: UserId::new(), role: PartyRole::Buyer }],
                TradeTerms {
                    amount: Money::new(dec!(1), Currency::USD),
                    delivery_terms: String::new(),
                    payment_terms: String::new(),
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.code(), "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn happy_path_appends_one_milestone_per_edge() {
        let f = fixture().await;
        let r = &f.registry;

        r.finalize(f.contract, f.buyer).await.unwrap();
        r.mark_funded(f.contract, f.buyer, WalletId::new()).await.unwrap();
        r.mark_shipped(f.contract, f.seller, "BOL-7781").await.unwrap();
        r.confirm_received(f.contract, f.buyer).await.unwrap();
        let done = r
            .settle(f.contract, f.seller, ContractStatus::Completed, "released to seller")
            .await
            .unwrap();

        assert_eq!(done.status, ContractStatus::Completed);
        let kinds: Vec<_> = done.milestones.iter().map(|m| m.kind.clone()).collect();
        assert_eq!(
            kinds,
            vec![
                MilestoneKind::Finalized,
                MilestoneKind::Funded,
                MilestoneKind::Shipped,
                MilestoneKind::Received,
                MilestoneKind::Completed,
            ]
        );
        assert_eq!(done.logistics_ref.as_deref(), Some("BOL-7781"));
    }

    #[tokio::test]
    async fn illegal_edge_leaves_contract_untouched() {
        let f = fixture().await;
        // Cannot ship a DRAFT contract
        let err = f
            .registry
            .mark_shipped(f.contract, f.seller, "BOL-1")
            .await
            .unwrap_err();
        assert_eq!(err.code(), "INVALID_TRANSITION");

        let c = f.registry.get(f.contract).await.unwrap();
        assert_eq!(c.status, ContractStatus::Draft);
        assert!(c.milestones.is_empty());
    }

    #[tokio::test]
    async fn role_checks_veto_without_side_effects() {
        let f = fixture().await;
        f.registry.finalize(f.contract, f.seller).await.unwrap();
        f.registry.mark_funded(f.contract, f.buyer, WalletId::new()).await.unwrap();

        // Buyer cannot mark shipment
        let err = f
            .registry
            .mark_shipped(f.contract, f.buyer, "BOL-1")
            .await
            .unwrap_err();
        assert_eq!(err.code(), "VALIDATION_ERROR");
        let c = f.registry.get(f.contract).await.unwrap();
        assert_eq!(c.status, ContractStatus::Funded);
        assert_eq!(c.milestones.len(), 2);
    }

    #[tokio::test]
    async fn dispute_and_mediator_resolution() {
        let f = fixture().await;
        f.registry.finalize(f.contract, f.buyer).await.unwrap();
        f.registry.mark_funded(f.contract, f.buyer, WalletId::new()).await.unwrap();
        f.registry
            .raise_dispute(f.contract, f.buyer, "goods never shipped")
            .await
            .unwrap();

        let resolved = f
            .registry
            .settle(f.contract, f.mediator, ContractStatus::Cancelled, "refunded to buyer")
            .await
            .unwrap();
        assert_eq!(resolved.status, ContractStatus::Cancelled);
        assert_eq!(
            resolved.milestones.last().unwrap().kind,
            MilestoneKind::Resolved
        );
    }

    #[tokio::test]
    async fn cancel_only_before_funding() {
        let f = fixture().await;
        f.registry.finalize(f.contract, f.buyer).await.unwrap();
        f.registry.cancel(f.contract, f.buyer).await.unwrap();

        let f2 = fixture().await;
        f2.registry.finalize(f2.contract, f2.buyer).await.unwrap();
        f2.registry.mark_funded(f2.contract, f2.buyer, WalletId::new()).await.unwrap();
        let err = f2.registry.cancel(f2.contract, f2.buyer).await.unwrap_err();
        assert_eq!(err.code(), "INVALID_TRANSITION");
    }

    #[tokio::test]
    async fn milestones_follow_a_legal_path() {
        let f = fixture().await;
        let r = &f.registry;
        r.finalize(f.contract, f.buyer).await.unwrap();
        r.mark_funded(f.contract, f.buyer, WalletId::new()).await.unwrap();
        r.raise_dispute(f.contract, f.seller, "payment terms").await.unwrap();
        let c = r
            .settle(f.contract, f.mediator, ContractStatus::Completed, "released to seller")
            .await
            .unwrap();

        // Replay the milestone log over the status graph
        let mut status = ContractStatus::Draft;
        for m in &c.milestones {
            let next = match m.kind {
                MilestoneKind::Finalized => ContractStatus::AwaitingFunds,
                MilestoneKind::Funded => ContractStatus::Funded,
                MilestoneKind::Shipped => ContractStatus::GoodsShipped,
                MilestoneKind::Received => ContractStatus::GoodsReceived,
                MilestoneKind::Disputed => ContractStatus::Disputed,
                MilestoneKind::Completed | MilestoneKind::Resolved => c.status,
                MilestoneKind::Cancelled => ContractStatus::Cancelled,
            };
            assert!(status.can_transition(next), "{status} -> {next}");
            status = next;
        }
        assert_eq!(status, c.status);
    }
}
