//! Tradewind Accounts - user registry and KYC lifecycle
//!
//! KYC status moves PENDING -> BASIC_COMPLETED -> ADVANCED_PENDING ->
//! ADVANCED_VERIFIED | REJECTED, and nothing outside this crate mutates
//! it. Balance-affecting operations call [`AccountRegistry::
//! require_transactor`] before touching the ledger.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tradewind_types::{DomainError, KycStatus, Result, User, UserId};

/// In-memory user registry
///
/// Thread-safe and cheap to clone; all clones share the same state.
#[derive(Clone, Default)]
pub struct AccountRegistry {
    users: Arc<RwLock<HashMap<UserId, User>>>,
}

impl AccountRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new user (KYC starts PENDING, risk score 0)
    pub async fn register(
        &self,
        username: impl Into<String>,
        wallet_address: Option<String>,
    ) -> Result<User> {
        let username = username.into();
        if username.trim().is_empty() {
            return Err(DomainError::validation("username must not be empty"));
        }

        let mut users = self.users.write().await;
        if users.values().any(|u| u.username == username) {
            return Err(DomainError::validation(format!(
                "username already taken: {username}"
            )));
        }

        let user = User::new(username, wallet_address);
        tracing::info!(user = %user.id, username = %user.username, "registered user");
        users.insert(user.id, user.clone());
        Ok(user)
    }

    /// Look up a user
    pub async fn get(&self, user_id: UserId) -> Result<User> {
        let users = self.users.read().await;
        users
            .get(&user_id)
            .cloned()
            .ok_or_else(|| DomainError::not_found("User", user_id))
    }

    /// Complete basic KYC: PENDING -> BASIC_COMPLETED
    pub async fn submit_basic_kyc(&self, user_id: UserId) -> Result<User> {
        self.advance_kyc(user_id, KycStatus::BasicCompleted, None).await
    }

    /// Submit advanced KYC documents: BASIC_COMPLETED -> ADVANCED_PENDING
    pub async fn submit_advanced_kyc(&self, user_id: UserId) -> Result<User> {
        self.advance_kyc(user_id, KycStatus::AdvancedPending, None).await
    }

    /// Review an advanced submission: ADVANCED_PENDING ->
    /// ADVANCED_VERIFIED (with a risk score) or REJECTED
    pub async fn review_advanced_kyc(
        &self,
        user_id: UserId,
        approve: bool,
        risk_score: u8,
    ) -> Result<User> {
        let to = if approve {
            KycStatus::AdvancedVerified
        } else {
            KycStatus::Rejected
        };
        self.advance_kyc(user_id, to, Some(risk_score.min(100))).await
    }

    /// Fail with `KycRequired` unless the user's status permits
    /// balance-affecting operations
    pub async fn require_transactor(&self, user_id: UserId) -> Result<User> {
        let user = self.get(user_id).await?;
        if !user.kyc_status.can_transact() {
            return Err(DomainError::KycRequired {
                user: user_id.to_string(),
                status: format!("{:?}", user.kyc_status),
            });
        }
        Ok(user)
    }

    async fn advance_kyc(
        &self,
        user_id: UserId,
        to: KycStatus,
        risk_score: Option<u8>,
    ) -> Result<User> {
        let mut users = self.users.write().await;
        let user = users
            .get_mut(&user_id)
            .ok_or_else(|| DomainError::not_found("User", user_id))?;

        if !user.kyc_status.can_transition(to) {
            return Err(DomainError::InvalidTransition {
                from: format!("{:?}", user.kyc_status),
                to: format!("{to:?}"),
            });
        }

        tracing::info!(user = %user_id, from = ?user.kyc_status, to = ?to, "kyc transition");
        user.kyc_status = to;
        if let Some(score) = risk_score {
            user.risk_score = score;
        }
        Ok(user.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn register_and_get() {
        let registry = AccountRegistry::new();
        let user = registry.register("acme-trading", None).await.unwrap();
        assert_eq!(user.kyc_status, KycStatus::Pending);

        let fetched = registry.get(user.id).await.unwrap();
        assert_eq!(fetched, user);
    }

    #[tokio::test]
    async fn duplicate_usernames_rejected() {
        let registry = AccountRegistry::new();
        registry.register("acme", None).await.unwrap();
        let err = registry.register("acme", None).await.unwrap_err();
        assert_eq!(err.code(), "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn full_kyc_flow() {
        let registry = AccountRegistry::new();
        let user = registry.register("acme", None).await.unwrap();

        assert!(registry.require_transactor(user.id).await.is_err());

        registry.submit_basic_kyc(user.id).await.unwrap();
        registry.require_transactor(user.id).await.unwrap();

        registry.submit_advanced_kyc(user.id).await.unwrap();
        let reviewed = registry.review_advanced_kyc(user.id, true, 12).await.unwrap();
        assert_eq!(reviewed.kyc_status, KycStatus::AdvancedVerified);
        assert_eq!(reviewed.risk_score, 12);
    }

    #[tokio::test]
    async fn rejected_users_cannot_transact() {
        let registry = AccountRegistry::new();
        let user = registry.register("acme", None).await.unwrap();
        registry.submit_basic_kyc(user.id).await.unwrap();
        registry.submit_advanced_kyc(user.id).await.unwrap();
        registry.review_advanced_kyc(user.id, false, 90).await.unwrap();

        let err = registry.require_transactor(user.id).await.unwrap_err();
        assert_eq!(err.code(), "KYC_REQUIRED");
    }

    #[tokio::test]
    async fn illegal_kyc_transition() {
        let registry = AccountRegistry::new();
        let user = registry.register("acme", None).await.unwrap();
        // Cannot skip straight to advanced review
        let err = registry.submit_advanced_kyc(user.id).await.unwrap_err();
        assert_eq!(err.code(), "INVALID_TRANSITION");
    }
}
