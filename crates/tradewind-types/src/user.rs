//! User and KYC types

use crate::UserId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// KYC verification status
///
/// Matches the status strings the trade desk front end exchanges with
/// the API. Only the KYC submission/review flow may move a user
/// between these states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum KycStatus {
    Pending,
    BasicCompleted,
    AdvancedPending,
    AdvancedVerified,
    Rejected,
}

impl KycStatus {
    /// Whether this status permits balance-affecting operations.
    ///
    /// The front end shipped with a development-time bypass that
    /// granted access unconditionally; the service does not honor it.
    pub fn can_transact(&self) -> bool {
        matches!(
            self,
            Self::BasicCompleted | Self::AdvancedPending | Self::AdvancedVerified
        )
    }

    /// Legal next statuses in the KYC flow
    pub fn can_transition(&self, to: KycStatus) -> bool {
        matches!(
            (self, to),
            (Self::Pending, Self::BasicCompleted)
                | (Self::BasicCompleted, Self::AdvancedPending)
                | (Self::AdvancedPending, Self::AdvancedVerified)
                | (Self::AdvancedPending, Self::Rejected)
        )
    }
}

/// A registered user of the trade desk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub username: String,
    /// Optional blockchain-linked address supplied at registration
    pub wallet_address: Option<String>,
    pub kyc_status: KycStatus,
    /// 0-100, assigned during advanced KYC review
    pub risk_score: u8,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(username: impl Into<String>, wallet_address: Option<String>) -> Self {
        Self {
            id: UserId::new(),
            username: username.into(),
            wallet_address,
            kyc_status: KycStatus::Pending,
            risk_score: 0,
            created_at: Utc::now(),
        }
    }
}
