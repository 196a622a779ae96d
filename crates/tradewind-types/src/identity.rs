//! Identity types for Tradewind
//!
//! All identifiers are strongly typed wrappers around UUIDs so that a
//! wallet id can never be passed where a contract id is expected.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Generate an ID newtype with the common implementations
macro_rules! define_id_type {
    ($name:ident, $prefix:literal, $doc:literal) => {
        #[doc = $doc]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Create a new random ID
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Parse from a string, accepting the display prefix if present
            pub fn parse(s: &str) -> Result<Self, uuid::Error> {
                let s = s.strip_prefix(concat!($prefix, "_")).unwrap_or(s);
                Ok(Self(Uuid::parse_str(s)?))
            }

            /// Get the inner UUID
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}_{}", $prefix, self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }
    };
}

define_id_type!(UserId, "user", "Unique identifier for a registered user");
define_id_type!(WalletId, "wallet", "Unique identifier for a wallet");
define_id_type!(TransactionId, "tx", "Unique identifier for a ledger transaction");
define_id_type!(ContractId, "contract", "Unique identifier for a trade contract");
define_id_type!(MilestoneId, "milestone", "Unique identifier for a contract milestone");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_carries_prefix() {
        let id = WalletId::new();
        assert!(id.to_string().starts_with("wallet_"));
    }

    #[test]
    fn parse_accepts_prefixed_and_bare() {
        let id = ContractId::new();
        assert_eq!(ContractId::parse(&id.to_string()).unwrap(), id);
        assert_eq!(ContractId::parse(&id.0.to_string()).unwrap(), id);
    }

    #[test]
    fn ids_do_not_collide() {
        assert_ne!(UserId::new(), UserId::new());
    }
}
