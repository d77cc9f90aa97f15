//! Identity types for state bags and field subscriptions

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier for a kind of state bag
///
/// Kinds are fixed at compile time by each bag type and double as the
/// persistence key, so they must never change once data has been saved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct BagKind(pub &'static str);

impl BagKind {
    /// Get the kind as a string slice
    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for BagKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "bag:{}", self.0)
    }
}

/// Unique identifier for a listener registered on a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubscriptionId(pub u64);

impl SubscriptionId {
    /// Create a new subscription ID
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw ID value
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "subscription:{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bag_kind() {
        let kind = BagKind("player");
        assert_eq!(kind.as_str(), "player");
        assert_eq!(format!("{}", kind), "bag:player");
    }

    #[test]
    fn test_subscription_id() {
        let id = SubscriptionId::new(7);
        assert_eq!(id.raw(), 7);
        assert_eq!(format!("{}", id), "subscription:7");
    }
}
