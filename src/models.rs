//! Shared model types used by domain queries and route DTOs

use serde::{Deserialize, Serialize};

/// Review state of a queued video.
///
/// `Pending` is the sole initial state; `Approved` and `Rejected` are
/// terminal. A decided row is never re-opened, so the review history stays
/// auditable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "approval_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ApprovalStatus {
    Pending,
    Approved,
    Rejected,
}

impl ApprovalStatus {
    /// Parse a query-string filter value.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parse() {
        assert_eq!(
            ApprovalStatus::parse("pending"),
            Some(ApprovalStatus::Pending)
        );
        assert_eq!(
            ApprovalStatus::parse("approved"),
            Some(ApprovalStatus::Approved)
        );
        assert_eq!(
            ApprovalStatus::parse("rejected"),
            Some(ApprovalStatus::Rejected)
        );
        assert_eq!(ApprovalStatus::parse("posted"), None);
        assert_eq!(ApprovalStatus::parse(""), None);
    }
}
