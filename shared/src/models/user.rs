//! User and role models

use serde::{Deserialize, Serialize};

use crate::workflow::ActorRole;

/// Platform roles
///
/// Farmers apply for certification; reviewers (DTAM document staff) review
/// and schedule; auditors run on-site inspections; admins manage everything.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Farmer,
    Reviewer,
    Auditor,
    Admin,
}

impl UserRole {
    pub const ALL: [UserRole; 4] = [
        UserRole::Farmer,
        UserRole::Reviewer,
        UserRole::Auditor,
        UserRole::Admin,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Farmer => "farmer",
            UserRole::Reviewer => "reviewer",
            UserRole::Auditor => "auditor",
            UserRole::Admin => "admin",
        }
    }

    /// DTAM staff roles have access to the back-office endpoints
    pub fn is_staff(&self) -> bool {
        !matches!(self, UserRole::Farmer)
    }

    /// The workflow actor this role acts as
    pub fn actor(&self) -> ActorRole {
        match self {
            UserRole::Farmer => ActorRole::Farmer,
            UserRole::Reviewer => ActorRole::Reviewer,
            UserRole::Auditor => ActorRole::Auditor,
            UserRole::Admin => ActorRole::Admin,
        }
    }
}

impl std::str::FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|r| r.as_str() == s)
            .copied()
            .ok_or_else(|| format!("unknown user role: {}", s))
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trip() {
        for role in UserRole::ALL {
            let parsed: UserRole = role.as_str().parse().unwrap();
            assert_eq!(parsed, role);
        }
    }

    #[test]
    fn test_staff_roles() {
        assert!(!UserRole::Farmer.is_staff());
        assert!(UserRole::Reviewer.is_staff());
        assert!(UserRole::Auditor.is_staff());
        assert!(UserRole::Admin.is_staff());
    }
}
