use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Per-player capability tier. The ordering is load-bearing: a level
/// allows any operation that a lower level allows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessLevel {
    View,
    Manage,
    Admin,
}

impl AccessLevel {
    /// Whether this level satisfies an operation that requires `required`.
    pub fn allows(&self, required: AccessLevel) -> bool {
        *self >= required
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AccessLevel::View => "view",
            AccessLevel::Manage => "manage",
            AccessLevel::Admin => "admin",
        }
    }
}

impl fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccessLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "view" => Ok(AccessLevel::View),
            "manage" => Ok(AccessLevel::Manage),
            "admin" => Ok(AccessLevel::Admin),
            other => Err(format!("unknown access level: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordering() {
        assert!(AccessLevel::View < AccessLevel::Manage);
        assert!(AccessLevel::Manage < AccessLevel::Admin);
    }

    #[test]
    fn test_allows_implication() {
        assert!(AccessLevel::Admin.allows(AccessLevel::View));
        assert!(AccessLevel::Manage.allows(AccessLevel::Manage));
        assert!(!AccessLevel::View.allows(AccessLevel::Manage));
    }

    #[test]
    fn test_round_trip() {
        for level in [AccessLevel::View, AccessLevel::Manage, AccessLevel::Admin] {
            assert_eq!(level.as_str().parse::<AccessLevel>().unwrap(), level);
        }
        assert!("owner".parse::<AccessLevel>().is_err());
    }

    #[test]
    fn test_serde_lowercase() {
        let json = serde_json::to_string(&AccessLevel::Manage).unwrap();
        assert_eq!(json, "\"manage\"");
        let level: AccessLevel = serde_json::from_str("\"admin\"").unwrap();
        assert_eq!(level, AccessLevel::Admin);
    }
}
