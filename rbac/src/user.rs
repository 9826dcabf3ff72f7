use serde::{Deserialize, Serialize};

/// Membership tier reported by the identity provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Membership {
    Founder,
    Citizen,
    #[default]
    None,
}

/// External identity as supplied by the auth collaborator, one value
/// per request. This core never mutates, fetches, or caches it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// The identity provider's user id.
    pub id: String,
    pub phone_number: String,
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default)]
    pub access_groups: Vec<String>,
    #[serde(default)]
    pub membership: Membership,
}

impl User {
    pub fn new(id: impl Into<String>, phone_number: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            phone_number: phone_number.into(),
            roles: Vec::new(),
            access_groups: Vec::new(),
            membership: Membership::None,
        }
    }

    pub fn with_roles(mut self, roles: Vec<String>) -> Self {
        self.roles = roles;
        self
    }

    pub fn with_access_groups(mut self, groups: Vec<String>) -> Self {
        self.access_groups = groups;
        self
    }

    pub fn with_membership(mut self, membership: Membership) -> Self {
        self.membership = membership;
        self
    }
}
