use crate::registry::{RoleRegistry, DEFAULT_ROLE, SUPER_ADMIN_ROLE};
use crate::user::{Membership, User};

/// Access groups that map to a role, in declared priority order.
const KNOWN_GROUP_ROLES: [&str; 4] = [
    "property-manager",
    "activity-manager",
    "front-desk-manager",
    "marketing",
];

/// Derive the effective role id for a user.
///
/// Priority: role strings outrank access groups, which outrank the
/// membership tier. Within the role list the super-admin role wins
/// regardless of position; otherwise the first registry-known entry
/// wins, falling back to the first raw string (which the registry will
/// resolve to `default` if it turns out to be unrecognized).
pub fn extract_role(registry: &RoleRegistry, user: &User) -> String {
    if !user.roles.is_empty() {
        if user.roles.iter().any(|r| r == SUPER_ADMIN_ROLE) {
            return SUPER_ADMIN_ROLE.to_string();
        }

        for role in &user.roles {
            if registry.is_known(role) {
                return role.clone();
            }
        }

        return user.roles[0].clone();
    }

    if !user.access_groups.is_empty() {
        for group in KNOWN_GROUP_ROLES {
            if user.access_groups.iter().any(|g| g == group) {
                return group.to_string();
            }
        }
    }

    match user.membership {
        Membership::Founder => "founder".to_string(),
        Membership::Citizen => "citizen".to_string(),
        Membership::None => DEFAULT_ROLE.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::RoleRegistry;

    fn registry() -> RoleRegistry {
        RoleRegistry::from_yaml_str(
            r#"
roles:
  cas-admin:
    displayName: Administrator
    description: Full access
    allowedPlayers: "*"
    permissions:
      canViewPlayers: true
  property-manager:
    displayName: Property Manager
    description: Site-wide content
    allowedPlayers: "*"
    permissions:
      canViewPlayers: true
  founder:
    displayName: Founder
    description: View only
    allowedPlayers: "*"
    permissions:
      canViewPlayers: true
  default:
    displayName: Guest
    description: No access
    allowedPlayers: []
    permissions: {}
"#,
        )
        .unwrap()
    }

    #[test]
    fn test_super_admin_wins_regardless_of_position() {
        let registry = registry();
        let user = User::new("u1", "+15550001111")
            .with_roles(vec!["property-manager".to_string(), "cas-admin".to_string()])
            .with_access_groups(vec!["front-desk-manager".to_string()])
            .with_membership(Membership::Citizen);

        assert_eq!(extract_role(&registry, &user), "cas-admin");
    }

    #[test]
    fn test_first_known_role_wins() {
        let registry = registry();
        let user = User::new("u1", "+15550001111").with_roles(vec![
            "stage-hand".to_string(),
            "property-manager".to_string(),
        ]);

        assert_eq!(extract_role(&registry, &user), "property-manager");
    }

    #[test]
    fn test_unknown_roles_return_first_raw_string() {
        let registry = registry();
        let user =
            User::new("u1", "+15550001111").with_roles(vec!["stage-hand".to_string()]);

        // The raw string comes back; the registry resolves it to the
        // deny-all default on lookup.
        assert_eq!(extract_role(&registry, &user), "stage-hand");
        assert!(registry.get("stage-hand").permissions.denies_all());
    }

    #[test]
    fn test_access_groups_checked_in_priority_order() {
        let registry = registry();
        let user = User::new("u1", "+15550001111").with_access_groups(vec![
            "front-desk-manager".to_string(),
            "property-manager".to_string(),
        ]);

        assert_eq!(extract_role(&registry, &user), "property-manager");
    }

    #[test]
    fn test_membership_fallback() {
        let registry = registry();

        let founder =
            User::new("u1", "+15550001111").with_membership(Membership::Founder);
        assert_eq!(extract_role(&registry, &founder), "founder");

        let citizen =
            User::new("u2", "+15550002222").with_membership(Membership::Citizen);
        assert_eq!(extract_role(&registry, &citizen), "citizen");

        let nobody = User::new("u3", "+15550003333");
        assert_eq!(extract_role(&registry, &nobody), "default");
    }

    #[test]
    fn test_unmatched_group_falls_through_to_membership() {
        let registry = registry();
        let user = User::new("u1", "+15550001111")
            .with_access_groups(vec!["book-club".to_string()])
            .with_membership(Membership::Founder);

        assert_eq!(extract_role(&registry, &user), "founder");
    }
}
