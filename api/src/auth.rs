use tracing::warn;

use rbac::{Permission, RoleRegistry, User};

use crate::error::ApiError;

/// Identity attached to the request by the identity middleware:
/// `None` means no authenticated session.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Option<User>);

/// The authenticated user, or the unauthenticated outcome.
pub fn require_user(current: &CurrentUser) -> Result<&User, ApiError> {
    current.0.as_ref().ok_or(ApiError::Unauthorized)
}

/// The authenticated user if their role carries the permission flag;
/// otherwise the forbidden outcome (distinguishable from
/// unauthenticated). Flags are role-only, so this check needs no I/O.
pub fn require_permission<'a>(
    registry: &RoleRegistry,
    current: &'a CurrentUser,
    permission: Permission,
) -> Result<&'a User, ApiError> {
    let user = require_user(current)?;

    if !rbac::has_permission(registry, user, permission) {
        warn!(
            "Denied user {}: missing permission {:?}",
            user.id, permission
        );
        return Err(ApiError::Forbidden);
    }

    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rbac::Membership;

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
      canManageUsers: true
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
    fn test_three_way_outcome() {
        let registry = registry();

        // No identity: unauthenticated.
        let anonymous = CurrentUser(None);
        assert!(matches!(
            require_permission(&registry, &anonymous, Permission::CanViewPlayers),
            Err(ApiError::Unauthorized)
        ));

        // Identity without the flag: forbidden.
        let citizen = CurrentUser(Some(
            User::new("c1", "+15550000001").with_membership(Membership::Citizen),
        ));
        assert!(matches!(
            require_permission(&registry, &citizen, Permission::CanViewPlayers),
            Err(ApiError::Forbidden)
        ));

        // Identity with the flag: allowed.
        let admin = CurrentUser(Some(
            User::new("a1", "+15550000002").with_roles(vec!["cas-admin".to_string()]),
        ));
        assert!(require_permission(&registry, &admin, Permission::CanViewPlayers).is_ok());
    }
}
