use crate::extract::extract_role;
use crate::registry::{Permission, PermissionFlags, PlayerAllowList, RoleRegistry};
use crate::user::User;

/// Role-only view of a user's permissions, computed without I/O.
///
/// This is the fast path for repeated UI-level checks. It ignores
/// per-player grants entirely, so it may under-report player access;
/// every enforcement decision at the API boundary must go through the
/// grant-aware resolver instead.
#[derive(Debug, Clone)]
pub struct RolePermissions {
    pub role: String,
    pub display_name: String,
    pub allowed_players: PlayerAllowList,
    pub allowed_locations: Vec<String>,
    pub flags: PermissionFlags,
}

/// Resolve a user to their role's static permission set.
pub fn resolve_role(registry: &RoleRegistry, user: &User) -> RolePermissions {
    let role = extract_role(registry, user);
    let config = registry.get(&role);

    RolePermissions {
        role,
        display_name: config.display_name.clone(),
        allowed_players: config.allowed_players.clone(),
        allowed_locations: config.allowed_locations.clone(),
        flags: config.permissions.clone(),
    }
}

/// Role-level permission flag check. Grants never alter flags, so this
/// is the one authoritative answer for operation-kind permissions.
pub fn has_permission(registry: &RoleRegistry, user: &User, permission: Permission) -> bool {
    resolve_role(registry, user).flags.flag(permission)
}

/// Role-only player access check (static allow-list, by id or name).
pub fn can_access_player(
    registry: &RoleRegistry,
    user: &User,
    player_id: &str,
    player_name: &str,
) -> bool {
    resolve_role(registry, user)
        .allowed_players
        .contains(player_id, player_name)
}

/// Whether the user's role covers a location tag.
pub fn can_access_location(registry: &RoleRegistry, user: &User, location: &str) -> bool {
    resolve_role(registry, user)
        .allowed_locations
        .iter()
        .any(|l| l == location)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::user::Membership;

    fn registry() -> RoleRegistry {
        RoleRegistry::from_yaml_str(
            r#"
roles:
  cas-admin:
    displayName: Administrator
    description: Full access
    allowedPlayers: "*"
    allowedLocations: [SFO, BLR]
    permissions:
      canViewPlayers: true
      canUploadContent: true
      canManageUsers: true
  front-desk-manager:
    displayName: Front Desk Manager
    description: Lobby screens
    allowedPlayers:
      - Entrance Lobby
    allowedLocations: [SFO]
    permissions:
      canViewPlayers: true
      canUploadContent: true
  citizen:
    displayName: Community Member
    description: Limited view access
    allowedPlayers: []
    allowedLocations: []
    permissions: {}
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
    fn test_admin_accesses_everything() {
        let registry = registry();
        let admin =
            User::new("a1", "+15550000001").with_roles(vec!["cas-admin".to_string()]);

        assert!(can_access_player(&registry, &admin, "p1", "Entrance Lobby"));
        assert!(can_access_player(&registry, &admin, "p77", "Brand New Screen"));
        assert!(has_permission(&registry, &admin, Permission::CanManageUsers));
    }

    #[test]
    fn test_static_list_matches_by_name() {
        let registry = registry();
        let fdm = User::new("f1", "+15550000002")
            .with_roles(vec!["front-desk-manager".to_string()]);

        assert!(can_access_player(&registry, &fdm, "p1", "Entrance Lobby"));
        assert!(!can_access_player(&registry, &fdm, "p2", "Degen Lounge Projector"));
    }

    #[test]
    fn test_empty_role_list_denies_every_player() {
        let registry = registry();
        let citizen =
            User::new("c1", "+15550000003").with_membership(Membership::Citizen);

        assert!(!can_access_player(&registry, &citizen, "p1", "Entrance Lobby"));
        assert!(!has_permission(&registry, &citizen, Permission::CanViewPlayers));
    }

    #[test]
    fn test_location_check() {
        let registry = registry();
        let fdm = User::new("f1", "+15550000002")
            .with_roles(vec!["front-desk-manager".to_string()]);

        assert!(can_access_location(&registry, &fdm, "SFO"));
        assert!(!can_access_location(&registry, &fdm, "BLR"));
    }
}
