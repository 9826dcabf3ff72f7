use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use rbac::{resolve_role, AccessLevel, PermissionFlags, PlayerAllowList, PlayerRef, RoleRegistry, User};

use crate::error::Result;
use crate::store::{Grant, GrantStore};

/// The merged result of role + active grants for one user, computed
/// per request and never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct EffectivePermissions {
    pub role: String,
    pub display_name: String,
    /// Always the role's static flags; grants never widen these.
    pub flags: PermissionFlags,
    /// Role allow-list unioned with grant player ids and names.
    /// `All` absorbs the union.
    pub allowed_players: PlayerAllowList,
    pub allowed_locations: Vec<String>,
    /// The user's active grants, newest first.
    pub grants: Vec<Grant>,
}

impl EffectivePermissions {
    pub fn allows_player(&self, player_id: &str, player_name: &str) -> bool {
        self.allowed_players.contains(player_id, player_name)
    }

    /// Access level applicable to one player. `All` grants `Admin`
    /// outright; a matching grant's explicit level beats the generic
    /// `Manage` assumed for statically-allowed players.
    pub fn access_level_for(&self, player_id: &str, player_name: &str) -> Option<AccessLevel> {
        if self.allowed_players.is_all() {
            return Some(AccessLevel::Admin);
        }

        if let Some(grant) = self
            .grants
            .iter()
            .find(|g| g.matches(player_id, player_name))
        {
            return Some(grant.access_level);
        }

        if self.allowed_players.contains(player_id, player_name) {
            return Some(AccessLevel::Manage);
        }

        None
    }

    /// Per-player level map keyed by both grant id and name, with the
    /// static allow-list entries at the `Manage` floor.
    pub fn player_access_levels(&self) -> HashMap<String, AccessLevel> {
        let mut levels = HashMap::new();

        if let PlayerAllowList::Named(entries) = &self.allowed_players {
            for entry in entries {
                levels.insert(entry.clone(), AccessLevel::Manage);
            }
        }
        for grant in &self.grants {
            levels.insert(grant.player_id.clone(), grant.access_level);
            levels.insert(grant.player_name.clone(), grant.access_level);
        }

        levels
    }
}

/// Outcome of a single player access check.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PlayerAccess {
    pub allowed: bool,
    pub access_level: Option<AccessLevel>,
}

impl PlayerAccess {
    pub fn denied() -> Self {
        Self {
            allowed: false,
            access_level: None,
        }
    }
}

/// The enforcement-grade resolver: role config merged with the grant
/// store. Every authorization decision that gates a state change or an
/// API-boundary read goes through here. A store failure propagates as
/// an error; there is no silent role-only fallback.
#[derive(Clone)]
pub struct PermissionResolver {
    registry: Arc<RoleRegistry>,
    store: GrantStore,
}

impl PermissionResolver {
    pub fn new(registry: Arc<RoleRegistry>, store: GrantStore) -> Self {
        Self { registry, store }
    }

    pub fn registry(&self) -> &RoleRegistry {
        &self.registry
    }

    pub fn store(&self) -> &GrantStore {
        &self.store
    }

    /// Merge the user's role with their active grants.
    pub async fn resolve(&self, user: &User) -> Result<EffectivePermissions> {
        let base = resolve_role(&self.registry, user);

        // Users with no mirror row simply have no grants yet. The
        // phone fallback covers rows pre-provisioned by grant before
        // the user's first login.
        let mirror = match self.store.find_user_by_external_id(&user.id).await? {
            Some(mirror) => Some(mirror),
            None => self.store.find_user_by_phone(&user.phone_number).await?,
        };
        let grants = match mirror {
            Some(mirror) => self.store.grants_for_user(&mirror.id).await?,
            None => Vec::new(),
        };

        debug!(
            "Resolved user {} to role '{}' with {} active grants",
            user.id,
            base.role,
            grants.len()
        );

        let grant_keys = grants
            .iter()
            .flat_map(|g| [g.player_id.clone(), g.player_name.clone()]);
        let allowed_players = base.allowed_players.union(grant_keys);

        Ok(EffectivePermissions {
            role: base.role,
            display_name: base.display_name,
            flags: base.flags,
            allowed_players,
            allowed_locations: base.allowed_locations,
            grants,
        })
    }

    /// Grant-aware player access check.
    pub async fn can_access_player(
        &self,
        user: &User,
        player_id: &str,
        player_name: &str,
    ) -> Result<PlayerAccess> {
        let permissions = self.resolve(user).await?;

        match permissions.access_level_for(player_id, player_name) {
            Some(level) => Ok(PlayerAccess {
                allowed: true,
                access_level: Some(level),
            }),
            None => Ok(PlayerAccess::denied()),
        }
    }

    /// Grant-aware filter over a raw player list. Order and duplicates
    /// preserved; identity when the effective allow-list is `All`.
    pub async fn filter_allowed<T: PlayerRef>(
        &self,
        user: &User,
        players: Vec<T>,
    ) -> Result<Vec<T>> {
        let permissions = self.resolve(user).await?;

        if permissions.allowed_players.is_all() {
            return Ok(players);
        }

        Ok(players
            .into_iter()
            .filter(|p| permissions.allowed_players.contains(p.id(), p.name()))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::GrantDatabase;
    use crate::store::NewGrant;
    use chrono::{Duration, Utc};
    use rbac::Permission;

    const ROLES: &str = r#"
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
    allowedPlayers: []
    allowedLocations: [SFO]
    permissions:
      canViewPlayers: true
      canUploadContent: true
  default:
    displayName: Guest
    description: No access
    allowedPlayers: []
    permissions: {}
"#;

    struct TestPlayer {
        id: &'static str,
        name: &'static str,
    }

    impl PlayerRef for TestPlayer {
        fn id(&self) -> &str {
            self.id
        }
        fn name(&self) -> &str {
            self.name
        }
    }

    async fn resolver() -> PermissionResolver {
        let registry = Arc::new(RoleRegistry::from_yaml_str(ROLES).unwrap());
        let store = GrantStore::new(GrantDatabase::in_memory().await.unwrap());
        PermissionResolver::new(registry, store)
    }

    fn fdm_user() -> User {
        User::new("ext-1", "+15550001111").with_roles(vec!["front-desk-manager".to_string()])
    }

    async fn seed_grant(
        resolver: &PermissionResolver,
        user: &User,
        player_id: &str,
        player_name: &str,
        level: AccessLevel,
        expires_at: Option<chrono::DateTime<Utc>>,
    ) {
        let mirror = resolver
            .store()
            .ensure_user(&user.id, &user.phone_number)
            .await
            .unwrap();
        resolver
            .store()
            .grant(NewGrant {
                user_id: mirror.id,
                player_id: player_id.to_string(),
                player_name: player_name.to_string(),
                access_level: level,
                granted_by: "admin@x".to_string(),
                expires_at,
                notes: None,
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_all_role_ignores_grant_state() {
        let resolver = resolver().await;
        let admin =
            User::new("ext-a", "+15550009999").with_roles(vec!["cas-admin".to_string()]);

        let access = resolver
            .can_access_player(&admin, "p1", "Entrance Lobby")
            .await
            .unwrap();
        assert!(access.allowed);
        assert_eq!(access.access_level, Some(AccessLevel::Admin));
    }

    #[tokio::test]
    async fn test_grant_then_check_then_revoke() {
        let resolver = resolver().await;
        let user = fdm_user();

        // No grants: the role's empty list denies every player.
        let before = resolver
            .can_access_player(&user, "p1", "Entrance Lobby")
            .await
            .unwrap();
        assert!(!before.allowed);

        seed_grant(&resolver, &user, "p1", "Entrance Lobby", AccessLevel::Manage, None).await;

        let by_id = resolver
            .can_access_player(&user, "p1", "whatever")
            .await
            .unwrap();
        assert!(by_id.allowed);
        assert_eq!(by_id.access_level, Some(AccessLevel::Manage));

        // Matched by display name as well.
        let by_name = resolver
            .can_access_player(&user, "other-id", "Entrance Lobby")
            .await
            .unwrap();
        assert!(by_name.allowed);

        let mirror = resolver
            .store()
            .find_user_by_external_id(&user.id)
            .await
            .unwrap()
            .unwrap();
        resolver
            .store()
            .revoke("admin@x", &mirror.id, "p1")
            .await
            .unwrap();

        let after = resolver
            .can_access_player(&user, "p1", "Entrance Lobby")
            .await
            .unwrap();
        assert_eq!(after, PlayerAccess::denied());
    }

    #[tokio::test]
    async fn test_grant_level_overrides_static_default() {
        let resolver = resolver().await;
        let user = fdm_user();

        seed_grant(&resolver, &user, "p1", "Entrance Lobby", AccessLevel::View, None).await;

        let access = resolver
            .can_access_player(&user, "p1", "Entrance Lobby")
            .await
            .unwrap();
        assert_eq!(access.access_level, Some(AccessLevel::View));
    }

    #[tokio::test]
    async fn test_expired_grant_behaves_as_absent() {
        let resolver = resolver().await;
        let user = fdm_user();

        seed_grant(
            &resolver,
            &user,
            "p1",
            "Entrance Lobby",
            AccessLevel::Manage,
            Some(Utc::now() - Duration::hours(1)),
        )
        .await;

        let access = resolver
            .can_access_player(&user, "p1", "Entrance Lobby")
            .await
            .unwrap();
        assert!(!access.allowed);

        let effective = resolver.resolve(&user).await.unwrap();
        assert!(!effective.allows_player("p1", "Entrance Lobby"));
        assert!(effective.grants.is_empty());
    }

    #[tokio::test]
    async fn test_flags_unaffected_by_grants() {
        let resolver = resolver().await;
        let user = fdm_user();

        seed_grant(&resolver, &user, "p1", "Entrance Lobby", AccessLevel::Admin, None).await;

        let effective = resolver.resolve(&user).await.unwrap();
        assert!(effective.flags.flag(Permission::CanUploadContent));
        // An admin-level grant on a player does not mint role-wide
        // permissions.
        assert!(!effective.flags.flag(Permission::CanManageUsers));
    }

    #[tokio::test]
    async fn test_filter_includes_granted_players() {
        let resolver = resolver().await;
        let user = fdm_user();

        seed_grant(&resolver, &user, "p2", "Degen Lounge Projector", AccessLevel::View, None)
            .await;

        let players = vec![
            TestPlayer { id: "p1", name: "Entrance Lobby" },
            TestPlayer { id: "p2", name: "Degen Lounge Projector" },
            TestPlayer { id: "p3", name: "Multiverse TV" },
        ];

        let filtered = resolver.filter_allowed(&user, players).await.unwrap();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].id, "p2");
    }

    #[tokio::test]
    async fn test_resolve_unions_without_losing_all() {
        let resolver = resolver().await;
        let admin =
            User::new("ext-a", "+15550009999").with_roles(vec!["cas-admin".to_string()]);

        seed_grant(&resolver, &admin, "p1", "Entrance Lobby", AccessLevel::View, None).await;

        let effective = resolver.resolve(&admin).await.unwrap();
        assert!(effective.allowed_players.is_all());
    }

    #[tokio::test]
    async fn test_player_access_levels_map() {
        let resolver = resolver().await;
        let user = fdm_user();

        seed_grant(&resolver, &user, "p1", "Entrance Lobby", AccessLevel::View, None).await;

        let effective = resolver.resolve(&user).await.unwrap();
        let levels = effective.player_access_levels();
        assert_eq!(levels.get("p1"), Some(&AccessLevel::View));
        assert_eq!(levels.get("Entrance Lobby"), Some(&AccessLevel::View));
    }

    #[tokio::test]
    async fn test_grant_by_phone_visible_before_first_login() {
        let resolver = resolver().await;
        let user = fdm_user();

        // Grant to the phone number before the user has ever logged in.
        let pending = resolver
            .store()
            .ensure_user_by_phone(&user.phone_number)
            .await
            .unwrap();
        resolver
            .store()
            .grant(NewGrant {
                user_id: pending.id,
                player_id: "p1".to_string(),
                player_name: "Entrance Lobby".to_string(),
                access_level: AccessLevel::View,
                granted_by: "admin@x".to_string(),
                expires_at: None,
                notes: None,
            })
            .await
            .unwrap();

        let access = resolver
            .can_access_player(&user, "p1", "Entrance Lobby")
            .await
            .unwrap();
        assert!(access.allowed);
        assert_eq!(access.access_level, Some(AccessLevel::View));
    }

    #[tokio::test]
    async fn test_user_without_mirror_row_resolves_role_only() {
        let resolver = resolver().await;
        let user = fdm_user();

        let effective = resolver.resolve(&user).await.unwrap();
        assert_eq!(effective.role, "front-desk-manager");
        assert!(effective.grants.is_empty());
    }
}
