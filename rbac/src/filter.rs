use crate::registry::RoleRegistry;
use crate::resolver::resolve_role;
use crate::user::User;

/// Anything the resource-listing collaborator hands us: an addressable
/// entity with an id and a display name. Upstream call sites reference
/// players by either, so the filter checks both.
pub trait PlayerRef {
    fn id(&self) -> &str;
    fn name(&self) -> &str;
}

/// Narrow a player list to what the user's role allows, without I/O.
///
/// Returns the input unchanged when the allow-list is `All`. Preserves
/// input order and duplicates; never adds entries.
pub fn filter_allowed<T: PlayerRef>(
    registry: &RoleRegistry,
    user: &User,
    players: Vec<T>,
) -> Vec<T> {
    let permissions = resolve_role(registry, user);

    if permissions.allowed_players.is_all() {
        return players;
    }

    players
        .into_iter()
        .filter(|p| permissions.allowed_players.contains(p.id(), p.name()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct TestPlayer {
        id: String,
        name: String,
    }

    impl TestPlayer {
        fn new(id: &str, name: &str) -> Self {
            Self {
                id: id.to_string(),
                name: name.to_string(),
            }
        }
    }

    impl PlayerRef for TestPlayer {
        fn id(&self) -> &str {
            &self.id
        }
        fn name(&self) -> &str {
            &self.name
        }
    }

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
  front-desk-manager:
    displayName: Front Desk Manager
    description: Lobby screens
    allowedPlayers:
      - Entrance Lobby
      - p4
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

    fn players() -> Vec<TestPlayer> {
        vec![
            TestPlayer::new("p1", "Entrance Lobby"),
            TestPlayer::new("p2", "Degen Lounge Projector"),
            TestPlayer::new("p3", "Multiverse TV"),
            TestPlayer::new("p4", "2nd Floor Lobby"),
        ]
    }

    #[test]
    fn test_all_returns_input_unchanged() {
        let registry = registry();
        let admin =
            User::new("a1", "+15550000001").with_roles(vec!["cas-admin".to_string()]);

        let input = players();
        let filtered = filter_allowed(&registry, &admin, input.clone());
        assert_eq!(filtered, input);
    }

    #[test]
    fn test_subset_matched_by_id_or_name_in_order() {
        let registry = registry();
        let fdm = User::new("f1", "+15550000002")
            .with_roles(vec!["front-desk-manager".to_string()]);

        let filtered = filter_allowed(&registry, &fdm, players());
        assert_eq!(
            filtered,
            vec![
                TestPlayer::new("p1", "Entrance Lobby"),
                TestPlayer::new("p4", "2nd Floor Lobby"),
            ]
        );
    }

    #[test]
    fn test_duplicates_survive() {
        let registry = registry();
        let fdm = User::new("f1", "+15550000002")
            .with_roles(vec!["front-desk-manager".to_string()]);

        let input = vec![
            TestPlayer::new("p1", "Entrance Lobby"),
            TestPlayer::new("p1", "Entrance Lobby"),
        ];
        let filtered = filter_allowed(&registry, &fdm, input);
        assert_eq!(filtered.len(), 2);
    }

    #[test]
    fn test_guest_sees_nothing() {
        let registry = registry();
        let guest = User::new("g1", "+15550000003");

        assert!(filter_allowed(&registry, &guest, players()).is_empty());
    }
}
