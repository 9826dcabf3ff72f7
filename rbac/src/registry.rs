use crate::error::{RbacError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info};

/// Role id every unknown role resolves to. The config must ship a
/// deny-all entry under this id.
pub const DEFAULT_ROLE: &str = "default";

/// Role id that outranks everything else during extraction.
pub const SUPER_ADMIN_ROLE: &str = "cas-admin";

/// Role-wide boolean capability, not scoped to a player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Permission {
    CanViewPlayers,
    CanUploadContent,
    CanScheduleContent,
    CanDeleteContent,
    CanDeployToPlayers,
    CanControlPlayback,
    CanViewAnalytics,
    CanManageUsers,
    CanViewAuditLogs,
    CanEditPermissions,
}

impl Permission {
    pub const ALL: [Permission; 10] = [
        Permission::CanViewPlayers,
        Permission::CanUploadContent,
        Permission::CanScheduleContent,
        Permission::CanDeleteContent,
        Permission::CanDeployToPlayers,
        Permission::CanControlPlayback,
        Permission::CanViewAnalytics,
        Permission::CanManageUsers,
        Permission::CanViewAuditLogs,
        Permission::CanEditPermissions,
    ];
}

/// The permission flag set of one role. Missing keys in the config
/// default to false, so a sparse config still denies.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PermissionFlags {
    pub can_view_players: bool,
    pub can_upload_content: bool,
    pub can_schedule_content: bool,
    pub can_delete_content: bool,
    pub can_deploy_to_players: bool,
    pub can_control_playback: bool,
    pub can_view_analytics: bool,
    pub can_manage_users: bool,
    pub can_view_audit_logs: bool,
    pub can_edit_permissions: bool,
}

impl PermissionFlags {
    pub fn flag(&self, permission: Permission) -> bool {
        match permission {
            Permission::CanViewPlayers => self.can_view_players,
            Permission::CanUploadContent => self.can_upload_content,
            Permission::CanScheduleContent => self.can_schedule_content,
            Permission::CanDeleteContent => self.can_delete_content,
            Permission::CanDeployToPlayers => self.can_deploy_to_players,
            Permission::CanControlPlayback => self.can_control_playback,
            Permission::CanViewAnalytics => self.can_view_analytics,
            Permission::CanManageUsers => self.can_manage_users,
            Permission::CanViewAuditLogs => self.can_view_audit_logs,
            Permission::CanEditPermissions => self.can_edit_permissions,
        }
    }

    /// True when every flag is off.
    pub fn denies_all(&self) -> bool {
        Permission::ALL.iter().all(|p| !self.flag(*p))
    }
}

/// A role's player allow-list: either every player, or an explicit set
/// keyed by player id or display name (both are accepted upstream, so
/// both are keys into the same set).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerAllowList {
    All,
    Named(Vec<String>),
}

impl PlayerAllowList {
    pub fn contains(&self, player_id: &str, player_name: &str) -> bool {
        match self {
            PlayerAllowList::All => true,
            PlayerAllowList::Named(entries) => entries
                .iter()
                .any(|e| e == player_id || e == player_name),
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, PlayerAllowList::All)
    }

    /// Union with extra player keys. `All` absorbs everything; named
    /// lists are deduplicated with input order preserved.
    pub fn union<I>(&self, extra: I) -> PlayerAllowList
    where
        I: IntoIterator<Item = String>,
    {
        match self {
            PlayerAllowList::All => PlayerAllowList::All,
            PlayerAllowList::Named(entries) => {
                let mut merged = entries.clone();
                for key in extra {
                    if !merged.contains(&key) {
                        merged.push(key);
                    }
                }
                PlayerAllowList::Named(merged)
            }
        }
    }
}

impl Serialize for PlayerAllowList {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self {
            PlayerAllowList::All => serializer.serialize_str("*"),
            PlayerAllowList::Named(entries) => entries.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for PlayerAllowList {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Sentinel(String),
            List(Vec<String>),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Sentinel(s) if s == "*" => Ok(PlayerAllowList::All),
            Raw::Sentinel(s) => Err(serde::de::Error::custom(format!(
                "allowedPlayers must be \"*\" or a list, got \"{}\"",
                s
            ))),
            Raw::List(entries) => Ok(PlayerAllowList::Named(entries)),
        }
    }
}

/// One role's static configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleConfig {
    pub display_name: String,
    pub description: String,
    pub allowed_players: PlayerAllowList,
    #[serde(default)]
    pub allowed_locations: Vec<String>,
    #[serde(default)]
    pub permissions: PermissionFlags,
}

#[derive(Debug, Deserialize)]
struct RegistryFile {
    roles: HashMap<String, RoleConfig>,
    #[serde(default)]
    player_locations: HashMap<String, String>,
}

/// Static role configuration, loaded and validated once at process
/// start, read-only afterwards. Shared as `Arc<RoleRegistry>` across
/// request handlers without synchronization.
#[derive(Debug)]
pub struct RoleRegistry {
    roles: HashMap<String, RoleConfig>,
    player_locations: HashMap<String, String>,
}

impl RoleRegistry {
    /// Load the registry from a YAML file. Malformed config is a boot
    /// failure, never a first-use failure.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        debug!("Loading role config from: {:?}", path);

        let content = std::fs::read_to_string(path)
            .map_err(|e| RbacError::ConfigParsing(format!("Failed to read {:?}: {}", path, e)))?;

        let registry = Self::from_yaml_str(&content)?;

        info!("Loaded {} roles from {:?}", registry.roles.len(), path);

        Ok(registry)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let file: RegistryFile = serde_yaml::from_str(content)
            .map_err(|e| RbacError::ConfigParsing(format!("Failed to parse YAML: {}", e)))?;

        let registry = Self {
            roles: file.roles,
            player_locations: file.player_locations,
        };
        registry.validate()?;

        Ok(registry)
    }

    fn validate(&self) -> Result<()> {
        let default = self.roles.get(DEFAULT_ROLE).ok_or_else(|| {
            RbacError::Validation(format!("Role config must contain a '{}' role", DEFAULT_ROLE))
        })?;

        // The fallback role is the deny-all floor for unknown roles.
        if !default.permissions.denies_all() || default.allowed_players.is_all() {
            return Err(RbacError::Validation(format!(
                "The '{}' role must deny all permissions and players",
                DEFAULT_ROLE
            )));
        }
        if let PlayerAllowList::Named(entries) = &default.allowed_players {
            if !entries.is_empty() {
                return Err(RbacError::Validation(format!(
                    "The '{}' role must have an empty player list",
                    DEFAULT_ROLE
                )));
            }
        }

        for (id, role) in &self.roles {
            if id.is_empty() {
                return Err(RbacError::Validation("Role id cannot be empty".to_string()));
            }
            if role.display_name.is_empty() {
                return Err(RbacError::Validation(format!(
                    "Role '{}' display name cannot be empty",
                    id
                )));
            }
            if let PlayerAllowList::Named(entries) = &role.allowed_players {
                if entries.iter().any(|e| e.is_empty()) {
                    return Err(RbacError::Validation(format!(
                        "Role '{}' has an empty player entry",
                        id
                    )));
                }
            }
        }

        Ok(())
    }

    /// Look up a role. Total: unknown ids resolve to the `default`
    /// deny-all entry, never an error.
    pub fn get(&self, role_id: &str) -> &RoleConfig {
        self.roles.get(role_id).unwrap_or_else(|| {
            // validate() guarantees the default entry exists
            &self.roles[DEFAULT_ROLE]
        })
    }

    pub fn is_known(&self, role_id: &str) -> bool {
        self.roles.contains_key(role_id)
    }

    pub fn role_ids(&self) -> impl Iterator<Item = &str> {
        self.roles.keys().map(|k| k.as_str())
    }

    /// Location tag for a player, from the shipped player map.
    pub fn player_location(&self, player_name: &str) -> Option<&str> {
        self.player_locations.get(player_name).map(|s| s.as_str())
    }
}
