//! Role-based access control core: static role configuration, role
//! extraction, and the synchronous (role-only) permission checks.
//!
//! Everything here is I/O-free and safe for unsynchronized concurrent
//! reads; the grant-aware layer lives in the `grants` crate.

pub mod access;
pub mod error;
pub mod extract;
pub mod filter;
pub mod registry;
pub mod resolver;
pub mod user;

pub use access::AccessLevel;
pub use error::{RbacError, Result};
pub use extract::extract_role;
pub use filter::{filter_allowed, PlayerRef};
pub use registry::{
    Permission, PermissionFlags, PlayerAllowList, RoleConfig, RoleRegistry, DEFAULT_ROLE,
    SUPER_ADMIN_ROLE,
};
pub use resolver::{
    can_access_location, can_access_player, has_permission, resolve_role, RolePermissions,
};
pub use user::{Membership, User};
