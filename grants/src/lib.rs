//! The dynamic permission layer: persisted per-player grants and the
//! grant-aware permission resolver.
//!
//! Grants only ever widen which players a user may touch; role-wide
//! permission flags come from the `rbac` crate alone.

pub mod audit;
pub mod db;
pub mod error;
pub mod resolver;
pub mod store;

pub use audit::{AuditAction, AuditEvent, AuditSink, TracingAuditSink};
pub use db::{GrantDatabase, GrantDatabaseConfig};
pub use error::{GrantError, Result};
pub use resolver::{EffectivePermissions, PermissionResolver, PlayerAccess};
pub use store::{Grant, GrantStore, MirrorUser, NewGrant};
