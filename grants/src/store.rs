use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info};

use rbac::AccessLevel;

use crate::audit::{AuditAction, AuditEvent, AuditSink, TracingAuditSink};
use crate::db::GrantDatabase;
use crate::error::{GrantError, Result};

/// A locally mirrored identity-provider user, keyed by external id.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MirrorUser {
    pub id: String,
    pub external_id: String,
    pub phone_number: String,
}

/// One per-user, per-player access override.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grant {
    pub user_id: String,
    pub player_id: String,
    pub player_name: String,
    pub access_level: AccessLevel,
    pub granted_by: String,
    pub granted_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

impl Grant {
    /// Active iff unexpired at `now`. Expired grants must behave as if
    /// absent for every authorization decision.
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at {
            None => true,
            Some(expiry) => expiry > now,
        }
    }

    /// Whether this grant names the player, by id or display name.
    pub fn matches(&self, player_id: &str, player_name: &str) -> bool {
        self.player_id == player_id
            || self.player_id == player_name
            || self.player_name == player_id
            || self.player_name == player_name
    }
}

/// Input for a grant upsert. `granted_at` is set by the store.
#[derive(Debug, Clone)]
pub struct NewGrant {
    pub user_id: String,
    pub player_id: String,
    pub player_name: String,
    pub access_level: AccessLevel,
    pub granted_by: String,
    pub expires_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

#[derive(Debug, FromRow)]
struct GrantRow {
    user_id: String,
    player_id: String,
    player_name: String,
    access_level: String,
    granted_by: String,
    granted_at: DateTime<Utc>,
    expires_at: Option<DateTime<Utc>>,
    notes: Option<String>,
}

impl GrantRow {
    fn try_into_grant(self) -> Result<Grant> {
        let access_level = AccessLevel::from_str(&self.access_level)
            .map_err(GrantError::Malformed)?;

        Ok(Grant {
            user_id: self.user_id,
            player_id: self.player_id,
            player_name: self.player_name,
            access_level,
            granted_by: self.granted_by,
            granted_at: self.granted_at,
            expires_at: self.expires_at,
            notes: self.notes,
        })
    }
}

const GRANT_COLUMNS: &str = "user_id, player_id, player_name, access_level, \
                             granted_by, granted_at, expires_at, notes";

/// Grant lifecycle manager: create/overwrite, revoke, and the active
/// (non-expired) range queries the resolver runs on every check.
#[derive(Clone)]
pub struct GrantStore {
    db: GrantDatabase,
    audit: Arc<dyn AuditSink>,
}

impl GrantStore {
    pub fn new(db: GrantDatabase) -> Self {
        Self {
            db,
            audit: Arc::new(TracingAuditSink),
        }
    }

    pub fn with_audit_sink(db: GrantDatabase, audit: Arc<dyn AuditSink>) -> Self {
        Self { db, audit }
    }

    pub fn database(&self) -> &GrantDatabase {
        &self.db
    }

    // ------------------------------------------------------------------
    // User mirror
    // ------------------------------------------------------------------

    /// Find or create the mirror row for an external identity.
    /// Idempotent per phone number; a placeholder row created by phone
    /// before first login is claimed by its external id later.
    pub async fn ensure_user(&self, external_id: &str, phone_number: &str) -> Result<MirrorUser> {
        if phone_number.is_empty() {
            return Err(GrantError::Validation(
                "phone_number must not be empty".to_string(),
            ));
        }

        if let Some(mut user) = self.find_user_by_phone(phone_number).await? {
            if user.external_id != external_id && user.external_id.starts_with("pending-") {
                sqlx::query("UPDATE users SET external_id = ? WHERE id = ?")
                    .bind(external_id)
                    .bind(&user.id)
                    .execute(self.db.pool())
                    .await?;

                info!("Mirror user {} claimed by external id", user.id);
                user.external_id = external_id.to_string();
            }
            return Ok(user);
        }

        let id = ulid::Ulid::new().to_string();
        sqlx::query("INSERT INTO users (id, external_id, phone_number) VALUES (?, ?, ?)")
            .bind(&id)
            .bind(external_id)
            .bind(phone_number)
            .execute(self.db.pool())
            .await?;

        info!("Created mirror user {} for {}", id, phone_number);

        Ok(MirrorUser {
            id,
            external_id: external_id.to_string(),
            phone_number: phone_number.to_string(),
        })
    }

    /// Find-or-create keyed by phone only; used when granting to a
    /// number that has never logged in.
    pub async fn ensure_user_by_phone(&self, phone_number: &str) -> Result<MirrorUser> {
        let placeholder = format!("pending-{}", phone_number);
        self.ensure_user(&placeholder, phone_number).await
    }

    pub async fn find_user_by_phone(&self, phone_number: &str) -> Result<Option<MirrorUser>> {
        let user = sqlx::query_as::<_, MirrorUser>(
            "SELECT id, external_id, phone_number FROM users WHERE phone_number = ?",
        )
        .bind(phone_number)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(user)
    }

    pub async fn find_user_by_external_id(&self, external_id: &str) -> Result<Option<MirrorUser>> {
        let user = sqlx::query_as::<_, MirrorUser>(
            "SELECT id, external_id, phone_number FROM users WHERE external_id = ?",
        )
        .bind(external_id)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(user)
    }

    // ------------------------------------------------------------------
    // Grant lifecycle
    // ------------------------------------------------------------------

    /// Upsert a grant on the `(user_id, player_id)` key. A second call
    /// for the same pair overwrites the prior row; there is never more
    /// than one row per pair. Validation happens before any write.
    pub async fn grant(&self, input: NewGrant) -> Result<Grant> {
        Self::validate(&input)?;

        let granted_at = Utc::now();

        debug!(
            "Granting {} on player {} to user {} (by {})",
            input.access_level, input.player_id, input.user_id, input.granted_by
        );

        let result = sqlx::query(
            r#"
            INSERT INTO player_grants
                (user_id, player_id, player_name, access_level,
                 granted_by, granted_at, expires_at, notes)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(user_id, player_id) DO UPDATE SET
                player_name = excluded.player_name,
                access_level = excluded.access_level,
                granted_by = excluded.granted_by,
                granted_at = excluded.granted_at,
                expires_at = excluded.expires_at,
                notes = excluded.notes
            "#,
        )
        .bind(&input.user_id)
        .bind(&input.player_id)
        .bind(&input.player_name)
        .bind(input.access_level.as_str())
        .bind(&input.granted_by)
        .bind(granted_at)
        .bind(input.expires_at)
        .bind(&input.notes)
        .execute(self.db.pool())
        .await;

        self.audit.record(&AuditEvent {
            actor: input.granted_by.clone(),
            action: AuditAction::Granted,
            user_id: input.user_id.clone(),
            player_id: input.player_id.clone(),
            player_name: Some(input.player_name.clone()),
            outcome: result.is_ok(),
            at: granted_at,
        });

        result?;

        info!(
            "Granted {} access on {} to user {}",
            input.access_level, input.player_name, input.user_id
        );

        Ok(Grant {
            user_id: input.user_id,
            player_id: input.player_id,
            player_name: input.player_name,
            access_level: input.access_level,
            granted_by: input.granted_by,
            granted_at,
            expires_at: input.expires_at,
            notes: input.notes,
        })
    }

    /// Delete the `(user_id, player_id)` row. Idempotent: a missing
    /// row is still success.
    pub async fn revoke(&self, actor: &str, user_id: &str, player_id: &str) -> Result<()> {
        let result =
            sqlx::query("DELETE FROM player_grants WHERE user_id = ? AND player_id = ?")
                .bind(user_id)
                .bind(player_id)
                .execute(self.db.pool())
                .await;

        self.audit.record(&AuditEvent {
            actor: actor.to_string(),
            action: AuditAction::Revoked,
            user_id: user_id.to_string(),
            player_id: player_id.to_string(),
            player_name: None,
            outcome: result.is_ok(),
            at: Utc::now(),
        });

        let result = result?;

        if result.rows_affected() == 0 {
            debug!(
                "Revoke for user {} player {} matched no row",
                user_id, player_id
            );
        } else {
            info!("Revoked player {} access from user {}", player_id, user_id);
        }

        Ok(())
    }

    /// Active grants for one user, newest first. The expiry predicate
    /// is applied in the query; expired rows never reach the resolver.
    pub async fn grants_for_user(&self, user_id: &str) -> Result<Vec<Grant>> {
        let sql = format!(
            "SELECT {} FROM player_grants \
             WHERE user_id = ? AND (expires_at IS NULL OR expires_at > ?) \
             ORDER BY granted_at DESC",
            GRANT_COLUMNS
        );

        let rows = sqlx::query_as::<_, GrantRow>(&sql)
            .bind(user_id)
            .bind(Utc::now())
            .fetch_all(self.db.pool())
            .await?;

        rows.into_iter().map(GrantRow::try_into_grant).collect()
    }

    /// Every grant for one user including expired rows, for the audit
    /// history view only. Never use this for authorization.
    pub async fn grants_for_user_all(&self, user_id: &str) -> Result<Vec<Grant>> {
        let sql = format!(
            "SELECT {} FROM player_grants WHERE user_id = ? ORDER BY granted_at DESC",
            GRANT_COLUMNS
        );

        let rows = sqlx::query_as::<_, GrantRow>(&sql)
            .bind(user_id)
            .fetch_all(self.db.pool())
            .await?;

        rows.into_iter().map(GrantRow::try_into_grant).collect()
    }

    /// Every active grant in the store, newest first. Backs the admin
    /// overview when no user/player filter is given.
    pub async fn grants_active(&self) -> Result<Vec<Grant>> {
        let sql = format!(
            "SELECT {} FROM player_grants \
             WHERE expires_at IS NULL OR expires_at > ? \
             ORDER BY granted_at DESC",
            GRANT_COLUMNS
        );

        let rows = sqlx::query_as::<_, GrantRow>(&sql)
            .bind(Utc::now())
            .fetch_all(self.db.pool())
            .await?;

        rows.into_iter().map(GrantRow::try_into_grant).collect()
    }

    /// Active grants on one player: "who has access to X."
    pub async fn grants_for_player(&self, player_id: &str) -> Result<Vec<Grant>> {
        let sql = format!(
            "SELECT {} FROM player_grants \
             WHERE player_id = ? AND (expires_at IS NULL OR expires_at > ?) \
             ORDER BY granted_at DESC",
            GRANT_COLUMNS
        );

        let rows = sqlx::query_as::<_, GrantRow>(&sql)
            .bind(player_id)
            .bind(Utc::now())
            .fetch_all(self.db.pool())
            .await?;

        rows.into_iter().map(GrantRow::try_into_grant).collect()
    }

    fn validate(input: &NewGrant) -> Result<()> {
        if input.user_id.is_empty() {
            return Err(GrantError::Validation("user_id must not be empty".to_string()));
        }
        if input.player_id.is_empty() {
            return Err(GrantError::Validation(
                "player_id must not be empty".to_string(),
            ));
        }
        if input.player_name.is_empty() {
            return Err(GrantError::Validation(
                "player_name must not be empty".to_string(),
            ));
        }
        if input.granted_by.is_empty() {
            return Err(GrantError::Validation(
                "granted_by must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
