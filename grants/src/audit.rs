use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

/// What happened to a grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditAction {
    Granted,
    Revoked,
}

/// One attributable grant mutation, handed to the audit collaborator.
#[derive(Debug, Clone, Serialize)]
pub struct AuditEvent {
    /// Identity of the actor who performed the mutation.
    pub actor: String,
    pub action: AuditAction,
    pub user_id: String,
    pub player_id: String,
    pub player_name: Option<String>,
    pub outcome: bool,
    pub at: DateTime<Utc>,
}

/// External audit-log writer. The lifecycle manager reports every
/// grant/revoke here; it does not write logs itself.
pub trait AuditSink: Send + Sync {
    fn record(&self, event: &AuditEvent);
}

/// Default sink: structured tracing events.
#[derive(Debug, Default)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn record(&self, event: &AuditEvent) {
        info!(
            actor = %event.actor,
            action = ?event.action,
            user_id = %event.user_id,
            player_id = %event.player_id,
            outcome = event.outcome,
            "grant audit event"
        );
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use std::sync::Mutex;

    /// Collects events for assertions.
    #[derive(Debug, Default)]
    pub struct RecordingSink {
        pub events: Mutex<Vec<AuditEvent>>,
    }

    impl AuditSink for RecordingSink {
        fn record(&self, event: &AuditEvent) {
            self.events.lock().unwrap().push(event.clone());
        }
    }
}
