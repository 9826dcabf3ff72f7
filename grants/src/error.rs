use thiserror::Error;

pub type Result<T> = std::result::Result<T, GrantError>;

#[derive(Error, Debug)]
pub enum GrantError {
    /// The grant store is unreachable or a query failed. Callers must
    /// treat this as a denial (fail closed), never an implicit
    /// role-only fallback.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A stored row could not be decoded (e.g. an unknown access
    /// level). Treated like a storage failure.
    #[error("Malformed grant data: {0}")]
    Malformed(String),

    /// Rejected before any write was attempted.
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Initialization error: {0}")]
    Initialization(String),
}
