use thiserror::Error;

/// Standard error type for tessera.
///
/// Authentication failures collapse into [`TesseraError::InvalidCredential`]
/// whatever the underlying reason; the reason is only ever logged.
#[derive(Debug, Error)]
pub enum TesseraError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: invalid credential")]
    InvalidCredential,

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Integrity violation: {0}")]
    Integrity(String),

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),
}

impl TesseraError {
    /// Get the error code string for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            TesseraError::BadRequest(_) => "BAD_REQUEST",
            TesseraError::InvalidCredential => "INVALID_CREDENTIAL",
            TesseraError::Conflict(_) => "CONFLICT",
            TesseraError::Integrity(_) => "INTEGRITY_ERROR",
            TesseraError::Timeout(_) => "TIMEOUT",
            TesseraError::Config(_) => "CONFIG_ERROR",
            TesseraError::Internal(_) => "INTERNAL_ERROR",
            TesseraError::Database(_) => "DATABASE_ERROR",
        }
    }

    /// Whether the error is a server-side failure that must be logged and
    /// hidden from the credential owner.
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            TesseraError::Integrity(_)
                | TesseraError::Timeout(_)
                | TesseraError::Config(_)
                | TesseraError::Internal(_)
                | TesseraError::Database(_)
        )
    }
}
