use rust_decimal::Decimal;
use thiserror::Error;

/// SQLSTATE codes Postgres raises when a transaction lost a race and may be retried.
const SERIALIZATION_FAILURE: &str = "40001";
const DEADLOCK_DETECTED: &str = "40P01";

/// Crate-wide error type.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Insufficient balance: requested {requested}, withdrawable {available}")]
    InsufficientBalance { requested: Decimal, available: Decimal },

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("Transaction conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, AppError>;

impl AppError {
    /// Returns true when the whole read-validate-write sequence may be run again.
    pub fn is_retryable(&self) -> bool {
        match self {
            AppError::Conflict(_) => true,
            AppError::Database(sqlx::Error::Database(db_err)) => matches!(
                db_err.code().as_deref(),
                Some(SERIALIZATION_FAILURE) | Some(DEADLOCK_DETECTED)
            ),
            _ => false,
        }
    }

    /// Returns true for a violated unique constraint, e.g. a duplicate e-mail
    /// inserted by a concurrent request.
    pub fn is_unique_violation(&self) -> bool {
        match self {
            AppError::Database(sqlx::Error::Database(db_err)) => db_err.is_unique_violation(),
            _ => false,
        }
    }

    /// Stable machine-readable code for callers that render errors.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::InvalidArgument(_) => "INVALID_ARGUMENT",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::InvalidState(_) => "INVALID_STATE",
            AppError::InsufficientBalance { .. } => "INSUFFICIENT_BALANCE",
            AppError::AlreadyExists(_) => "ALREADY_EXISTS",
            AppError::Conflict(_) => "CONFLICT",
            AppError::Database(_) => "DATABASE_ERROR",
            AppError::Config(_) => "CONFIG_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Business-rule failures never mutate state and are final for the call.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            AppError::InvalidArgument(_)
                | AppError::NotFound(_)
                | AppError::InvalidState(_)
                | AppError::InsufficientBalance { .. }
                | AppError::AlreadyExists(_)
        )
    }
}
