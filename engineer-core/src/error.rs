//! Error types for the data-access layer
//!
//! Every sqlx failure is classified once, here, into the taxonomy the
//! dispatcher maps onto responses. There is no not-found variant: an
//! update touching zero rows or an empty lookup is an outcome, not an error.

use sqlx::error::ErrorKind;
use thiserror::Error;

/// Database error type
#[derive(Error, Debug)]
pub enum DbError {
    /// No pooled connection became free within the acquire timeout
    #[error("connection pool exhausted")]
    PoolExhausted,

    /// The database could not be reached or the connection broke
    #[error("database unreachable: {0}")]
    Connectivity(#[source] sqlx::Error),

    /// A unique, foreign-key, not-null or check constraint rejected the write
    #[error("constraint violation{}", .constraint.as_deref().map(|c| format!(" on {c}")).unwrap_or_default())]
    ConstraintViolation {
        constraint: Option<String>,
        #[source]
        source: sqlx::Error,
    },

    /// A single-row statement reported a different row count
    #[error("expected {expected} affected row(s), got {actual}")]
    UnexpectedRowCount { expected: u64, actual: u64 },

    /// Any other driver or SQL failure
    #[error("database error: {0}")]
    Query(#[source] sqlx::Error),
}

/// Result type alias for data-access operations
pub type DbResult<T> = std::result::Result<T, DbError>;

impl DbError {
    /// Whether a caller may reasonably retry the same request.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::PoolExhausted)
    }

    /// Stable machine-readable name used in failure responses.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::PoolExhausted => "pool_exhausted",
            Self::Connectivity(_) => "connectivity_failure",
            Self::ConstraintViolation { .. } => "constraint_violation",
            Self::UnexpectedRowCount { .. } | Self::Query(_) => "internal_error",
        }
    }
}

fn is_constraint_kind(kind: ErrorKind) -> bool {
    matches!(
        kind,
        ErrorKind::UniqueViolation
            | ErrorKind::ForeignKeyViolation
            | ErrorKind::NotNullViolation
            | ErrorKind::CheckViolation
    )
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        let constraint = match &err {
            sqlx::Error::Database(db) if is_constraint_kind(db.kind()) => {
                Some(db.constraint().map(str::to_owned))
            }
            _ => None,
        };
        if let Some(constraint) = constraint {
            return Self::ConstraintViolation {
                constraint,
                source: err,
            };
        }

        match err {
            sqlx::Error::PoolTimedOut => Self::PoolExhausted,
            err @ (sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolClosed
            | sqlx::Error::Protocol(_)
            | sqlx::Error::WorkerCrashed) => Self::Connectivity(err),
            other => Self::Query(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::error::DatabaseError;
    use std::error::Error as StdError;
    use std::fmt;
    use std::io;

    /// Minimal driver error so classification can be checked without Postgres.
    #[derive(Debug)]
    struct FakeDbError {
        kind: ErrorKind,
        constraint: Option<&'static str>,
    }

    impl fmt::Display for FakeDbError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "fake database error")
        }
    }

    impl StdError for FakeDbError {}

    impl DatabaseError for FakeDbError {
        fn message(&self) -> &str {
            "fake database error"
        }

        fn as_error(&self) -> &(dyn StdError + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn StdError + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn StdError + Send + Sync + 'static> {
            self
        }

        fn constraint(&self) -> Option<&str> {
            self.constraint
        }

        fn kind(&self) -> ErrorKind {
            match self.kind {
                ErrorKind::UniqueViolation => ErrorKind::UniqueViolation,
                ErrorKind::ForeignKeyViolation => ErrorKind::ForeignKeyViolation,
                ErrorKind::NotNullViolation => ErrorKind::NotNullViolation,
                ErrorKind::CheckViolation => ErrorKind::CheckViolation,
                _ => ErrorKind::Other,
            }
        }
    }

    fn database_error(kind: ErrorKind, constraint: Option<&'static str>) -> sqlx::Error {
        sqlx::Error::Database(Box::new(FakeDbError { kind, constraint }))
    }

    #[test]
    fn pool_timeout_is_exhaustion() {
        let err = DbError::from(sqlx::Error::PoolTimedOut);
        assert!(matches!(err, DbError::PoolExhausted));
        assert!(err.is_retryable());
        assert_eq!(err.kind(), "pool_exhausted");
    }

    #[test]
    fn io_and_closed_pool_are_connectivity() {
        let io_err = io::Error::new(io::ErrorKind::ConnectionRefused, "refused");
        assert!(matches!(
            DbError::from(sqlx::Error::Io(io_err)),
            DbError::Connectivity(_)
        ));

        let err = DbError::from(sqlx::Error::PoolClosed);
        assert!(matches!(err, DbError::Connectivity(_)));
        assert!(!err.is_retryable());
    }

    #[test]
    fn foreign_key_violation_is_constraint() {
        let err = DbError::from(database_error(
            ErrorKind::ForeignKeyViolation,
            Some("engineers_site_id_fkey"),
        ));

        match &err {
            DbError::ConstraintViolation { constraint, .. } => {
                assert_eq!(constraint.as_deref(), Some("engineers_site_id_fkey"));
            }
            other => panic!("unexpected classification: {other:?}"),
        }
        assert_eq!(
            err.to_string(),
            "constraint violation on engineers_site_id_fkey"
        );
    }

    #[test]
    fn unique_violation_without_name_is_constraint() {
        let err = DbError::from(database_error(ErrorKind::UniqueViolation, None));
        assert!(matches!(err, DbError::ConstraintViolation { .. }));
        assert_eq!(err.to_string(), "constraint violation");
    }

    #[test]
    fn other_database_errors_are_query_failures() {
        let err = DbError::from(database_error(ErrorKind::Other, None));
        assert!(matches!(err, DbError::Query(_)));
        assert_eq!(err.kind(), "internal_error");

        assert!(matches!(
            DbError::from(sqlx::Error::RowNotFound),
            DbError::Query(_)
        ));
    }

    #[test]
    fn row_count_display() {
        let err = DbError::UnexpectedRowCount {
            expected: 1,
            actual: 0,
        };
        assert_eq!(err.to_string(), "expected 1 affected row(s), got 0");
    }
}
