//! Error types for database bootstrap and DDL execution.

use thiserror::Error;
use tokio_postgres::error::SqlState;

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Broad failure classes, used by callers that only care about the category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Server unreachable, authentication rejected, or connection lost.
    Connectivity,
    /// Insufficient privilege for a database or table operation.
    Permission,
    /// Malformed SQL, dependency-order violation, type conflict.
    Statement,
    /// Settings that can never produce a valid statement or session.
    Configuration,
}

#[derive(Error, Debug)]
pub enum DbError {
    #[error("failed to connect to {target}")]
    Connect {
        target: String,
        #[source]
        source: BoxError,
    },

    #[error("connection lost while executing `{statement}`")]
    Disconnected {
        statement: String,
        #[source]
        source: BoxError,
    },

    #[error("permission denied executing `{statement}`")]
    Permission {
        statement: String,
        #[source]
        source: BoxError,
    },

    #[error("statement failed: `{statement}`")]
    Statement {
        statement: String,
        #[source]
        source: BoxError,
    },

    #[error("invalid identifier {value:?}: {reason}")]
    InvalidIdentifier { value: String, reason: &'static str },

    #[error("invalid encoding {0:?}")]
    InvalidEncoding(String),

    #[error("admin database and target database are both {0:?}")]
    SameDatabase(String),
}

impl DbError {
    /// Classify a driver error raised while executing `statement`.
    pub fn from_driver(statement: &str, error: tokio_postgres::Error) -> Self {
        let statement = statement.trim().to_string();
        match error.code().cloned() {
            Some(code) if code == SqlState::INSUFFICIENT_PRIVILEGE => DbError::Permission {
                statement,
                source: error.into(),
            },
            Some(_) => DbError::Statement {
                statement,
                source: error.into(),
            },
            None => DbError::Disconnected {
                statement,
                source: error.into(),
            },
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            DbError::Connect { .. } | DbError::Disconnected { .. } => ErrorKind::Connectivity,
            DbError::Permission { .. } => ErrorKind::Permission,
            DbError::Statement { .. } => ErrorKind::Statement,
            DbError::InvalidIdentifier { .. }
            | DbError::InvalidEncoding(_)
            | DbError::SameDatabase(_) => ErrorKind::Configuration,
        }
    }

    /// The statement that failed, if the error came from executing one.
    pub fn statement(&self) -> Option<&str> {
        match self {
            DbError::Disconnected { statement, .. }
            | DbError::Permission { statement, .. }
            | DbError::Statement { statement, .. } => Some(statement),
            _ => None,
        }
    }

    /// SQLSTATE reported by the server, when the source is a driver error.
    pub fn sql_state(&self) -> Option<&SqlState> {
        let source = match self {
            DbError::Connect { source, .. }
            | DbError::Disconnected { source, .. }
            | DbError::Permission { source, .. }
            | DbError::Statement { source, .. } => source,
            _ => return None,
        };
        source
            .downcast_ref::<tokio_postgres::Error>()
            .and_then(|error| error.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opaque(message: &str) -> BoxError {
        std::io::Error::other(message.to_string()).into()
    }

    #[test]
    fn kinds_follow_the_taxonomy() {
        let connect = DbError::Connect {
            target: "127.0.0.1:5432/postgres".to_string(),
            source: opaque("refused"),
        };
        assert_eq!(connect.kind(), ErrorKind::Connectivity);
        assert_eq!(
            connect.to_string(),
            "failed to connect to 127.0.0.1:5432/postgres"
        );

        let statement = DbError::Statement {
            statement: "CREATE TABLE t ()".to_string(),
            source: opaque("boom"),
        };
        assert_eq!(statement.kind(), ErrorKind::Statement);
        assert_eq!(statement.statement(), Some("CREATE TABLE t ()"));

        assert_eq!(
            DbError::SameDatabase("postgres".to_string()).kind(),
            ErrorKind::Configuration
        );
    }

    #[test]
    fn sql_state_is_absent_for_non_driver_sources() {
        let error = DbError::Permission {
            statement: "DROP DATABASE x".to_string(),
            source: opaque("denied"),
        };
        assert!(error.sql_state().is_none());
        assert!(DbError::InvalidEncoding("??".to_string()).sql_state().is_none());
    }

    #[test]
    fn source_chain_is_preserved() {
        let error = DbError::Statement {
            statement: "SELECT".to_string(),
            source: opaque("syntax error"),
        };
        let source = std::error::Error::source(&error).unwrap();
        assert_eq!(source.to_string(), "syntax error");
    }
}
