use thiserror::Error;

pub(crate) type Result<T, E = TrackerError> = std::result::Result<T, E>;

/// Failures surfaced to callers of the store, the report service and the CLI.
///
/// Each variant maps to the status an HTTP front end would answer with:
/// validation problems are the caller's fault (400), a missing identity is
/// 401, an id that does not exist for the current user is 404, and anything
/// else is an internal failure (500) whose detail stays in the logs.
#[derive(Debug, Error)]
pub(crate) enum TrackerError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Unauthenticated(String),

    #[error("{0}")]
    NotFound(&'static str),

    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("output error: {0}")]
    Output(#[from] std::io::Error),

    #[error("corrupt {column} value {value:?} in {table}")]
    CorruptRecord {
        table: &'static str,
        column: &'static str,
        value: String,
    },
}

impl TrackerError {
    pub(crate) fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub(crate) fn status_code(&self) -> u16 {
        match self {
            Self::Validation(_) => 400,
            Self::Unauthenticated(_) => 401,
            Self::NotFound(_) => 404,
            Self::Storage(_)
            | Self::Serialization(_)
            | Self::Output(_)
            | Self::CorruptRecord { .. } => 500,
        }
    }

    /// Message safe to show the caller. Internal failures get a generic text.
    pub(crate) fn public_message(&self) -> String {
        match self.status_code() {
            500 => "Internal server error".to_string(),
            _ => self.to_string(),
        }
    }

    pub(crate) fn is_internal(&self) -> bool {
        self.status_code() >= 500
    }

    /// Process exit code used by the CLI for this error.
    pub(crate) fn exit_code(&self) -> u8 {
        match self.status_code() {
            400 => 2,
            401 => 3,
            404 => 4,
            _ => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(TrackerError::validation("bad").status_code(), 400);
        assert_eq!(
            TrackerError::Unauthenticated("no user".into()).status_code(),
            401
        );
        assert_eq!(TrackerError::NotFound("Expense not found").status_code(), 404);
        assert_eq!(
            TrackerError::Storage(rusqlite::Error::InvalidQuery).status_code(),
            500
        );
    }

    #[test]
    fn test_public_message_hides_internal_detail() {
        let err = TrackerError::CorruptRecord {
            table: "expenses",
            column: "amount",
            value: "abc".into(),
        };
        assert!(err.is_internal());
        assert_eq!(err.public_message(), "Internal server error");
        assert!(err.to_string().contains("abc"));
    }

    #[test]
    fn test_public_message_keeps_client_errors() {
        let err = TrackerError::NotFound("Budget not found");
        assert_eq!(err.public_message(), "Budget not found");
        assert!(!err.is_internal());
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(TrackerError::validation("x").exit_code(), 2);
        assert_eq!(TrackerError::Unauthenticated("x".into()).exit_code(), 3);
        assert_eq!(TrackerError::NotFound("x").exit_code(), 4);
        assert_eq!(
            TrackerError::Storage(rusqlite::Error::InvalidQuery).exit_code(),
            1
        );
    }
}
