use sqlx::error::ErrorKind;
use thiserror::Error;

/// Persistence failure, classified by the database's own error kind.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("unique constraint violated: {constraint}")]
    UniqueViolation { constraint: String },

    #[error("foreign key constraint violated: {constraint}")]
    ForeignKeyViolation { constraint: String },

    #[error("check constraint violated: {constraint}")]
    CheckViolation { constraint: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl StoreError {
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, StoreError::UniqueViolation { .. })
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(ref db_err) = err {
            let constraint = db_err.constraint().unwrap_or_default().to_string();
            match db_err.kind() {
                ErrorKind::UniqueViolation => return StoreError::UniqueViolation { constraint },
                ErrorKind::ForeignKeyViolation => {
                    return StoreError::ForeignKeyViolation { constraint }
                }
                ErrorKind::CheckViolation => return StoreError::CheckViolation { constraint },
                _ => {}
            }
        }
        StoreError::Other(anyhow::Error::new(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_database_errors_are_other() {
        let err = StoreError::from(sqlx::Error::RowNotFound);
        assert!(matches!(err, StoreError::Other(_)));
        assert!(!err.is_unique_violation());
    }

    #[test]
    fn test_unique_violation_reports_constraint() {
        let err = StoreError::UniqueViolation {
            constraint: "users_email_unique".to_string(),
        };
        assert!(err.is_unique_violation());
        assert_eq!(err.to_string(), "unique constraint violated: users_email_unique");
    }
}
