use thiserror::Error;
use uuid::Uuid;

use crate::db::StoreError;

#[derive(Debug, Error)]
pub enum CurriculumError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("concurrent update conflict for child {0}")]
    Conflict(Uuid),
    #[error("{operation} failed after {attempts} attempts")]
    OperationFailed {
        operation: &'static str,
        attempts: u32,
    },
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),
    #[error("operation cancelled")]
    Cancelled,
}

impl CurriculumError {
    pub fn is_conflict(&self) -> bool {
        matches!(self, CurriculumError::Conflict(_))
    }

    /// Errors raised before any mutation was attempted.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            CurriculumError::Validation(_) | CurriculumError::Unauthorized(_)
        )
    }
}

impl From<StoreError> for CurriculumError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict { child_id } => CurriculumError::Conflict(child_id),
            StoreError::Sql(err) => CurriculumError::StoreUnavailable(err.to_string()),
            StoreError::Unavailable(message) => CurriculumError::StoreUnavailable(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_conflict_maps_to_conflict() {
        let child_id = Uuid::new_v4();
        let err: CurriculumError = StoreError::Conflict { child_id }.into();
        assert!(err.is_conflict());
        assert!(!err.is_rejection());
    }

    #[test]
    fn store_failure_maps_to_unavailable() {
        let err: CurriculumError = StoreError::Unavailable("pool closed".to_string()).into();
        match err {
            CurriculumError::StoreUnavailable(message) => assert_eq!(message, "pool closed"),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
