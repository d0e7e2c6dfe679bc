use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::CurriculumError;

/// Identity facts of the caller, supplied by the transport layer for every
/// mutating call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallerScope {
    pub user_id: Option<Uuid>,
    pub is_admin: bool,
    pub is_therapist: bool,
    #[serde(default)]
    pub child_scope: HashSet<Uuid>,
}

impl CallerScope {
    pub fn admin(user_id: Uuid) -> Self {
        Self {
            user_id: Some(user_id),
            is_admin: true,
            ..Self::default()
        }
    }

    pub fn therapist(user_id: Uuid, children: impl IntoIterator<Item = Uuid>) -> Self {
        Self {
            user_id: Some(user_id),
            is_therapist: true,
            child_scope: children.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Parent or guardian account scoped to its own children.
    pub fn guardian(user_id: Uuid, children: impl IntoIterator<Item = Uuid>) -> Self {
        Self {
            user_id: Some(user_id),
            child_scope: children.into_iter().collect(),
            ..Self::default()
        }
    }

    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn is_authenticated(&self) -> bool {
        self.user_id.is_some()
    }

    /// Admins bypass the scope check; everyone else needs `child_id` in scope.
    pub fn authorize_child(&self, child_id: Uuid) -> Result<(), CurriculumError> {
        if !self.is_authenticated() {
            return Err(CurriculumError::Unauthorized(
                "caller is not authenticated".to_string(),
            ));
        }
        if self.is_admin || self.child_scope.contains(&child_id) {
            return Ok(());
        }

        let role = if self.is_therapist { "therapist" } else { "user" };
        Err(CurriculumError::Unauthorized(format!(
            "{role} has no access to child {child_id}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_bypasses_scope() {
        let caller = CallerScope::admin(Uuid::new_v4());
        assert!(caller.authorize_child(Uuid::new_v4()).is_ok());
    }

    #[test]
    fn therapist_limited_to_assigned_children() {
        let assigned = Uuid::new_v4();
        let caller = CallerScope::therapist(Uuid::new_v4(), [assigned]);
        assert!(caller.authorize_child(assigned).is_ok());

        let err = caller.authorize_child(Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, CurriculumError::Unauthorized(msg) if msg.starts_with("therapist")));
    }

    #[test]
    fn guardian_limited_to_own_children() {
        let child = Uuid::new_v4();
        let caller = CallerScope::guardian(Uuid::new_v4(), [child]);
        assert!(caller.authorize_child(child).is_ok());
        assert!(caller.authorize_child(Uuid::new_v4()).is_err());
    }

    #[test]
    fn anonymous_rejected() {
        let err = CallerScope::anonymous()
            .authorize_child(Uuid::new_v4())
            .unwrap_err();
        assert!(err.is_rejection());
    }
}
