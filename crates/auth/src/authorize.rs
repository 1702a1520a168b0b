use thiserror::Error;

use crate::{Capability, PermissionSet};

/// A resolved permission set lacks a required capability.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("forbidden: missing permission '{0}'")]
    Forbidden(Capability),
}

/// Check one capability against a resolved permission set.
///
/// - No IO
/// - No panics
/// - No business logic (pure policy check)
pub fn authorize(permissions: &PermissionSet, required: Capability) -> Result<(), AuthzError> {
    if permissions.get(required) {
        Ok(())
    } else {
        Err(AuthzError::Forbidden(required))
    }
}

/// Check several capabilities; the first missing one is reported.
pub fn authorize_all(
    permissions: &PermissionSet,
    required: &[Capability],
) -> Result<(), AuthzError> {
    required
        .iter()
        .try_for_each(|capability| authorize(permissions, *capability))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn granted_flag_passes() {
        let set = PermissionSet::new().grant(Capability::EditProject);
        assert!(authorize(&set, Capability::EditProject).is_ok());
    }

    #[test]
    fn false_and_absent_flags_are_forbidden() {
        let set: PermissionSet = [(Capability::DeleteProject, false)].into_iter().collect();
        assert_eq!(
            authorize(&set, Capability::DeleteProject),
            Err(AuthzError::Forbidden(Capability::DeleteProject))
        );
        assert_eq!(
            authorize(&set, Capability::ViewBoard),
            Err(AuthzError::Forbidden(Capability::ViewBoard))
        );
    }

    #[test]
    fn authorize_all_reports_first_missing() {
        let set = PermissionSet::new().grant(Capability::ViewBoard);
        let err = authorize_all(
            &set,
            &[Capability::ViewBoard, Capability::EditBoard, Capability::DeleteBoard],
        )
        .unwrap_err();
        assert_eq!(err, AuthzError::Forbidden(Capability::EditBoard));
    }
}
