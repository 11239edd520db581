//! Authorization checks on a request-scoped caller context.
//!
//! The server builds a [`RequestContext`] from the session and the caller's
//! stored user row on every request; services call these checks before
//! touching any data.

use serde::Serialize;

use crate::types::{InstitutionId, UserId, UserRole};

/// Who is calling, as currently recorded in the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestContext {
    pub user_id: UserId,
    pub role: Option<UserRole>,
    pub institution_id: Option<InstitutionId>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AccessError {
    #[error("this action requires the {0} role")]
    WrongRole(UserRole),

    #[error("you are not associated with an institution")]
    NoInstitution,

    #[error("permission denied for this institution")]
    OtherInstitution,
}

impl RequestContext {
    /// The caller's institution, if they belong to one.
    ///
    /// # Errors
    ///
    /// Returns [`AccessError::NoInstitution`] for users not yet linked.
    pub const fn institution(&self) -> Result<InstitutionId, AccessError> {
        match self.institution_id {
            Some(id) => Ok(id),
            None => Err(AccessError::NoInstitution),
        }
    }

    /// # Errors
    ///
    /// Returns [`AccessError::WrongRole`] unless the caller holds `role`.
    pub fn require_role(&self, role: UserRole) -> Result<(), AccessError> {
        if self.role == Some(role) {
            Ok(())
        } else {
            Err(AccessError::WrongRole(role))
        }
    }

    /// Caller must belong to `target`.
    ///
    /// # Errors
    ///
    /// Returns an error when the caller has no institution or a different one.
    pub fn require_member_of(&self, target: InstitutionId) -> Result<(), AccessError> {
        if self.institution()? == target {
            Ok(())
        } else {
            Err(AccessError::OtherInstitution)
        }
    }

    /// Caller must be an institution admin of `target`.
    ///
    /// # Errors
    ///
    /// Returns an error for non-admins and for admins of other institutions.
    pub fn require_admin_of(&self, target: InstitutionId) -> Result<(), AccessError> {
        self.require_role(UserRole::InstitutionAdmin)?;
        self.require_member_of(target)
    }

    /// Caller must be an institution admin; returns their institution.
    ///
    /// # Errors
    ///
    /// Returns an error for non-admins and admins not yet linked.
    pub fn require_admin(&self) -> Result<InstitutionId, AccessError> {
        self.require_role(UserRole::InstitutionAdmin)?;
        self.institution()
    }

    /// Caller must be a student; returns their institution if any.
    ///
    /// # Errors
    ///
    /// Returns [`AccessError::WrongRole`] for anyone else.
    pub fn require_student(&self) -> Result<Option<InstitutionId>, AccessError> {
        self.require_role(UserRole::Student)?;
        Ok(self.institution_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(role: Option<UserRole>, institution: Option<i32>) -> RequestContext {
        RequestContext {
            user_id: UserId::new(1),
            role,
            institution_id: institution.map(InstitutionId::new),
        }
    }

    #[test]
    fn test_admin_of_own_institution_allowed() {
        let admin = ctx(Some(UserRole::InstitutionAdmin), Some(4));
        assert_eq!(admin.require_admin_of(InstitutionId::new(4)), Ok(()));
        assert_eq!(admin.require_admin(), Ok(InstitutionId::new(4)));
    }

    #[test]
    fn test_admin_of_other_institution_denied() {
        let admin = ctx(Some(UserRole::InstitutionAdmin), Some(4));
        assert_eq!(
            admin.require_admin_of(InstitutionId::new(5)),
            Err(AccessError::OtherInstitution)
        );
    }

    #[test]
    fn test_student_cannot_act_as_admin() {
        let student = ctx(Some(UserRole::Student), Some(4));
        assert_eq!(
            student.require_admin_of(InstitutionId::new(4)),
            Err(AccessError::WrongRole(UserRole::InstitutionAdmin))
        );
        assert_eq!(student.require_member_of(InstitutionId::new(4)), Ok(()));
    }

    #[test]
    fn test_unlinked_user() {
        let fresh = ctx(None, None);
        assert_eq!(fresh.institution(), Err(AccessError::NoInstitution));
        assert_eq!(
            fresh.require_member_of(InstitutionId::new(1)),
            Err(AccessError::NoInstitution)
        );
        assert!(fresh.require_student().is_err());
    }
}
