//! Role policies.
//!
//! Each endpoint group names a policy type; [`Principal::require`] checks it
//! before any data is touched.

use serde::{Deserialize, Serialize};

use crate::models::{Department, Role, User};
use crate::FrontDeskError;

/// Authenticated identity attached to a session.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Principal {
    pub user_id: i64,
    pub role: Role,
    pub department: Option<Department>,
}

impl Principal {
    pub fn for_user(user: &User) -> Self {
        Self {
            user_id: user.id,
            role: user.role,
            department: user.department,
        }
    }

    pub fn allows<P: Policy>(&self) -> bool {
        P::ROLES.contains(&self.role)
    }

    /// Fail with an authorization error unless the policy admits this role.
    pub fn require<P: Policy>(&self) -> Result<(), FrontDeskError> {
        if self.allows::<P>() {
            Ok(())
        } else {
            Err(FrontDeskError::Authorization(format!(
                "{} access required",
                P::NAME
            )))
        }
    }
}

/// A closed set of roles allowed through one endpoint group.
pub trait Policy {
    const NAME: &'static str;
    const ROLES: &'static [Role];
}

pub struct AdminOnly;
pub struct ReceptionistOnly;
pub struct DoctorOnly;
/// Patient history is shared between doctors and administrators.
pub struct DoctorOrAdmin;
pub struct AdminOrReceptionist;
pub struct VitalsWriters;
pub struct AnyStaff;

impl Policy for AdminOnly {
    const NAME: &'static str = "admin";
    const ROLES: &'static [Role] = &[Role::Admin];
}

impl Policy for ReceptionistOnly {
    const NAME: &'static str = "receptionist";
    const ROLES: &'static [Role] = &[Role::Receptionist];
}

impl Policy for DoctorOnly {
    const NAME: &'static str = "doctor";
    const ROLES: &'static [Role] = &[Role::Doctor];
}

impl Policy for DoctorOrAdmin {
    const NAME: &'static str = "doctor or admin";
    const ROLES: &'static [Role] = &[Role::Doctor, Role::Admin];
}

impl Policy for AdminOrReceptionist {
    const NAME: &'static str = "admin or receptionist";
    const ROLES: &'static [Role] = &[Role::Admin, Role::Receptionist];
}

impl Policy for VitalsWriters {
    const NAME: &'static str = "receptionist or doctor";
    const ROLES: &'static [Role] = &[Role::Receptionist, Role::Doctor];
}

impl Policy for AnyStaff {
    const NAME: &'static str = "staff";
    const ROLES: &'static [Role] = &[Role::Admin, Role::Doctor, Role::Receptionist];
}

#[cfg(test)]
mod tests {
    use super::*;

    fn principal(role: Role) -> Principal {
        Principal {
            user_id: 1,
            role,
            department: None,
        }
    }

    #[test]
    fn test_single_role_policies() {
        assert!(principal(Role::Admin).require::<AdminOnly>().is_ok());
        assert!(principal(Role::Doctor).require::<AdminOnly>().is_err());
        assert!(principal(Role::Admin).require::<ReceptionistOnly>().is_err());
        assert!(principal(Role::Receptionist).require::<DoctorOnly>().is_err());
    }

    #[test]
    fn test_vitals_policies() {
        assert!(principal(Role::Receptionist).allows::<VitalsWriters>());
        assert!(principal(Role::Doctor).allows::<VitalsWriters>());
        assert!(!principal(Role::Admin).allows::<VitalsWriters>());
        assert!(principal(Role::Admin).allows::<AnyStaff>());
    }

    #[test]
    fn test_denial_is_authorization_error() {
        let err = principal(Role::Receptionist)
            .require::<DoctorOrAdmin>()
            .unwrap_err();
        assert!(matches!(err, FrontDeskError::Authorization(_)));
    }
}
