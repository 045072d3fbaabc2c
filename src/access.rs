use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;

use crate::{
    guard::{Denial, DenialReason, Requirement, authorize},
    models::{Permission, Role},
    session::Session,
};

/// AccessCheck
///
/// Result of a conditional-rendering query. `has_access` agrees with the guard
/// returning `Allow` for the same session and requirement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct AccessCheck {
    pub has_access: bool,
    pub reason: Option<DenialReason>,
    pub required: Option<String>,
    pub current: Option<String>,
}

impl AccessCheck {
    fn granted() -> Self {
        Self {
            has_access: true,
            reason: None,
            required: None,
            current: None,
        }
    }

    /// Loading or anonymous: no access, but no role or permission to blame either.
    fn unsettled() -> Self {
        Self {
            has_access: false,
            ..Self::granted()
        }
    }
}

impl From<Denial> for AccessCheck {
    fn from(denial: Denial) -> Self {
        Self {
            has_access: false,
            reason: Some(denial.reason),
            required: Some(denial.required),
            current: denial.current,
        }
    }
}

/// AccessQuery
///
/// Read-only view over a session for components that show or hide
/// affordances without a route transition.
#[derive(Debug, Clone, Copy)]
pub struct AccessQuery<'a> {
    session: &'a Session,
}

impl<'a> AccessQuery<'a> {
    pub fn new(session: &'a Session) -> Self {
        Self { session }
    }

    pub fn check_access(&self, requirement: &Requirement) -> AccessCheck {
        if self.session.is_loading || !self.session.is_authenticated {
            return AccessCheck::unsettled();
        }

        match authorize(requirement, self.session) {
            Ok(()) => AccessCheck::granted(),
            Err(denial) => denial.into(),
        }
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.check_access(&Requirement::role(role)).has_access
    }

    pub fn has_permission(&self, permission: &Permission) -> bool {
        self.check_access(&Requirement::permission(permission.clone()))
            .has_access
    }
}
