use boardwise_auth::Principal;
use boardwise_core::{OrganizationId, UserId};

/// Principal context for a request (authenticated user + acting organization).
///
/// Inserted by the auth middleware; present on every protected route.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PrincipalContext {
    principal: Principal,
}

impl PrincipalContext {
    pub fn new(principal: Principal) -> Self {
        Self { principal }
    }

    pub fn user_id(&self) -> UserId {
        self.principal.user_id
    }

    pub fn organization_id(&self) -> OrganizationId {
        self.principal.organization_id
    }
}
