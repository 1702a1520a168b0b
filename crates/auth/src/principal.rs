use serde::{Deserialize, Serialize};

use boardwise_core::{OrganizationId, UserId};

use crate::JwtClaims;

/// An authenticated caller: a user acting inside one of its organizations.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Principal {
    pub user_id: UserId,
    pub organization_id: OrganizationId,
}

impl Principal {
    pub fn new(user_id: UserId, organization_id: OrganizationId) -> Self {
        Self {
            user_id,
            organization_id,
        }
    }
}

impl From<&JwtClaims> for Principal {
    fn from(claims: &JwtClaims) -> Self {
        Self::new(claims.sub, claims.organization_id)
    }
}
