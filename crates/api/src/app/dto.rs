use serde::{Deserialize, Serialize};

use boardwise_auth::{MembershipEdge, PermissionSet};
use boardwise_core::{OrganizationId, RoleId, UserId};

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct AddUserRequest {
    pub user_id: UserId,
    pub role_id: RoleId,
}

#[derive(Debug, Deserialize)]
pub struct AddOrganizationRequest {
    pub organization_id: OrganizationId,
    pub role_id: RoleId,
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
pub struct PermissionsResponse {
    pub permissions: PermissionSet,
}

#[derive(Debug, Serialize)]
pub struct MembershipResponse {
    pub membership: MembershipEdge,
}
