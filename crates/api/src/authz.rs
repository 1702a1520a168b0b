//! API-side authorization guard.
//!
//! Resolves the caller's effective permission set on a resource and checks the
//! capability a route needs before anything is mutated.

use axum::http::StatusCode;
use axum::response::Response;

use boardwise_auth::{
    AccessStore, Capability, PermissionSet, ResourceRef, authorize, extract_permissions,
};
use boardwise_core::RoleId;

use crate::app::AppState;
use crate::app::errors::{self, json_error};
use crate::context::PrincipalContext;

/// Effective permission set of the request principal on `resource`.
pub async fn permissions(
    state: &AppState,
    principal: &PrincipalContext,
    resource: ResourceRef,
) -> Result<PermissionSet, Response> {
    state
        .resolver
        .resolve_effective(principal.user_id(), principal.organization_id(), resource)
        .await
        .map_err(|e| {
            tracing::debug!(
                user_id = %principal.user_id(),
                organization_id = %principal.organization_id(),
                %resource,
                error = %e,
                "access denied"
            );
            errors::resolve_error_to_response(e, state.conceal_resource_existence)
        })
}

/// Resolve, then require `capability`.
pub async fn require(
    state: &AppState,
    principal: &PrincipalContext,
    resource: ResourceRef,
    capability: Capability,
) -> Result<PermissionSet, Response> {
    let set = permissions(state, principal, resource).await?;
    authorize(&set, capability).map_err(|e| {
        tracing::debug!(user_id = %principal.user_id(), %resource, %capability, "capability missing");
        errors::authz_error_to_response(e)
    })?;
    Ok(set)
}

/// A caller may only hand out capabilities it holds itself.
pub async fn ensure_grantable(
    state: &AppState,
    caller: &PermissionSet,
    role_id: RoleId,
) -> Result<(), Response> {
    let role = state
        .resolver
        .store()
        .find_role_by_id(role_id)
        .await
        .map_err(|e| errors::resolve_error_to_response(e.into(), false))?
        .ok_or_else(|| json_error(StatusCode::NOT_FOUND, "not_found", "role not found"))?;

    let escalated: Vec<&'static str> = extract_permissions(&role)
        .granted()
        .filter(|capability| !caller.get(*capability))
        .map(|capability| capability.as_str())
        .collect();
    if escalated.is_empty() {
        Ok(())
    } else {
        Err(json_error(
            StatusCode::FORBIDDEN,
            "privilege_escalation",
            format!("role grants permissions the caller lacks: {}", escalated.join(", ")),
        ))
    }
}
