//! Adding and removing users and organizations on projects and boards.
//!
//! Every mutation resolves the caller first and requires the matching
//! `ADD_*` / `REMOVE_*` capability on the target resource.

use axum::{
    Extension, Json,
    extract::Path,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use boardwise_auth::{Capability, MembershipEdge, ResourceRef, Subject};
use boardwise_core::{BoardId, OrganizationId, ProjectId, RoleId, UserId};

use crate::app::AppState;
use crate::app::dto::{AddOrganizationRequest, AddUserRequest, MembershipResponse};
use crate::app::errors::{self, json_error, parse_id};
use crate::authz;
use crate::context::PrincipalContext;

pub async fn add_project_user(
    Extension(state): Extension<AppState>,
    Extension(principal): Extension<PrincipalContext>,
    Path(project_id): Path<String>,
    Json(body): Json<AddUserRequest>,
) -> Response {
    let project_id = match parse_id::<ProjectId>(&project_id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    add_member(
        &state,
        &principal,
        ResourceRef::Project(project_id),
        Subject::User(body.user_id),
        body.role_id,
        Capability::AddUserToProject,
    )
    .await
}

pub async fn remove_project_user(
    Extension(state): Extension<AppState>,
    Extension(principal): Extension<PrincipalContext>,
    Path((project_id, user_id)): Path<(String, String)>,
) -> Response {
    let (project_id, user_id) = match (
        parse_id::<ProjectId>(&project_id),
        parse_id::<UserId>(&user_id),
    ) {
        (Ok(p), Ok(u)) => (p, u),
        (Err(resp), _) | (_, Err(resp)) => return resp,
    };

    remove_member(
        &state,
        &principal,
        ResourceRef::Project(project_id),
        Subject::User(user_id),
        Capability::RemoveUserFromProject,
    )
    .await
}

pub async fn add_project_organization(
    Extension(state): Extension<AppState>,
    Extension(principal): Extension<PrincipalContext>,
    Path(project_id): Path<String>,
    Json(body): Json<AddOrganizationRequest>,
) -> Response {
    let project_id = match parse_id::<ProjectId>(&project_id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    add_member(
        &state,
        &principal,
        ResourceRef::Project(project_id),
        Subject::Organization(body.organization_id),
        body.role_id,
        Capability::AddOrganizationToProject,
    )
    .await
}

pub async fn remove_project_organization(
    Extension(state): Extension<AppState>,
    Extension(principal): Extension<PrincipalContext>,
    Path((project_id, organization_id)): Path<(String, String)>,
) -> Response {
    let (project_id, organization_id) = match (
        parse_id::<ProjectId>(&project_id),
        parse_id::<OrganizationId>(&organization_id),
    ) {
        (Ok(p), Ok(o)) => (p, o),
        (Err(resp), _) | (_, Err(resp)) => return resp,
    };

    remove_member(
        &state,
        &principal,
        ResourceRef::Project(project_id),
        Subject::Organization(organization_id),
        Capability::RemoveOrganizationFromProject,
    )
    .await
}

pub async fn add_board_user(
    Extension(state): Extension<AppState>,
    Extension(principal): Extension<PrincipalContext>,
    Path(board_id): Path<String>,
    Json(body): Json<AddUserRequest>,
) -> Response {
    let board_id = match parse_id::<BoardId>(&board_id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    add_member(
        &state,
        &principal,
        ResourceRef::Board(board_id),
        Subject::User(body.user_id),
        body.role_id,
        Capability::AddUserToBoard,
    )
    .await
}

pub async fn remove_board_user(
    Extension(state): Extension<AppState>,
    Extension(principal): Extension<PrincipalContext>,
    Path((board_id, user_id)): Path<(String, String)>,
) -> Response {
    let (board_id, user_id) = match (parse_id::<BoardId>(&board_id), parse_id::<UserId>(&user_id)) {
        (Ok(b), Ok(u)) => (b, u),
        (Err(resp), _) | (_, Err(resp)) => return resp,
    };

    remove_member(
        &state,
        &principal,
        ResourceRef::Board(board_id),
        Subject::User(user_id),
        Capability::RemoveUserFromBoard,
    )
    .await
}

pub async fn add_board_organization(
    Extension(state): Extension<AppState>,
    Extension(principal): Extension<PrincipalContext>,
    Path(board_id): Path<String>,
    Json(body): Json<AddOrganizationRequest>,
) -> Response {
    let board_id = match parse_id::<BoardId>(&board_id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    add_member(
        &state,
        &principal,
        ResourceRef::Board(board_id),
        Subject::Organization(body.organization_id),
        body.role_id,
        Capability::AddOrganizationToBoard,
    )
    .await
}

pub async fn remove_board_organization(
    Extension(state): Extension<AppState>,
    Extension(principal): Extension<PrincipalContext>,
    Path((board_id, organization_id)): Path<(String, String)>,
) -> Response {
    let (board_id, organization_id) = match (
        parse_id::<BoardId>(&board_id),
        parse_id::<OrganizationId>(&organization_id),
    ) {
        (Ok(b), Ok(o)) => (b, o),
        (Err(resp), _) | (_, Err(resp)) => return resp,
    };

    remove_member(
        &state,
        &principal,
        ResourceRef::Board(board_id),
        Subject::Organization(organization_id),
        Capability::RemoveOrganizationFromBoard,
    )
    .await
}

async fn add_member(
    state: &AppState,
    principal: &PrincipalContext,
    resource: ResourceRef,
    subject: Subject,
    role_id: RoleId,
    capability: Capability,
) -> Response {
    let caller = match authz::require(state, principal, resource, capability).await {
        Ok(set) => set,
        Err(resp) => return resp,
    };
    if let Err(resp) = authz::ensure_grantable(state, &caller, role_id).await {
        return resp;
    }

    let edge = match MembershipEdge::new(subject, resource, role_id) {
        Ok(edge) => edge,
        Err(e) => return json_error(StatusCode::BAD_REQUEST, "validation_error", e.to_string()),
    };

    match state.memberships.grant(edge).await {
        Ok(membership) => {
            tracing::info!(
                granted_by = %principal.user_id(),
                %subject,
                %resource,
                role_id = %role_id,
                "membership added"
            );
            (StatusCode::CREATED, Json(MembershipResponse { membership })).into_response()
        }
        Err(e) => errors::membership_error_to_response(e),
    }
}

async fn remove_member(
    state: &AppState,
    principal: &PrincipalContext,
    resource: ResourceRef,
    subject: Subject,
    capability: Capability,
) -> Response {
    if let Err(resp) = authz::require(state, principal, resource, capability).await {
        return resp;
    }

    match state.memberships.revoke(subject, resource).await {
        Ok(_) => {
            tracing::info!(
                removed_by = %principal.user_id(),
                %subject,
                %resource,
                "membership removed"
            );
            StatusCode::NO_CONTENT.into_response()
        }
        Err(e) => errors::membership_error_to_response(e),
    }
}
