use axum::{Extension, Json, extract::Path, response::IntoResponse};

use boardwise_auth::ResourceRef;
use boardwise_core::{BoardId, ProjectId};

use crate::app::AppState;
use crate::app::dto::PermissionsResponse;
use crate::app::errors::parse_id;
use crate::authz;
use crate::context::PrincipalContext;

pub async fn project_permissions(
    Extension(state): Extension<AppState>,
    Extension(principal): Extension<PrincipalContext>,
    Path(project_id): Path<String>,
) -> axum::response::Response {
    let project_id = match parse_id::<ProjectId>(&project_id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    permissions_of(&state, &principal, ResourceRef::Project(project_id)).await
}

pub async fn board_permissions(
    Extension(state): Extension<AppState>,
    Extension(principal): Extension<PrincipalContext>,
    Path(board_id): Path<String>,
) -> axum::response::Response {
    let board_id = match parse_id::<BoardId>(&board_id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    permissions_of(&state, &principal, ResourceRef::Board(board_id)).await
}

async fn permissions_of(
    state: &AppState,
    principal: &PrincipalContext,
    resource: ResourceRef,
) -> axum::response::Response {
    match authz::permissions(state, principal, resource).await {
        Ok(permissions) => Json(PermissionsResponse { permissions }).into_response(),
        Err(resp) => resp,
    }
}
