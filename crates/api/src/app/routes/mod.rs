use axum::{
    Router,
    routing::{delete, get, post},
};

pub mod memberships;
pub mod permissions;
pub mod system;

/// Routes behind the auth middleware.
pub fn router() -> Router {
    Router::new()
        .route("/whoami", get(system::whoami))
        .route(
            "/projects/:project_id/permissions",
            get(permissions::project_permissions),
        )
        .route(
            "/boards/:board_id/permissions",
            get(permissions::board_permissions),
        )
        .route("/projects/:project_id/users", post(memberships::add_project_user))
        .route(
            "/projects/:project_id/users/:user_id",
            delete(memberships::remove_project_user),
        )
        .route(
            "/projects/:project_id/organizations",
            post(memberships::add_project_organization),
        )
        .route(
            "/projects/:project_id/organizations/:organization_id",
            delete(memberships::remove_project_organization),
        )
        .route("/boards/:board_id/users", post(memberships::add_board_user))
        .route(
            "/boards/:board_id/users/:user_id",
            delete(memberships::remove_board_user),
        )
        .route(
            "/boards/:board_id/organizations",
            post(memberships::add_board_organization),
        )
        .route(
            "/boards/:board_id/organizations/:organization_id",
            delete(memberships::remove_board_organization),
        )
}
