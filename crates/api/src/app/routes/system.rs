use axum::{Extension, Json, response::IntoResponse};
use serde_json::json;

use crate::context::PrincipalContext;

pub async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

pub async fn whoami(Extension(principal): Extension<PrincipalContext>) -> impl IntoResponse {
    Json(json!({
        "user_id": principal.user_id().to_string(),
        "organization_id": principal.organization_id().to_string(),
    }))
}
