use std::str::FromStr;

use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use boardwise_auth::{AuthzError, ResolveError};
use boardwise_infra::MembershipStoreError;

/// Map a resolution failure to a response.
///
/// With `conceal` set, "does not exist" and "not a member" produce the same
/// body so callers cannot probe for resource ids.
pub fn resolve_error_to_response(err: ResolveError, conceal: bool) -> axum::response::Response {
    match err {
        ResolveError::NotFound(_) | ResolveError::Authorization(_) if conceal => {
            json_error(StatusCode::NOT_FOUND, "not_found", "resource not found")
        }
        ResolveError::NotFound(kind) => {
            json_error(StatusCode::NOT_FOUND, "not_found", format!("{kind} not found"))
        }
        ResolveError::Authorization(kind) => json_error(
            StatusCode::FORBIDDEN,
            "forbidden",
            format!("not a member of the {kind}"),
        ),
        ResolveError::Storage(e) => {
            tracing::error!(error = %e, "access store failure during resolution");
            json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "storage_error",
                "storage unavailable",
            )
        }
    }
}

pub fn authz_error_to_response(err: AuthzError) -> axum::response::Response {
    json_error(StatusCode::FORBIDDEN, "forbidden", err.to_string())
}

pub fn membership_error_to_response(err: MembershipStoreError) -> axum::response::Response {
    match err {
        MembershipStoreError::AlreadyExists(..) => {
            json_error(StatusCode::CONFLICT, "conflict", err.to_string())
        }
        MembershipStoreError::NotFound(..) | MembershipStoreError::UnknownReference(_) => {
            json_error(StatusCode::NOT_FOUND, "not_found", err.to_string())
        }
        MembershipStoreError::Storage(msg) => {
            tracing::error!(error = %msg, "membership store failure");
            json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "storage_error",
                "storage unavailable",
            )
        }
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

/// Parse a path segment into a typed id.
pub fn parse_id<T>(raw: &str) -> Result<T, axum::response::Response>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.parse::<T>()
        .map_err(|e| json_error(StatusCode::BAD_REQUEST, "invalid_id", e.to_string()))
}
