//! HTTP API application wiring (Axum router + store wiring).
//!
//! - `services.rs`: storage wiring (in-memory or Postgres)
//! - `routes/`: HTTP routes + handlers
//! - `dto.rs`: request/response bodies
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{Extension, Router, routing::get};
use tower::ServiceBuilder;

use boardwise_auth::{AccessStore, Hs256JwtValidator, RoleResolver};
use boardwise_infra::MembershipStore;

use crate::config::ApiConfig;
use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub resolver: Arc<RoleResolver<Arc<dyn AccessStore>>>,
    pub memberships: Arc<dyn MembershipStore>,
    pub conceal_resource_existence: bool,
}

impl AppState {
    pub fn new(
        config: &ApiConfig,
        access: Arc<dyn AccessStore>,
        memberships: Arc<dyn MembershipStore>,
    ) -> Self {
        Self {
            resolver: Arc::new(RoleResolver::new(access)),
            memberships,
            conceal_resource_existence: config.conceal_resource_existence,
        }
    }
}

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub fn build_app(
    config: &ApiConfig,
    access: Arc<dyn AccessStore>,
    memberships: Arc<dyn MembershipStore>,
) -> Router {
    let jwt = Arc::new(Hs256JwtValidator::new(config.jwt_secret.clone().into_bytes()));
    let auth_state = middleware::AuthState { jwt };

    let state = AppState::new(config, access, memberships);

    // Protected routes: require a valid bearer token.
    let protected = routes::router()
        .layer(Extension(state))
        .layer(axum::middleware::from_fn_with_state(
            auth_state,
            middleware::auth_middleware,
        ));

    Router::new()
        .route("/health", get(routes::system::health))
        .merge(protected)
        .layer(ServiceBuilder::new())
}
