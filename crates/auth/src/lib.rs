//! `boardwise-auth` — role and permission resolution for organizations,
//! projects and boards.
//!
//! This crate is intentionally decoupled from HTTP and from concrete storage;
//! lookups go through the [`AccessStore`] trait.

pub mod authorize;
pub mod claims;
pub mod membership;
pub mod permissions;
pub mod principal;
pub mod resolver;
pub mod resources;
pub mod roles;
pub mod store;

pub use authorize::{authorize, authorize_all, AuthzError};
pub use claims::{validate_claims, Hs256JwtValidator, JwtClaims, JwtValidator, TokenValidationError};
pub use membership::{MembershipEdge, ResourceKind, ResourceRef, Subject};
pub use permissions::{Capability, PermissionSet, RoleFlags};
pub use principal::Principal;
pub use resolver::{ResolveError, RoleResolver};
pub use resources::{Board, Organization, Project};
pub use roles::{extract_permissions, DefaultRole, Role};
pub use store::{AccessStore, AccessStoreError};
