//! `boardwise-core` — shared identifiers and the domain error model.
//!
//! This crate has no infrastructure concerns and no knowledge of permissions.

pub mod entity;
pub mod error;
pub mod id;

pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::{BoardId, OrganizationId, ProjectId, RoleId, UserId};
