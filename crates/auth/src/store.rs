//! Read-side storage contract consumed by the role resolver.
//!
//! Implementations live in `boardwise-infra`; this crate only states what the
//! resolver needs to read.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use boardwise_core::{BoardId, OrganizationId, ProjectId, RoleId, UserId};

use crate::{Board, MembershipEdge, Organization, Project, ResourceRef, Role, Subject};

/// Storage failure (transient or data-level). Never retried by callers here.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AccessStoreError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    #[error("failed to decode stored record: {0}")]
    Decode(String),
}

/// Lookups the role resolver performs. All methods are idempotent reads.
#[async_trait]
pub trait AccessStore: Send + Sync {
    async fn find_organization(
        &self,
        id: OrganizationId,
    ) -> Result<Option<Organization>, AccessStoreError>;

    async fn find_project(&self, id: ProjectId) -> Result<Option<Project>, AccessStoreError>;

    async fn find_board(&self, id: BoardId) -> Result<Option<Board>, AccessStoreError>;

    async fn find_role_by_id(&self, id: RoleId) -> Result<Option<Role>, AccessStoreError>;

    /// The membership edge for (subject, resource), if any.
    async fn find_link(
        &self,
        subject: Subject,
        resource: ResourceRef,
    ) -> Result<Option<MembershipEdge>, AccessStoreError>;

    async fn find_project_organization_link(
        &self,
        organization_id: OrganizationId,
        project_id: ProjectId,
    ) -> Result<Option<MembershipEdge>, AccessStoreError> {
        self.find_link(
            Subject::Organization(organization_id),
            ResourceRef::Project(project_id),
        )
        .await
    }

    async fn find_board_organization_link(
        &self,
        organization_id: OrganizationId,
        board_id: BoardId,
    ) -> Result<Option<MembershipEdge>, AccessStoreError> {
        self.find_link(
            Subject::Organization(organization_id),
            ResourceRef::Board(board_id),
        )
        .await
    }

    async fn find_project_user_link(
        &self,
        user_id: UserId,
        project_id: ProjectId,
    ) -> Result<Option<MembershipEdge>, AccessStoreError> {
        self.find_link(Subject::User(user_id), ResourceRef::Project(project_id))
            .await
    }

    async fn find_board_user_link(
        &self,
        user_id: UserId,
        board_id: BoardId,
    ) -> Result<Option<MembershipEdge>, AccessStoreError> {
        self.find_link(Subject::User(user_id), ResourceRef::Board(board_id))
            .await
    }

    async fn find_organization_user_link(
        &self,
        user_id: UserId,
        organization_id: OrganizationId,
    ) -> Result<Option<MembershipEdge>, AccessStoreError> {
        self.find_link(
            Subject::User(user_id),
            ResourceRef::Organization(organization_id),
        )
        .await
    }
}

#[async_trait]
impl<S> AccessStore for Arc<S>
where
    S: AccessStore + ?Sized,
{
    async fn find_organization(
        &self,
        id: OrganizationId,
    ) -> Result<Option<Organization>, AccessStoreError> {
        (**self).find_organization(id).await
    }

    async fn find_project(&self, id: ProjectId) -> Result<Option<Project>, AccessStoreError> {
        (**self).find_project(id).await
    }

    async fn find_board(&self, id: BoardId) -> Result<Option<Board>, AccessStoreError> {
        (**self).find_board(id).await
    }

    async fn find_role_by_id(&self, id: RoleId) -> Result<Option<Role>, AccessStoreError> {
        (**self).find_role_by_id(id).await
    }

    async fn find_link(
        &self,
        subject: Subject,
        resource: ResourceRef,
    ) -> Result<Option<MembershipEdge>, AccessStoreError> {
        (**self).find_link(subject, resource).await
    }
}
