use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use boardwise_auth::{MembershipEdge, ResourceKind, ResourceRef, Subject};

/// Membership write failure.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MembershipStoreError {
    #[error("membership already exists for {0} on {1}")]
    AlreadyExists(Subject, ResourceRef),

    #[error("no membership for {0} on {1}")]
    NotFound(Subject, ResourceRef),

    /// One endpoint of the edge (or its role) does not exist.
    #[error("{0} not found")]
    UnknownReference(ResourceKind),

    #[error("storage error: {0}")]
    Storage(String),
}

/// Lifecycle of membership edges: created when a subject is added to a
/// resource, deleted when it is removed.
#[async_trait]
pub trait MembershipStore: Send + Sync {
    /// Insert a new edge. Fails with `AlreadyExists` if the (subject, resource)
    /// pair already has one.
    async fn grant(&self, edge: MembershipEdge) -> Result<MembershipEdge, MembershipStoreError>;

    /// Delete the edge for (subject, resource), returning it.
    async fn revoke(
        &self,
        subject: Subject,
        resource: ResourceRef,
    ) -> Result<MembershipEdge, MembershipStoreError>;
}

#[async_trait]
impl<S> MembershipStore for Arc<S>
where
    S: MembershipStore + ?Sized,
{
    async fn grant(&self, edge: MembershipEdge) -> Result<MembershipEdge, MembershipStoreError> {
        (**self).grant(edge).await
    }

    async fn revoke(
        &self,
        subject: Subject,
        resource: ResourceRef,
    ) -> Result<MembershipEdge, MembershipStoreError> {
        (**self).revoke(subject, resource).await
    }
}
