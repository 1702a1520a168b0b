//! Role resolution: which permission set does a subject hold on a resource?
//!
//! Resolution follows the ownership chain (board → project → owning
//! organization) and OR-merges inherited and local grants. The resolver only
//! reads from its store and never retries.

use thiserror::Error;

use boardwise_core::{BoardId, OrganizationId, ProjectId, UserId};

use crate::store::{AccessStore, AccessStoreError};
use crate::{extract_permissions, MembershipEdge, PermissionSet, ResourceKind, ResourceRef, Subject};

/// Why no permission set could be produced.
///
/// "Has access but lacks a capability" is not an error here; it is a `false`
/// flag in the returned set.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("{0} not found")]
    NotFound(ResourceKind),

    #[error("subject is not a member of the {0}")]
    Authorization(ResourceKind),

    #[error(transparent)]
    Storage(#[from] AccessStoreError),
}

impl ResolveError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ResolveError::NotFound(_))
    }
}

/// Resolves effective permission sets against an injected [`AccessStore`].
#[derive(Debug, Clone)]
pub struct RoleResolver<S> {
    store: S,
}

impl<S: AccessStore> RoleResolver<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Permission set of an organization on a project.
    ///
    /// The owning organization always gets [`PermissionSet::owner`].
    pub async fn resolve_for_project(
        &self,
        organization_id: OrganizationId,
        project_id: ProjectId,
    ) -> Result<PermissionSet, ResolveError> {
        traced(
            Subject::Organization(organization_id),
            ResourceRef::Project(project_id),
            self.organization_on_project(organization_id, project_id).await,
        )
    }

    /// Permission set of an organization on a board: the project-level set
    /// merged with the board's own grant.
    ///
    /// Both grants are required. Without project access the board link is
    /// never consulted.
    pub async fn resolve_for_board(
        &self,
        organization_id: OrganizationId,
        board_id: BoardId,
    ) -> Result<PermissionSet, ResolveError> {
        traced(
            Subject::Organization(organization_id),
            ResourceRef::Board(board_id),
            self.organization_on_board(organization_id, board_id).await,
        )
    }

    /// Permission set of a user through a direct project membership.
    pub async fn resolve_for_project_user(
        &self,
        user_id: UserId,
        project_id: ProjectId,
    ) -> Result<PermissionSet, ResolveError> {
        traced(
            Subject::User(user_id),
            ResourceRef::Project(project_id),
            self.user_on_project(user_id, project_id).await,
        )
    }

    /// Permission set of a user on a board: project membership merged with
    /// board membership.
    pub async fn resolve_for_board_user(
        &self,
        user_id: UserId,
        board_id: BoardId,
    ) -> Result<PermissionSet, ResolveError> {
        traced(
            Subject::User(user_id),
            ResourceRef::Board(board_id),
            self.user_on_board(user_id, board_id).await,
        )
    }

    /// Organization-scoped role of a member.
    pub async fn resolve_for_organization_user(
        &self,
        user_id: UserId,
        organization_id: OrganizationId,
    ) -> Result<PermissionSet, ResolveError> {
        traced(
            Subject::User(user_id),
            ResourceRef::Organization(organization_id),
            self.user_on_organization(user_id, organization_id).await,
        )
    }

    /// Dispatch over every (subject kind, resource kind) pair.
    ///
    /// An organization resolved against itself is its own owner; against any
    /// other organization it has no access.
    pub async fn resolve(
        &self,
        subject: Subject,
        resource: ResourceRef,
    ) -> Result<PermissionSet, ResolveError> {
        match (subject, resource) {
            (Subject::Organization(org), ResourceRef::Project(project)) => {
                self.resolve_for_project(org, project).await
            }
            (Subject::Organization(org), ResourceRef::Board(board)) => {
                self.resolve_for_board(org, board).await
            }
            (Subject::User(user), ResourceRef::Project(project)) => {
                self.resolve_for_project_user(user, project).await
            }
            (Subject::User(user), ResourceRef::Board(board)) => {
                self.resolve_for_board_user(user, board).await
            }
            (Subject::User(user), ResourceRef::Organization(org)) => {
                self.resolve_for_organization_user(user, org).await
            }
            (Subject::Organization(org), ResourceRef::Organization(target)) => {
                self.store
                    .find_organization(target)
                    .await?
                    .ok_or(ResolveError::NotFound(ResourceKind::Organization))?;
                if org == target {
                    Ok(PermissionSet::owner())
                } else {
                    Err(ResolveError::Authorization(ResourceKind::Organization))
                }
            }
        }
    }

    /// Permission set of a request principal: a user acting inside an
    /// organization.
    ///
    /// The organization side only counts when the user holds a membership
    /// edge on that organization; otherwise the user's own set is the answer.
    /// With membership, the user-keyed and organization-keyed sets are
    /// OR-merged. When only one side grants access that side's set is
    /// returned. When neither does, `NotFound` is preferred over
    /// `Authorization`. Storage failures are returned as soon as they are seen.
    pub async fn resolve_effective(
        &self,
        user_id: UserId,
        organization_id: OrganizationId,
        resource: ResourceRef,
    ) -> Result<PermissionSet, ResolveError> {
        let by_user = self.resolve(Subject::User(user_id), resource).await;
        if let Err(e @ ResolveError::Storage(_)) = &by_user {
            return Err(e.clone());
        }

        match self
            .resolve_for_organization_user(user_id, organization_id)
            .await
        {
            Ok(_) => {}
            Err(e @ ResolveError::Storage(_)) => return Err(e),
            Err(_) => return by_user,
        }

        let by_org = self
            .resolve(Subject::Organization(organization_id), resource)
            .await;

        match (by_user, by_org) {
            (_, Err(ResolveError::Storage(e))) => Err(ResolveError::Storage(e)),
            (Ok(user), Ok(org)) => Ok(user.merge(&org)),
            (Ok(set), Err(_)) | (Err(_), Ok(set)) => Ok(set),
            (Err(user), Err(org)) => {
                if org.is_not_found() {
                    Err(org)
                } else {
                    Err(user)
                }
            }
        }
    }

    async fn organization_on_project(
        &self,
        organization_id: OrganizationId,
        project_id: ProjectId,
    ) -> Result<PermissionSet, ResolveError> {
        let project = self
            .store
            .find_project(project_id)
            .await?
            .ok_or(ResolveError::NotFound(ResourceKind::Project))?;

        if project.organization_id == organization_id {
            return Ok(PermissionSet::owner());
        }

        let link = self
            .store
            .find_project_organization_link(organization_id, project_id)
            .await?
            .ok_or(ResolveError::Authorization(ResourceKind::Project))?;
        self.role_permissions(&link).await
    }

    async fn organization_on_board(
        &self,
        organization_id: OrganizationId,
        board_id: BoardId,
    ) -> Result<PermissionSet, ResolveError> {
        let board = self
            .store
            .find_board(board_id)
            .await?
            .ok_or(ResolveError::NotFound(ResourceKind::Board))?;

        let inherited = self
            .resolve_for_project(organization_id, board.project_id)
            .await?;

        let link = self
            .store
            .find_board_organization_link(organization_id, board_id)
            .await?
            .ok_or(ResolveError::Authorization(ResourceKind::Board))?;
        let local = self.role_permissions(&link).await?;

        Ok(inherited.merge(&local))
    }

    async fn user_on_project(
        &self,
        user_id: UserId,
        project_id: ProjectId,
    ) -> Result<PermissionSet, ResolveError> {
        self.store
            .find_project(project_id)
            .await?
            .ok_or(ResolveError::NotFound(ResourceKind::Project))?;

        let link = self
            .store
            .find_project_user_link(user_id, project_id)
            .await?
            .ok_or(ResolveError::Authorization(ResourceKind::Project))?;
        self.role_permissions(&link).await
    }

    async fn user_on_board(
        &self,
        user_id: UserId,
        board_id: BoardId,
    ) -> Result<PermissionSet, ResolveError> {
        let board = self
            .store
            .find_board(board_id)
            .await?
            .ok_or(ResolveError::NotFound(ResourceKind::Board))?;

        let inherited = self
            .resolve_for_project_user(user_id, board.project_id)
            .await?;

        let link = self
            .store
            .find_board_user_link(user_id, board_id)
            .await?
            .ok_or(ResolveError::Authorization(ResourceKind::Board))?;
        let local = self.role_permissions(&link).await?;

        Ok(inherited.merge(&local))
    }

    async fn user_on_organization(
        &self,
        user_id: UserId,
        organization_id: OrganizationId,
    ) -> Result<PermissionSet, ResolveError> {
        self.store
            .find_organization(organization_id)
            .await?
            .ok_or(ResolveError::NotFound(ResourceKind::Organization))?;

        let link = self
            .store
            .find_organization_user_link(user_id, organization_id)
            .await?
            .ok_or(ResolveError::Authorization(ResourceKind::Organization))?;
        self.role_permissions(&link).await
    }

    async fn role_permissions(&self, edge: &MembershipEdge) -> Result<PermissionSet, ResolveError> {
        let role = self
            .store
            .find_role_by_id(edge.role_id)
            .await?
            .ok_or(ResolveError::NotFound(ResourceKind::Role))?;
        Ok(extract_permissions(&role))
    }
}

fn traced(
    subject: Subject,
    resource: ResourceRef,
    outcome: Result<PermissionSet, ResolveError>,
) -> Result<PermissionSet, ResolveError> {
    match &outcome {
        Ok(set) => tracing::debug!(
            %subject,
            %resource,
            granted = set.granted().count(),
            "permissions resolved"
        ),
        Err(ResolveError::Storage(e)) => tracing::warn!(
            %subject,
            %resource,
            error = %e,
            "permission lookup failed"
        ),
        Err(e) => tracing::debug!(%subject, %resource, reason = %e, "permissions denied"),
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashMap;

    use async_trait::async_trait;
    use boardwise_core::RoleId;

    use crate::{Board, Capability, Organization, Project, Role};

    /// Minimal fixture store; full scenarios run against the in-memory store
    /// in `boardwise-infra`.
    #[derive(Default)]
    struct FixtureStore {
        organizations: HashMap<OrganizationId, Organization>,
        projects: HashMap<ProjectId, Project>,
        boards: HashMap<BoardId, Board>,
        roles: HashMap<RoleId, Role>,
        links: HashMap<(Subject, ResourceRef), MembershipEdge>,
        fail_links: bool,
    }

    #[async_trait]
    impl AccessStore for FixtureStore {
        async fn find_organization(
            &self,
            id: OrganizationId,
        ) -> Result<Option<Organization>, AccessStoreError> {
            Ok(self.organizations.get(&id).cloned())
        }

        async fn find_project(&self, id: ProjectId) -> Result<Option<Project>, AccessStoreError> {
            Ok(self.projects.get(&id).cloned())
        }

        async fn find_board(&self, id: BoardId) -> Result<Option<Board>, AccessStoreError> {
            Ok(self.boards.get(&id).cloned())
        }

        async fn find_role_by_id(&self, id: RoleId) -> Result<Option<Role>, AccessStoreError> {
            Ok(self.roles.get(&id).cloned())
        }

        async fn find_link(
            &self,
            subject: Subject,
            resource: ResourceRef,
        ) -> Result<Option<MembershipEdge>, AccessStoreError> {
            if self.fail_links {
                return Err(AccessStoreError::Unavailable("connection reset".into()));
            }
            Ok(self.links.get(&(subject, resource)).cloned())
        }
    }

    struct Fixture {
        store: FixtureStore,
        owner: OrganizationId,
        project: ProjectId,
        board: BoardId,
    }

    fn fixture() -> Fixture {
        let mut store = FixtureStore::default();
        let owner = OrganizationId::new();
        let project = ProjectId::new();
        let board = BoardId::new();

        store.organizations.insert(owner, Organization { id: owner, name: "Acme".into() });
        store.projects.insert(
            project,
            Project { id: project, organization_id: owner, name: "Roadmap".into() },
        );
        store.boards.insert(board, Board { id: board, project_id: project, name: "Q3".into() });

        Fixture { store, owner, project, board }
    }

    fn link(store: &mut FixtureStore, subject: Subject, resource: ResourceRef, role: Role) {
        let edge = MembershipEdge::new(subject, resource, role.id).unwrap();
        store.roles.insert(role.id, role);
        store.links.insert(edge.key(), edge);
    }

    #[tokio::test]
    async fn dangling_role_reference_is_not_found() {
        let mut f = fixture();
        let guest = OrganizationId::new();
        let edge = MembershipEdge::new(
            Subject::Organization(guest),
            ResourceRef::Project(f.project),
            RoleId::new(),
        )
        .unwrap();
        f.store.links.insert(edge.key(), edge);

        let resolver = RoleResolver::new(f.store);
        let err = resolver.resolve_for_project(guest, f.project).await.unwrap_err();
        assert_eq!(err, ResolveError::NotFound(ResourceKind::Role));
    }

    #[tokio::test]
    async fn owner_short_circuits_before_link_lookup() {
        let mut f = fixture();
        f.store.fail_links = true;
        let owner = f.owner;
        let project = f.project;

        let resolver = RoleResolver::new(f.store);
        let set = resolver.resolve_for_project(owner, project).await.unwrap();
        assert_eq!(set, PermissionSet::owner());
    }

    #[tokio::test]
    async fn storage_failure_propagates() {
        let mut f = fixture();
        f.store.fail_links = true;
        let project = f.project;

        let resolver = RoleResolver::new(f.store);
        let err = resolver
            .resolve_for_project(OrganizationId::new(), project)
            .await
            .unwrap_err();
        assert!(matches!(err, ResolveError::Storage(AccessStoreError::Unavailable(_))));
    }

    #[tokio::test]
    async fn user_board_access_merges_project_and_board_roles() {
        let mut f = fixture();
        let user = UserId::new();
        link(
            &mut f.store,
            Subject::User(user),
            ResourceRef::Project(f.project),
            Role::new(RoleId::new(), "Viewer").with(Capability::ViewProject),
        );
        link(
            &mut f.store,
            Subject::User(user),
            ResourceRef::Board(f.board),
            Role::new(RoleId::new(), "Carder").with(Capability::CreateCard),
        );
        let board = f.board;

        let resolver = RoleResolver::new(f.store);
        let set = resolver.resolve_for_board_user(user, board).await.unwrap();
        assert!(set.get(Capability::ViewProject));
        assert!(set.get(Capability::CreateCard));
        assert!(!set.get(Capability::DeleteBoard));
    }

    #[tokio::test]
    async fn effective_prefers_granting_side() {
        let mut f = fixture();
        let user = UserId::new();
        let guest = OrganizationId::new();
        link(
            &mut f.store,
            Subject::User(user),
            ResourceRef::Project(f.project),
            Role::new(RoleId::new(), "Editor").with(Capability::EditProject),
        );
        let project = f.project;

        let resolver = RoleResolver::new(f.store);
        let set = resolver
            .resolve_effective(user, guest, ResourceRef::Project(project))
            .await
            .unwrap();
        assert!(set.get(Capability::EditProject));
    }

    #[tokio::test]
    async fn effective_merges_when_both_sides_grant() {
        let mut f = fixture();
        let user = UserId::new();
        link(
            &mut f.store,
            Subject::User(user),
            ResourceRef::Project(f.project),
            Role::new(RoleId::new(), "Viewer").with(Capability::ViewProject),
        );
        link(
            &mut f.store,
            Subject::User(user),
            ResourceRef::Organization(f.owner),
            Role::new(RoleId::new(), "Member"),
        );
        let (owner, project) = (f.owner, f.project);

        let resolver = RoleResolver::new(f.store);
        let set = resolver
            .resolve_effective(user, owner, ResourceRef::Project(project))
            .await
            .unwrap();
        assert_eq!(set, PermissionSet::owner());
    }

    #[tokio::test]
    async fn effective_ignores_organization_without_membership() {
        let f = fixture();
        let outsider = UserId::new();
        let (owner, project) = (f.owner, f.project);

        let resolver = RoleResolver::new(f.store);
        let err = resolver
            .resolve_effective(outsider, owner, ResourceRef::Project(project))
            .await
            .unwrap_err();
        assert_eq!(err, ResolveError::Authorization(ResourceKind::Project));
    }

    #[tokio::test]
    async fn effective_storage_failure_propagates() {
        let mut f = fixture();
        f.store.fail_links = true;
        let (owner, project) = (f.owner, f.project);

        let resolver = RoleResolver::new(f.store);
        let err = resolver
            .resolve_effective(UserId::new(), owner, ResourceRef::Project(project))
            .await
            .unwrap_err();
        assert!(matches!(err, ResolveError::Storage(_)));
    }

    #[tokio::test]
    async fn effective_denial_distinguishes_missing_resource() {
        let f = fixture();
        let resolver = RoleResolver::new(f.store);
        let user = UserId::new();
        let guest = OrganizationId::new();

        let err = resolver
            .resolve_effective(user, guest, ResourceRef::Project(ProjectId::new()))
            .await
            .unwrap_err();
        assert_eq!(err, ResolveError::NotFound(ResourceKind::Project));

        let err = resolver
            .resolve_effective(user, guest, ResourceRef::Project(f.project))
            .await
            .unwrap_err();
        assert_eq!(err, ResolveError::Authorization(ResourceKind::Project));
    }

    #[tokio::test]
    async fn organization_against_itself_is_owner() {
        let f = fixture();
        let owner = f.owner;
        let resolver = RoleResolver::new(f.store);

        let set = resolver
            .resolve(Subject::Organization(owner), ResourceRef::Organization(owner))
            .await
            .unwrap();
        assert_eq!(set, PermissionSet::owner());

        let err = resolver
            .resolve(
                Subject::Organization(OrganizationId::new()),
                ResourceRef::Organization(owner),
            )
            .await
            .unwrap_err();
        assert_eq!(err, ResolveError::Authorization(ResourceKind::Organization));
    }
}
