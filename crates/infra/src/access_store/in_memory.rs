use std::collections::HashMap;
use std::hash::Hash;
use std::sync::RwLock;

use async_trait::async_trait;

use boardwise_auth::{
    AccessStore, AccessStoreError, Board, DefaultRole, MembershipEdge, Organization, Project,
    ResourceKind, ResourceRef, Role, Subject,
};
use boardwise_core::{BoardId, Entity, OrganizationId, ProjectId, RoleId};

use super::membership::{MembershipStore, MembershipStoreError};

type LinkKey = (Subject, ResourceRef);

/// In-memory access store for tests/dev.
///
/// Default roles are installed on construction. Referential integrity between
/// edges and their endpoints is checked on `grant`; users are not tracked
/// here, so user subjects are accepted as-is.
#[derive(Debug)]
pub struct InMemoryAccessStore {
    organizations: RwLock<HashMap<OrganizationId, Organization>>,
    projects: RwLock<HashMap<ProjectId, Project>>,
    boards: RwLock<HashMap<BoardId, Board>>,
    roles: RwLock<HashMap<RoleId, Role>>,
    links: RwLock<HashMap<LinkKey, MembershipEdge>>,
}

impl InMemoryAccessStore {
    pub fn new() -> Self {
        let roles = DefaultRole::ALL
            .iter()
            .map(|r| (r.id(), r.role()))
            .collect();

        Self {
            organizations: RwLock::new(HashMap::new()),
            projects: RwLock::new(HashMap::new()),
            boards: RwLock::new(HashMap::new()),
            roles: RwLock::new(roles),
            links: RwLock::new(HashMap::new()),
        }
    }

    pub fn upsert_organization(&self, organization: Organization) -> Result<(), AccessStoreError> {
        upsert(&self.organizations, organization)
    }

    pub fn upsert_project(&self, project: Project) -> Result<(), AccessStoreError> {
        upsert(&self.projects, project)
    }

    pub fn upsert_board(&self, board: Board) -> Result<(), AccessStoreError> {
        upsert(&self.boards, board)
    }

    pub fn upsert_role(&self, role: Role) -> Result<(), AccessStoreError> {
        upsert(&self.roles, role)
    }

    /// Number of stored membership edges.
    pub fn link_count(&self) -> Result<usize, AccessStoreError> {
        let links = self.links.read().map_err(|_| poisoned())?;
        Ok(links.len())
    }

    fn exists(&self, resource: ResourceRef) -> Result<bool, AccessStoreError> {
        match resource {
            ResourceRef::Organization(id) => contains(&self.organizations, &id),
            ResourceRef::Project(id) => contains(&self.projects, &id),
            ResourceRef::Board(id) => contains(&self.boards, &id),
        }
    }
}

impl Default for InMemoryAccessStore {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned() -> AccessStoreError {
    AccessStoreError::Unavailable("lock poisoned".to_string())
}

fn storage(e: AccessStoreError) -> MembershipStoreError {
    MembershipStoreError::Storage(e.to_string())
}

fn upsert<E: Entity>(table: &RwLock<HashMap<E::Id, E>>, entity: E) -> Result<(), AccessStoreError> {
    let mut map = table.write().map_err(|_| poisoned())?;
    map.insert(entity.id(), entity);
    Ok(())
}

fn contains<K: Eq + Hash, V>(table: &RwLock<HashMap<K, V>>, key: &K) -> Result<bool, AccessStoreError> {
    let map = table.read().map_err(|_| poisoned())?;
    Ok(map.contains_key(key))
}

fn get<K: Eq + Hash, V: Clone>(
    table: &RwLock<HashMap<K, V>>,
    key: &K,
) -> Result<Option<V>, AccessStoreError> {
    let map = table.read().map_err(|_| poisoned())?;
    Ok(map.get(key).cloned())
}

#[async_trait]
impl AccessStore for InMemoryAccessStore {
    async fn find_organization(
        &self,
        id: OrganizationId,
    ) -> Result<Option<Organization>, AccessStoreError> {
        get(&self.organizations, &id)
    }

    async fn find_project(&self, id: ProjectId) -> Result<Option<Project>, AccessStoreError> {
        get(&self.projects, &id)
    }

    async fn find_board(&self, id: BoardId) -> Result<Option<Board>, AccessStoreError> {
        get(&self.boards, &id)
    }

    async fn find_role_by_id(&self, id: RoleId) -> Result<Option<Role>, AccessStoreError> {
        get(&self.roles, &id)
    }

    async fn find_link(
        &self,
        subject: Subject,
        resource: ResourceRef,
    ) -> Result<Option<MembershipEdge>, AccessStoreError> {
        get(&self.links, &(subject, resource))
    }
}

#[async_trait]
impl MembershipStore for InMemoryAccessStore {
    async fn grant(&self, edge: MembershipEdge) -> Result<MembershipEdge, MembershipStoreError> {
        if !self.exists(edge.resource).map_err(storage)? {
            return Err(MembershipStoreError::UnknownReference(edge.resource.kind()));
        }
        if let Subject::Organization(org) = edge.subject {
            if !contains(&self.organizations, &org).map_err(storage)? {
                return Err(MembershipStoreError::UnknownReference(
                    ResourceKind::Organization,
                ));
            }
        }
        if !contains(&self.roles, &edge.role_id).map_err(storage)? {
            return Err(MembershipStoreError::UnknownReference(ResourceKind::Role));
        }

        let mut links = self.links.write().map_err(|_| storage(poisoned()))?;
        if links.contains_key(&edge.key()) {
            return Err(MembershipStoreError::AlreadyExists(edge.subject, edge.resource));
        }
        links.insert(edge.key(), edge.clone());

        tracing::debug!(subject = %edge.subject, resource = %edge.resource, role_id = %edge.role_id, "membership granted");
        Ok(edge)
    }

    async fn revoke(
        &self,
        subject: Subject,
        resource: ResourceRef,
    ) -> Result<MembershipEdge, MembershipStoreError> {
        let mut links = self.links.write().map_err(|_| storage(poisoned()))?;
        let edge = links
            .remove(&(subject, resource))
            .ok_or(MembershipStoreError::NotFound(subject, resource))?;

        tracing::debug!(%subject, %resource, "membership revoked");
        Ok(edge)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use boardwise_core::UserId;

    fn seeded() -> (InMemoryAccessStore, OrganizationId, ProjectId) {
        let store = InMemoryAccessStore::new();
        let org = OrganizationId::new();
        let project = ProjectId::new();
        store
            .upsert_organization(Organization { id: org, name: "Acme".into() })
            .unwrap();
        store
            .upsert_project(Project {
                id: project,
                organization_id: org,
                name: "Roadmap".into(),
            })
            .unwrap();
        (store, org, project)
    }

    #[tokio::test]
    async fn default_roles_are_installed() {
        let store = InMemoryAccessStore::new();
        for role in DefaultRole::ALL {
            let found = store.find_role_by_id(role.id()).await.unwrap().unwrap();
            assert_eq!(found.name, role.name());
        }
    }

    #[tokio::test]
    async fn grant_then_find_then_revoke() {
        let (store, _org, project) = seeded();
        let user = Subject::User(UserId::new());
        let resource = ResourceRef::Project(project);

        let edge = MembershipEdge::new(user, resource, DefaultRole::Viewer.id()).unwrap();
        store.grant(edge.clone()).await.unwrap();

        let found = store.find_link(user, resource).await.unwrap();
        assert_eq!(found, Some(edge.clone()));

        let removed = store.revoke(user, resource).await.unwrap();
        assert_eq!(removed, edge);
        assert!(store.find_link(user, resource).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_pair_is_rejected() {
        let (store, _org, project) = seeded();
        let user = Subject::User(UserId::new());
        let resource = ResourceRef::Project(project);

        let first = MembershipEdge::new(user, resource, DefaultRole::Viewer.id()).unwrap();
        let second = MembershipEdge::new(user, resource, DefaultRole::Admin.id()).unwrap();
        store.grant(first).await.unwrap();

        assert_eq!(
            store.grant(second).await,
            Err(MembershipStoreError::AlreadyExists(user, resource))
        );
        assert_eq!(store.link_count().unwrap(), 1);
    }

    #[tokio::test]
    async fn grant_checks_endpoints_and_role() {
        let (store, _org, project) = seeded();
        let user = Subject::User(UserId::new());

        let missing_board = MembershipEdge::new(
            user,
            ResourceRef::Board(BoardId::new()),
            DefaultRole::Viewer.id(),
        )
        .unwrap();
        assert_eq!(
            store.grant(missing_board).await,
            Err(MembershipStoreError::UnknownReference(ResourceKind::Board))
        );

        let missing_org = MembershipEdge::new(
            Subject::Organization(OrganizationId::new()),
            ResourceRef::Project(project),
            DefaultRole::Viewer.id(),
        )
        .unwrap();
        assert_eq!(
            store.grant(missing_org).await,
            Err(MembershipStoreError::UnknownReference(ResourceKind::Organization))
        );

        let missing_role =
            MembershipEdge::new(user, ResourceRef::Project(project), RoleId::new()).unwrap();
        assert_eq!(
            store.grant(missing_role).await,
            Err(MembershipStoreError::UnknownReference(ResourceKind::Role))
        );
    }

    #[tokio::test]
    async fn revoking_absent_edge_fails() {
        let (store, _org, project) = seeded();
        let user = Subject::User(UserId::new());
        let resource = ResourceRef::Project(project);

        assert_eq!(
            store.revoke(user, resource).await,
            Err(MembershipStoreError::NotFound(user, resource))
        );
    }

    #[tokio::test]
    async fn poisoned_lock_is_reported_everywhere() {
        let (store, org, project) = seeded();
        let store = std::sync::Arc::new(store);

        let poisoner = store.clone();
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.projects.write().unwrap();
            panic!("writer died holding the lock");
        })
        .join();

        assert!(matches!(
            store.upsert_project(Project {
                id: project,
                organization_id: org,
                name: "Renamed".into(),
            }),
            Err(AccessStoreError::Unavailable(_))
        ));
        assert!(matches!(
            store.find_project(project).await,
            Err(AccessStoreError::Unavailable(_))
        ));

        let edge = MembershipEdge::new(
            Subject::User(UserId::new()),
            ResourceRef::Project(project),
            DefaultRole::Viewer.id(),
        )
        .unwrap();
        assert!(matches!(
            store.grant(edge).await,
            Err(MembershipStoreError::Storage(_))
        ));
    }
}
