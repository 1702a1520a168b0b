//! Postgres-backed access store.
//!
//! Expected tables:
//!
//! | table           | columns                                                                 |
//! |-----------------|-------------------------------------------------------------------------|
//! | `organizations` | `id uuid pk`, `name text`                                               |
//! | `projects`      | `id uuid pk`, `organization_id uuid`, `name text`                       |
//! | `boards`        | `id uuid pk`, `project_id uuid`, `name text`                            |
//! | `roles`         | `id uuid pk`, `name`, `organization_id`, timestamps, one `boolean` column per capability token (quoted, e.g. `"VIEW_PROJECT"`) |
//! | `memberships`   | `subject_kind`, `subject_id`, `resource_kind`, `resource_id`, `role_id uuid fk roles`, `created_at`; primary key on the first four |
//!
//! Roles are read with `row_to_json` and decoded by `Role::from_record`, so a
//! capability column added to the table is picked up as soon as the
//! `Capability` enum knows its token.
//!
//! ## Error Mapping
//!
//! | SQLx error                     | result                                      |
//! |--------------------------------|---------------------------------------------|
//! | unique violation (`23505`)     | `MembershipStoreError::AlreadyExists`        |
//! | foreign key violation (`23503`)| `MembershipStoreError::UnknownReference(Role)` |
//! | anything else                  | `AccessStoreError::Unavailable` / `MembershipStoreError::Storage` |

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use tracing::instrument;
use uuid::Uuid;

use boardwise_auth::{
    AccessStore, AccessStoreError, Board, MembershipEdge, Organization, Project, ResourceKind,
    ResourceRef, Role, Subject,
};
use boardwise_core::{BoardId, OrganizationId, ProjectId, RoleId};

use super::membership::{MembershipStore, MembershipStoreError};

/// Postgres-backed implementation of the access read and write sides.
///
/// ## Thread Safety
///
/// Uses SQLx connection pool which is thread-safe (Arc + Send + Sync).
#[derive(Clone)]
pub struct PostgresAccessStore {
    pool: Arc<PgPool>,
}

impl PostgresAccessStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    /// Connect to `database_url` with a default pool.
    pub async fn connect(database_url: &str) -> Result<Self, AccessStoreError> {
        let pool = PgPool::connect(database_url).await.map_err(unavailable)?;
        Ok(Self::new(pool))
    }

    async fn resource_exists(&self, resource: ResourceRef) -> Result<bool, sqlx::Error> {
        let sql = match resource.kind() {
            ResourceKind::Organization => "SELECT EXISTS (SELECT 1 FROM organizations WHERE id = $1)",
            ResourceKind::Project => "SELECT EXISTS (SELECT 1 FROM projects WHERE id = $1)",
            ResourceKind::Board => "SELECT EXISTS (SELECT 1 FROM boards WHERE id = $1)",
            ResourceKind::Role => "SELECT EXISTS (SELECT 1 FROM roles WHERE id = $1)",
        };
        sqlx::query_scalar::<_, bool>(sql)
            .bind(resource.uuid())
            .fetch_one(&*self.pool)
            .await
    }
}

fn unavailable(e: sqlx::Error) -> AccessStoreError {
    AccessStoreError::Unavailable(e.to_string())
}

fn decode(e: sqlx::Error) -> AccessStoreError {
    AccessStoreError::Decode(e.to_string())
}

#[async_trait]
impl AccessStore for PostgresAccessStore {
    #[instrument(skip(self), level = "trace")]
    async fn find_organization(
        &self,
        id: OrganizationId,
    ) -> Result<Option<Organization>, AccessStoreError> {
        let row = sqlx::query("SELECT id, name FROM organizations WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(unavailable)?;

        row.map(|row| {
            Ok(Organization {
                id: OrganizationId::from_uuid(row.try_get::<Uuid, _>("id").map_err(decode)?),
                name: row.try_get("name").map_err(decode)?,
            })
        })
        .transpose()
    }

    #[instrument(skip(self), level = "trace")]
    async fn find_project(&self, id: ProjectId) -> Result<Option<Project>, AccessStoreError> {
        let row = sqlx::query("SELECT id, organization_id, name FROM projects WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(unavailable)?;

        row.map(|row| {
            Ok(Project {
                id: ProjectId::from_uuid(row.try_get::<Uuid, _>("id").map_err(decode)?),
                organization_id: OrganizationId::from_uuid(
                    row.try_get::<Uuid, _>("organization_id").map_err(decode)?,
                ),
                name: row.try_get("name").map_err(decode)?,
            })
        })
        .transpose()
    }

    #[instrument(skip(self), level = "trace")]
    async fn find_board(&self, id: BoardId) -> Result<Option<Board>, AccessStoreError> {
        let row = sqlx::query("SELECT id, project_id, name FROM boards WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(unavailable)?;

        row.map(|row| {
            Ok(Board {
                id: BoardId::from_uuid(row.try_get::<Uuid, _>("id").map_err(decode)?),
                project_id: ProjectId::from_uuid(
                    row.try_get::<Uuid, _>("project_id").map_err(decode)?,
                ),
                name: row.try_get("name").map_err(decode)?,
            })
        })
        .transpose()
    }

    #[instrument(skip(self), level = "trace")]
    async fn find_role_by_id(&self, id: RoleId) -> Result<Option<Role>, AccessStoreError> {
        let record = sqlx::query_scalar::<_, serde_json::Value>(
            "SELECT row_to_json(r) FROM roles r WHERE r.id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&*self.pool)
        .await
        .map_err(unavailable)?;

        let Some(record) = record else {
            return Ok(None);
        };
        let object = record
            .as_object()
            .ok_or_else(|| AccessStoreError::Decode("role row is not an object".to_string()))?;
        Role::from_record(object)
            .map(Some)
            .map_err(|e| AccessStoreError::Decode(e.to_string()))
    }

    #[instrument(skip(self), level = "trace")]
    async fn find_link(
        &self,
        subject: Subject,
        resource: ResourceRef,
    ) -> Result<Option<MembershipEdge>, AccessStoreError> {
        let row = sqlx::query(
            r#"
            SELECT role_id, created_at
            FROM memberships
            WHERE subject_kind = $1 AND subject_id = $2
              AND resource_kind = $3 AND resource_id = $4
            "#,
        )
        .bind(subject.kind())
        .bind(subject.uuid())
        .bind(resource.kind().as_str())
        .bind(resource.uuid())
        .fetch_optional(&*self.pool)
        .await
        .map_err(unavailable)?;

        row.map(|row| {
            Ok(MembershipEdge {
                subject,
                resource,
                role_id: RoleId::from_uuid(row.try_get::<Uuid, _>("role_id").map_err(decode)?),
                created_at: row
                    .try_get::<DateTime<Utc>, _>("created_at")
                    .map_err(decode)?,
            })
        })
        .transpose()
    }
}

#[async_trait]
impl MembershipStore for PostgresAccessStore {
    #[instrument(skip(self), level = "debug")]
    async fn grant(&self, edge: MembershipEdge) -> Result<MembershipEdge, MembershipStoreError> {
        let storage = |e: sqlx::Error| MembershipStoreError::Storage(e.to_string());

        // Resource columns are polymorphic, so their existence is checked here
        // rather than by a foreign key.
        if !self.resource_exists(edge.resource).await.map_err(storage)? {
            return Err(MembershipStoreError::UnknownReference(edge.resource.kind()));
        }
        if let Subject::Organization(org) = edge.subject {
            if !self
                .resource_exists(ResourceRef::Organization(org))
                .await
                .map_err(storage)?
            {
                return Err(MembershipStoreError::UnknownReference(
                    ResourceKind::Organization,
                ));
            }
        }

        let result = sqlx::query(
            r#"
            INSERT INTO memberships (
                subject_kind, subject_id, resource_kind, resource_id, role_id, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(edge.subject.kind())
        .bind(edge.subject.uuid())
        .bind(edge.resource.kind().as_str())
        .bind(edge.resource.uuid())
        .bind(edge.role_id.as_uuid())
        .bind(edge.created_at)
        .execute(&*self.pool)
        .await;

        match result {
            Ok(_) => Ok(edge),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => Err(
                MembershipStoreError::AlreadyExists(edge.subject, edge.resource),
            ),
            Err(sqlx::Error::Database(db)) if db.is_foreign_key_violation() => {
                Err(MembershipStoreError::UnknownReference(ResourceKind::Role))
            }
            Err(e) => Err(storage(e)),
        }
    }

    #[instrument(skip(self), level = "debug")]
    async fn revoke(
        &self,
        subject: Subject,
        resource: ResourceRef,
    ) -> Result<MembershipEdge, MembershipStoreError> {
        let row = sqlx::query(
            r#"
            DELETE FROM memberships
            WHERE subject_kind = $1 AND subject_id = $2
              AND resource_kind = $3 AND resource_id = $4
            RETURNING role_id, created_at
            "#,
        )
        .bind(subject.kind())
        .bind(subject.uuid())
        .bind(resource.kind().as_str())
        .bind(resource.uuid())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| MembershipStoreError::Storage(e.to_string()))?
        .ok_or(MembershipStoreError::NotFound(subject, resource))?;

        let role_id = row
            .try_get::<Uuid, _>("role_id")
            .map_err(|e| MembershipStoreError::Storage(e.to_string()))?;
        let created_at = row
            .try_get::<DateTime<Utc>, _>("created_at")
            .map_err(|e| MembershipStoreError::Storage(e.to_string()))?;

        Ok(MembershipEdge {
            subject,
            resource,
            role_id: RoleId::from_uuid(role_id),
            created_at,
        })
    }
}
