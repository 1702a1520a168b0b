//! Membership edges: a subject holds exactly one role on a resource.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use boardwise_core::{BoardId, DomainError, OrganizationId, ProjectId, RoleId, UserId};

/// Who is being granted access.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum Subject {
    User(UserId),
    Organization(OrganizationId),
}

/// What access is granted on.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum ResourceRef {
    Organization(OrganizationId),
    Project(ProjectId),
    Board(BoardId),
}

/// Resource kinds, used in error reporting.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Organization,
    Project,
    Board,
    Role,
}

impl ResourceKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            ResourceKind::Organization => "organization",
            ResourceKind::Project => "project",
            ResourceKind::Board => "board",
            ResourceKind::Role => "role",
        }
    }
}

impl core::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Subject {
    pub fn kind(&self) -> &'static str {
        match self {
            Subject::User(_) => "user",
            Subject::Organization(_) => "organization",
        }
    }

    pub fn uuid(&self) -> uuid::Uuid {
        match self {
            Subject::User(id) => *id.as_uuid(),
            Subject::Organization(id) => *id.as_uuid(),
        }
    }
}

impl core::fmt::Display for Subject {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}:{}", self.kind(), self.uuid())
    }
}

impl ResourceRef {
    pub fn kind(&self) -> ResourceKind {
        match self {
            ResourceRef::Organization(_) => ResourceKind::Organization,
            ResourceRef::Project(_) => ResourceKind::Project,
            ResourceRef::Board(_) => ResourceKind::Board,
        }
    }

    pub fn uuid(&self) -> uuid::Uuid {
        match self {
            ResourceRef::Organization(id) => *id.as_uuid(),
            ResourceRef::Project(id) => *id.as_uuid(),
            ResourceRef::Board(id) => *id.as_uuid(),
        }
    }
}

impl core::fmt::Display for ResourceRef {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}:{}", self.kind(), self.uuid())
    }
}

/// A typed link granting `subject` the role `role_id` on `resource`.
///
/// Unique per (subject, resource). Organizations are never members of other
/// organizations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MembershipEdge {
    pub subject: Subject,
    pub resource: ResourceRef,
    pub role_id: RoleId,
    pub created_at: DateTime<Utc>,
}

impl MembershipEdge {
    pub fn new(subject: Subject, resource: ResourceRef, role_id: RoleId) -> Result<Self, DomainError> {
        if let (Subject::Organization(_), ResourceRef::Organization(_)) = (subject, resource) {
            return Err(DomainError::validation(
                "an organization cannot be a member of an organization",
            ));
        }

        Ok(Self {
            subject,
            resource,
            role_id,
            created_at: Utc::now(),
        })
    }

    pub fn key(&self) -> (Subject, ResourceRef) {
        (self.subject, self.resource)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn organization_in_organization_is_rejected() {
        let err = MembershipEdge::new(
            Subject::Organization(OrganizationId::new()),
            ResourceRef::Organization(OrganizationId::new()),
            RoleId::new(),
        );
        assert!(err.is_err());
    }

    #[test]
    fn every_other_pairing_is_accepted() {
        let user = Subject::User(UserId::new());
        let org = Subject::Organization(OrganizationId::new());
        let resources = [
            ResourceRef::Project(ProjectId::new()),
            ResourceRef::Board(BoardId::new()),
        ];

        for resource in resources {
            assert!(MembershipEdge::new(user, resource, RoleId::new()).is_ok());
            assert!(MembershipEdge::new(org, resource, RoleId::new()).is_ok());
        }
        assert!(
            MembershipEdge::new(user, ResourceRef::Organization(OrganizationId::new()), RoleId::new())
                .is_ok()
        );
    }

    #[test]
    fn refs_render_kind_and_id() {
        let id = ProjectId::new();
        assert_eq!(ResourceRef::Project(id).to_string(), format!("project:{id}"));
    }
}
