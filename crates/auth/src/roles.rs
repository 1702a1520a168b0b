use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use boardwise_core::{DomainError, Entity, OrganizationId, RoleId};

use crate::{Capability, PermissionSet, RoleFlags};

/// A named bundle of capability flags.
///
/// Default roles are shared templates with fixed ids; custom roles belong to
/// the organization that created them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: RoleId,
    pub name: String,
    #[serde(default)]
    pub organization_id: Option<OrganizationId>,
    #[serde(flatten)]
    pub flags: RoleFlags,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Role {
    /// A role with every flag off.
    pub fn new(id: RoleId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            organization_id: None,
            flags: RoleFlags::default(),
            created_at: None,
            updated_at: None,
        }
    }

    /// A custom role owned by `organization_id`.
    pub fn custom(organization_id: OrganizationId, name: impl Into<String>) -> Self {
        let mut role = Self::new(RoleId::new(), name);
        role.organization_id = Some(organization_id);
        role.created_at = Some(Utc::now());
        role.updated_at = role.created_at;
        role
    }

    pub fn with(mut self, capability: Capability) -> Self {
        self.flags.set(capability, true);
        self
    }

    pub fn with_all(mut self, capabilities: &[Capability]) -> Self {
        for capability in capabilities {
            self.flags.set(*capability, true);
        }
        self
    }

    pub fn grants(&self, capability: Capability) -> bool {
        self.flags.get(capability)
    }

    /// Decode a raw storage row (e.g. Postgres `row_to_json`).
    ///
    /// Flag fields are selected by name shape; missing flags are `false`.
    pub fn from_record(record: &Map<String, Value>) -> Result<Role, DomainError> {
        let permissions = PermissionSet::from_record(record)?;

        let identity: Map<String, Value> = record
            .iter()
            .filter(|(key, _)| !crate::permissions::is_flag_name(key))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        let identity: RoleIdentity = serde_json::from_value(Value::Object(identity))
            .map_err(|e| DomainError::validation(format!("role record: {e}")))?;

        let mut flags = RoleFlags::default();
        for (capability, granted) in permissions.iter() {
            flags.set(capability, granted);
        }

        Ok(Role {
            id: identity.id,
            name: identity.name,
            organization_id: identity.organization_id,
            flags,
            created_at: identity.created_at,
            updated_at: identity.updated_at,
        })
    }
}

impl Entity for Role {
    type Id = RoleId;

    fn id(&self) -> RoleId {
        self.id
    }
}

#[derive(Deserialize)]
struct RoleIdentity {
    id: RoleId,
    name: String,
    #[serde(default)]
    organization_id: Option<OrganizationId>,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    updated_at: Option<DateTime<Utc>>,
}

/// Flatten a role into the permission set it grants.
///
/// The result has one entry per capability and nothing else.
pub fn extract_permissions(role: &Role) -> PermissionSet {
    PermissionSet::from(role.flags)
}

/// Built-in role templates created at organization setup.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DefaultRole {
    Owner,
    Admin,
    Member,
    Viewer,
}

impl DefaultRole {
    pub const ALL: [DefaultRole; 4] = [
        DefaultRole::Owner,
        DefaultRole::Admin,
        DefaultRole::Member,
        DefaultRole::Viewer,
    ];

    /// Fixed identity shared by every deployment.
    pub const fn id(self) -> RoleId {
        let n = match self {
            DefaultRole::Owner => 1,
            DefaultRole::Admin => 2,
            DefaultRole::Member => 3,
            DefaultRole::Viewer => 4,
        };
        RoleId::from_uuid(Uuid::from_u128(0x0b0a_7d00_0000_7000_8000_0000_0000_0000 | n))
    }

    pub const fn name(self) -> &'static str {
        match self {
            DefaultRole::Owner => "Owner",
            DefaultRole::Admin => "Admin",
            DefaultRole::Member => "Member",
            DefaultRole::Viewer => "Viewer",
        }
    }

    pub fn capabilities(self) -> Vec<Capability> {
        use Capability::*;
        match self {
            DefaultRole::Owner => Capability::ALL.to_vec(),
            DefaultRole::Admin => Capability::ALL
                .iter()
                .copied()
                .filter(|c| *c != DeleteProject)
                .collect(),
            DefaultRole::Member => vec![
                ViewProject, CreateBoard, ViewBoard, EditBoard, CreateList, EditList, DeleteList,
                CreateCard, EditCard, DeleteCard,
            ],
            DefaultRole::Viewer => vec![ViewProject, ViewBoard],
        }
    }

    pub fn role(self) -> Role {
        Role::new(self.id(), self.name()).with_all(&self.capabilities())
    }
}
