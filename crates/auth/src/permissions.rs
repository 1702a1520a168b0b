//! Capability vocabulary and permission sets.
//!
//! The vocabulary is closed: every flag a role can carry is a `Capability`
//! variant with a stable `OBJECT_ACTION` token. Role records store one boolean
//! per capability (`RoleFlags`), and a `PermissionSet` is the flattened view
//! handed to callers.

use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use boardwise_core::DomainError;

macro_rules! capabilities {
    ($( $(#[$meta:meta])* $variant:ident => $token:literal, $field:ident; )+) => {
        /// A single capability flag.
        #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum Capability {
            $( $(#[$meta])* $variant, )+
        }

        impl Capability {
            /// Every capability, in declaration order.
            pub const ALL: &'static [Capability] = &[ $( Capability::$variant, )+ ];

            /// Wire/storage token (e.g. `"VIEW_PROJECT"`).
            pub const fn as_str(self) -> &'static str {
                match self {
                    $( Capability::$variant => $token, )+
                }
            }
        }

        impl FromStr for Capability {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $( $token => Ok(Capability::$variant), )+
                    other => Err(DomainError::validation(format!("unknown capability '{other}'"))),
                }
            }
        }

        /// One boolean per capability, as stored on a role record.
        ///
        /// Missing fields deserialize as `false`.
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
        #[serde(default)]
        pub struct RoleFlags {
            $( #[serde(rename = $token)] pub $field: bool, )+
        }

        impl RoleFlags {
            pub fn get(&self, capability: Capability) -> bool {
                match capability {
                    $( Capability::$variant => self.$field, )+
                }
            }

            pub fn set(&mut self, capability: Capability, granted: bool) {
                match capability {
                    $( Capability::$variant => self.$field = granted, )+
                }
            }
        }
    };
}

capabilities! {
    CreateBoard => "CREATE_BOARD", create_board;
    ViewProject => "VIEW_PROJECT", view_project;
    EditProject => "EDIT_PROJECT", edit_project;
    DeleteProject => "DELETE_PROJECT", delete_project;
    AddUserToProject => "ADD_USER_TO_PROJECT", add_user_to_project;
    RemoveUserFromProject => "REMOVE_USER_FROM_PROJECT", remove_user_from_project;
    AddOrganizationToProject => "ADD_ORGANIZATION_TO_PROJECT", add_organization_to_project;
    RemoveOrganizationFromProject => "REMOVE_ORGANIZATION_FROM_PROJECT", remove_organization_from_project;
    ViewBoard => "VIEW_BOARD", view_board;
    EditBoard => "EDIT_BOARD", edit_board;
    DeleteBoard => "DELETE_BOARD", delete_board;
    AddUserToBoard => "ADD_USER_TO_BOARD", add_user_to_board;
    RemoveUserFromBoard => "REMOVE_USER_FROM_BOARD", remove_user_from_board;
    AddOrganizationToBoard => "ADD_ORGANIZATION_TO_BOARD", add_organization_to_board;
    RemoveOrganizationFromBoard => "REMOVE_ORGANIZATION_FROM_BOARD", remove_organization_from_board;
    CreateList => "CREATE_LIST", create_list;
    EditList => "EDIT_LIST", edit_list;
    DeleteList => "DELETE_LIST", delete_list;
    CreateCard => "CREATE_CARD", create_card;
    EditCard => "EDIT_CARD", edit_card;
    DeleteCard => "DELETE_CARD", delete_card;
}

impl core::fmt::Display for Capability {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Capability {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Capability {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let token = String::deserialize(deserializer)?;
        token.parse().map_err(serde::de::Error::custom)
    }
}

static FLAG_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z]+(_[A-Z]+)+$").expect("flag name pattern is valid"));

/// Whether a record field name has the `OBJECT_ACTION` shape of a capability flag.
pub fn is_flag_name(name: &str) -> bool {
    FLAG_NAME.is_match(name)
}

/// Flattened capability flags for one (subject, resource) pair.
///
/// Keys absent from the map read as `false`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionSet(BTreeMap<Capability, bool>);

impl PermissionSet {
    /// An empty set (every lookup is `false`).
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Every capability present and `true` (owning organization).
    pub fn owner() -> Self {
        Capability::ALL.iter().map(|c| (*c, true)).collect()
    }

    pub fn get(&self, capability: Capability) -> bool {
        self.0.get(&capability).copied().unwrap_or(false)
    }

    pub fn set(&mut self, capability: Capability, granted: bool) {
        self.0.insert(capability, granted);
    }

    pub fn grant(mut self, capability: Capability) -> Self {
        self.set(capability, true);
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (Capability, bool)> + '_ {
        self.0.iter().map(|(c, v)| (*c, *v))
    }

    /// Capabilities whose flag is `true`.
    pub fn granted(&self) -> impl Iterator<Item = Capability> + '_ {
        self.iter().filter_map(|(c, v)| v.then_some(c))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// OR-merge: a flag is granted if either side grants it.
    ///
    /// The key set of the result is the union of both key sets; a key missing
    /// on one side counts as `false` there.
    pub fn merge(&self, other: &PermissionSet) -> PermissionSet {
        let mut merged = self.0.clone();
        for (capability, granted) in &other.0 {
            let slot = merged.entry(*capability).or_insert(false);
            *slot = *slot || *granted;
        }
        PermissionSet(merged)
    }

    /// Fold any number of sets with [`PermissionSet::merge`].
    pub fn merge_all<'a, I>(sets: I) -> PermissionSet
    where
        I: IntoIterator<Item = &'a PermissionSet>,
    {
        sets.into_iter()
            .fold(PermissionSet::new(), |acc, set| acc.merge(set))
    }

    /// Project a raw role record onto its capability flags.
    ///
    /// Only fields whose name has the flag shape (see [`is_flag_name`]) are
    /// considered; identity, timestamp and foreign-key fields are ignored. A
    /// flag-shaped field with no matching capability is skipped. Flag values
    /// must be booleans.
    pub fn from_record(record: &Map<String, Value>) -> Result<PermissionSet, DomainError> {
        let mut set = PermissionSet::new();
        for (key, value) in record {
            if !is_flag_name(key) {
                continue;
            }
            let Ok(capability) = key.parse::<Capability>() else {
                tracing::warn!(flag = %key, "ignoring unknown capability flag on role record");
                continue;
            };
            let granted = value
                .as_bool()
                .ok_or_else(|| DomainError::validation(format!("flag '{key}' is not a boolean")))?;
            set.set(capability, granted);
        }
        Ok(set)
    }
}

impl FromIterator<(Capability, bool)> for PermissionSet {
    fn from_iter<T: IntoIterator<Item = (Capability, bool)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl From<RoleFlags> for PermissionSet {
    fn from(flags: RoleFlags) -> Self {
        Capability::ALL.iter().map(|c| (*c, flags.get(*c))).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn arb_set() -> impl Strategy<Value = PermissionSet> {
        proptest::collection::btree_map(
            proptest::sample::select(Capability::ALL.to_vec()),
            any::<bool>(),
            0..8,
        )
        .prop_map(PermissionSet)
    }

    #[test]
    fn tokens_roundtrip_and_have_flag_shape() {
        for capability in Capability::ALL {
            assert!(is_flag_name(capability.as_str()), "{capability}");
            assert_eq!(capability.as_str().parse::<Capability>().unwrap(), *capability);
        }
    }

    #[test]
    fn flag_shape_excludes_identity_fields() {
        assert!(is_flag_name("VIEW_PROJECT"));
        assert!(is_flag_name("ADD_USER_TO_PROJECT"));
        assert!(!is_flag_name("id"));
        assert!(!is_flag_name("organization_id"));
        assert!(!is_flag_name("createdAt"));
        assert!(!is_flag_name("ADMIN"));
        assert!(!is_flag_name("VIEW_"));
        assert!(!is_flag_name("View_Project"));
    }

    #[test]
    fn serializes_with_uppercase_keys() {
        let set = PermissionSet::new()
            .grant(Capability::ViewProject)
            .merge(&[(Capability::EditProject, false)].into_iter().collect());
        let json = serde_json::to_value(&set).unwrap();
        assert_eq!(json, json!({ "VIEW_PROJECT": true, "EDIT_PROJECT": false }));

        let back: PermissionSet = serde_json::from_value(json).unwrap();
        assert_eq!(back, set);
    }

    #[test]
    fn merge_treats_missing_keys_as_false() {
        let old: PermissionSet = [(Capability::ViewProject, true)].into_iter().collect();
        let new: PermissionSet = [(Capability::ViewProject, false), (Capability::CreateCard, true)]
            .into_iter()
            .collect();

        let merged = old.merge(&new);
        assert!(merged.get(Capability::ViewProject));
        assert!(merged.get(Capability::CreateCard));
        assert!(!merged.get(Capability::DeleteProject));
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn merge_all_of_nothing_is_empty() {
        assert!(PermissionSet::merge_all(std::iter::empty()).is_empty());
    }

    #[test]
    fn owner_grants_everything() {
        let owner = PermissionSet::owner();
        assert_eq!(owner.granted().count(), Capability::ALL.len());
    }

    #[test]
    fn from_record_picks_only_flag_fields() {
        let record = json!({
            "id": "0191d3c4-0000-7000-8000-000000000001",
            "name": "Reviewer",
            "organization_id": null,
            "created_at": "2024-01-01T00:00:00Z",
            "VIEW_PROJECT": true,
            "EDIT_PROJECT": false,
            "ARCHIVE_UNIVERSE": true,
        });
        let set = PermissionSet::from_record(record.as_object().unwrap()).unwrap();

        let keys: Vec<_> = set.iter().map(|(c, _)| c).collect();
        assert_eq!(keys, vec![Capability::ViewProject, Capability::EditProject]);
        assert!(set.get(Capability::ViewProject));
        assert!(!set.get(Capability::EditProject));
    }

    #[test]
    fn from_record_rejects_non_boolean_flag() {
        let record = json!({ "VIEW_PROJECT": "yes" });
        let err = PermissionSet::from_record(record.as_object().unwrap()).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    proptest! {
        #[test]
        fn merge_is_commutative(a in arb_set(), b in arb_set()) {
            prop_assert_eq!(a.merge(&b), b.merge(&a));
        }

        #[test]
        fn merge_is_associative(a in arb_set(), b in arb_set(), c in arb_set()) {
            prop_assert_eq!(a.merge(&b.merge(&c)), a.merge(&b).merge(&c));
        }

        #[test]
        fn merge_is_keywise_or(a in arb_set(), b in arb_set()) {
            let merged = a.merge(&b);
            for capability in Capability::ALL {
                prop_assert_eq!(merged.get(*capability), a.get(*capability) || b.get(*capability));
            }
        }

        #[test]
        fn merge_never_revokes(a in arb_set(), b in arb_set()) {
            let merged = a.merge(&b);
            for capability in a.granted() {
                prop_assert!(merged.get(capability));
            }
        }
    }
}
