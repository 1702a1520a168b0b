//! Infrastructure layer: storage adapters for roles, resources and memberships.

pub mod access_store;


pub use access_store::{InMemoryAccessStore, MembershipStore, MembershipStoreError};
#[cfg(feature = "postgres")]
pub use access_store::PostgresAccessStore;
