//! Storage adapters for the access model.
//!
//! The read side implements `boardwise_auth::AccessStore`; the write side
//! (granting and revoking membership edges) is [`MembershipStore`].

pub mod in_memory;
pub mod membership;
#[cfg(feature = "postgres")]
pub mod postgres;

pub use in_memory::InMemoryAccessStore;
pub use membership::{MembershipStore, MembershipStoreError};
#[cfg(feature = "postgres")]
pub use postgres::PostgresAccessStore;
