//! Repository Layer
//!
//! Data access abstractions and implementations.

mod traits;
pub(crate) mod db;
mod observe;
mod tree_repo;
mod member_repo;
mod life_event_repo;
mod media_repo;
pub mod relationship;


pub use traits::{Repository, SearchableRepository};
pub use db::{init_db, DbState, Table, SCHEMA_VERSION};
pub use tree_repo::TreeRepository;
pub use member_repo::MemberRepository;
pub use life_event_repo::LifeEventRepository;
pub use media_repo::MediaRepository;
pub use relationship::{RelationshipBatchOperations, RelationshipQueryOperations, RelationshipRepository};
