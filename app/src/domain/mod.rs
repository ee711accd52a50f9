//! Domain Layer
//!
//! Contains all domain entities and core abstractions.

mod entity;
mod tree;
mod member;
mod relationship;
mod life_event;
mod media;
mod location;
mod file_id;

pub use entity::{Entity, DomainError, DomainResult};
pub use tree::FamilyTree;
pub use member::{FamilyMember, Gender};
pub use relationship::{Relationship, RelationshipKind};
pub use life_event::{LifeEvent, LifeEventKind};
pub use media::{Media, MediaKind};
pub use location::{Address, GeocodedLocation};
pub use file_id::{FileFingerprint, FileIdentifier};
