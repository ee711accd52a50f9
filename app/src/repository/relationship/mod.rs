//! Relationship Repository Module
//!
//! This module provides relationship repository functionality split into specialized sub-modules:
//! - relationship_repo: Core CRUD operations and per-member reads/streams
//! - relationship_queries: Derived ID sets, counts, existence checks
//! - relationship_batch: Transactional multi-record writes

mod relationship_repo;
mod relationship_queries;
mod relationship_batch;

pub use relationship_repo::RelationshipRepository;

// Re-export all operation traits so they can be used by importing RelationshipRepository
pub use relationship_queries::RelationshipQueryOperations;
pub use relationship_batch::RelationshipBatchOperations;
