//! Repository Layer - Core Traits
//!
//! Storage contracts shared by every family-tree repository.

use async_trait::async_trait;
use crate::domain::{DomainError, DomainResult, Entity};

/// CRUD over one entity type
///
/// IDs are assigned by the store: `create` ignores the incoming ID and
/// returns the entity with the stored one.
#[async_trait]
pub trait Repository<T: Entity>: Send + Sync {
    async fn create(&self, entity: &T) -> DomainResult<T>;

    /// `None` when no row has this ID
    async fn find_by_id(&self, id: T::Id) -> DomainResult<Option<T>>;

    async fn list(&self) -> DomainResult<Vec<T>>;

    /// NotFound if the entity does not exist
    async fn update(&self, entity: &T) -> DomainResult<T>;

    /// Deleting a missing entity is not an error
    async fn delete(&self, id: T::Id) -> DomainResult<()>;

    /// Like `find_by_id`, but a missing row is NotFound
    async fn get(&self, id: T::Id) -> DomainResult<T>
    where
        T::Id: std::fmt::Display,
    {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("{} {}", entity_name::<T>(), id)))
    }
}

/// Free-text lookup
#[async_trait]
pub trait SearchableRepository<T: Entity>: Repository<T> {
    async fn search(&self, query: &str) -> DomainResult<Vec<T>>;
}

/// Last path segment of the type name, e.g. "FamilyMember"
fn entity_name<T>() -> &'static str {
    let full = std::any::type_name::<T>();
    full.rsplit("::").next().unwrap_or(full)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::FamilyTree;

    #[test]
    fn test_entity_name() {
        assert_eq!(entity_name::<FamilyTree>(), "FamilyTree");
    }
}
