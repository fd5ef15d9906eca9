use std::sync::Arc;

use async_trait::async_trait;

use crate::{Entity, EntityId, Result};

/// Single-purpose storage collaborator for one entity type.
///
/// Each write is atomic on its own: when a call returns an error it has left
/// the collection unchanged.
#[async_trait]
pub trait Repository<E: Entity>: Send + Sync {
    /// Stores a new entity and returns it as stored (version stamped to 1).
    ///
    /// Fails with `AlreadyExists` if the id is taken.
    async fn create(&self, entity: E) -> Result<E>;

    /// Replaces a stored entity and returns it with its version bumped.
    ///
    /// Fails with `NotFound` if the id is unknown and with `VersionConflict`
    /// if `entity.version()` is not the currently stored version.
    async fn update(&self, entity: E) -> Result<E>;

    /// Removes an entity. Fails with `NotFound` if the id is unknown.
    async fn delete(&self, id: EntityId) -> Result<()>;

    /// Puts back a previously deleted entity exactly as it was captured,
    /// version included, so stale copies are still rejected by `update`.
    ///
    /// Fails with `AlreadyExists` if the id is taken.
    async fn restore(&self, entity: E) -> Result<E>;

    async fn find_by_id(&self, id: EntityId) -> Result<Option<E>>;

    /// Returns every entity in insertion order. A restored entity counts as
    /// inserted when it was restored.
    async fn find_all(&self) -> Result<Vec<E>>;
}

#[async_trait]
impl<E, T> Repository<E> for Arc<T>
where
    E: Entity,
    T: Repository<E> + ?Sized,
{
    async fn create(&self, entity: E) -> Result<E> {
        (**self).create(entity).await
    }

    async fn update(&self, entity: E) -> Result<E> {
        (**self).update(entity).await
    }

    async fn delete(&self, id: EntityId) -> Result<()> {
        (**self).delete(id).await
    }

    async fn restore(&self, entity: E) -> Result<E> {
        (**self).restore(entity).await
    }

    async fn find_by_id(&self, id: EntityId) -> Result<Option<E>> {
        (**self).find_by_id(id).await
    }

    async fn find_all(&self) -> Result<Vec<E>> {
        (**self).find_all().await
    }
}

/// Applies the repository write rules to an in-memory list of entities.
///
/// Shared by the backends so they agree on `AlreadyExists`, `NotFound` and
/// `VersionConflict` semantics.
pub(crate) mod rules {
    use crate::{Entity, EntityId, RepositoryError, Result, Version};

    pub fn create<E: Entity>(entities: &mut Vec<E>, mut entity: E) -> Result<E> {
        entity.set_version(Version::first());
        insert(entities, entity)
    }

    /// Like `create`, but keeps the version the entity carries. A never
    /// stored entity (version 0) is stamped like a create.
    pub fn restore<E: Entity>(entities: &mut Vec<E>, mut entity: E) -> Result<E> {
        if entity.version() == Version::initial() {
            entity.set_version(Version::first());
        }
        insert(entities, entity)
    }

    fn insert<E: Entity>(entities: &mut Vec<E>, entity: E) -> Result<E> {
        let id = entity.id();
        if entities.iter().any(|e| e.id() == id) {
            return Err(RepositoryError::AlreadyExists {
                collection: E::collection(),
                id,
            });
        }
        entities.push(entity.clone());
        Ok(entity)
    }

    pub fn update<E: Entity>(entities: &mut [E], mut entity: E) -> Result<E> {
        let id = entity.id();
        let stored = entities
            .iter_mut()
            .find(|e| e.id() == id)
            .ok_or(RepositoryError::NotFound {
                collection: E::collection(),
                id,
            })?;

        if stored.version() != entity.version() {
            return Err(RepositoryError::VersionConflict {
                collection: E::collection(),
                id,
                expected: entity.version(),
                actual: stored.version(),
            });
        }

        entity.set_version(stored.version().next());
        *stored = entity.clone();
        Ok(entity)
    }

    pub fn delete<E: Entity>(entities: &mut Vec<E>, id: EntityId) -> Result<()> {
        let position = entities
            .iter()
            .position(|e| e.id() == id)
            .ok_or(RepositoryError::NotFound {
                collection: E::collection(),
                id,
            })?;
        entities.remove(position);
        Ok(())
    }
}
