use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::repository::rules;
use crate::{Entity, EntityId, Repository, RepositoryError, Result};

#[derive(Debug, Default)]
struct FailureSwitches {
    create: AtomicBool,
    update: AtomicBool,
    delete: AtomicBool,
}

/// In-memory repository.
///
/// Clones share the same underlying collection, so a test can keep a handle
/// for assertions while the code under test owns another. Each write can be
/// switched to fail with [`RepositoryError::Unavailable`] to exercise
/// compensation paths.
#[derive(Debug)]
pub struct InMemoryRepository<E> {
    entities: Arc<RwLock<Vec<E>>>,
    failures: Arc<FailureSwitches>,
}

impl<E> Clone for InMemoryRepository<E> {
    fn clone(&self) -> Self {
        Self {
            entities: Arc::clone(&self.entities),
            failures: Arc::clone(&self.failures),
        }
    }
}

impl<E> Default for InMemoryRepository<E> {
    fn default() -> Self {
        Self {
            entities: Arc::new(RwLock::new(Vec::new())),
            failures: Arc::new(FailureSwitches::default()),
        }
    }
}

impl<E: Entity> InMemoryRepository<E> {
    /// Creates an empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent `create` and `restore` call fail.
    pub fn set_fail_on_create(&self, fail: bool) {
        self.failures.create.store(fail, Ordering::SeqCst);
    }

    /// Makes every subsequent `update` call fail.
    pub fn set_fail_on_update(&self, fail: bool) {
        self.failures.update.store(fail, Ordering::SeqCst);
    }

    /// Makes every subsequent `delete` call fail.
    pub fn set_fail_on_delete(&self, fail: bool) {
        self.failures.delete.store(fail, Ordering::SeqCst);
    }

    /// Returns the number of stored entities.
    pub async fn len(&self) -> usize {
        self.entities.read().await.len()
    }

    /// Returns true if the collection is empty.
    pub async fn is_empty(&self) -> bool {
        self.entities.read().await.is_empty()
    }

    fn check(switch: &AtomicBool, operation: &str) -> Result<()> {
        if switch.load(Ordering::SeqCst) {
            return Err(RepositoryError::Unavailable(format!(
                "{} {} rejected",
                E::collection(),
                operation
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl<E: Entity> Repository<E> for InMemoryRepository<E> {
    async fn create(&self, entity: E) -> Result<E> {
        Self::check(&self.failures.create, "create")?;
        let mut entities = self.entities.write().await;
        rules::create(&mut entities, entity)
    }

    async fn update(&self, entity: E) -> Result<E> {
        Self::check(&self.failures.update, "update")?;
        let mut entities = self.entities.write().await;
        rules::update(&mut entities, entity)
    }

    async fn delete(&self, id: EntityId) -> Result<()> {
        Self::check(&self.failures.delete, "delete")?;
        let mut entities = self.entities.write().await;
        rules::delete(&mut entities, id)
    }

    async fn restore(&self, entity: E) -> Result<E> {
        Self::check(&self.failures.create, "restore")?;
        let mut entities = self.entities.write().await;
        rules::restore(&mut entities, entity)
    }

    async fn find_by_id(&self, id: EntityId) -> Result<Option<E>> {
        let entities = self.entities.read().await;
        Ok(entities.iter().find(|e| e.id() == id).cloned())
    }

    async fn find_all(&self) -> Result<Vec<E>> {
        Ok(self.entities.read().await.clone())
    }
}
