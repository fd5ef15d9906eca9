//! Repository backed by one JSON document file per collection.

use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::repository::rules;
use crate::{Entity, EntityId, Repository, Result};

/// Stores a whole collection as a JSON array in `<data_dir>/<collection>.json`.
///
/// Every write reads the file, applies the change and rewrites it through a
/// temporary file followed by a rename, so a failed write leaves the previous
/// contents in place. A missing file is an empty collection.
///
/// Writes from clones of the same repository are serialized by an internal
/// mutex. Two repositories pointed at the same file are not coordinated.
#[derive(Debug)]
pub struct JsonFileRepository<E> {
    path: PathBuf,
    lock: Arc<Mutex<()>>,
    _entity: PhantomData<fn() -> E>,
}

impl<E> Clone for JsonFileRepository<E> {
    fn clone(&self) -> Self {
        Self {
            path: self.path.clone(),
            lock: Arc::clone(&self.lock),
            _entity: PhantomData,
        }
    }
}

impl<E: Entity> JsonFileRepository<E> {
    /// Creates a repository for `E` under `data_dir`.
    ///
    /// The directory is created lazily on the first write.
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        let path = data_dir
            .as_ref()
            .join(format!("{}.json", E::collection()));
        Self {
            path,
            lock: Arc::new(Mutex::new(())),
            _entity: PhantomData,
        }
    }

    /// Returns the path of the collection file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<Vec<E>> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) if bytes.is_empty() => Ok(Vec::new()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, entities: &[E]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let bytes = serde_json::to_vec_pretty(entities)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        tracing::debug!(
            collection = E::collection(),
            count = entities.len(),
            "collection file written"
        );
        Ok(())
    }

    async fn modify<T>(&self, change: impl FnOnce(&mut Vec<E>) -> Result<T>) -> Result<T> {
        let _guard = self.lock.lock().await;
        let mut entities = self.load().await?;
        let out = change(&mut entities)?;
        self.save(&entities).await?;
        Ok(out)
    }
}

#[async_trait]
impl<E: Entity> Repository<E> for JsonFileRepository<E> {
    async fn create(&self, entity: E) -> Result<E> {
        self.modify(|entities| rules::create(entities, entity)).await
    }

    async fn update(&self, entity: E) -> Result<E> {
        self.modify(|entities| rules::update(entities, entity)).await
    }

    async fn delete(&self, id: EntityId) -> Result<()> {
        self.modify(|entities| rules::delete(entities, id)).await
    }

    async fn restore(&self, entity: E) -> Result<E> {
        self.modify(|entities| rules::restore(entities, entity)).await
    }

    async fn find_by_id(&self, id: EntityId) -> Result<Option<E>> {
        let _guard = self.lock.lock().await;
        Ok(self.load().await?.into_iter().find(|e| e.id() == id))
    }

    async fn find_all(&self) -> Result<Vec<E>> {
        let _guard = self.lock.lock().await;
        self.load().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::tests::Note;
    use crate::{RepositoryError, Version};

    #[tokio::test]
    async fn test_missing_file_is_empty_collection() {
        let dir = tempfile::tempdir().unwrap();
        let repo: JsonFileRepository<Note> = JsonFileRepository::new(dir.path());

        assert!(repo.find_all().await.unwrap().is_empty());
        assert!(!repo.path().exists());
    }

    #[tokio::test]
    async fn test_writes_persist_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let repo = JsonFileRepository::new(dir.path());
        let created = repo.create(Note::new("persisted")).await.unwrap();

        let reopened: JsonFileRepository<Note> = JsonFileRepository::new(dir.path());
        let loaded = reopened.find_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(loaded, created);
        assert_eq!(loaded.version, Version::first());
        assert!(dir.path().join("notes.json").exists());
    }

    #[tokio::test]
    async fn test_failed_write_leaves_file_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let repo = JsonFileRepository::new(dir.path());
        let created = repo.create(Note::new("original")).await.unwrap();
        let before = std::fs::read(repo.path()).unwrap();

        let result = repo.create(created.clone()).await;
        assert!(matches!(result, Err(RepositoryError::AlreadyExists { .. })));
        assert_eq!(std::fs::read(repo.path()).unwrap(), before);
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let dir = tempfile::tempdir().unwrap();
        let repo = JsonFileRepository::new(dir.path());
        let mut note = repo.create(Note::new("v1")).await.unwrap();
        note.text = "v2".to_string();

        let updated = repo.update(note).await.unwrap();
        assert_eq!(updated.version, Version::new(2));

        repo.delete(updated.id).await.unwrap();
        assert!(repo.find_all().await.unwrap().is_empty());
        assert!(repo.delete(updated.id).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_corrupt_file_reports_serialization_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("notes.json"), b"{ not json").unwrap();
        let repo: JsonFileRepository<Note> = JsonFileRepository::new(dir.path());

        let result = repo.find_all().await;
        assert!(matches!(result, Err(RepositoryError::Serialization(_))));
    }
}
