//! Both backends must agree on the repository write rules.

use serde::{Deserialize, Serialize};
use storage::{
    Entity, EntityId, InMemoryRepository, JsonFileRepository, Repository, RepositoryError, Version,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Ticket {
    id: EntityId,
    version: Version,
    title: String,
}

impl Entity for Ticket {
    fn collection() -> &'static str {
        "tickets"
    }

    fn id(&self) -> EntityId {
        self.id
    }

    fn version(&self) -> Version {
        self.version
    }

    fn set_version(&mut self, version: Version) {
        self.version = version;
    }
}

fn ticket(title: &str) -> Ticket {
    Ticket {
        id: EntityId::new(),
        version: Version::initial(),
        title: title.to_string(),
    }
}

async fn exercise(repo: &dyn Repository<Ticket>) {
    let first = repo.create(ticket("first")).await.unwrap();
    let second = repo.create(ticket("second")).await.unwrap();
    assert_eq!(first.version, Version::first());

    // Insertion order is preserved.
    let all = repo.find_all().await.unwrap();
    assert_eq!(all, vec![first.clone(), second.clone()]);

    let mut renamed = first.clone();
    renamed.title = "renamed".to_string();
    let renamed = repo.update(renamed).await.unwrap();
    assert_eq!(renamed.version, Version::new(2));

    // The pre-update copy is now stale.
    let stale = repo.update(first.clone()).await;
    assert!(matches!(stale, Err(RepositoryError::VersionConflict { .. })));

    // Re-creating a deleted entity is allowed and restarts its version.
    repo.delete(second.id).await.unwrap();
    assert!(repo.find_by_id(second.id).await.unwrap().is_none());
    let recreated = repo.create(second.clone()).await.unwrap();
    assert_eq!(recreated.title, "second");
    assert_eq!(recreated.version, Version::first());

    // Restoring keeps the captured version, so the stale copy stays stale.
    repo.delete(renamed.id).await.unwrap();
    let restored = repo.restore(renamed.clone()).await.unwrap();
    assert_eq!(restored, renamed);
    assert_eq!(
        repo.find_by_id(renamed.id).await.unwrap().unwrap().version,
        Version::new(2)
    );
    let stale = repo.update(first.clone()).await;
    assert!(matches!(
        stale,
        Err(RepositoryError::VersionConflict { expected, actual, .. })
            if expected == Version::first() && actual == Version::new(2)
    ));
    let again = repo.restore(renamed.clone()).await;
    assert!(matches!(again, Err(RepositoryError::AlreadyExists { .. })));

    assert!(repo.delete(EntityId::new()).await.unwrap_err().is_not_found());
    assert_eq!(repo.find_all().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_in_memory_repository_contract() {
    let repo = InMemoryRepository::new();
    exercise(&repo).await;
}

#[tokio::test]
async fn test_json_file_repository_contract() {
    let dir = tempfile::tempdir().unwrap();
    let repo = JsonFileRepository::new(dir.path());
    exercise(&repo).await;
}
