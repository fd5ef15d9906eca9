use std::sync::Arc;

use common::EntityId;
use criterion::{Criterion, criterion_group, criterion_main};
use domain::{AuditAction, AuditLog, Task};
use storage::{InMemoryRepository, Repository};
use transaction::TransactionBuilder;

#[derive(Debug, Clone)]
struct BenchFailure;

impl std::fmt::Display for BenchFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "bench transaction failed")
    }
}

fn new_task(user: EntityId) -> Task {
    Task::new(EntityId::new(), EntityId::new(), "Bench task", "", user).unwrap()
}

fn bench_commit(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let tasks: Arc<dyn Repository<Task>> = Arc::new(InMemoryRepository::new());
    let logs: Arc<dyn Repository<AuditLog>> = Arc::new(InMemoryRepository::new());
    let user = EntityId::new();

    c.bench_function("transaction/create_with_audit", |b| {
        b.iter(|| {
            rt.block_on(async {
                let task = new_task(user);
                let mut tx = TransactionBuilder::new("bench");
                tx.create(&tasks, task.clone());
                tx.audit(&logs, AuditLog::of(&task, AuditAction::Created, user));
                tx.build(BenchFailure).run().await.unwrap();
            });
        });
    });
}

fn bench_rollback(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let tasks: Arc<dyn Repository<Task>> = Arc::new(InMemoryRepository::new());
    let failing_logs = InMemoryRepository::<AuditLog>::new();
    failing_logs.set_fail_on_create(true);
    let logs: Arc<dyn Repository<AuditLog>> = Arc::new(failing_logs);
    let user = EntityId::new();

    c.bench_function("transaction/create_with_failed_audit", |b| {
        b.iter(|| {
            rt.block_on(async {
                let task = new_task(user);
                let mut tx = TransactionBuilder::new("bench");
                tx.create(&tasks, task.clone());
                tx.audit(&logs, AuditLog::of(&task, AuditAction::Created, user));
                tx.build(BenchFailure).run().await.unwrap_err();
            });
        });
    });
}

criterion_group!(benches, bench_commit, bench_rollback);
criterion_main!(benches);
