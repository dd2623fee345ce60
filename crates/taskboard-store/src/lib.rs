//! Persistence layer for the task board.
//!
//! [`TaskStore`] wraps a single SQLite connection behind a mutex and
//! exposes it to async handlers through [`TaskStore::with_db`], which
//! runs the closure on the blocking pool. Handlers submit one closure
//! per request; the mutex serializes access so each closure sees a
//! consistent database.

pub mod db;
pub mod models;
pub mod reconcile;

use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;
use taskboard_protocol::DomainError;

pub use db::TaskDb;
pub use models::{CategoryRecord, ProjectRecord, TaskRecord, UserRecord};
pub use reconcile::AssociationDiff;

#[derive(Clone)]
pub struct TaskStore {
    db: Arc<Mutex<TaskDb>>,
}

impl TaskStore {
    pub fn open(path: &Path) -> Result<Self, rusqlite::Error> {
        let db = TaskDb::open(path)?;
        Ok(Self {
            db: Arc::new(Mutex::new(db)),
        })
    }

    pub fn open_in_memory() -> Result<Self, rusqlite::Error> {
        let db = TaskDb::open_in_memory()?;
        Ok(Self {
            db: Arc::new(Mutex::new(db)),
        })
    }

    /// Run a closure against the database on the blocking pool.
    pub async fn with_db<F, R>(&self, f: F) -> Result<R, DomainError>
    where
        F: FnOnce(&mut TaskDb) -> Result<R, DomainError> + Send + 'static,
        R: Send + 'static,
    {
        let db = Arc::clone(&self.db);
        tokio::task::spawn_blocking(move || {
            let mut db = db.lock();
            f(&mut db)
        })
        .await
        .map_err(|e| DomainError::Store(format!("blocking task failed: {e}")))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> TaskDb {
        TaskDb::open_in_memory().unwrap()
    }

    #[test]
    fn user_roundtrip_and_token_lookup() {
        let db = store();
        let user = db.create_user("alice", "digest", "tok-1").unwrap();
        assert!(user.id > 0);

        let by_token = db.find_user_by_token("tok-1").unwrap().unwrap();
        assert_eq!(by_token.id, user.id);
        assert_eq!(by_token.username, "alice");

        db.update_user_token(user.id, "tok-2").unwrap();
        assert!(db.find_user_by_token("tok-1").unwrap().is_none());
        assert!(db.find_user_by_token("tok-2").unwrap().is_some());
    }

    #[test]
    fn credentials_require_exact_digest() {
        let db = store();
        db.create_user("bob", "digest-a", "t").unwrap();
        assert!(db.find_user_by_credentials("bob", "digest-a").unwrap().is_some());
        assert!(db.find_user_by_credentials("bob", "digest-b").unwrap().is_none());
    }

    #[test]
    fn membership_gates_project_listing() {
        let db = store();
        let owner = db.create_user("owner", "d", "t1").unwrap();
        let other = db.create_user("other", "d", "t2").unwrap();
        let project = db.create_project("Board", "The shared board", owner.id).unwrap();
        db.create_membership(project.id, owner.id).unwrap();

        assert!(db.membership_exists(owner.id, project.id).unwrap());
        assert!(!db.membership_exists(other.id, project.id).unwrap());
        assert_eq!(db.member_projects(owner.id).unwrap().len(), 1);
        assert!(db.member_projects(other.id).unwrap().is_empty());
    }

    #[test]
    fn task_load_resolves_project_through_category() {
        let db = store();
        let owner = db.create_user("owner", "d", "t").unwrap();
        let project = db.create_project("P", "descr", owner.id).unwrap();
        let cat = db.create_category(project.id, "Todo").unwrap();
        let task = db.create_task(&cat, "Ship it", "").unwrap();

        let loaded = db.find_task(task.id).unwrap().unwrap();
        assert_eq!(loaded.category_id, cat.id);
        assert_eq!(loaded.project_id, project.id);

        let cat2 = db.create_category(project.id, "Done").unwrap();
        db.move_task(task.id, cat2.id).unwrap();
        let moved = db.find_task(task.id).unwrap().unwrap();
        assert_eq!(moved.category_id, cat2.id);
        assert_eq!(moved.project_id, project.id);
    }

    #[test]
    fn project_delete_cascades_to_tasks_and_memberships() {
        let db = store();
        let owner = db.create_user("owner", "d", "t").unwrap();
        let project = db.create_project("P", "descr", owner.id).unwrap();
        db.create_membership(project.id, owner.id).unwrap();
        let cat = db.create_category(project.id, "Todo").unwrap();
        let task = db.create_task(&cat, "T", "").unwrap();

        db.destroy_project(project.id).unwrap();
        assert!(db.find_category(cat.id).unwrap().is_none());
        assert!(db.find_task(task.id).unwrap().is_none());
        assert!(!db.membership_exists(owner.id, project.id).unwrap());
    }

    #[test]
    fn edit_task_reconciles_associations() {
        let mut db = store();
        let owner = db.create_user("owner", "d", "t0").unwrap();
        let u1 = db.create_user("u1", "d", "t1").unwrap();
        let u2 = db.create_user("u2", "d", "t2").unwrap();
        let project = db.create_project("P", "descr", owner.id).unwrap();
        let cat = db.create_category(project.id, "Todo").unwrap();
        let task = db.create_task(&cat, "T", "").unwrap();

        db.edit_task(task.id, "T", "", &[u1.id, u2.id]).unwrap();
        let users = db.task_users(task.id).unwrap();
        assert_eq!(users.len(), 2);

        // shrink to one, with an unknown id mixed in
        db.edit_task(task.id, "T2", "changed", &[u2.id, 999_999]).unwrap();
        let users = db.task_users(task.id).unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].id, u2.id);

        let edited = db.find_task(task.id).unwrap().unwrap();
        assert_eq!(edited.title, "T2");
        assert_eq!(edited.description, "changed");
    }

    #[test]
    fn edit_task_is_idempotent() {
        let mut db = store();
        let owner = db.create_user("owner", "d", "t0").unwrap();
        let u1 = db.create_user("u1", "d", "t1").unwrap();
        let project = db.create_project("P", "descr", owner.id).unwrap();
        let cat = db.create_category(project.id, "Todo").unwrap();
        let task = db.create_task(&cat, "T", "").unwrap();

        db.edit_task(task.id, "T", "x", &[u1.id]).unwrap();
        db.edit_task(task.id, "T", "x", &[u1.id]).unwrap();
        let users = db.task_users(task.id).unwrap();
        assert_eq!(users.len(), 1);
    }

    #[test]
    fn failed_edit_leaves_no_partial_state() {
        let mut db = store();
        let owner = db.create_user("owner", "d", "t0").unwrap();
        let u1 = db.create_user("u1", "d", "t1").unwrap();
        let project = db.create_project("P", "descr", owner.id).unwrap();
        let cat = db.create_category(project.id, "Todo").unwrap();
        let task = db.create_task(&cat, "Keep", "before").unwrap();
        db.edit_task(task.id, "Keep", "before", &[u1.id]).unwrap();

        // a ghost task id slides past the scalar update (zero rows
        // matched) and fails on the association insert, which violates
        // the task_users foreign key mid-transaction
        let ghost = task.id + 100;
        let err = db.edit_task(ghost, "X", "y", &[u1.id]).unwrap_err();
        assert!(matches!(err, DomainError::Store(_)));

        // the aborted transaction left nothing behind
        assert!(db.task_users(ghost).unwrap().is_empty());
        let kept = db.find_task(task.id).unwrap().unwrap();
        assert_eq!(kept.title, "Keep");
        assert_eq!(kept.description, "before");
        let users = db.task_users(task.id).unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].id, u1.id);

        // the connection is still usable after the rollback
        db.edit_task(task.id, "Keep2", "after", &[]).unwrap();
        assert!(db.task_users(task.id).unwrap().is_empty());
    }

    #[tokio::test]
    async fn with_db_runs_closures_against_shared_state() {
        let store = TaskStore::open_in_memory().unwrap();
        let id = store
            .with_db(|db| db.create_user("async", "d", "t").map(|u| u.id))
            .await
            .unwrap();
        let found = store
            .with_db(move |db| db.find_user(id))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.username, "async");
    }
}
