//! Access guards and checked entity lookup.
//!
//! Sync functions over `&TaskDb`, composed inside `with_db` closures
//! so each check-then-act sequence runs under the store lock.
//!
//! The failure mapping is deliberate and asymmetric:
//! - a missing *user* row for an authenticated principal means the
//!   session is stale, so `Authorization`;
//! - a missing *project* on a direct id lookup is `NotFound`;
//! - a missing category or task is reported as `AccessDenied`, same as
//!   a membership failure, so callers cannot probe which ids exist.

use taskboard_protocol::{DomainError, SessionContext};
use taskboard_store::{CategoryRecord, ProjectRecord, TaskDb, TaskRecord, UserRecord};

/// The authenticated principal id, or `Authorization` if the session
/// never authenticated.
pub fn require_principal(session: &SessionContext) -> Result<i64, DomainError> {
    session.principal().ok_or(DomainError::Authorization)
}

/// Membership row exists, or `AccessDenied`.
pub fn assert_member(db: &TaskDb, user_id: i64, project_id: i64) -> Result<(), DomainError> {
    if db.membership_exists(user_id, project_id)? {
        Ok(())
    } else {
        Err(DomainError::AccessDenied)
    }
}

pub fn user_by_id(db: &TaskDb, id: i64) -> Result<UserRecord, DomainError> {
    db.find_user(id)?.ok_or(DomainError::Authorization)
}

pub fn project_by_id(db: &TaskDb, id: i64) -> Result<ProjectRecord, DomainError> {
    db.find_project(id)?.ok_or(DomainError::NotFound)
}

/// Resolve a category and verify the caller belongs to its project.
pub fn category_checked(
    db: &TaskDb,
    user_id: i64,
    category_id: i64,
) -> Result<CategoryRecord, DomainError> {
    let category = db.find_category(category_id)?.ok_or(DomainError::AccessDenied)?;
    assert_member(db, user_id, category.project_id)?;
    Ok(category)
}

/// Resolve a task (project derived through its category on this very
/// load) and verify the caller belongs to that project.
pub fn task_checked(db: &TaskDb, user_id: i64, task_id: i64) -> Result<TaskRecord, DomainError> {
    let task = db.find_task(task_id)?.ok_or(DomainError::AccessDenied)?;
    assert_member(db, user_id, task.project_id)?;
    Ok(task)
}
