//! Wire conversion — strips internal linkage fields before records
//! leave the process. Callers never see `owner_id`, `project_id`, or
//! `category_id`; relationships are expressed through the method
//! surface instead.

use serde_json::{Value, json};
use taskboard_store::{CategoryRecord, ProjectRecord, TaskRecord, UserRecord};

pub fn user_to_wire(user: &UserRecord) -> Value {
    json!({ "id": user.id, "username": user.username })
}

pub fn project_to_wire(project: &ProjectRecord) -> Value {
    json!({
        "id": project.id,
        "title": project.title,
        "description": project.description,
    })
}

/// `tasks` is always present and always `[]`; no operation on this
/// surface nests tasks inside a category.
pub fn category_to_wire(category: &CategoryRecord) -> Value {
    json!({ "id": category.id, "title": category.title, "tasks": [] })
}

/// `associatedUsers` is always present, `[]` when none are loaded.
pub fn task_to_wire(task: &TaskRecord, users: &[UserRecord]) -> Value {
    json!({
        "id": task.id,
        "title": task.title,
        "description": task.description,
        "associatedUsers": users.iter().map(user_to_wire).collect::<Vec<_>>(),
    })
}
