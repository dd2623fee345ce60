//! Persisted record types, one struct per table.
//!
//! These carry the internal linkage fields (`owner_id`, `project_id`,
//! `category_id`); the server's wire conversion strips them before
//! anything leaves the process.

#[derive(Debug, Clone)]
pub struct UserRecord {
    pub id: i64,
    pub username: String,
    pub token: String,
}

#[derive(Debug, Clone)]
pub struct ProjectRecord {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub owner_id: i64,
}

#[derive(Debug, Clone)]
pub struct CategoryRecord {
    pub id: i64,
    pub title: String,
    pub project_id: i64,
}

#[derive(Debug, Clone)]
pub struct TaskRecord {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub category_id: i64,
    /// Resolved transitively through the category on every load.
    pub project_id: i64,
}
