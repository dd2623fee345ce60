//! SQLite-backed persistence (rusqlite is sync — callers drive it
//! through [`crate::TaskStore::with_db`] on the blocking pool).
//!
//! Every query maps storage failures into `DomainError::Store`; the
//! dispatcher reports those as INTERNAL_ERROR. Absence is expressed as
//! `Option`, never as an error — deciding what a missing row *means*
//! (NOT_FOUND vs ACCESS_DENIED vs AUTHORIZATION_ERROR) belongs to the
//! access layer, not the store.

use rusqlite::{Connection, OptionalExtension, params};
use taskboard_protocol::DomainError;

use crate::models::{CategoryRecord, ProjectRecord, TaskRecord, UserRecord};
use crate::reconcile::AssociationDiff;

pub struct TaskDb {
    conn: Connection,
}

fn sql(e: rusqlite::Error) -> DomainError {
    DomainError::Store(e.to_string())
}

fn now_ms() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}

impl TaskDb {
    pub fn open(path: &std::path::Path) -> Result<Self, rusqlite::Error> {
        if let Some(parent) = path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode = WAL; PRAGMA foreign_keys = ON;")?;
        let db = Self { conn };
        db.run_migrations()?;
        Ok(db)
    }

    /// In-memory database, used by tests.
    pub fn open_in_memory() -> Result<Self, rusqlite::Error> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        let db = Self { conn };
        db.run_migrations()?;
        Ok(db)
    }

    fn run_migrations(&self) -> Result<(), rusqlite::Error> {
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS users (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                username        TEXT NOT NULL UNIQUE,
                password_digest TEXT NOT NULL,
                token           TEXT NOT NULL,
                created_at      INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS projects (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                title       TEXT NOT NULL,
                description TEXT NOT NULL,
                owner_id    INTEGER NOT NULL REFERENCES users(id),
                created_at  INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS project_users (
                project_id  INTEGER NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
                user_id     INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                PRIMARY KEY (project_id, user_id)
            );

            CREATE TABLE IF NOT EXISTS categories (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                title       TEXT NOT NULL,
                project_id  INTEGER NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
                created_at  INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS tasks (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                title       TEXT NOT NULL,
                description TEXT NOT NULL,
                category_id INTEGER NOT NULL REFERENCES categories(id) ON DELETE CASCADE,
                created_at  INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS task_users (
                task_id     INTEGER NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
                user_id     INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                PRIMARY KEY (task_id, user_id)
            );

            CREATE INDEX IF NOT EXISTS idx_categories_project ON categories(project_id);
            CREATE INDEX IF NOT EXISTS idx_tasks_category ON tasks(category_id);
            CREATE INDEX IF NOT EXISTS idx_project_users_user ON project_users(user_id);
            ",
        )?;
        Ok(())
    }

    // ── Users ────────────────────────────────────────────────────────────

    pub fn create_user(
        &self,
        username: &str,
        password_digest: &str,
        token: &str,
    ) -> Result<UserRecord, DomainError> {
        self.conn
            .execute(
                "INSERT INTO users (username, password_digest, token, created_at) VALUES (?1, ?2, ?3, ?4)",
                params![username, password_digest, token, now_ms()],
            )
            .map_err(sql)?;
        Ok(UserRecord {
            id: self.conn.last_insert_rowid(),
            username: username.to_string(),
            token: token.to_string(),
        })
    }

    pub fn find_user(&self, id: i64) -> Result<Option<UserRecord>, DomainError> {
        self.conn
            .query_row(
                "SELECT id, username, token FROM users WHERE id = ?1",
                params![id],
                user_from_row,
            )
            .optional()
            .map_err(sql)
    }

    pub fn find_user_by_credentials(
        &self,
        username: &str,
        password_digest: &str,
    ) -> Result<Option<UserRecord>, DomainError> {
        self.conn
            .query_row(
                "SELECT id, username, token FROM users WHERE username = ?1 AND password_digest = ?2",
                params![username, password_digest],
                user_from_row,
            )
            .optional()
            .map_err(sql)
    }

    pub fn find_user_by_token(&self, token: &str) -> Result<Option<UserRecord>, DomainError> {
        self.conn
            .query_row(
                "SELECT id, username, token FROM users WHERE token = ?1",
                params![token],
                user_from_row,
            )
            .optional()
            .map_err(sql)
    }

    pub fn update_user_token(&self, id: i64, token: &str) -> Result<(), DomainError> {
        self.conn
            .execute("UPDATE users SET token = ?1 WHERE id = ?2", params![token, id])
            .map_err(sql)?;
        Ok(())
    }

    // ── Projects & membership ────────────────────────────────────────────

    pub fn create_project(
        &self,
        title: &str,
        description: &str,
        owner_id: i64,
    ) -> Result<ProjectRecord, DomainError> {
        self.conn
            .execute(
                "INSERT INTO projects (title, description, owner_id, created_at) VALUES (?1, ?2, ?3, ?4)",
                params![title, description, owner_id, now_ms()],
            )
            .map_err(sql)?;
        Ok(ProjectRecord {
            id: self.conn.last_insert_rowid(),
            title: title.to_string(),
            description: description.to_string(),
            owner_id,
        })
    }

    pub fn find_project(&self, id: i64) -> Result<Option<ProjectRecord>, DomainError> {
        self.conn
            .query_row(
                "SELECT id, title, description, owner_id FROM projects WHERE id = ?1",
                params![id],
                project_from_row,
            )
            .optional()
            .map_err(sql)
    }

    pub fn destroy_project(&self, id: i64) -> Result<(), DomainError> {
        self.conn
            .execute("DELETE FROM projects WHERE id = ?1", params![id])
            .map_err(sql)?;
        Ok(())
    }

    /// Projects the user belongs to via a membership row.
    pub fn member_projects(&self, user_id: i64) -> Result<Vec<ProjectRecord>, DomainError> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT p.id, p.title, p.description, p.owner_id
                 FROM projects p JOIN project_users pu ON pu.project_id = p.id
                 WHERE pu.user_id = ?1 ORDER BY p.id",
            )
            .map_err(sql)?;
        let rows = stmt
            .query_map(params![user_id], project_from_row)
            .map_err(sql)?;
        rows.collect::<Result<_, _>>().map_err(sql)
    }

    pub fn owned_projects(&self, user_id: i64) -> Result<Vec<ProjectRecord>, DomainError> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT id, title, description, owner_id FROM projects
                 WHERE owner_id = ?1 ORDER BY id",
            )
            .map_err(sql)?;
        let rows = stmt
            .query_map(params![user_id], project_from_row)
            .map_err(sql)?;
        rows.collect::<Result<_, _>>().map_err(sql)
    }

    pub fn create_membership(&self, project_id: i64, user_id: i64) -> Result<(), DomainError> {
        self.conn
            .execute(
                "INSERT OR IGNORE INTO project_users (project_id, user_id) VALUES (?1, ?2)",
                params![project_id, user_id],
            )
            .map_err(sql)?;
        Ok(())
    }

    pub fn membership_exists(&self, user_id: i64, project_id: i64) -> Result<bool, DomainError> {
        self.conn
            .query_row(
                "SELECT 1 FROM project_users WHERE user_id = ?1 AND project_id = ?2",
                params![user_id, project_id],
                |_| Ok(()),
            )
            .optional()
            .map(|row| row.is_some())
            .map_err(sql)
    }

    // ── Categories ───────────────────────────────────────────────────────

    pub fn create_category(
        &self,
        project_id: i64,
        title: &str,
    ) -> Result<CategoryRecord, DomainError> {
        self.conn
            .execute(
                "INSERT INTO categories (title, project_id, created_at) VALUES (?1, ?2, ?3)",
                params![title, project_id, now_ms()],
            )
            .map_err(sql)?;
        Ok(CategoryRecord {
            id: self.conn.last_insert_rowid(),
            title: title.to_string(),
            project_id,
        })
    }

    pub fn find_category(&self, id: i64) -> Result<Option<CategoryRecord>, DomainError> {
        self.conn
            .query_row(
                "SELECT id, title, project_id FROM categories WHERE id = ?1",
                params![id],
                category_from_row,
            )
            .optional()
            .map_err(sql)
    }

    pub fn categories_in_project(
        &self,
        project_id: i64,
    ) -> Result<Vec<CategoryRecord>, DomainError> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT id, title, project_id FROM categories
                 WHERE project_id = ?1 ORDER BY id",
            )
            .map_err(sql)?;
        let rows = stmt
            .query_map(params![project_id], category_from_row)
            .map_err(sql)?;
        rows.collect::<Result<_, _>>().map_err(sql)
    }

    pub fn destroy_category(&self, id: i64) -> Result<(), DomainError> {
        self.conn
            .execute("DELETE FROM categories WHERE id = ?1", params![id])
            .map_err(sql)?;
        Ok(())
    }

    // ── Tasks ────────────────────────────────────────────────────────────

    pub fn create_task(
        &self,
        category: &CategoryRecord,
        title: &str,
        description: &str,
    ) -> Result<TaskRecord, DomainError> {
        self.conn
            .execute(
                "INSERT INTO tasks (title, description, category_id, created_at) VALUES (?1, ?2, ?3, ?4)",
                params![title, description, category.id, now_ms()],
            )
            .map_err(sql)?;
        Ok(TaskRecord {
            id: self.conn.last_insert_rowid(),
            title: title.to_string(),
            description: description.to_string(),
            category_id: category.id,
            project_id: category.project_id,
        })
    }

    /// Load a task joined with its category, re-deriving the effective
    /// project id on every call.
    pub fn find_task(&self, id: i64) -> Result<Option<TaskRecord>, DomainError> {
        self.conn
            .query_row(
                "SELECT t.id, t.title, t.description, t.category_id, c.project_id
                 FROM tasks t JOIN categories c ON c.id = t.category_id
                 WHERE t.id = ?1",
                params![id],
                task_from_row,
            )
            .optional()
            .map_err(sql)
    }

    pub fn tasks_in_category(&self, category_id: i64) -> Result<Vec<TaskRecord>, DomainError> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT t.id, t.title, t.description, t.category_id, c.project_id
                 FROM tasks t JOIN categories c ON c.id = t.category_id
                 WHERE t.category_id = ?1 ORDER BY t.id",
            )
            .map_err(sql)?;
        let rows = stmt.query_map(params![category_id], task_from_row).map_err(sql)?;
        rows.collect::<Result<_, _>>().map_err(sql)
    }

    pub fn destroy_task(&self, id: i64) -> Result<(), DomainError> {
        self.conn
            .execute("DELETE FROM tasks WHERE id = ?1", params![id])
            .map_err(sql)?;
        Ok(())
    }

    /// Reassign the task's category. Same-project enforcement happens
    /// in the handler before this is called.
    pub fn move_task(&self, id: i64, category_id: i64) -> Result<(), DomainError> {
        self.conn
            .execute(
                "UPDATE tasks SET category_id = ?1 WHERE id = ?2",
                params![category_id, id],
            )
            .map_err(sql)?;
        Ok(())
    }

    /// Users associated with the task (order unspecified).
    pub fn task_users(&self, task_id: i64) -> Result<Vec<UserRecord>, DomainError> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT u.id, u.username, u.token
                 FROM users u JOIN task_users tu ON tu.user_id = u.id
                 WHERE tu.task_id = ?1",
            )
            .map_err(sql)?;
        let rows = stmt.query_map(params![task_id], user_from_row).map_err(sql)?;
        rows.collect::<Result<_, _>>().map_err(sql)
    }

    // ── Transactional task edit ──────────────────────────────────────────

    /// Apply scalar updates and reconcile the association set, all in
    /// one transaction. Any failure mid-sequence rolls the whole thing
    /// back; partial association state never becomes visible.
    pub fn edit_task(
        &mut self,
        task_id: i64,
        title: &str,
        description: &str,
        requested_users: &[i64],
    ) -> Result<(), DomainError> {
        let tx = self.conn.transaction().map_err(sql)?;

        tx.execute(
            "UPDATE tasks SET title = ?1, description = ?2 WHERE id = ?3",
            params![title, description, task_id],
        )
        .map_err(sql)?;

        let current: Vec<i64> = {
            let mut stmt = tx
                .prepare("SELECT user_id FROM task_users WHERE task_id = ?1")
                .map_err(sql)?;
            let rows = stmt
                .query_map(params![task_id], |row| row.get(0))
                .map_err(sql)?;
            rows.collect::<Result<_, _>>().map_err(sql)?
        };

        let existing = existing_user_ids_on(&tx, requested_users)?;
        let diff = AssociationDiff::compute(requested_users, &existing, &current);

        for user_id in &diff.remove {
            tx.execute(
                "DELETE FROM task_users WHERE task_id = ?1 AND user_id = ?2",
                params![task_id, user_id],
            )
            .map_err(sql)?;
        }
        for user_id in &diff.add {
            tx.execute(
                "INSERT INTO task_users (task_id, user_id) VALUES (?1, ?2)",
                params![task_id, user_id],
            )
            .map_err(sql)?;
        }

        tx.commit().map_err(sql)
    }
}

fn existing_user_ids_on(conn: &Connection, ids: &[i64]) -> Result<Vec<i64>, DomainError> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let placeholders = vec!["?"; ids.len()].join(", ");
    let mut stmt = conn
        .prepare(&format!("SELECT id FROM users WHERE id IN ({placeholders})"))
        .map_err(sql)?;
    let rows = stmt
        .query_map(rusqlite::params_from_iter(ids.iter()), |row| row.get(0))
        .map_err(sql)?;
    rows.collect::<Result<_, _>>().map_err(sql)
}

fn user_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<UserRecord> {
    Ok(UserRecord {
        id: row.get(0)?,
        username: row.get(1)?,
        token: row.get(2)?,
    })
}

fn project_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ProjectRecord> {
    Ok(ProjectRecord {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        owner_id: row.get(3)?,
    })
}

fn category_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<CategoryRecord> {
    Ok(CategoryRecord {
        id: row.get(0)?,
        title: row.get(1)?,
        project_id: row.get(2)?,
    })
}

fn task_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<TaskRecord> {
    Ok(TaskRecord {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        category_id: row.get(3)?,
        project_id: row.get(4)?,
    })
}
