//! Method name constants — every RPC method grouped by namespace.
//!
//! Each constant is the exact string sent over the wire as the
//! `method` field of a JSON-RPC request.

/// All taskboard method names, grouped by namespace.
pub struct Methods;

impl Methods {
    // ── User ────────────────────────────────────────────────────────────
    pub const USER_REGISTER: &str = "user.register";
    pub const USER_LOGIN: &str = "user.login";
    pub const USER_AUTHORIZE: &str = "user.authorize";
    pub const USER_INFO: &str = "user.info";

    // ── Project ─────────────────────────────────────────────────────────
    pub const PROJECT_CREATE: &str = "project.create";
    pub const PROJECT_GET_LIST: &str = "project.getList";
    pub const PROJECT_DELETE: &str = "project.delete";

    // ── Category ────────────────────────────────────────────────────────
    pub const CATEGORY_CREATE: &str = "category.create";
    pub const CATEGORY_GET_LIST: &str = "category.getList";
    pub const CATEGORY_DELETE: &str = "category.delete";

    // ── Task ────────────────────────────────────────────────────────────
    pub const TASK_CREATE: &str = "task.create";
    pub const TASK_GET_LIST: &str = "task.getList";
    pub const TASK_GET: &str = "task.get";
    pub const TASK_DELETE: &str = "task.delete";
    pub const TASK_MOVE: &str = "task.move";
    pub const TASK_EDIT: &str = "task.edit";
}

/// Returns true if the given string is a known taskboard method.
pub fn is_known_method(method: &str) -> bool {
    matches!(
        method.split('.').next(),
        Some("user") | Some("project") | Some("category") | Some("task")
    )
}

/// Type alias — the method name is always a `&str` at the protocol level.
pub type MethodName = &'static str;
