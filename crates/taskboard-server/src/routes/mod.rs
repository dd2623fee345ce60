//! Method handlers, one module per namespace.

pub mod category;
pub mod project;
pub mod task;
pub mod user;

use crate::dispatch::MethodDispatcher;

/// Register every method the server exposes.
pub fn register_all(dispatcher: &mut MethodDispatcher) {
    user::register(dispatcher);
    project::register(dispatcher);
    category::register(dispatcher);
    task::register(dispatcher);
}
