//! Task methods. Every entry point resolves the task or category
//! through the access chain first; the task's project is re-derived
//! from its category on each request, never trusted from the caller.

use serde::Deserialize;
use serde_json::{Value, json};
use taskboard_protocol::{DomainError, HandlerError, Methods, SessionContext, forms};
use taskboard_store::TaskStore;

use crate::access;
use crate::convert;
use crate::dispatch::{MethodDispatcher, parse_params};

pub fn register(dispatcher: &mut MethodDispatcher) {
    dispatcher.register_authorized(Methods::TASK_CREATE, task_create);
    dispatcher.register_authorized(Methods::TASK_GET_LIST, task_get_list);
    dispatcher.register_authorized(Methods::TASK_GET, task_get);
    dispatcher.register_authorized(Methods::TASK_DELETE, task_delete);
    dispatcher.register_authorized(Methods::TASK_MOVE, task_move);
    dispatcher.register_authorized(Methods::TASK_EDIT, task_edit);
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TaskCreateParams {
    category_id: i64,
    title: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CategoryIdParam {
    category_id: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TaskIdParam {
    task_id: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TaskMoveParams {
    task_id: i64,
    category_id: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TaskEditParams {
    task_id: i64,
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    associated_users: Vec<i64>,
}

async fn task_create(
    store: TaskStore,
    params: Option<Value>,
    session: SessionContext,
) -> Result<Value, HandlerError> {
    let form: TaskCreateParams = parse_params(params)?;
    forms::validate_task_form(&form.title, &form.description)?;
    let user_id = access::require_principal(&session)?;

    let task = store
        .with_db(move |db| {
            let category = access::category_checked(db, user_id, form.category_id)?;
            db.create_task(&category, &form.title, &form.description)
        })
        .await?;

    Ok(convert::task_to_wire(&task, &[]))
}

async fn task_get_list(
    store: TaskStore,
    params: Option<Value>,
    session: SessionContext,
) -> Result<Value, HandlerError> {
    let p: CategoryIdParam = parse_params(params)?;
    let user_id = access::require_principal(&session)?;

    let tasks = store
        .with_db(move |db| {
            let category = access::category_checked(db, user_id, p.category_id)?;
            db.tasks_in_category(category.id)
        })
        .await?;

    Ok(json!(
        tasks
            .iter()
            .map(|t| convert::task_to_wire(t, &[]))
            .collect::<Vec<_>>()
    ))
}

async fn task_get(
    store: TaskStore,
    params: Option<Value>,
    session: SessionContext,
) -> Result<Value, HandlerError> {
    let p: TaskIdParam = parse_params(params)?;
    let user_id = access::require_principal(&session)?;

    let (task, users) = store
        .with_db(move |db| {
            let task = access::task_checked(db, user_id, p.task_id)?;
            let users = db.task_users(task.id)?;
            Ok((task, users))
        })
        .await?;

    Ok(convert::task_to_wire(&task, &users))
}

async fn task_delete(
    store: TaskStore,
    params: Option<Value>,
    session: SessionContext,
) -> Result<Value, HandlerError> {
    let p: TaskIdParam = parse_params(params)?;
    let user_id = access::require_principal(&session)?;

    store
        .with_db(move |db| {
            let task = access::task_checked(db, user_id, p.task_id)?;
            db.destroy_task(task.id)
        })
        .await?;

    Ok(Value::Null)
}

async fn task_move(
    store: TaskStore,
    params: Option<Value>,
    session: SessionContext,
) -> Result<Value, HandlerError> {
    let p: TaskMoveParams = parse_params(params)?;
    let user_id = access::require_principal(&session)?;

    store
        .with_db(move |db| {
            let task = access::task_checked(db, user_id, p.task_id)?;
            let target = access::category_checked(db, user_id, p.category_id)?;
            // Authorized on both sides is not enough: moving across
            // projects is semantically invalid.
            if task.project_id != target.project_id {
                return Err(DomainError::WrongOperands);
            }
            db.move_task(task.id, target.id)
        })
        .await?;

    Ok(Value::Null)
}

async fn task_edit(
    store: TaskStore,
    params: Option<Value>,
    session: SessionContext,
) -> Result<Value, HandlerError> {
    let form: TaskEditParams = parse_params(params)?;
    forms::validate_task_form(&form.title, &form.description)?;
    let user_id = access::require_principal(&session)?;

    let (task, users) = store
        .with_db(move |db| {
            let task = access::task_checked(db, user_id, form.task_id)?;
            db.edit_task(task.id, &form.title, &form.description, &form.associated_users)?;
            let task = access::task_checked(db, user_id, form.task_id)?;
            let users = db.task_users(task.id)?;
            Ok((task, users))
        })
        .await?;

    Ok(convert::task_to_wire(&task, &users))
}
