//! Project methods. Creation also inserts the creator's membership
//! row, so a fresh project is immediately visible in its owner's
//! `project.getList`. Deletion is owner-only; membership alone is not
//! enough.

use serde::Deserialize;
use serde_json::{Value, json};
use taskboard_protocol::{DomainError, HandlerError, Methods, SessionContext, forms};
use taskboard_store::TaskStore;

use crate::access;
use crate::convert;
use crate::dispatch::{MethodDispatcher, parse_params};

pub fn register(dispatcher: &mut MethodDispatcher) {
    dispatcher.register_authorized(Methods::PROJECT_CREATE, project_create);
    dispatcher.register_authorized(Methods::PROJECT_GET_LIST, project_get_list);
    dispatcher.register_authorized(Methods::PROJECT_DELETE, project_delete);
}

#[derive(Debug, Deserialize)]
struct ProjectForm {
    title: String,
    description: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProjectIdParam {
    project_id: i64,
}

async fn project_create(
    store: TaskStore,
    params: Option<Value>,
    session: SessionContext,
) -> Result<Value, HandlerError> {
    let form: ProjectForm = parse_params(params)?;
    forms::validate_project_form(&form.title, &form.description)?;
    let user_id = access::require_principal(&session)?;

    let project = store
        .with_db(move |db| {
            let user = access::user_by_id(db, user_id)?;
            let project = db.create_project(&form.title, &form.description, user.id)?;
            db.create_membership(project.id, user.id)?;
            Ok(project)
        })
        .await?;

    Ok(convert::project_to_wire(&project))
}

async fn project_get_list(
    store: TaskStore,
    _params: Option<Value>,
    session: SessionContext,
) -> Result<Value, HandlerError> {
    let user_id = access::require_principal(&session)?;

    let (projects, owned) = store
        .with_db(move |db| {
            access::user_by_id(db, user_id)?;
            Ok((db.member_projects(user_id)?, db.owned_projects(user_id)?))
        })
        .await?;

    Ok(json!({
        "projects": projects.iter().map(convert::project_to_wire).collect::<Vec<_>>(),
        "ownedProjects": owned.iter().map(convert::project_to_wire).collect::<Vec<_>>(),
    }))
}

async fn project_delete(
    store: TaskStore,
    params: Option<Value>,
    session: SessionContext,
) -> Result<Value, HandlerError> {
    let p: ProjectIdParam = parse_params(params)?;
    let user_id = access::require_principal(&session)?;

    store
        .with_db(move |db| {
            let project = access::project_by_id(db, p.project_id)?;
            if project.owner_id != user_id {
                return Err(DomainError::AccessDenied);
            }
            db.destroy_project(project.id)
        })
        .await?;

    Ok(Value::Null)
}
