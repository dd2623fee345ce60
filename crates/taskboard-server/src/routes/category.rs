//! Category methods. Creation is owner-only; listing and deletion are
//! open to any project member. The category's project linkage is fixed
//! at creation, there is no move.

use serde::Deserialize;
use serde_json::{Value, json};
use taskboard_protocol::{DomainError, HandlerError, Methods, SessionContext, forms};
use taskboard_store::TaskStore;

use crate::access;
use crate::convert;
use crate::dispatch::{MethodDispatcher, parse_params};

pub fn register(dispatcher: &mut MethodDispatcher) {
    dispatcher.register_authorized(Methods::CATEGORY_CREATE, category_create);
    dispatcher.register_authorized(Methods::CATEGORY_GET_LIST, category_get_list);
    dispatcher.register_authorized(Methods::CATEGORY_DELETE, category_delete);
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CategoryForm {
    project_id: i64,
    title: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProjectIdParam {
    project_id: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CategoryIdParam {
    category_id: i64,
}

async fn category_create(
    store: TaskStore,
    params: Option<Value>,
    session: SessionContext,
) -> Result<Value, HandlerError> {
    let form: CategoryForm = parse_params(params)?;
    forms::validate_category_form(&form.title)?;
    let user_id = access::require_principal(&session)?;

    let category = store
        .with_db(move |db| {
            let user = access::user_by_id(db, user_id)?;
            let project = access::project_by_id(db, form.project_id)?;
            if project.owner_id != user.id {
                return Err(DomainError::AccessDenied);
            }
            db.create_category(project.id, &form.title)
        })
        .await?;

    Ok(convert::category_to_wire(&category))
}

async fn category_get_list(
    store: TaskStore,
    params: Option<Value>,
    session: SessionContext,
) -> Result<Value, HandlerError> {
    let p: ProjectIdParam = parse_params(params)?;
    let user_id = access::require_principal(&session)?;

    let categories = store
        .with_db(move |db| {
            access::assert_member(db, user_id, p.project_id)?;
            db.categories_in_project(p.project_id)
        })
        .await?;

    Ok(json!(
        categories.iter().map(convert::category_to_wire).collect::<Vec<_>>()
    ))
}

async fn category_delete(
    store: TaskStore,
    params: Option<Value>,
    session: SessionContext,
) -> Result<Value, HandlerError> {
    let p: CategoryIdParam = parse_params(params)?;
    let user_id = access::require_principal(&session)?;

    store
        .with_db(move |db| {
            let category = access::category_checked(db, user_id, p.category_id)?;
            db.destroy_category(category.id)
        })
        .await?;

    Ok(Value::Null)
}
