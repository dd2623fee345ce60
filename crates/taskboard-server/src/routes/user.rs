//! User methods: registration, login, token re-authorization, info.
//!
//! register/login are the only paths that mint a session token (32
//! random bytes, hex). user.authorize binds an existing token to the
//! connection without rotating it, so a client can resume after a
//! reconnect.

use serde::Deserialize;
use serde_json::{Value, json};
use sha2::{Digest, Sha256};
use taskboard_protocol::{DomainError, HandlerError, Methods, SessionContext, forms};
use taskboard_store::TaskStore;

use crate::access;
use crate::convert;
use crate::dispatch::{MethodDispatcher, parse_params};

pub fn register(dispatcher: &mut MethodDispatcher) {
    dispatcher.register(Methods::USER_REGISTER, user_register);
    dispatcher.register(Methods::USER_LOGIN, user_login);
    dispatcher.register(Methods::USER_AUTHORIZE, user_authorize);
    dispatcher.register_authorized(Methods::USER_INFO, user_info);
}

#[derive(Debug, Deserialize)]
struct UserForm {
    username: String,
    password: String,
}

#[derive(Debug, Deserialize)]
struct AuthorizeParams {
    token: String,
}

/// Credentials are stored and compared as SHA-256 hex digests.
fn digest_password(password: &str) -> String {
    hex::encode(Sha256::digest(password.as_bytes()))
}

fn fresh_token() -> String {
    let bytes: [u8; 32] = rand::random();
    hex::encode(bytes)
}

async fn user_register(
    store: TaskStore,
    params: Option<Value>,
    session: SessionContext,
) -> Result<Value, HandlerError> {
    let form: UserForm = parse_params(params)?;
    forms::validate_user_form(&form.username, &form.password)?;

    let digest = digest_password(&form.password);
    let token = fresh_token();
    let user = store
        .with_db(move |db| db.create_user(&form.username, &digest, &token))
        .await?;

    session.set_principal(user.id);
    Ok(json!({ "token": user.token }))
}

async fn user_login(
    store: TaskStore,
    params: Option<Value>,
    session: SessionContext,
) -> Result<Value, HandlerError> {
    let form: UserForm = parse_params(params)?;
    forms::validate_user_form(&form.username, &form.password)?;

    let digest = digest_password(&form.password);
    let token = fresh_token();
    let returned = token.clone();
    let user = store
        .with_db(move |db| {
            let user = db
                .find_user_by_credentials(&form.username, &digest)?
                .ok_or(DomainError::Authorization)?;
            db.update_user_token(user.id, &token)?;
            Ok(user)
        })
        .await?;

    session.set_principal(user.id);
    Ok(json!({ "token": returned }))
}

async fn user_authorize(
    store: TaskStore,
    params: Option<Value>,
    session: SessionContext,
) -> Result<Value, HandlerError> {
    let p: AuthorizeParams = parse_params(params)?;
    let user = store
        .with_db(move |db| {
            db.find_user_by_token(&p.token)?
                .ok_or(DomainError::Authorization)
        })
        .await?;

    session.set_principal(user.id);
    Ok(convert::user_to_wire(&user))
}

async fn user_info(
    store: TaskStore,
    _params: Option<Value>,
    session: SessionContext,
) -> Result<Value, HandlerError> {
    let user_id = access::require_principal(&session)?;
    let user = store.with_db(move |db| access::user_by_id(db, user_id)).await?;
    Ok(convert::user_to_wire(&user))
}
