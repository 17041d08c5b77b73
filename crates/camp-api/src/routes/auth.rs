use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::http::header::SET_COOKIE;
use axum::response::{IntoResponse, Response};
use bson::oid::ObjectId;
use bson::{Bson, Document, doc};
use camp_query::{Filter, FilterGroup, FilterNode, Operator};
use chrono::{Duration, Utc};
use serde::Deserialize;
use serde_json::{Value, json};

use super::data;
use crate::auth::password::verify_password;
use crate::auth::token::{self, RESET_TOKEN_TTL_MINUTES, hash_reset_token, reset_token};
use crate::auth::{CurrentUser, cleared_cookie, session_cookie};
use crate::error::ApiError;
use crate::extract::{Body, validated};
use crate::mailer::Message;
use crate::models::user::{self, Role, UserInput};
use crate::models::{Mode, USERS};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginInput {
    email: Option<String>,
    password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DetailsInput {
    name: Option<String>,
    email: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordChange {
    current_password: Option<String>,
    new_password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ForgotInput {
    email: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ResetInput {
    password: Option<String>,
}

/// Sign a token for `user` and return it in the body and as a cookie.
fn send_token(state: &AppState, user: &ObjectId, status: StatusCode) -> Result<Response, ApiError> {
    let config = &state.config;
    let token = token::issue(user, &config.jwt_secret, config.jwt_expire_days)?;
    let cookie = session_cookie(&token, config.cookie_expire_days);
    Ok((
        status,
        [(SET_COOKIE, cookie)],
        Json(json!({ "success": true, "token": token })),
    )
        .into_response())
}

fn user_by_email(email: &str) -> FilterGroup {
    FilterGroup::eq("email", email.trim())
}

pub async fn register(
    State(state): State<AppState>,
    Body(input): Body<UserInput>,
) -> Result<Response, ApiError> {
    validated(input.validate(Mode::Create, Role::SELF_SERVICE))?;

    let created = state
        .blocking(move |store| {
            let fields = input.into_fields()?;
            Ok(store.insert_one(USERS, user::new_document(fields))?)
        })
        .await?;
    let id = created
        .get_object_id("_id")
        .map_err(|e| ApiError::Upstream(e.to_string()))?;

    tracing::info!(user = %id, role = %user::role_of(&created), "registered user");
    send_token(&state, &id, StatusCode::CREATED)
}

pub async fn login(
    State(state): State<AppState>,
    Body(input): Body<LoginInput>,
) -> Result<Response, ApiError> {
    let (Some(email), Some(password)) = (input.email, input.password) else {
        return Err(ApiError::BadRequest(
            "Please provide an email and password".into(),
        ));
    };

    let id = state
        .blocking(move |store| {
            let invalid = || ApiError::Unauthorized("Invalid credentials".into());
            let user = store.find_one(USERS, &user_by_email(&email))?.ok_or_else(invalid)?;
            let hash = user.get_str("password").unwrap_or_default();
            if !verify_password(&password, hash) {
                return Err(invalid());
            }
            user.get_object_id("_id").map_err(|_| invalid())
        })
        .await?;

    send_token(&state, &id, StatusCode::OK)
}

pub async fn logout() -> impl IntoResponse {
    (
        [(SET_COOKIE, cleared_cookie())],
        Json(json!({ "success": true, "data": {} })),
    )
}

pub async fn me(State(state): State<AppState>, caller: CurrentUser) -> Result<Json<Value>, ApiError> {
    let user = state
        .blocking(move |store| Ok(store.find_by_id(USERS, &caller.id)?))
        .await?
        .ok_or_else(ApiError::not_authorized)?;
    Ok(data(user::public(user)))
}

pub async fn update_details(
    State(state): State<AppState>,
    caller: CurrentUser,
    Body(input): Body<DetailsInput>,
) -> Result<Json<Value>, ApiError> {
    let input = UserInput {
        name: input.name,
        email: input.email,
        ..UserInput::default()
    };
    validated(input.validate(Mode::Update, &[]))?;

    let user = state
        .blocking(move |store| {
            let fields = input.into_fields()?;
            Ok(store.update_by_id(USERS, &caller.id, fields, &[])?)
        })
        .await?
        .ok_or_else(ApiError::not_authorized)?;
    Ok(data(user::public(user)))
}

pub async fn update_password(
    State(state): State<AppState>,
    caller: CurrentUser,
    Body(input): Body<PasswordChange>,
) -> Result<Response, ApiError> {
    let (Some(current), Some(new)) = (input.current_password, input.new_password) else {
        return Err(ApiError::BadRequest(
            "Please provide the current and new password".into(),
        ));
    };
    let change = UserInput {
        password: Some(new),
        ..UserInput::default()
    };
    validated(change.validate(Mode::Update, &[]))?;

    state
        .blocking(move |store| {
            let user = store
                .find_by_id(USERS, &caller.id)?
                .ok_or_else(ApiError::not_authorized)?;
            if !verify_password(&current, user.get_str("password").unwrap_or_default()) {
                return Err(ApiError::Unauthorized("Password is incorrect".into()));
            }
            store.update_by_id(USERS, &caller.id, change.into_fields()?, &[])?;
            Ok(())
        })
        .await?;

    send_token(&state, &caller.id, StatusCode::OK)
}

pub async fn forgot_password(
    State(state): State<AppState>,
    Body(input): Body<ForgotInput>,
) -> Result<Json<Value>, ApiError> {
    let email = input
        .email
        .filter(|e| !e.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("Please provide an email".into()))?;

    let (plain, digest) = reset_token();
    let expires = bson::DateTime::from_millis(
        (Utc::now() + Duration::minutes(RESET_TOKEN_TTL_MINUTES)).timestamp_millis(),
    );
    let lookup = email.clone();
    let id = state
        .blocking(move |store| {
            let user = store
                .find_one(USERS, &user_by_email(&lookup))?
                .ok_or_else(|| ApiError::NoMatch("There is no user with that email".into()))?;
            let id = user
                .get_object_id("_id")
                .map_err(|e| ApiError::Upstream(e.to_string()))?;
            let set = doc! { "resetPasswordToken": digest, "resetPasswordExpire": expires };
            store.update_by_id(USERS, &id, set, &[])?;
            Ok(id)
        })
        .await?;

    let message = Message {
        to: email,
        subject: "Password reset token".into(),
        text: format!(
            "You are receiving this email because you (or someone else) has requested the reset of a password. Please make a PUT request to: \n\n {}",
            state.config.reset_url(&plain)
        ),
    };
    if let Err(e) = state.mailer.send(message).await {
        tracing::warn!(user = %id, error = %e, "reset email failed");
        state
            .blocking(move |store| {
                store.update_by_id(USERS, &id, Document::new(), &reset_fields())?;
                Ok(())
            })
            .await?;
        return Err(ApiError::Upstream(e.to_string()));
    }

    Ok(Json(json!({ "success": true, "data": "Email sent" })))
}

fn reset_fields() -> Vec<String> {
    vec!["resetPasswordToken".into(), "resetPasswordExpire".into()]
}

pub async fn reset_password(
    State(state): State<AppState>,
    Path(token): Path<String>,
    Body(input): Body<ResetInput>,
) -> Result<Response, ApiError> {
    let change = UserInput {
        password: input.password,
        ..UserInput::default()
    };
    if change.password.is_none() {
        return Err(ApiError::BadRequest("Please provide a password".into()));
    }
    validated(change.validate(Mode::Update, &[]))?;

    let pending = FilterGroup::and(vec![
        FilterNode::Condition(Filter::eq("resetPasswordToken", hash_reset_token(&token))),
        FilterNode::Condition(Filter {
            field: "resetPasswordExpire".into(),
            operator: Operator::Gt,
            value: Bson::DateTime(bson::DateTime::now()),
        }),
    ]);

    let id = state
        .blocking(move |store| {
            let user = store
                .find_one(USERS, &pending)?
                .ok_or_else(|| ApiError::BadRequest("Invalid token".into()))?;
            let id = user
                .get_object_id("_id")
                .map_err(|e| ApiError::Upstream(e.to_string()))?;
            store.update_by_id(USERS, &id, change.into_fields()?, &reset_fields())?;
            Ok(id)
        })
        .await?;

    tracing::info!(user = %id, "password reset");
    send_token(&state, &id, StatusCode::OK)
}
