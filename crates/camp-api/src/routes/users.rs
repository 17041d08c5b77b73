use axum::Json;
use axum::extract::{Path, RawQuery, State};
use axum::http::StatusCode;
use serde_json::Value;

use super::{data, deleted};
use crate::advanced::{Listing, ResultsEnvelope, advanced_results};
use crate::auth::CurrentUser;
use crate::error::ApiError;
use crate::extract::{Body, validated};
use crate::models::user::{self, HIDDEN, Role, UserInput};
use crate::models::{Mode, USERS, parse_id};
use crate::state::AppState;

const RESOURCE: &str = "User";

// Every user route is admin-only.

pub async fn list(
    State(state): State<AppState>,
    caller: CurrentUser,
    RawQuery(query): RawQuery,
) -> Result<Json<ResultsEnvelope>, ApiError> {
    caller.authorize(&[Role::Admin])?;
    let listing = Listing::new(USERS).hidden(HIDDEN);
    Ok(Json(advanced_results(&state, query.as_deref(), listing).await?))
}

pub async fn get(
    State(state): State<AppState>,
    caller: CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    caller.authorize(&[Role::Admin])?;
    let oid = parse_id(&id)?;
    let found = state
        .blocking(move |store| Ok(store.find_by_id(USERS, &oid)?))
        .await?
        .ok_or_else(|| ApiError::not_found(RESOURCE, id))?;
    Ok(data(user::public(found)))
}

pub async fn create(
    State(state): State<AppState>,
    caller: CurrentUser,
    Body(input): Body<UserInput>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    caller.authorize(&[Role::Admin])?;
    validated(input.validate(Mode::Create, Role::ALL))?;

    let created = state
        .blocking(move |store| {
            let fields = input.into_fields()?;
            Ok(store.insert_one(USERS, user::new_document(fields))?)
        })
        .await?;
    Ok((StatusCode::CREATED, data(user::public(created))))
}

pub async fn update(
    State(state): State<AppState>,
    caller: CurrentUser,
    Path(id): Path<String>,
    Body(input): Body<UserInput>,
) -> Result<Json<Value>, ApiError> {
    caller.authorize(&[Role::Admin])?;
    let oid = parse_id(&id)?;
    validated(input.validate(Mode::Update, Role::ALL))?;

    let updated = state
        .blocking(move |store| {
            let fields = input.into_fields()?;
            Ok(store.update_by_id(USERS, &oid, fields, &[])?)
        })
        .await?
        .ok_or_else(|| ApiError::not_found(RESOURCE, id))?;
    Ok(data(user::public(updated)))
}

pub async fn delete(
    State(state): State<AppState>,
    caller: CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    caller.authorize(&[Role::Admin])?;
    let oid = parse_id(&id)?;
    state
        .blocking(move |store| Ok(store.delete_by_id(USERS, &oid)?))
        .await?
        .ok_or_else(|| ApiError::not_found(RESOURCE, id))?;
    Ok(deleted())
}
