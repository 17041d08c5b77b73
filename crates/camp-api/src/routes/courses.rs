use axum::Json;
use axum::extract::{Path, RawQuery, State};
use axum::http::StatusCode;
use bson::Document;
use camp_query::{FilterGroup, Populate, Query};
use serde_json::Value;

use super::{data, deleted, list as list_json};
use crate::advanced::{Listing, ResultsEnvelope, advanced_results};
use crate::aggregate::recompute_average_cost;
use crate::auth::CurrentUser;
use crate::error::ApiError;
use crate::extract::{Body, validated};
use crate::models::course::{self, CourseInput};
use crate::models::user::Role;
use crate::models::{BOOTCAMPS, COURSES, Mode, parse_id};
use crate::state::AppState;

const RESOURCE: &str = "Course";

fn bootcamp_summary() -> Populate {
    Populate::reference("bootcamp", BOOTCAMPS, &["name", "description"])
}

pub async fn list(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> Result<Json<ResultsEnvelope>, ApiError> {
    let listing = Listing::new(COURSES).populate(bootcamp_summary());
    Ok(Json(advanced_results(&state, query.as_deref(), listing).await?))
}

pub async fn for_bootcamp(
    State(state): State<AppState>,
    Path(bootcamp): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let bootcamp = parse_id(&bootcamp)?;
    let courses = state
        .blocking(move |store| {
            Ok(store.find(COURSES, &Query::filtered(FilterGroup::eq("bootcamp", bootcamp)))?)
        })
        .await?;
    Ok(list_json(courses))
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let oid = parse_id(&id)?;
    let query = Query {
        populate: vec![bootcamp_summary()],
        ..Query::filtered(FilterGroup::eq("_id", oid))
    };
    let found = state
        .blocking(move |store| Ok(store.find(COURSES, &query)?.into_iter().next()))
        .await?
        .ok_or_else(|| ApiError::not_found(RESOURCE, id))?;
    Ok(data(found))
}

pub async fn create(
    State(state): State<AppState>,
    caller: CurrentUser,
    Path(bootcamp): Path<String>,
    Body(input): Body<CourseInput>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    caller.authorize(&[Role::Publisher, Role::Admin])?;
    let bootcamp_id = parse_id(&bootcamp)?;
    validated(input.validate(Mode::Create))?;

    let created = state
        .blocking(move |store| {
            let parent = store
                .find_by_id(BOOTCAMPS, &bootcamp_id)?
                .ok_or_else(|| ApiError::not_found("Bootcamp", bootcamp))?;
            caller.ensure_owner(
                &parent,
                &format!("add a course to bootcamp {}", bootcamp_id.to_hex()),
            )?;

            let mut fields = input.into_fields();
            fields.insert("bootcamp", bootcamp_id);
            fields.insert("user", caller.id);
            let created = store.insert_one(COURSES, course::new_document(fields))?;
            recompute_average_cost(store, bootcamp_id)?;
            Ok(created)
        })
        .await?;
    Ok((StatusCode::CREATED, data(created)))
}

/// Load a course the caller may modify.
async fn owned(
    state: &AppState,
    caller: &CurrentUser,
    id: &str,
    action: &'static str,
) -> Result<Document, ApiError> {
    let oid = parse_id(id)?;
    let found = state
        .blocking(move |store| Ok(store.find_by_id(COURSES, &oid)?))
        .await?
        .ok_or_else(|| ApiError::not_found(RESOURCE, id))?;
    caller.ensure_owner(&found, action)?;
    Ok(found)
}

pub async fn update(
    State(state): State<AppState>,
    caller: CurrentUser,
    Path(id): Path<String>,
    Body(input): Body<CourseInput>,
) -> Result<Json<Value>, ApiError> {
    let existing = owned(&state, &caller, &id, "update this course").await?;
    validated(input.validate(Mode::Update))?;
    let oid = parse_id(&id)?;

    let updated = state
        .blocking(move |store| {
            let updated = store
                .update_by_id(COURSES, &oid, input.into_fields(), &[])?
                .ok_or_else(|| ApiError::not_found(RESOURCE, id))?;
            if let Ok(bootcamp) = existing.get_object_id("bootcamp") {
                recompute_average_cost(store, bootcamp)?;
            }
            Ok(updated)
        })
        .await?;
    Ok(data(updated))
}

pub async fn delete(
    State(state): State<AppState>,
    caller: CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let existing = owned(&state, &caller, &id, "delete this course").await?;
    let oid = parse_id(&id)?;

    state
        .blocking(move |store| {
            store.delete_by_id(COURSES, &oid)?;
            if let Ok(bootcamp) = existing.get_object_id("bootcamp") {
                recompute_average_cost(store, bootcamp)?;
            }
            Ok(())
        })
        .await?;
    Ok(deleted())
}
