use axum::Json;
use axum::extract::{Multipart, Path, RawQuery, State};
use axum::http::StatusCode;
use bson::{Document, doc};
use camp_query::{FilterGroup, FilterNode, GeoWithin, Populate, Query};
use serde_json::{Value, json};

use super::{data, deleted, list as list_json};
use crate::advanced::{Listing, ResultsEnvelope, advanced_results};
use crate::auth::CurrentUser;
use crate::error::ApiError;
use crate::extract::{Body, validated};
use crate::models::bootcamp::{self, BootcampInput};
use crate::models::user::Role;
use crate::models::{BOOTCAMPS, COURSES, Mode, REVIEWS, parse_id};
use crate::state::AppState;

/// Mean Earth radius in kilometres.
pub const EARTH_RADIUS_KM: f64 = 6378.1;

const RESOURCE: &str = "Bootcamp";

pub async fn list(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> Result<Json<ResultsEnvelope>, ApiError> {
    let listing =
        Listing::new(BOOTCAMPS).populate(Populate::children("courses", COURSES, "bootcamp", &[]));
    Ok(Json(advanced_results(&state, query.as_deref(), listing).await?))
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let oid = parse_id(&id)?;
    let found = state
        .blocking(move |store| Ok(store.find_by_id(BOOTCAMPS, &oid)?))
        .await?
        .ok_or_else(|| ApiError::not_found(RESOURCE, id))?;
    Ok(data(found))
}

pub async fn create(
    State(state): State<AppState>,
    caller: CurrentUser,
    Body(input): Body<BootcampInput>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    caller.authorize(&[Role::Publisher, Role::Admin])?;
    validated(input.validate(Mode::Create))?;

    // Publishers may own a single bootcamp. The early count spares a
    // geocoder call; the insert below re-checks atomically.
    let already_published = || {
        ApiError::BadRequest(format!(
            "The user with ID {} has already published a bootcamp",
            caller.id.to_hex()
        ))
    };
    let limit = (!caller.is_admin()).then(|| FilterGroup::eq("user", caller.id));
    if let Some(owned_by_caller) = limit.clone() {
        let published = state
            .blocking(move |store| Ok(store.count(BOOTCAMPS, Some(&owned_by_caller))?))
            .await?;
        if published > 0 {
            return Err(already_published());
        }
    }

    let address = input.address.clone().unwrap_or_default();
    let location = state.geocoder.geocode(&address).await?;

    let mut fields = input.into_fields();
    fields.insert("location", location.to_document());
    fields.insert("user", caller.id);

    let created = state
        .blocking(move |store| {
            let doc = bootcamp::new_document(fields);
            Ok(match limit {
                Some(owned_by_caller) => store.insert_unless(BOOTCAMPS, &owned_by_caller, doc)?,
                None => Some(store.insert_one(BOOTCAMPS, doc)?),
            })
        })
        .await?
        .ok_or_else(already_published)?;
    tracing::info!(bootcamp = ?created.get_object_id("_id").ok(), user = %caller.id, "created bootcamp");
    Ok((StatusCode::CREATED, data(created)))
}

/// Load a bootcamp the caller may modify.
async fn owned(
    state: &AppState,
    caller: &CurrentUser,
    id: &str,
    action: &str,
) -> Result<Document, ApiError> {
    let oid = parse_id(id)?;
    let found = state
        .blocking(move |store| Ok(store.find_by_id(BOOTCAMPS, &oid)?))
        .await?
        .ok_or_else(|| ApiError::not_found(RESOURCE, id))?;
    caller.ensure_owner(&found, action)?;
    Ok(found)
}

pub async fn update(
    State(state): State<AppState>,
    caller: CurrentUser,
    Path(id): Path<String>,
    Body(input): Body<BootcampInput>,
) -> Result<Json<Value>, ApiError> {
    owned(&state, &caller, &id, "update this bootcamp").await?;
    validated(input.validate(Mode::Update))?;

    let location = match input.address.as_deref() {
        Some(address) => Some(state.geocoder.geocode(address).await?),
        None => None,
    };
    let mut fields = input.into_fields();
    if let Some(location) = location {
        fields.insert("location", location.to_document());
    }

    let oid = parse_id(&id)?;
    let updated = state
        .blocking(move |store| Ok(store.update_by_id(BOOTCAMPS, &oid, fields, &[])?))
        .await?
        .ok_or_else(|| ApiError::not_found(RESOURCE, id))?;
    Ok(data(updated))
}

pub async fn delete(
    State(state): State<AppState>,
    caller: CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    owned(&state, &caller, &id, "delete this bootcamp").await?;
    let oid = parse_id(&id)?;

    let (courses, reviews) = state
        .blocking(move |store| {
            let children = FilterGroup::eq("bootcamp", oid);
            let courses = store.delete_many(COURSES, Some(&children))?;
            let reviews = store.delete_many(REVIEWS, Some(&children))?;
            store.delete_by_id(BOOTCAMPS, &oid)?;
            Ok((courses, reviews))
        })
        .await?;
    tracing::info!(bootcamp = %oid, courses, reviews, "deleted bootcamp");
    Ok(deleted())
}

pub async fn within_radius(
    State(state): State<AppState>,
    Path((zipcode, distance)): Path<(String, String)>,
) -> Result<Json<Value>, ApiError> {
    let distance: f64 = distance
        .trim()
        .parse()
        .ok()
        .filter(|d: &f64| d.is_finite() && *d >= 0.0)
        .ok_or_else(|| ApiError::BadRequest("Distance must be a non-negative number".into()))?;

    let center = state.geocoder.geocode(&zipcode).await?;
    let filter = FilterGroup::and(vec![FilterNode::GeoWithin(GeoWithin {
        field: "location".into(),
        center: [center.longitude, center.latitude],
        radius: distance / EARTH_RADIUS_KM,
    })]);

    let found = state
        .blocking(move |store| Ok(store.find(BOOTCAMPS, &Query::filtered(filter))?))
        .await?;
    Ok(list_json(found))
}

pub async fn upload_photo(
    State(state): State<AppState>,
    caller: CurrentUser,
    Path(id): Path<String>,
    mut multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
    owned(&state, &caller, &id, "update this bootcamp").await?;
    let oid = parse_id(&id)?;
    let max = state.config.max_upload_bytes;

    let bad_upload = |e: axum::extract::multipart::MultipartError| ApiError::BadRequest(e.body_text());
    let mut upload = None;
    while let Some(field) = multipart.next_field().await.map_err(bad_upload)? {
        if field.name() != Some("file") {
            continue;
        }
        let is_image = field
            .content_type()
            .is_some_and(|ct| ct.starts_with("image/"));
        if !is_image {
            return Err(ApiError::BadRequest("Please upload an image file".into()));
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let bytes = field.bytes().await.map_err(bad_upload)?;
        upload = Some((file_name, bytes));
        break;
    }

    let (file_name, bytes) =
        upload.ok_or_else(|| ApiError::BadRequest("Please upload a file".into()))?;
    if bytes.len() > max {
        return Err(ApiError::BadRequest(format!(
            "Please upload an image less than {max} bytes"
        )));
    }

    let name = state.photos.save(&oid, &file_name, &bytes).await?;
    let stored = name.clone();
    state
        .blocking(move |store| {
            Ok(store.update_by_id(BOOTCAMPS, &oid, doc! { "photo": stored }, &[])?)
        })
        .await?
        .ok_or_else(|| ApiError::not_found(RESOURCE, id))?;

    Ok(Json(json!({ "success": true, "data": name })))
}
