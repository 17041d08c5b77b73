mod auth;
mod bootcamps;
mod courses;
mod health;
mod reviews;
mod users;

use axum::Json;
use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post, put};
use bson::Document;
use serde_json::{Value, json};

use crate::json::doc_to_json;
use crate::state::AppState;

/// Multipart framing on top of the photo itself.
const UPLOAD_OVERHEAD: usize = 64 * 1024;

pub fn router(state: AppState) -> Router {
    let upload_limit = state.config.max_upload_bytes.saturating_add(UPLOAD_OVERHEAD);

    let api = Router::new()
        // auth
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", get(auth::logout))
        .route("/auth/me", get(auth::me))
        .route("/auth/updatedetails", put(auth::update_details))
        .route("/auth/updatepassword", put(auth::update_password))
        .route("/auth/forgotpassword", post(auth::forgot_password))
        .route("/auth/resetpassword/{token}", put(auth::reset_password))
        // bootcamps
        .route("/bootcamps", get(bootcamps::list).post(bootcamps::create))
        .route(
            "/bootcamps/{id}",
            get(bootcamps::get)
                .put(bootcamps::update)
                .delete(bootcamps::delete),
        )
        .route(
            "/bootcamps/radius/{zipcode}/{distance}",
            get(bootcamps::within_radius),
        )
        .route(
            "/bootcamps/{id}/photo",
            put(bootcamps::upload_photo).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route(
            "/bootcamps/{id}/courses",
            get(courses::for_bootcamp).post(courses::create),
        )
        .route(
            "/bootcamps/{id}/reviews",
            get(reviews::for_bootcamp).post(reviews::create),
        )
        // courses
        .route("/courses", get(courses::list))
        .route(
            "/courses/{id}",
            get(courses::get).put(courses::update).delete(courses::delete),
        )
        // reviews
        .route("/reviews", get(reviews::list))
        .route(
            "/reviews/{id}",
            get(reviews::get).put(reviews::update).delete(reviews::delete),
        )
        // users
        .route("/users", get(users::list).post(users::create))
        .route(
            "/users/{id}",
            get(users::get).put(users::update).delete(users::delete),
        );

    Router::new()
        .route("/healthz", get(health::healthz))
        .nest("/api/v1", api)
        .with_state(state)
}

fn data(doc: Document) -> Json<Value> {
    Json(json!({ "success": true, "data": doc_to_json(doc) }))
}

fn list(docs: Vec<Document>) -> Json<Value> {
    let data: Vec<Value> = docs.into_iter().map(doc_to_json).collect();
    Json(json!({ "success": true, "count": data.len(), "data": data }))
}

fn deleted() -> Json<Value> {
    Json(json!({ "success": true, "data": {} }))
}
