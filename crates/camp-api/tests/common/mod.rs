#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderMap, Method, Request, StatusCode};
use camp_api::auth::password::hash_password;
use camp_api::config::Config;
use camp_api::geocoder::{Location, TableGeocoder};
use camp_api::mailer::{MailError, Mailer, Message};
use camp_api::models::{USERS, create_collections, user};
use camp_api::routes;
use camp_api::state::AppState;
use camp_api::upload::PhotoStore;
use camp_store::{DocumentStore, MemoryStore};
use clap::Parser;
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

pub const PASSWORD: &str = "123456";
pub const MAX_UPLOAD: usize = 1024;

/// Keeps every message so tests can read reset links back.
#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<Message>>,
    pub fail: bool,
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, message: Message) -> Result<(), MailError> {
        if self.fail {
            return Err(MailError("smtp down".into()));
        }
        self.sent.lock().unwrap().push(message);
        Ok(())
    }
}

pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
    pub mailer: Arc<RecordingMailer>,
    pub uploads: tempfile::TempDir,
}

fn location(longitude: f64, latitude: f64, city: &str, zipcode: &str) -> Location {
    Location {
        longitude,
        latitude,
        formatted_address: format!("{city} {zipcode}"),
        street: None,
        city: Some(city.into()),
        state: Some("MA".into()),
        zipcode: Some(zipcode.into()),
        country: Some("US".into()),
    }
}

fn geocoder() -> TableGeocoder {
    TableGeocoder::new([
        ("233 Bay State Rd Boston MA 02215".to_string(), location(-71.104, 42.350, "Boston", "02215")),
        ("220 Pawtucket St Lowell MA 01854".to_string(), location(-71.324, 42.639, "Lowell", "01854")),
        ("45 Upper College Rd Kingston RI 02881".to_string(), location(-71.526, 41.482, "Kingston", "02881")),
    ])
}

pub const BOSTON: &str = "233 Bay State Rd Boston MA 02215";
pub const LOWELL: &str = "220 Pawtucket St Lowell MA 01854";
pub const KINGSTON: &str = "45 Upper College Rd Kingston RI 02881";

impl TestApp {
    pub fn new() -> Self {
        Self::with_mailer(RecordingMailer::default())
    }

    pub fn with_mailer(mailer: RecordingMailer) -> Self {
        let uploads = tempfile::tempdir().unwrap();
        let max_upload = MAX_UPLOAD.to_string();
        let config = Config::try_parse_from([
            "camp-api",
            "--jwt-secret",
            "test-secret",
            "--upload-dir",
            uploads.path().to_str().unwrap(),
            "--max-upload-bytes",
            max_upload.as_str(),
            "--public-url",
            "http://camp.test",
        ])
        .unwrap()
        .validate()
        .unwrap();

        let store = Arc::new(MemoryStore::new());
        create_collections(store.as_ref()).unwrap();
        let mailer = Arc::new(mailer);
        let state = AppState {
            store: store.clone(),
            photos: Arc::new(PhotoStore::new(&config.upload_dir)),
            config: Arc::new(config),
            geocoder: Arc::new(geocoder()),
            mailer: mailer.clone(),
        };
        Self {
            router: routes::router(state),
            store,
            mailer,
            uploads,
        }
    }

    pub async fn request(&self, request: Request<Body>) -> (StatusCode, HeaderMap, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, headers, body)
    }

    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let (status, _, body) = self.request(request).await;
        (status, body)
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.send(Method::GET, uri, token, None).await
    }

    /// Register through the API and return the session token.
    pub async fn register(&self, name: &str, email: &str, role: &str) -> String {
        let (status, body) = self
            .send(
                Method::POST,
                "/api/v1/auth/register",
                None,
                Some(json!({ "name": name, "email": email, "password": PASSWORD, "role": role })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["token"].as_str().unwrap().to_string()
    }

    pub async fn login(&self, email: &str, password: &str) -> (StatusCode, Value) {
        self.send(
            Method::POST,
            "/api/v1/auth/login",
            None,
            Some(json!({ "email": email, "password": password })),
        )
        .await
    }

    /// Admins cannot self-register, so they go straight into the store.
    pub async fn admin(&self) -> String {
        let fields = bson::doc! {
            "name": "Admin",
            "email": "admin@gmail.com",
            "password": hash_password(PASSWORD).unwrap(),
            "role": "admin",
        };
        self.store.insert_one(USERS, user::new_document(fields)).unwrap();
        let (status, body) = self.login("admin@gmail.com", PASSWORD).await;
        assert_eq!(status, StatusCode::OK, "{body}");
        body["token"].as_str().unwrap().to_string()
    }

    /// Create a bootcamp and return its id.
    pub async fn bootcamp(&self, token: &str, name: &str, address: &str) -> String {
        let (status, body) = self
            .send(
                Method::POST,
                "/api/v1/bootcamps",
                Some(token),
                Some(json!({
                    "name": name,
                    "description": format!("{name} teaches full stack development"),
                    "address": address,
                    "careers": ["Web Development", "Other"],
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["data"]["_id"].as_str().unwrap().to_string()
    }
}
