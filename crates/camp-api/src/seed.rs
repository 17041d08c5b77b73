use std::path::{Path, PathBuf};

use bson::oid::ObjectId;
use bson::{Bson, Document};
use camp_store::{DocumentStore, StoreError};
use serde_json::Value;
use thiserror::Error;

use crate::aggregate::{recompute_average_cost, recompute_average_rating};
use crate::auth::password::hash_password;
use crate::error::ApiError;
use crate::geocoder::Geocoder;
use crate::json::from_json;
use crate::models::{BOOTCAMPS, COURSES, REVIEWS, USERS, bootcamp, course, review, user};

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("reading {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("parsing {path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("{file}: {message}")]
    Invalid { file: &'static str, message: String },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Api(#[from] ApiError),
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeedReport {
    pub users: usize,
    pub bootcamps: usize,
    pub courses: usize,
    pub reviews: usize,
}

/// Import `users.json`, `bootcamps.json`, `courses.json` and `reviews.json`
/// from `dir`. Missing files are skipped. Ids and references may be given as
/// hex strings; passwords are hashed and bootcamp addresses geocoded.
pub async fn seed(
    store: &dyn DocumentStore,
    geocoder: &dyn Geocoder,
    dir: &Path,
) -> Result<SeedReport, SeedError> {
    let mut report = SeedReport::default();

    for mut doc in read_file(dir, "users.json").await? {
        if let Some(Bson::String(plain)) = doc.get("password") {
            let hashed = hash_password(plain)?;
            doc.insert("password", hashed);
        }
        store.insert_one(USERS, user::new_document(doc))?;
        report.users += 1;
    }

    let mut bootcamp_ids = Vec::new();
    for mut doc in read_file(dir, "bootcamps.json").await? {
        if let Some(Bson::String(address)) = doc.remove("address") {
            if !doc.contains_key("location") {
                match geocoder.geocode(&address).await {
                    Ok(location) => {
                        doc.insert("location", location.to_document());
                    }
                    Err(e) => tracing::warn!(%address, error = %e, "seeding bootcamp without location"),
                }
            }
        }
        if let Some(Bson::String(name)) = doc.get("name") {
            let slug = bootcamp::slugify(name);
            doc.insert("slug", slug);
        }
        let stored = store.insert_one(BOOTCAMPS, bootcamp::new_document(doc))?;
        if let Ok(id) = stored.get_object_id("_id") {
            bootcamp_ids.push(id);
        }
        report.bootcamps += 1;
    }

    for doc in read_file(dir, "courses.json").await? {
        store.insert_one(COURSES, course::new_document(doc))?;
        report.courses += 1;
    }
    for doc in read_file(dir, "reviews.json").await? {
        store.insert_one(REVIEWS, review::new_document(doc))?;
        report.reviews += 1;
    }

    for id in bootcamp_ids {
        recompute_average_cost(store, id)?;
        recompute_average_rating(store, id)?;
    }

    tracing::info!(
        users = report.users,
        bootcamps = report.bootcamps,
        courses = report.courses,
        reviews = report.reviews,
        "seeded store"
    );
    Ok(report)
}

/// Fields holding ObjectIds that seed files write as hex strings.
const ID_FIELDS: &[&str] = &["_id", "user", "bootcamp"];

async fn read_file(dir: &Path, file: &'static str) -> Result<Vec<Document>, SeedError> {
    let path = dir.join(file);
    let raw = match tokio::fs::read_to_string(&path).await {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "no seed file");
            return Ok(Vec::new());
        }
        Err(source) => return Err(SeedError::Io { path, source }),
    };
    let value: Value =
        serde_json::from_str(&raw).map_err(|source| SeedError::Json { path, source })?;
    let Value::Array(items) = value else {
        return Err(SeedError::Invalid {
            file,
            message: "expected a JSON array".into(),
        });
    };

    items
        .into_iter()
        .map(|item| match from_json(item) {
            Bson::Document(doc) => object_ids(doc, file),
            _ => Err(SeedError::Invalid {
                file,
                message: "expected an array of objects".into(),
            }),
        })
        .collect()
}

fn object_ids(mut doc: Document, file: &'static str) -> Result<Document, SeedError> {
    for field in ID_FIELDS {
        if let Some(Bson::String(hex)) = doc.get(*field) {
            let id = ObjectId::parse_str(hex).map_err(|_| SeedError::Invalid {
                file,
                message: format!("`{field}` is not an ObjectId: {hex}"),
            })?;
            doc.insert(*field, id);
        }
    }
    Ok(doc)
}
