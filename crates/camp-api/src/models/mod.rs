pub mod bootcamp;
pub mod course;
pub mod review;
pub mod user;

use std::sync::LazyLock;

use bson::Bson;
use bson::oid::ObjectId;
use camp_store::{CollectionConfig, DocumentStore, StoreError};
use regex::Regex;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use url::Url;

use crate::error::ApiError;

pub const USERS: &str = "users";
pub const BOOTCAMPS: &str = "bootcamps";
pub const COURSES: &str = "courses";
pub const REVIEWS: &str = "reviews";

/// Create every collection with its unique constraints.
pub fn create_collections(store: &dyn DocumentStore) -> Result<(), StoreError> {
    store.create_collection(CollectionConfig::new(USERS).unique(&["email"]))?;
    store.create_collection(CollectionConfig::new(BOOTCAMPS).unique(&["name"]))?;
    store.create_collection(CollectionConfig::new(COURSES))?;
    store.create_collection(CollectionConfig::new(REVIEWS).unique(&["bootcamp", "user"]))?;
    Ok(())
}

/// Whether a payload is creating a document or patching one. On update,
/// absent fields are left alone but present ones are still checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Create,
    Update,
}

pub fn parse_id(raw: &str) -> Result<ObjectId, ApiError> {
    ObjectId::parse_str(raw).map_err(|_| ApiError::BadId(raw.to_string()))
}

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\w+([.-]?\w+)*@\w+([.-]?\w+)*(\.\w{2,3})+$").expect("email pattern compiles")
});

pub(crate) fn is_email(value: &str) -> bool {
    EMAIL.is_match(value)
}

pub(crate) fn is_http_url(value: &str) -> bool {
    Url::parse(value).is_ok_and(|u| matches!(u.scheme(), "http" | "https") && u.has_host())
}

/// Push `message` when a required string is missing (on create) or blank.
pub(crate) fn require_text(
    errors: &mut Vec<String>,
    value: Option<&str>,
    mode: Mode,
    message: &str,
) {
    let missing = match value {
        None => mode == Mode::Create,
        Some(v) => v.trim().is_empty(),
    };
    if missing {
        errors.push(message.to_string());
    }
}

pub(crate) fn require_value<T>(errors: &mut Vec<String>, value: Option<T>, mode: Mode, message: &str) {
    if value.is_none() && mode == Mode::Create {
        errors.push(message.to_string());
    }
}

/// Integral values are stored as integers so they read back the way they
/// were written.
pub(crate) fn number(value: f64) -> Bson {
    if value.fract() == 0.0 && value >= f64::from(i32::MIN) && value <= f64::from(i32::MAX) {
        Bson::Int32(value as i32)
    } else {
        Bson::Double(value)
    }
}

/// Accept a JSON number or a numeric string.
pub(crate) fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }

    match Option::<Raw>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Raw::Number(n)) => Ok(Some(n)),
        Some(Raw::Text(s)) => s
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .map(Some)
            .ok_or_else(|| D::Error::custom(format!("`{s}` is not a number"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_shape() {
        assert!(is_email("john@gmail.com"));
        assert!(is_email("mary.jane-doe@mail.example.org"));
        assert!(!is_email("john@"));
        assert!(!is_email("no spaces@x.com"));
    }

    #[test]
    fn urls_need_http() {
        assert!(is_http_url("https://devworks.com"));
        assert!(!is_http_url("ftp://devworks.com"));
        assert!(!is_http_url("devworks.com"));
    }

    #[test]
    fn bad_object_id() {
        let err = parse_id("123").unwrap_err();
        assert_eq!(err.to_string(), "Resource not found with id of 123");
    }

    #[test]
    fn whole_numbers_become_ints() {
        assert_eq!(number(8.0), Bson::Int32(8));
        assert_eq!(number(8.5), Bson::Double(8.5));
    }

    #[test]
    fn numbers_from_strings() {
        #[derive(Deserialize)]
        struct Weeks {
            #[serde(default, deserialize_with = "lenient_number")]
            weeks: Option<f64>,
        }
        let w: Weeks = serde_json::from_str(r#"{"weeks": "8"}"#).unwrap();
        assert_eq!(w.weeks, Some(8.0));
        let w: Weeks = serde_json::from_str(r#"{"weeks": 12}"#).unwrap();
        assert_eq!(w.weeks, Some(12.0));
        let w: Weeks = serde_json::from_str(r#"{}"#).unwrap();
        assert_eq!(w.weeks, None);
        assert!(serde_json::from_str::<Weeks>(r#"{"weeks": "eight"}"#).is_err());
    }
}
