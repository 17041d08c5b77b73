use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use bson::{Document, doc};
use serde::Deserialize;
use thiserror::Error;

use crate::error::ApiError;

#[derive(Debug, Error)]
pub enum GeocodeError {
    #[error("Could not find a location for {0}")]
    NotFound(String),

    #[error("geocoder unavailable: {0}")]
    Unavailable(String),
}

impl From<GeocodeError> for ApiError {
    fn from(e: GeocodeError) -> Self {
        match e {
            GeocodeError::NotFound(_) => ApiError::BadRequest(e.to_string()),
            GeocodeError::Unavailable(_) => ApiError::Upstream(e.to_string()),
        }
    }
}

/// A geocoded address.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub longitude: f64,
    pub latitude: f64,
    pub formatted_address: String,
    #[serde(default)]
    pub street: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub zipcode: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
}

impl Location {
    /// GeoJSON point plus address parts, as stored on a bootcamp.
    pub fn to_document(&self) -> Document {
        let mut out = doc! {
            "type": "Point",
            "coordinates": [self.longitude, self.latitude],
            "formattedAddress": self.formatted_address.clone(),
        };
        for (key, value) in [
            ("street", &self.street),
            ("city", &self.city),
            ("state", &self.state),
            ("zipcode", &self.zipcode),
            ("country", &self.country),
        ] {
            if let Some(value) = value {
                out.insert(key, value.as_str());
            }
        }
        out
    }
}

/// Resolves free-form addresses and zipcodes to coordinates.
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn geocode(&self, address: &str) -> Result<Location, GeocodeError>;
}

/// Used when no provider is configured. Every lookup fails.
pub struct NoGeocoder;

#[async_trait]
impl Geocoder for NoGeocoder {
    async fn geocode(&self, _address: &str) -> Result<Location, GeocodeError> {
        Err(GeocodeError::Unavailable("no geocoder configured".into()))
    }
}

/// Fixed lookup table keyed by address or zipcode, matched case-insensitively.
#[derive(Debug, Default)]
pub struct TableGeocoder {
    entries: HashMap<String, Location>,
}

fn normalize(address: &str) -> String {
    address.trim().to_lowercase()
}

impl TableGeocoder {
    pub fn new(entries: impl IntoIterator<Item = (String, Location)>) -> Self {
        Self {
            entries: entries
                .into_iter()
                .map(|(k, v)| (normalize(&k), v))
                .collect(),
        }
    }

    /// Load a JSON object of `{ "<address>": Location }`.
    pub fn load(path: &Path) -> Result<Self, GeocodeError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| GeocodeError::Unavailable(format!("{}: {e}", path.display())))?;
        let entries: HashMap<String, Location> = serde_json::from_str(&raw)
            .map_err(|e| GeocodeError::Unavailable(format!("{}: {e}", path.display())))?;
        Ok(Self::new(entries))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl Geocoder for TableGeocoder {
    async fn geocode(&self, address: &str) -> Result<Location, GeocodeError> {
        let key = normalize(address);
        if let Some(location) = self.entries.get(&key) {
            return Ok(location.clone());
        }
        // A bare zipcode also matches any entry located in it.
        self.entries
            .values()
            .find(|l| l.zipcode.as_deref().is_some_and(|z| normalize(z) == key))
            .cloned()
            .ok_or_else(|| GeocodeError::NotFound(address.to_string()))
    }
}
