use bson::{Bson, Document};

use crate::path::get_path;
use crate::value::as_f64;

/// Central angle in radians between two `[lng, lat]` points given in degrees.
pub fn central_angle(a: [f64; 2], b: [f64; 2]) -> f64 {
    let (lng1, lat1) = (a[0].to_radians(), a[1].to_radians());
    let (lng2, lat2) = (b[0].to_radians(), b[1].to_radians());
    let dlat = lat2 - lat1;
    let dlng = lng2 - lng1;
    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlng / 2.0).sin().powi(2);
    2.0 * h.sqrt().min(1.0).asin()
}

/// `[lng, lat]` of the GeoJSON point stored at `field`.
pub(crate) fn point_at(doc: &Document, field: &str) -> Option<[f64; 2]> {
    let point = match get_path(doc, field)? {
        Bson::Document(d) => d,
        _ => return None,
    };
    match point.get("coordinates")? {
        Bson::Array(coords) if coords.len() == 2 => Some([as_f64(&coords[0])?, as_f64(&coords[1])?]),
        _ => None,
    }
}
