//! Great-circle distance
//!
//! Distances use the spherical law of cosines on a 6371 km sphere:
//!
//! ```text
//! d = R * acos( cos(lat1) * cos(lat2) * cos(lng2 - lng1) + sin(lat1) * sin(lat2) )
//! ```
//!
//! The same expression is available as a SQL fragment (`build_formula`) so a
//! store can sort natively, and as a plain function (`distance_km`) for
//! stores that evaluate it in-process. Both clamp the acos argument to 1:
//! for identical or nearly identical points rounding can push the cosine
//! slightly above 1, which would make acos return NaN.

use crate::constants::geo::{EARTH_RADIUS_KM, MAX_PRECISION};
use crate::coord::Coordinates;
use crate::error::{Error, Result};

/// Distance in kilometers between two points
pub fn distance_km(reference: Coordinates, point: Coordinates) -> f64 {
    let ref_lat = reference.lat.to_radians();
    let lat = point.lat.to_radians();
    let delta_lng = point.lng.to_radians() - reference.lng.to_radians();

    let cos_angle = ref_lat.cos() * lat.cos() * delta_lng.cos() + ref_lat.sin() * lat.sin();

    EARTH_RADIUS_KM * cos_angle.min(1.0).max(-1.0).acos()
}

/// Round to `precision` decimal digits, half away from zero (like SQL ROUND)
///
/// `precision` is capped at `MAX_PRECISION`.
pub fn round_to(value: f64, precision: u32) -> f64 {
    let factor = 10f64.powi(precision.min(MAX_PRECISION) as i32);
    (value * factor).round() / factor
}

/// Distance in kilometers rounded to `precision` digits
pub fn rounded_distance_km(reference: Coordinates, point: Coordinates, precision: u32) -> f64 {
    round_to(distance_km(reference, point), precision)
}

/// Build the distance formula as a query expression
///
/// # Arguments
/// * `reference` - Fixed reference point, inlined as numeric literals
/// * `lat_column` - Column holding each row's latitude
/// * `lng_column` - Column holding each row's longitude
/// * `precision` - Decimal digits for the server-side ROUND
///
/// # Returns
/// An expression evaluating to the distance in kilometers
pub fn build_formula(
    reference: Coordinates,
    lat_column: &str,
    lng_column: &str,
    precision: u32,
) -> Result<String> {
    reference.validate()?;
    let lat = validate_identifier(lat_column)?;
    let lng = validate_identifier(lng_column)?;
    let ref_lat = reference.lat;
    let ref_lng = reference.lng;

    Ok(format!(
        "ROUND({EARTH_RADIUS_KM} * ACOS(LEAST(1, \
         COS(RADIANS({ref_lat})) * COS(RADIANS({lat})) * COS(RADIANS({lng}) - RADIANS({ref_lng})) \
         + SIN(RADIANS({ref_lat})) * SIN(RADIANS({lat})))), {precision})"
    ))
}

/// Check that a column or table name is a plain identifier
///
/// Accepts `name` or `table.name` where each part matches
/// `[A-Za-z_][A-Za-z0-9_]*`.
pub fn validate_identifier(identifier: &str) -> Result<&str> {
    let valid_part = |part: &str| {
        let mut chars = part.chars();
        matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
            && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
    };

    let parts: Vec<&str> = identifier.split('.').collect();
    if parts.len() <= 2 && parts.iter().all(|p| valid_part(p)) {
        Ok(identifier)
    } else {
        Err(Error::InvalidIdentifier(identifier.to_string()))
    }
}
