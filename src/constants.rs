//! Centralized constants for the geo-distance crate
//!
//! This module consolidates constants that are used across multiple modules
//! to avoid duplication and ensure consistency.

/// Geographic constants
pub mod geo {
    /// Mean Earth radius in kilometers
    pub const EARTH_RADIUS_KM: f64 = 6371.0;

    /// Decimal digits kept for computed distances
    pub const DEFAULT_PRECISION: u32 = 2;

    /// Most decimal digits an f64 distance can carry
    pub const MAX_PRECISION: u32 = 15;

    /// Distance reported for records without a computed distance
    pub const NO_DISTANCE: f64 = -1.0;
}

/// External API endpoints
pub mod api {
    /// OpenStreetMap Nominatim geocoding API
    pub const NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org";

    /// Google Maps Platform (geocoding lives under /maps/api/geocode)
    pub const GOOGLE_MAPS_URL: &str = "https://maps.googleapis.com";
}

/// Store table names
pub mod tables {
    /// Persistent coordinate cache (search, country, geo_lat, geo_long)
    pub const CACHE_TABLE: &str = "geo_search_cache";

    /// Shared point-store table (id, att_id, latitude, longitude)
    pub const POINT_TABLE: &str = "geo_points";
}

/// Registered provider names
pub mod providers {
    /// OpenStreetMap Nominatim
    pub const OPENSTREETMAP: &str = "openstreetmap";

    /// Google Maps Geocoding API
    pub const GOOGLE_MAPS: &str = "google_maps";
}
