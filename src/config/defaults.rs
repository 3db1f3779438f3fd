//! Default configuration values
//!
//! Named constants for all tunable parameters

use crate::constants::api::{GOOGLE_MAPS_URL, NOMINATIM_URL};

/// Default OpenStreetMap Nominatim endpoint
pub const DEFAULT_NOMINATIM_URL: &str = NOMINATIM_URL;

/// Default Google Maps endpoint
pub const DEFAULT_GOOGLE_URL: &str = GOOGLE_MAPS_URL;

/// User agent sent to lookup providers (Nominatim requires one)
pub const DEFAULT_USER_AGENT: &str = concat!("geo-distance/", env!("CARGO_PKG_VERSION"));

/// Provider request timeout in seconds
pub const DEFAULT_PROVIDER_TIMEOUT_SECS: u64 = 30;

/// Default server host
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default server port
pub const DEFAULT_PORT: u16 = 7878;

/// Config file name
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Coordinate cache file name
pub const CACHE_FILE_NAME: &str = "coordinate_cache.json";

/// Application directory name (for XDG paths)
pub const APP_DIR_NAME: &str = "geo-distance";
