//! geo-distance: distance ranking against a geocoded address
//!
//! A library and CLI tool that orders record ids by great-circle distance to
//! a reference point resolved from a free-form address.
//!
//! ## Features
//!
//! - Read-through coordinate cache in front of named lookup providers
//!   (OpenStreetMap Nominatim, Google Maps)
//! - Spherical law of cosines distance, as a SQL expression or in-process
//! - Fail-open ranking: ranked ids first, unranked ids in input order
//! - HTTP API + CLI interface
//!
//! ## Quick Start
//!
//! ```rust
//! use geo_distance::coord::{distance, Coordinates};
//!
//! let berlin = Coordinates::new(52.52, 13.405);
//! let paris = Coordinates::new(48.8566, 2.3522);
//!
//! let km = distance::rounded_distance_km(berlin, paris, 2);
//! assert!((km - 878.0).abs() < 2.0);
//!
//! let formula = distance::build_formula(berlin, "lat", "lng", 2).unwrap();
//! assert!(formula.starts_with("ROUND(6371 * ACOS(LEAST(1, "));
//! ```

pub mod cli;
pub mod config;
pub mod constants;
pub mod coord;
pub mod error;
pub mod field;
pub mod format;
pub mod geo;
pub mod rank;
pub mod request;
pub mod server;
pub mod store;

// Re-export commonly used types
pub use config::Config;
pub use coord::Coordinates;
pub use error::{Error, ResolutionError, Result};
pub use field::{FieldConfiguration, RecordId, RecordModel};
pub use rank::RankingEngine;
pub use request::RequestParams;
pub use store::SortDirection;
