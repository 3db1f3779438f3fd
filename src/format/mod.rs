//! Output formatters
//!
//! Provides trait-based output formatting for ranking and lookup results.

pub mod json;
pub mod text;

use crate::constants::geo::NO_DISTANCE;
use crate::coord::Coordinates;
use crate::error::Result;
use crate::field::RecordId;
use crate::geo::cache::Resolution;
use crate::store::SortDirection;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Information about an output format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormatInfo {
    /// Format name
    pub name: String,
    /// Format description
    pub description: String,
}

/// Result of ranking a set of ids
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingReport {
    pub field: String,
    pub direction: SortDirection,
    /// Ids in ranked order
    pub ids: Vec<RecordId>,
    /// Distance per id in kilometers, -1 when unknown
    pub distances: BTreeMap<RecordId, f64>,
}

impl RankingReport {
    /// Distance of an id, None if unknown
    pub fn distance(&self, id: RecordId) -> Option<f64> {
        self.distances
            .get(&id)
            .copied()
            .filter(|d| *d != NO_DISTANCE)
    }

    /// Number of ids with a known distance
    pub fn ranked_count(&self) -> usize {
        self.ids.iter().filter(|id| self.distance(**id).is_some()).count()
    }
}

/// Result of resolving an address
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolutionReport {
    pub address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    pub found: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coords: Option<Coordinates>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provenance: Option<String>,
    pub cached: bool,
}

impl ResolutionReport {
    pub fn new(address: &str, country: Option<&str>, resolution: Option<Resolution>) -> Self {
        Self {
            address: address.to_string(),
            country: country.map(String::from),
            found: resolution.is_some(),
            cached: resolution.as_ref().is_some_and(|r| r.cached),
            coords: resolution.as_ref().map(|r| r.coords),
            provenance: resolution.map(|r| r.provenance),
        }
    }
}

/// Trait for output formatters
pub trait OutputFormatter: Send + Sync {
    /// Get the format name
    fn name(&self) -> &str;

    /// Get the format description
    fn description(&self) -> &str;

    /// Format a ranking result
    fn format_ranking(&self, report: &RankingReport) -> Result<String>;

    /// Format an address lookup
    fn format_resolution(&self, report: &ResolutionReport) -> Result<String>;
}

/// Get a formatter by name
pub fn get_formatter(name: &str) -> Option<Box<dyn OutputFormatter>> {
    match name.to_lowercase().as_str() {
        "json" => Some(Box::new(json::JsonFormatter)),
        "text" => Some(Box::new(text::TextFormatter)),
        _ => None,
    }
}

/// List all available formatters
pub fn available_formats() -> Vec<FormatInfo> {
    vec![
        FormatInfo {
            name: "json".to_string(),
            description: "Full JSON report".to_string(),
        },
        FormatInfo {
            name: "text".to_string(),
            description: "Human-readable text".to_string(),
        },
    ]
}
