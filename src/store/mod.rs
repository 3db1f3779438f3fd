//! Persistence boundary
//!
//! The crate does not own a database. It talks to two abstract stores:
//! - `CacheStore`: the insert-only coordinate cache table
//! - `DistanceStore`: executes distance queries against the point table or
//!   a record table
//!
//! `DistanceQuery::to_sql` renders the parameterized statement for SQL
//! backed stores; `memory::MemoryStore` evaluates the same query in-process.

pub mod json;
pub mod memory;

use crate::constants::tables::{CACHE_TABLE, POINT_TABLE};
use crate::coord::distance::{build_formula, validate_identifier};
use crate::coord::Coordinates;
use crate::error::Result;
use crate::field::RecordId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A cached lookup result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Trimmed address as searched
    pub search: String,
    /// Trimmed country as searched (empty if none)
    pub country: String,
    pub geo_lat: f64,
    pub geo_long: f64,
    /// Where the coordinate came from
    #[serde(default)]
    pub provenance: String,
    pub created_at: DateTime<Utc>,
}

impl CacheEntry {
    pub fn new(
        search: impl Into<String>,
        country: impl Into<String>,
        coords: Coordinates,
        provenance: impl Into<String>,
    ) -> Self {
        Self {
            search: search.into(),
            country: country.into(),
            geo_lat: coords.lat,
            geo_long: coords.lng,
            provenance: provenance.into(),
            created_at: Utc::now(),
        }
    }

    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.geo_lat, self.geo_long)
    }
}

/// Insert-only store for resolved coordinates
///
/// Lookups are exact, case-sensitive matches on (search, country). Stores
/// may hold duplicate rows for a key; `find` returns the first.
pub trait CacheStore: Send + Sync {
    fn find(&self, search: &str, country: &str) -> Result<Option<CacheEntry>>;

    fn insert(&self, entry: CacheEntry) -> Result<()>;
}

/// Render the cache lookup with its values inlined, for diagnostics
pub fn cache_lookup_statement(search: &str, country: &str) -> String {
    format!(
        "SELECT * FROM {} WHERE search = {} AND country = {}",
        CACHE_TABLE,
        quote_literal(search),
        quote_literal(country)
    )
}

fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Sort direction for ranked ids
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

impl std::str::FromStr for SortDirection {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            _ => Err(format!("Unknown sort direction: {}", s)),
        }
    }
}

impl std::fmt::Display for SortDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_sql())
    }
}

/// Which table holds the record coordinates
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DistanceSource {
    /// Shared point table, rows owned by one attribute
    PointStore { attribute_id: String },
    /// The record table itself, with two coordinate columns
    RecordTable {
        table: String,
        lat_column: String,
        lng_column: String,
    },
}

/// A distance query for a set of record ids
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceQuery {
    pub reference: Coordinates,
    pub source: DistanceSource,
    pub ids: Vec<RecordId>,
    pub direction: SortDirection,
    pub precision: u32,
}

/// Bound parameter of a rendered statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlParam {
    Id(RecordId),
    Text(String),
}

/// A parameterized statement with `?` placeholders
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlStatement {
    pub sql: String,
    pub params: Vec<SqlParam>,
}

impl DistanceQuery {
    /// Table the query reads from
    pub fn table(&self) -> &str {
        match &self.source {
            DistanceSource::PointStore { .. } => POINT_TABLE,
            DistanceSource::RecordTable { table, .. } => table,
        }
    }

    /// The distance expression for this query's source columns
    pub fn formula(&self) -> Result<String> {
        let (lat, lng) = match &self.source {
            DistanceSource::PointStore { .. } => ("latitude", "longitude"),
            DistanceSource::RecordTable {
                lat_column,
                lng_column,
                ..
            } => (lat_column.as_str(), lng_column.as_str()),
        };
        build_formula(self.reference, lat, lng, self.precision)
    }

    /// Render the full statement
    ///
    /// Yields `id` and `item_dist` columns, ordered by distance.
    pub fn to_sql(&self) -> Result<SqlStatement> {
        let table = validate_identifier(self.table())?;
        let formula = self.formula()?;

        let placeholders = vec!["?"; self.ids.len()].join(", ");
        let mut params: Vec<SqlParam> = self.ids.iter().copied().map(SqlParam::Id).collect();

        let mut sql = format!(
            "SELECT id, {} AS item_dist FROM {} WHERE id IN ({})",
            formula, table, placeholders
        );
        if let DistanceSource::PointStore { attribute_id } = &self.source {
            sql.push_str(" AND att_id = ?");
            params.push(SqlParam::Text(attribute_id.clone()));
        }
        sql.push_str(&format!(" ORDER BY item_dist {}", self.direction.as_sql()));

        Ok(SqlStatement { sql, params })
    }
}

/// One ranked row
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DistanceRow {
    pub id: RecordId,
    /// Rounded distance in kilometers
    pub distance: f64,
}

/// Executes distance queries
///
/// SQL-backed implementations run `DistanceQuery::to_sql`; in-process ones
/// must return the same rows `rounded_distance_km` yields for the query.
pub trait DistanceStore: Send + Sync {
    /// Rows for the matching ids, ordered by distance in the query's direction
    fn query_distances(&self, query: &DistanceQuery) -> Result<Vec<DistanceRow>>;
}
