//! Field configuration and record model
//!
//! A distance field is configured once (usually in the config file) and
//! drives one ranking engine. The record model describes the table the
//! field ranks and the attributes it can read coordinates from.

use crate::constants::geo::{DEFAULT_PRECISION, MAX_PRECISION};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Record identifier
pub type RecordId = u64;

/// Where the lookup country comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CountryMode {
    /// No country is sent to the providers
    #[default]
    None,
    /// A fixed country from the field configuration
    Preset,
    /// A request parameter (GET, falling back to POST)
    Get,
}

impl std::str::FromStr for CountryMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "none" | "" => Ok(Self::None),
            "preset" => Ok(Self::Preset),
            "get" | "request" => Ok(Self::Get),
            _ => Err(format!("Unknown country mode: {}", s)),
        }
    }
}

/// How record coordinates are stored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataMode {
    /// One point attribute, stored in the shared point table
    Single,
    /// Two numeric columns on the record table (latitude, longitude)
    Multi,
}

impl std::str::FromStr for DataMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "single" => Ok(Self::Single),
            "multi" => Ok(Self::Multi),
            _ => Err(format!("Unknown data mode: {}", s)),
        }
    }
}

/// A provider entry in a field's lookup list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupService {
    /// Registered provider name
    pub service: String,
    /// Provider credential
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_token: Option<String>,
}

impl LookupService {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            api_token: None,
        }
    }

    pub fn with_api_token(mut self, api_token: impl Into<String>) -> Self {
        self.api_token = Some(api_token.into());
        self
    }
}

/// Configuration of one distance field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldConfiguration {
    /// Field identifier, unique per record model
    pub id: String,

    /// Request parameter carrying the address
    #[serde(default)]
    pub get_param: String,

    #[serde(default)]
    pub country_mode: CountryMode,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country_preset: Option<String>,

    /// Request parameter carrying the country (country_mode = get)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country_param: Option<String>,

    /// Providers, tried in order
    #[serde(default)]
    pub lookup_services: Vec<LookupService>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_mode: Option<DataMode>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub single_attr_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_attr_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub second_attr_id: Option<String>,

    /// Decimal digits kept for distances
    #[serde(default = "default_precision")]
    pub precision: u32,
}

fn default_precision() -> u32 {
    DEFAULT_PRECISION
}

impl FieldConfiguration {
    /// Create an unconfigured field
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            get_param: String::new(),
            country_mode: CountryMode::None,
            country_preset: None,
            country_param: None,
            lookup_services: Vec::new(),
            data_mode: None,
            single_attr_id: None,
            first_attr_id: None,
            second_attr_id: None,
            precision: DEFAULT_PRECISION,
        }
    }

    /// Read the address from this request parameter
    pub fn with_get_param(mut self, name: impl Into<String>) -> Self {
        self.get_param = name.into();
        self
    }

    /// Use a fixed country
    pub fn with_country_preset(mut self, country: impl Into<String>) -> Self {
        self.country_mode = CountryMode::Preset;
        self.country_preset = Some(country.into());
        self
    }

    /// Read the country from this request parameter
    pub fn with_country_param(mut self, name: impl Into<String>) -> Self {
        self.country_mode = CountryMode::Get;
        self.country_param = Some(name.into());
        self
    }

    /// Append a provider to the lookup list
    pub fn with_lookup_service(mut self, service: LookupService) -> Self {
        self.lookup_services.push(service);
        self
    }

    /// Rank by a point attribute
    pub fn with_single_attribute(mut self, attr: impl Into<String>) -> Self {
        self.data_mode = Some(DataMode::Single);
        self.single_attr_id = Some(attr.into());
        self
    }

    /// Rank by a latitude and a longitude attribute
    pub fn with_attribute_pair(
        mut self,
        latitude: impl Into<String>,
        longitude: impl Into<String>,
    ) -> Self {
        self.data_mode = Some(DataMode::Multi);
        self.first_attr_id = Some(latitude.into());
        self.second_attr_id = Some(longitude.into());
        self
    }

    pub fn with_precision(mut self, precision: u32) -> Self {
        self.precision = precision;
        self
    }

    /// True if the field has both an address parameter and providers
    pub fn is_configured(&self) -> bool {
        !self.get_param.trim().is_empty() && !self.lookup_services.is_empty()
    }

    /// Check the data mode against the record model
    ///
    /// Single mode needs a point attribute; multi mode needs two scalar
    /// attributes.
    pub fn validate(&self, model: &RecordModel) -> Result<()> {
        match self.data_mode {
            Some(DataMode::Single) => {
                let attribute = model.require(self.single_attr_id.as_deref(), "single_attr_id")?;
                if !attribute.kind.is_point() {
                    return Err(Error::Attribute(format!(
                        "Attribute '{}' of field '{}' is not a geolocation attribute",
                        attribute.col_name, self.id
                    )));
                }
            }
            Some(DataMode::Multi) => {
                for (reference, setting) in [
                    (self.first_attr_id.as_deref(), "first_attr_id"),
                    (self.second_attr_id.as_deref(), "second_attr_id"),
                ] {
                    let attribute = model.require(reference, setting)?;
                    if attribute.kind.is_point() {
                        return Err(Error::Attribute(format!(
                            "Attribute '{}' of field '{}' must be a scalar attribute",
                            attribute.col_name, self.id
                        )));
                    }
                }
            }
            None => {}
        }

        if self.precision > MAX_PRECISION {
            return Err(Error::Config(format!(
                "Field '{}' has precision {}, at most {} digits are supported",
                self.id, self.precision, MAX_PRECISION
            )));
        }

        if self.country_mode == CountryMode::Preset && self.country_preset.is_none() {
            return Err(Error::Config(format!(
                "Field '{}' uses a preset country but has no country_preset",
                self.id
            )));
        }

        Ok(())
    }
}

/// Attribute type tag
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeKind {
    /// Point attribute, stored in the shared point table
    Geolocation,
    Numeric,
    Decimal,
    Text,
    #[serde(other)]
    Other,
}

impl AttributeKind {
    pub fn is_point(&self) -> bool {
        matches!(self, Self::Geolocation)
    }
}

/// An attribute of the record model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub id: String,
    pub col_name: String,
    #[serde(default)]
    pub name: String,
    pub kind: AttributeKind,
}

impl Attribute {
    pub fn new(id: impl Into<String>, col_name: impl Into<String>, kind: AttributeKind) -> Self {
        let col_name = col_name.into();
        Self {
            id: id.into(),
            name: col_name.clone(),
            col_name,
            kind,
        }
    }
}

/// The record table a field ranks
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RecordModel {
    #[serde(default)]
    pub table_name: String,
    #[serde(default)]
    pub attributes: Vec<Attribute>,
}

impl RecordModel {
    pub fn new(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            attributes: Vec::new(),
        }
    }

    pub fn with_attribute(mut self, attribute: Attribute) -> Self {
        self.attributes.push(attribute);
        self
    }

    /// Find an attribute by id or column name
    pub fn attribute(&self, reference: &str) -> Option<&Attribute> {
        self.attributes
            .iter()
            .find(|a| a.id == reference)
            .or_else(|| self.attributes.iter().find(|a| a.col_name == reference))
    }

    /// Find a configured attribute, failing if unset or unknown
    pub fn require(&self, reference: Option<&str>, setting: &str) -> Result<&Attribute> {
        let reference = reference
            .filter(|r| !r.trim().is_empty())
            .ok_or_else(|| Error::Attribute(format!("Setting '{}' is not set", setting)))?;

        self.attribute(reference)
            .ok_or_else(|| Error::Attribute(format!("Unknown attribute: {}", reference)))
    }
}
