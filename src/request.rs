//! Request parameters
//!
//! The ranking engine reads the address and country from the incoming
//! request through `RequestReader`. `RequestParams` is the owned
//! implementation used by the HTTP server and the CLI.

use crate::field::{CountryMode, FieldConfiguration};
use std::collections::HashMap;

/// Read access to GET and POST parameters
pub trait RequestReader {
    fn get(&self, name: &str) -> Option<String>;

    fn post(&self, name: &str) -> Option<String>;
}

/// GET and POST parameters of one request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestParams {
    get: HashMap<String, String>,
    post: HashMap<String, String>,
}

impl RequestParams {
    /// Create an empty parameter set
    pub fn new() -> Self {
        Self::default()
    }

    /// Create from already-parsed parameter maps
    pub fn from_maps(get: HashMap<String, String>, post: HashMap<String, String>) -> Self {
        Self { get, post }
    }

    pub fn with_get(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.get.insert(name.into(), value.into());
        self
    }

    pub fn with_post(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.post.insert(name.into(), value.into());
        self
    }
}

impl RequestReader for RequestParams {
    fn get(&self, name: &str) -> Option<String> {
        self.get.get(name).cloned()
    }

    fn post(&self, name: &str) -> Option<String> {
        self.post.get(name).cloned()
    }
}

/// The address to rank by, trimmed; empty if the parameter is absent
///
/// Only the query string is consulted.
pub fn read_address(field: &FieldConfiguration, request: &dyn RequestReader) -> String {
    if field.get_param.trim().is_empty() {
        return String::new();
    }
    request
        .get(&field.get_param)
        .map(|v| v.trim().to_string())
        .unwrap_or_default()
}

/// The lookup country for a request
///
/// * `get` mode: the country parameter from GET, or POST if GET is empty;
///   trimmed, empty means none
/// * `preset` mode: the configured country
/// * otherwise none
pub fn country_information(
    field: &FieldConfiguration,
    request: &dyn RequestReader,
) -> Option<String> {
    match field.country_mode {
        CountryMode::Get => {
            let param = field.country_param.as_deref().filter(|p| !p.is_empty())?;
            let value = request
                .get(param)
                .filter(|v| !v.is_empty())
                .or_else(|| request.post(param))?;
            let value = value.trim();
            (!value.is_empty()).then(|| value.to_string())
        }
        CountryMode::Preset => field.country_preset.clone(),
        CountryMode::None => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field() -> FieldConfiguration {
        FieldConfiguration::new("distance").with_get_param("geo")
    }

    #[test]
    fn test_read_address() {
        let request = RequestParams::new().with_get("geo", "  Alexanderplatz 1 ");
        assert_eq!(read_address(&field(), &request), "Alexanderplatz 1");
    }

    #[test]
    fn test_read_address_ignores_post() {
        let request = RequestParams::new().with_post("geo", "Alexanderplatz 1");
        assert_eq!(read_address(&field(), &request), "");
    }

    #[test]
    fn test_read_address_without_param_name() {
        let request = RequestParams::new().with_get("", "x");
        assert_eq!(read_address(&FieldConfiguration::new("d"), &request), "");
    }

    #[test]
    fn test_country_from_get() {
        let field = field().with_country_param("country");
        let request = RequestParams::new()
            .with_get("country", " DE ")
            .with_post("country", "AT");
        assert_eq!(country_information(&field, &request), Some("DE".to_string()));
    }

    #[test]
    fn test_country_post_fallback() {
        let field = field().with_country_param("country");

        let request = RequestParams::new().with_post("country", "AT");
        assert_eq!(country_information(&field, &request), Some("AT".to_string()));

        let request = RequestParams::new()
            .with_get("country", "")
            .with_post("country", "CH");
        assert_eq!(country_information(&field, &request), Some("CH".to_string()));
    }

    #[test]
    fn test_country_blank_is_none() {
        let field = field().with_country_param("country");
        let request = RequestParams::new().with_get("country", "   ");
        assert_eq!(country_information(&field, &request), None);
        assert_eq!(country_information(&field, &RequestParams::new()), None);
    }

    #[test]
    fn test_country_get_mode_without_param_name() {
        let mut field = field();
        field.country_mode = CountryMode::Get;
        let request = RequestParams::new().with_get("country", "DE");
        assert_eq!(country_information(&field, &request), None);
    }

    #[test]
    fn test_country_preset() {
        let field = field().with_country_preset("fr");
        let request = RequestParams::new().with_get("country", "DE");
        assert_eq!(country_information(&field, &request), Some("fr".to_string()));
    }

    #[test]
    fn test_country_none_mode() {
        let request = RequestParams::new().with_get("country", "DE");
        assert_eq!(country_information(&field(), &request), None);
    }
}
