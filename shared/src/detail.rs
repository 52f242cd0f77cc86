//! Inputs for the two read-only detail views: the map and the Wikipedia page.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::{MAP_SPAN_DEGREES, WIKIPEDIA_BASE_URL};

#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum CoordinateError {
    #[error("coordinate is not finite")]
    NonFinite,
    #[error("latitude out of range: {0}")]
    LatitudeOutOfRange(f64),
    #[error("longitude out of range: {0}")]
    LongitudeOutOfRange(f64),
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct RawCoordinate {
    lat: f64,
    lon: f64,
}

/// Validated, NaN-safe lat/lon.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCoordinate")]
pub struct Coordinate {
    lat: f64,
    lon: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lon: f64) -> Result<Self, CoordinateError> {
        if !lat.is_finite() || !lon.is_finite() {
            return Err(CoordinateError::NonFinite);
        }
        if !(-90.0..=90.0).contains(&lat) {
            return Err(CoordinateError::LatitudeOutOfRange(lat));
        }
        if !(-180.0..=180.0).contains(&lon) {
            return Err(CoordinateError::LongitudeOutOfRange(lon));
        }
        Ok(Self { lat, lon })
    }

    #[must_use]
    pub const fn lat(self) -> f64 {
        self.lat
    }

    #[must_use]
    pub const fn lon(self) -> f64 {
        self.lon
    }
}

impl TryFrom<RawCoordinate> for Coordinate {
    type Error = CoordinateError;

    fn try_from(raw: RawCoordinate) -> Result<Self, Self::Error> {
        Self::new(raw.lat, raw.lon)
    }
}

/// Visible map area: one degree of latitude is roughly 111 km.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MapRegion {
    pub center: Coordinate,
    pub latitude_delta: f64,
    pub longitude_delta: f64,
}

impl MapRegion {
    #[must_use]
    pub const fn around(center: Coordinate) -> Self {
        Self {
            center,
            latitude_delta: MAP_SPAN_DEGREES,
            longitude_delta: MAP_SPAN_DEGREES,
        }
    }
}

/// Free-text address handed to the geocoder.
#[must_use]
pub fn geocode_address(city: &str, country: &str) -> String {
    format!("{city}, {country}")
}

/// Wikipedia article address for a city. Not validated.
#[must_use]
pub fn wikipedia_url(city: &str) -> String {
    format!("{WIKIPEDIA_BASE_URL}{}", city.replace(' ', "_"))
}

pub fn parse_page_url(raw: &str) -> Result<Url, url::ParseError> {
    Url::parse(raw)
}

/// Markup shown inside the web view when a page cannot be loaded.
#[must_use]
pub fn page_error_html(description: &str) -> String {
    format!(
        "<html><font size=+2 color='red'><p>An error occurred: <br />\
         Possible causes for this error:<br />\
         - No network connection<br />\
         - Wrong URL entered<br />\
         - Server computer is down</p></font></html>{}",
        escape_html(description)
    )
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '&' => escaped.push_str("&amp;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
