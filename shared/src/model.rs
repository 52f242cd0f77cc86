use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::city_store::CityStore;
use crate::detail::{geocode_address, MapRegion};
use crate::AppError;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GeocodeRequestId(pub String);

impl GeocodeRequestId {
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GeocodeRequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The city a detail view is showing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub city: String,
    pub country: String,
}

impl Selection {
    pub fn new(city: impl Into<String>, country: impl Into<String>) -> Self {
        Self {
            city: city.into(),
            country: country.into(),
        }
    }

    #[must_use]
    pub fn address(&self) -> String {
        geocode_address(&self.city, &self.country)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum MapStatus {
    Locating,
    Located(MapRegion),
    Failed,
}

#[derive(Clone, Debug, PartialEq)]
pub enum DetailView {
    Map {
        selection: Selection,
        status: MapStatus,
    },
    WebPage {
        selection: Selection,
        /// `None` when the constructed address does not parse.
        url: Option<String>,
        error_html: Option<String>,
    },
}

impl DetailView {
    #[must_use]
    pub const fn selection(&self) -> &Selection {
        match self {
            Self::Map { selection, .. } | Self::WebPage { selection, .. } => selection,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AppState {
    #[default]
    Loading,
    Ready,
}

#[derive(Debug, Default)]
pub struct Model {
    pub state: AppState,
    pub store: CityStore,
    pub editing: bool,

    pub detail: Option<DetailView>,
    /// Only the result for this request is applied; anything else is stale.
    pub pending_geocode: Option<GeocodeRequestId>,
    pub network_activity: bool,

    pub active_error: Option<AppError>,
}

impl Model {
    pub fn set_error(&mut self, error: AppError) {
        self.active_error = Some(error);
    }

    pub fn clear_error(&mut self) {
        self.active_error = None;
    }

    pub fn is_ready(&self) -> bool {
        self.state == AppState::Ready
    }

    /// Closes the detail view and forgets any lookup it started.
    pub fn close_detail(&mut self) {
        self.detail = None;
        self.pending_geocode = None;
        self.network_activity = false;
    }
}
