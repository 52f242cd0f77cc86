#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::too_many_lines)]

pub mod capabilities;
pub mod city_store;
pub mod detail;
pub mod event;
pub mod model;
pub mod persistence;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub use app::App;
pub use capabilities::{Capabilities, Effect};
pub use city_store::{CityPosition, CityStore, CityStoreError};
pub use crux_core::App as CruxApp;
pub use event::Event;
pub use model::Model;

/// Key (under the user-data namespace) holding the encoded city store.
pub const STORE_KEY: &str = "favorite_cities";
pub const WIKIPEDIA_BASE_URL: &str = "https://en.wikipedia.org/wiki/";
/// Latitude and longitude span of the map detail, in degrees.
pub const MAP_SPAN_DEGREES: f64 = 2.0;
pub const SECTION_FOOTER_PREFIX: &str = "My Favorite Cities in ";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorSeverity {
    Transient,
    Permanent,
    Fatal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    NotFound,
    IndexOutOfRange,
    CrossGroupMove,
    GeocodeFailed,
    MapLoadFailed,
    Persistence,
    Deserialization,
    Validation,
    InvalidState,
}

impl ErrorKind {
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::NotFound => "NOT_FOUND",
            Self::IndexOutOfRange => "INDEX_OUT_OF_RANGE",
            Self::CrossGroupMove => "CROSS_GROUP_MOVE",
            Self::GeocodeFailed => "GEOCODE_FAILED",
            Self::MapLoadFailed => "MAP_LOAD_FAILED",
            Self::Persistence => "PERSISTENCE_ERROR",
            Self::Deserialization => "DESERIALIZATION_ERROR",
            Self::Validation => "VALIDATION_ERROR",
            Self::InvalidState => "INVALID_STATE",
        }
    }

    #[must_use]
    pub const fn default_severity(self) -> ErrorSeverity {
        match self {
            Self::GeocodeFailed | Self::MapLoadFailed | Self::Persistence | Self::InvalidState => {
                ErrorSeverity::Transient
            }

            Self::Deserialization => ErrorSeverity::Fatal,

            Self::NotFound | Self::IndexOutOfRange | Self::CrossGroupMove | Self::Validation => {
                ErrorSeverity::Permanent
            }
        }
    }

    /// Whether repeating the same user action may succeed. Nothing is retried
    /// automatically.
    #[must_use]
    pub const fn is_retryable(self) -> bool {
        matches!(
            self,
            Self::GeocodeFailed | Self::MapLoadFailed | Self::Persistence
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppError {
    pub kind: ErrorKind,
    pub severity: ErrorSeverity,
    pub message: String,
    pub internal_message: Option<String>,
    pub context: HashMap<String, String>,
}

impl AppError {
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            severity: kind.default_severity(),
            message: message.into(),
            internal_message: None,
            context: HashMap::new(),
        }
    }

    #[must_use]
    pub fn with_internal(mut self, internal: impl Into<String>) -> Self {
        self.internal_message = Some(internal.into());
        self
    }

    #[must_use]
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.kind.code()
    }

    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }

    #[must_use]
    pub fn user_facing_title(&self) -> String {
        match self.kind {
            ErrorKind::NotFound | ErrorKind::IndexOutOfRange => "City Not Found".into(),
            ErrorKind::CrossGroupMove => "Move Not Allowed!".into(),
            ErrorKind::GeocodeFailed => "Forward Geocoding Failed!".into(),
            ErrorKind::MapLoadFailed => {
                match (self.context.get("city"), self.context.get("country")) {
                    (Some(city), Some(country)) => {
                        format!("Unable to Load the Map for: {city} in {country}!")
                    }
                    _ => "Unable to Load the Map!".into(),
                }
            }
            ErrorKind::Persistence => "Unable to Save Cities".into(),
            ErrorKind::Deserialization => "Saved Cities Unreadable".into(),
            ErrorKind::Validation => "Missing Information".into(),
            ErrorKind::InvalidState => "Please Wait".into(),
        }
    }

    #[must_use]
    pub fn user_facing_message(&self) -> String {
        match self.kind {
            ErrorKind::NotFound | ErrorKind::IndexOutOfRange => {
                "The selected city is no longer in your list.".into()
            }
            ErrorKind::CrossGroupMove => {
                "Order cities according to your liking only within the same country!".into()
            }
            ErrorKind::GeocodeFailed => {
                "This could be because your device is not connected to the Internet.".into()
            }
            ErrorKind::MapLoadFailed => format!("Error description: {}", self.message),
            ErrorKind::Persistence => {
                "Your change is kept for now but could not be saved to the device.".into()
            }
            ErrorKind::Deserialization => {
                "Your saved cities could not be read. Starting with an empty list.".into()
            }
            ErrorKind::Validation => self.message.clone(),
            ErrorKind::InvalidState => "Your cities are still loading.".into(),
        }
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code(), self.message)?;
        if let Some(internal) = &self.internal_message {
            write!(f, " (internal: {internal})")?;
        }
        Ok(())
    }
}

impl std::error::Error for AppError {}

impl From<CityStoreError> for AppError {
    fn from(e: CityStoreError) -> Self {
        let message = e.to_string();
        match e {
            CityStoreError::NotFound { country } => {
                Self::new(ErrorKind::NotFound, message).with_context("country", country)
            }
            CityStoreError::IndexOutOfRange {
                country,
                index,
                len,
            } => Self::new(ErrorKind::IndexOutOfRange, message)
                .with_context("country", country)
                .with_context("index", index.to_string())
                .with_context("len", len.to_string()),
            CityStoreError::CrossGroupMove { from, to } => {
                Self::new(ErrorKind::CrossGroupMove, message)
                    .with_context("from", from)
                    .with_context("to", to)
            }
            CityStoreError::EmptyCountryName => Self::new(ErrorKind::Validation, message),
        }
    }
}

impl From<capabilities::GeocodeError> for AppError {
    fn from(e: capabilities::GeocodeError) -> Self {
        Self::new(ErrorKind::GeocodeFailed, "geocoding failed").with_internal(e.to_string())
    }
}

impl From<persistence::StoreError> for AppError {
    fn from(e: persistence::StoreError) -> Self {
        Self::new(ErrorKind::Deserialization, "stored cities could not be decoded")
            .with_internal(e.to_string())
    }
}

impl From<capabilities::KvError> for AppError {
    fn from(e: capabilities::KvError) -> Self {
        Self::new(ErrorKind::Persistence, "key-value store failed").with_internal(e.to_string())
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CitySection {
    pub country: String,
    pub footer: String,
    pub cities: Vec<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MapViewStatus {
    Locating,
    Located {
        latitude: f64,
        longitude: f64,
        latitude_delta: f64,
        longitude_delta: f64,
    },
    Failed,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DetailViewModel {
    Map {
        title: String,
        address: String,
        status: MapViewStatus,
    },
    WebPage {
        title: String,
        url: Option<String>,
        error_html: Option<String>,
    },
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ViewState {
    Loading,
    Ready {
        sections: Vec<CitySection>,
        editing: bool,
        detail: Option<DetailViewModel>,
    },
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct UserFacingError {
    pub title: String,
    pub message: String,
    pub is_retryable: bool,
    pub error_code: String,
}

impl From<&AppError> for UserFacingError {
    fn from(e: &AppError) -> Self {
        Self {
            title: e.user_facing_title(),
            message: e.user_facing_message(),
            is_retryable: e.is_retryable(),
            error_code: e.code().to_string(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ViewModel {
    pub state: ViewState,
    pub error: Option<UserFacingError>,
    pub network_activity: bool,
}

pub mod app {
    use tracing::{debug, error, info, warn};

    use super::*;
    use crate::capabilities::kv::check_value_size;
    use crate::capabilities::{GeocodeError, KvError, KvKey};
    use crate::detail::{page_error_html, parse_page_url, wikipedia_url, MapRegion};
    use crate::model::{AppState, DetailView, GeocodeRequestId, MapStatus, Selection};

    #[derive(Default)]
    pub struct App;

    impl App {
        pub fn store_key() -> Result<KvKey, KvError> {
            KvKey::user_data(STORE_KEY)
        }

        fn load_store(model: &mut Model, caps: &Capabilities) {
            let key = match Self::store_key() {
                Ok(key) => key,
                Err(e) => {
                    error!(error = %e, "invalid store key");
                    model.state = AppState::Ready;
                    model.set_error(e.into());
                    return;
                }
            };

            caps.key_value.get(key.raw(), |result| {
                Event::StoreLoaded(result.map_err(|e| e.to_string()))
            });
        }

        /// Writes the whole store after a mutation. A failed write leaves the
        /// in-memory store as it is.
        fn persist_store(model: &mut Model, caps: &Capabilities) {
            let bytes = match crate::persistence::encode(&model.store) {
                Ok(bytes) => bytes,
                Err(e) => {
                    error!(error = %e, "failed to encode city store");
                    model.set_error(
                        AppError::new(ErrorKind::Persistence, "city store could not be encoded")
                            .with_internal(e.to_string()),
                    );
                    return;
                }
            };

            let key = match Self::store_key().and_then(|key| {
                check_value_size(&bytes)?;
                Ok(key)
            }) {
                Ok(key) => key,
                Err(e) => {
                    error!(error = %e, "refusing to write city store");
                    model.set_error(e.into());
                    return;
                }
            };

            debug!(bytes = bytes.len(), "persisting city store");
            caps.key_value.set(key.raw(), bytes, |result| {
                Event::StorePersisted(result.map(|_| ()).map_err(|e| e.to_string()))
            });
        }

        fn apply_loaded(model: &mut Model, result: Result<Option<Vec<u8>>, String>) {
            model.state = AppState::Ready;
            match result {
                Ok(Some(bytes)) => match crate::persistence::decode(&bytes) {
                    Ok(store) => {
                        info!(
                            countries = store.len(),
                            cities = store.city_count(),
                            "city store loaded"
                        );
                        model.store = store;
                    }
                    Err(e) => {
                        error!(error = %e, "stored cities unreadable, starting empty");
                        model.store = CityStore::new();
                        model.set_error(e.into());
                    }
                },
                Ok(None) => {
                    info!("no stored cities, starting empty");
                    model.store = CityStore::new();
                }
                Err(message) => {
                    error!(error = %message, "failed to read city store");
                    model.store = CityStore::new();
                    model.set_error(KvError::Storage { message }.into());
                }
            }
        }

        fn show_map(model: &mut Model, caps: &Capabilities, country: String, index: usize) {
            let selection = match model.store.city_at(&country, index) {
                Ok(city) => Selection::new(city, country),
                Err(e) => {
                    warn!(error = %e, "cannot show map");
                    model.set_error(e.into());
                    return;
                }
            };

            let request_id = GeocodeRequestId::generate();
            let address = selection.address();
            debug!(request_id = %request_id, "geocoding selected city");

            model.detail = Some(DetailView::Map {
                selection,
                status: MapStatus::Locating,
            });
            model.pending_geocode = Some(request_id.clone());
            model.network_activity = true;

            caps.geocode.resolve(address, move |result| Event::GeocodeResolved {
                request_id,
                result,
            });
        }

        fn apply_geocode(
            model: &mut Model,
            request_id: &GeocodeRequestId,
            result: Result<crate::detail::Coordinate, GeocodeError>,
        ) -> bool {
            if model.pending_geocode.as_ref() != Some(request_id) {
                debug!(request_id = %request_id, "discarding stale geocode result");
                return false;
            }
            model.pending_geocode = None;
            model.network_activity = false;

            let status = match result {
                Ok(center) => MapStatus::Located(MapRegion::around(center)),
                Err(GeocodeError::Cancelled) => {
                    debug!("geocode cancelled by shell");
                    MapStatus::Failed
                }
                Err(e) => {
                    warn!(error = %e, "geocoding failed");
                    model.set_error(e.into());
                    MapStatus::Failed
                }
            };

            if let Some(DetailView::Map {
                status: current, ..
            }) = model.detail.as_mut()
            {
                *current = status;
            }
            true
        }

        fn show_web_page(model: &mut Model, country: String, index: usize) {
            let selection = match model.store.city_at(&country, index) {
                Ok(city) => Selection::new(city, country),
                Err(e) => {
                    warn!(error = %e, "cannot show web page");
                    model.set_error(e.into());
                    return;
                }
            };

            let raw = wikipedia_url(&selection.city);
            let detail = match parse_page_url(&raw) {
                Ok(url) => DetailView::WebPage {
                    selection,
                    url: Some(url.into()),
                    error_html: None,
                },
                Err(e) => {
                    warn!(error = %e, url = %raw, "wikipedia url does not parse");
                    DetailView::WebPage {
                        selection,
                        url: None,
                        error_html: Some(page_error_html(&e.to_string())),
                    }
                }
            };

            model.pending_geocode = None;
            model.network_activity = false;
            model.detail = Some(detail);
        }

        fn build_sections(model: &Model) -> Vec<CitySection> {
            model
                .store
                .groups()
                .map(|(country, cities)| CitySection {
                    country: country.to_string(),
                    footer: format!("{SECTION_FOOTER_PREFIX}{country}"),
                    cities: cities.to_vec(),
                })
                .collect()
        }

        fn build_detail(detail: &DetailView) -> DetailViewModel {
            match detail {
                DetailView::Map { selection, status } => DetailViewModel::Map {
                    title: selection.city.clone(),
                    address: selection.address(),
                    status: match status {
                        MapStatus::Locating => MapViewStatus::Locating,
                        MapStatus::Located(region) => MapViewStatus::Located {
                            latitude: region.center.lat(),
                            longitude: region.center.lon(),
                            latitude_delta: region.latitude_delta,
                            longitude_delta: region.longitude_delta,
                        },
                        MapStatus::Failed => MapViewStatus::Failed,
                    },
                },
                DetailView::WebPage {
                    selection,
                    url,
                    error_html,
                } => DetailViewModel::WebPage {
                    title: selection.country.clone(),
                    url: url.clone(),
                    error_html: error_html.clone(),
                },
            }
        }
    }

    impl crux_core::App for App {
        type Event = Event;
        type Model = Model;
        type ViewModel = ViewModel;
        type Capabilities = Capabilities;

        fn update(&self, event: Event, model: &mut Model, caps: &Capabilities) {
            let event_name = event.name();
            if event.is_user_initiated() {
                debug!(event = event_name, "user action");
            }

            if event.is_mutation() && !model.is_ready() {
                warn!(event = event_name, "ignoring change while cities are loading");
                model.set_error(AppError::new(
                    ErrorKind::InvalidState,
                    "city store is still loading",
                ));
                caps.render.render();
                return;
            }

            match event {
                Event::Noop => {}

                Event::AppStarted => {
                    model.state = AppState::Loading;
                    Self::load_store(model, caps);
                    caps.render.render();
                }

                Event::StoreLoaded(result) => {
                    Self::apply_loaded(model, result);
                    caps.render.render();
                }

                Event::AddCity { country, city } => {
                    if country.trim().is_empty() || city.trim().is_empty() {
                        model.set_error(AppError::new(
                            ErrorKind::Validation,
                            "Please enter both a country name and a city name.",
                        ));
                    } else {
                        model.store.add_city(country, city);
                        Self::persist_store(model, caps);
                    }
                    caps.render.render();
                }

                Event::RemoveCity { country, index } => {
                    match model.store.remove_city(&country, index) {
                        Ok(removed) => {
                            debug!(city = %removed, country = %country, "city removed");
                            Self::persist_store(model, caps);
                        }
                        Err(e) => {
                            warn!(error = %e, "remove rejected");
                            model.set_error(e.into());
                        }
                    }
                    caps.render.render();
                }

                Event::MoveCity { from, to } => {
                    match model.store.move_between(&from, &to) {
                        Ok(()) => Self::persist_store(model, caps),
                        Err(e) => {
                            warn!(error = %e, "move rejected");
                            model.set_error(e.into());
                        }
                    }
                    caps.render.render();
                }

                Event::StorePersisted(Ok(())) => {
                    debug!("city store saved");
                }

                Event::StorePersisted(Err(message)) => {
                    error!(error = %message, "failed to save city store");
                    model.set_error(KvError::Storage { message }.into());
                    caps.render.render();
                }

                Event::EditingToggled => {
                    model.editing = !model.editing;
                    caps.render.render();
                }

                Event::ShowMap { country, index } => {
                    Self::show_map(model, caps, country, index);
                    caps.render.render();
                }

                Event::GeocodeResolved { request_id, result } => {
                    if Self::apply_geocode(model, &request_id, result) {
                        caps.render.render();
                    }
                }

                Event::MapLoadingStarted => {
                    model.network_activity = true;
                    caps.render.render();
                }

                Event::MapLoadingFinished | Event::PageLoadingFinished => {
                    model.network_activity = false;
                    caps.render.render();
                }

                Event::MapLoadFailed { description } => {
                    model.network_activity = false;
                    let mut error = AppError::new(ErrorKind::MapLoadFailed, description);
                    if let Some(DetailView::Map { selection, .. }) = &model.detail {
                        error = error
                            .with_context("city", selection.city.clone())
                            .with_context("country", selection.country.clone());
                    }
                    model.set_error(error);
                    caps.render.render();
                }

                Event::ShowWebPage { country, index } => {
                    Self::show_web_page(model, country, index);
                    caps.render.render();
                }

                Event::PageLoadingStarted => {
                    model.network_activity = true;
                    caps.render.render();
                }

                Event::PageLoadFailed {
                    description,
                    cancelled,
                } => {
                    // A cancelled load means the page redirected itself.
                    if cancelled {
                        debug!("page load cancelled");
                        return;
                    }
                    model.network_activity = false;
                    if let Some(DetailView::WebPage { error_html, .. }) = model.detail.as_mut() {
                        *error_html = Some(page_error_html(&description));
                    }
                    caps.render.render();
                }

                Event::DetailDismissed => {
                    model.close_detail();
                    caps.render.render();
                }

                Event::ErrorDismissed => {
                    model.clear_error();
                    caps.render.render();
                }
            }
        }

        fn view(&self, model: &Model) -> ViewModel {
            let state = match model.state {
                AppState::Loading => ViewState::Loading,
                AppState::Ready => ViewState::Ready {
                    sections: Self::build_sections(model),
                    editing: model.editing,
                    detail: model.detail.as_ref().map(Self::build_detail),
                },
            };

            ViewModel {
                state,
                error: model.active_error.as_ref().map(UserFacingError::from),
                network_activity: model.network_activity,
            }
        }
    }
}
