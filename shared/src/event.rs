use serde::{Deserialize, Serialize};

use crate::capabilities::GeocodeResult;
use crate::city_store::CityPosition;
use crate::model::GeocodeRequestId;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
pub enum Event {
    #[default]
    Noop,

    AppStarted,

    // Table
    AddCity {
        country: String,
        city: String,
    },
    RemoveCity {
        country: String,
        index: usize,
    },
    MoveCity {
        from: CityPosition,
        to: CityPosition,
    },
    EditingToggled,

    // Detail views
    ShowMap {
        country: String,
        index: usize,
    },
    ShowWebPage {
        country: String,
        index: usize,
    },
    MapLoadingStarted,
    MapLoadingFinished,
    MapLoadFailed {
        description: String,
    },
    PageLoadingStarted,
    PageLoadingFinished,
    PageLoadFailed {
        description: String,
        cancelled: bool,
    },
    DetailDismissed,

    ErrorDismissed,

    // Capability callbacks
    #[serde(skip)]
    StoreLoaded(Result<Option<Vec<u8>>, String>),
    #[serde(skip)]
    StorePersisted(Result<(), String>),
    #[serde(skip)]
    GeocodeResolved {
        request_id: GeocodeRequestId,
        result: GeocodeResult,
    },
}

impl Event {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Noop => "noop",
            Self::AppStarted => "app_started",
            Self::AddCity { .. } => "add_city",
            Self::RemoveCity { .. } => "remove_city",
            Self::MoveCity { .. } => "move_city",
            Self::EditingToggled => "editing_toggled",
            Self::ShowMap { .. } => "show_map",
            Self::ShowWebPage { .. } => "show_web_page",
            Self::MapLoadingStarted => "map_loading_started",
            Self::MapLoadingFinished => "map_loading_finished",
            Self::MapLoadFailed { .. } => "map_load_failed",
            Self::PageLoadingStarted => "page_loading_started",
            Self::PageLoadingFinished => "page_loading_finished",
            Self::PageLoadFailed { .. } => "page_load_failed",
            Self::DetailDismissed => "detail_dismissed",
            Self::ErrorDismissed => "error_dismissed",
            Self::StoreLoaded(_) => "store_loaded",
            Self::StorePersisted(_) => "store_persisted",
            Self::GeocodeResolved { .. } => "geocode_resolved",
        }
    }

    #[must_use]
    pub const fn is_user_initiated(&self) -> bool {
        matches!(
            self,
            Self::AddCity { .. }
                | Self::RemoveCity { .. }
                | Self::MoveCity { .. }
                | Self::EditingToggled
                | Self::ShowMap { .. }
                | Self::ShowWebPage { .. }
                | Self::DetailDismissed
                | Self::ErrorDismissed
        )
    }

    /// Events that change the city list.
    #[must_use]
    pub const fn is_mutation(&self) -> bool {
        matches!(
            self,
            Self::AddCity { .. } | Self::RemoveCity { .. } | Self::MoveCity { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_noop() {
        assert_eq!(Event::default(), Event::Noop);
        assert!(!Event::default().is_mutation());
    }
}
