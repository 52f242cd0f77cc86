use assert_matches::assert_matches;
use crux_core::testing::AppTester;
use favorite_cities::capabilities::{GeocodeError, GeocodeOperation};
use favorite_cities::detail::Coordinate;
use favorite_cities::model::{DetailView, GeocodeRequestId, MapStatus};
use favorite_cities::{
    App, CruxApp, DetailViewModel, Effect, ErrorKind, Event, MapViewStatus, Model, ViewState,
};

fn setup() -> (AppTester<App, Effect>, Model) {
    let app = AppTester::<App, Effect>::default();
    let mut model = Model::default();
    app.update(Event::AppStarted, &mut model);
    app.update(Event::StoreLoaded(Ok(None)), &mut model);

    for (country, city) in [("Japan", "Tokyo"), ("USA", "New York City"), ("USA", "Boston")] {
        app.update(
            Event::AddCity {
                country: country.into(),
                city: city.into(),
            },
            &mut model,
        );
    }
    (app, model)
}

fn detail(model: &Model) -> Option<DetailViewModel> {
    match App.view(model).state {
        ViewState::Ready { detail, .. } => detail,
        ViewState::Loading => None,
    }
}

fn show_tokyo_map(app: &AppTester<App, Effect>, model: &mut Model) -> GeocodeRequestId {
    app.update(
        Event::ShowMap {
            country: "Japan".into(),
            index: 0,
        },
        model,
    );
    model.pending_geocode.clone().unwrap()
}

#[test]
fn show_map_requests_geocode() {
    let (app, mut model) = setup();

    let update = app.update(
        Event::ShowMap {
            country: "USA".into(),
            index: 0,
        },
        &mut model,
    );

    let operation = update
        .effects
        .iter()
        .find_map(|e| match e {
            Effect::Geocode(request) => Some(request.operation.clone()),
            _ => None,
        })
        .expect("geocode request");
    assert_eq!(
        operation,
        GeocodeOperation::Resolve {
            address: "New York City, USA".into()
        }
    );

    assert!(model.network_activity);
    assert_eq!(
        detail(&model),
        Some(DetailViewModel::Map {
            title: "New York City".into(),
            address: "New York City, USA".into(),
            status: MapViewStatus::Locating,
        })
    );
}

#[test]
fn resolved_coordinate_centers_map() {
    let (app, mut model) = setup();
    let request_id = show_tokyo_map(&app, &mut model);

    let update = app.update(
        Event::GeocodeResolved {
            request_id,
            result: Ok(Coordinate::new(35.6762, 139.6503).unwrap()),
        },
        &mut model,
    );

    assert!(update.effects.iter().any(|e| matches!(e, Effect::Render(_))));
    assert!(!model.network_activity);
    assert!(model.pending_geocode.is_none());
    assert_matches!(
        detail(&model),
        Some(DetailViewModel::Map {
            status: MapViewStatus::Located {
                latitude_delta,
                longitude_delta,
                ..
            },
            ..
        }) if latitude_delta == 2.0 && longitude_delta == 2.0
    );
}

#[test]
fn stale_geocode_result_is_discarded() {
    let (app, mut model) = setup();
    let first = show_tokyo_map(&app, &mut model);
    let second = show_tokyo_map(&app, &mut model);
    assert_ne!(first, second);

    let update = app.update(
        Event::GeocodeResolved {
            request_id: first,
            result: Ok(Coordinate::new(0.0, 0.0).unwrap()),
        },
        &mut model,
    );

    assert!(update.effects.is_empty());
    assert_eq!(model.pending_geocode, Some(second));
    assert_matches!(
        model.detail,
        Some(DetailView::Map {
            status: MapStatus::Locating,
            ..
        })
    );
}

#[test]
fn result_after_dismiss_is_discarded() {
    let (app, mut model) = setup();
    let request_id = show_tokyo_map(&app, &mut model);

    app.update(Event::DetailDismissed, &mut model);
    app.update(
        Event::GeocodeResolved {
            request_id,
            result: Err(GeocodeError::NoResult),
        },
        &mut model,
    );

    assert!(model.detail.is_none());
    assert!(model.active_error.is_none());
    assert!(!model.network_activity);
}

#[test]
fn geocode_failure_shows_alert() {
    let (app, mut model) = setup();
    let request_id = show_tokyo_map(&app, &mut model);

    app.update(
        Event::GeocodeResolved {
            request_id,
            result: Err(GeocodeError::Service {
                message: "offline".into(),
            }),
        },
        &mut model,
    );

    assert_matches!(
        detail(&model),
        Some(DetailViewModel::Map {
            status: MapViewStatus::Failed,
            ..
        })
    );
    let error = App.view(&model).error.unwrap();
    assert_eq!(error.title, "Forward Geocoding Failed!");
    assert_eq!(
        error.message,
        "This could be because your device is not connected to the Internet."
    );
}

#[test]
fn cancelled_geocode_fails_quietly() {
    let (app, mut model) = setup();
    let request_id = show_tokyo_map(&app, &mut model);

    app.update(
        Event::GeocodeResolved {
            request_id,
            result: Err(GeocodeError::Cancelled),
        },
        &mut model,
    );

    assert!(model.active_error.is_none());
    assert_matches!(
        model.detail,
        Some(DetailView::Map {
            status: MapStatus::Failed,
            ..
        })
    );
}

#[test]
fn map_load_failure_names_city() {
    let (app, mut model) = setup();
    show_tokyo_map(&app, &mut model);

    app.update(Event::MapLoadingStarted, &mut model);
    assert!(model.network_activity);

    app.update(
        Event::MapLoadFailed {
            description: "tiles unavailable".into(),
        },
        &mut model,
    );

    assert!(!model.network_activity);
    let error = App.view(&model).error.unwrap();
    assert_eq!(error.title, "Unable to Load the Map for: Tokyo in Japan!");
    assert_eq!(error.message, "Error description: tiles unavailable");
}

#[test]
fn map_failure_with_page_open_names_no_city() {
    let (app, mut model) = setup();
    app.update(
        Event::ShowWebPage {
            country: "Japan".into(),
            index: 0,
        },
        &mut model,
    );

    app.update(
        Event::MapLoadFailed {
            description: "tiles unavailable".into(),
        },
        &mut model,
    );

    let error = App.view(&model).error.unwrap();
    assert_eq!(error.title, "Unable to Load the Map!");
    assert_eq!(error.message, "Error description: tiles unavailable");
}

#[test]
fn web_page_points_at_wikipedia() {
    let (app, mut model) = setup();

    let update = app.update(
        Event::ShowWebPage {
            country: "USA".into(),
            index: 0,
        },
        &mut model,
    );

    assert!(update
        .effects
        .iter()
        .all(|e| !matches!(e, Effect::Geocode(_))));
    assert_eq!(
        detail(&model),
        Some(DetailViewModel::WebPage {
            title: "USA".into(),
            url: Some("https://en.wikipedia.org/wiki/New_York_City".into()),
            error_html: None,
        })
    );
}

#[test]
fn page_load_lifecycle() {
    let (app, mut model) = setup();
    app.update(
        Event::ShowWebPage {
            country: "USA".into(),
            index: 1,
        },
        &mut model,
    );

    app.update(Event::PageLoadingStarted, &mut model);
    assert!(model.network_activity);

    let update = app.update(
        Event::PageLoadFailed {
            description: "redirect".into(),
            cancelled: true,
        },
        &mut model,
    );
    assert!(update.effects.is_empty());
    assert!(model.network_activity);

    app.update(
        Event::PageLoadFailed {
            description: "The Internet connection appears to be offline.".into(),
            cancelled: false,
        },
        &mut model,
    );

    assert!(!model.network_activity);
    let Some(DetailViewModel::WebPage { error_html, .. }) = detail(&model) else {
        panic!("expected web page detail");
    };
    let html = error_html.unwrap();
    assert!(html.contains("An error occurred"));
    assert!(html.ends_with("The Internet connection appears to be offline."));
}

#[test]
fn detail_for_missing_city_reports_error() {
    let (app, mut model) = setup();

    app.update(
        Event::ShowMap {
            country: "Japan".into(),
            index: 5,
        },
        &mut model,
    );
    assert!(model.detail.is_none());
    assert_eq!(
        model.active_error.as_ref().map(|e| e.kind),
        Some(ErrorKind::IndexOutOfRange)
    );

    app.update(Event::ErrorDismissed, &mut model);
    app.update(
        Event::ShowWebPage {
            country: "Brazil".into(),
            index: 0,
        },
        &mut model,
    );
    assert_eq!(
        model.active_error.as_ref().map(|e| e.kind),
        Some(ErrorKind::NotFound)
    );
}
