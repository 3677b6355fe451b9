//! End-to-end tour flow over the built-in New York catalog.

use chrono::Utc;
use worldtour::catalog::PoiCatalog;
use worldtour::geo::Coordinate;
use worldtour::monitor::{
    LocationError, LocationMonitor, LocationSource, MonitorEvent, PermissionState,
};
use worldtour::narration::SilentNarrator;
use worldtour::proximity::UserLocationSample;
use worldtour::session::controller::{SessionEvent, TourCommand, TourController};
use worldtour::session::SessionState;

const EMPIRE_STATE: (f64, f64) = (40.7484, -73.9857);

struct FixedSource {
    coordinate: Coordinate,
}

impl FixedSource {
    fn at(lat: f64, lon: f64) -> Self {
        Self {
            coordinate: Coordinate::new(lat, lon).unwrap(),
        }
    }
}

impl LocationSource for FixedSource {
    fn permission(&self) -> PermissionState {
        PermissionState::Granted
    }

    fn request_permission(&mut self) -> PermissionState {
        PermissionState::Granted
    }

    fn current_position(&mut self) -> Result<UserLocationSample, LocationError> {
        Ok(UserLocationSample {
            coordinate: self.coordinate,
            timestamp: Utc::now(),
        })
    }
}

fn fix(lat: f64, lon: f64) -> SessionEvent {
    SessionEvent::LocationUpdated(UserLocationSample {
        coordinate: Coordinate::new(lat, lon).unwrap(),
        timestamp: Utc::now(),
    })
}

/// Walk from south of Madison Square Park into the Empire State Building's
/// trigger zone. The monitor must announce the zone entry exactly once even
/// though several in-range fixes arrive.
#[test]
fn test_walk_into_trigger_zone_announces_once() {
    let mut monitor = LocationMonitor::new(PoiCatalog::builtin_nyc());
    let events = monitor.event_receiver();
    let mut source = FixedSource::at(40.7300, -73.9900);
    monitor.start(&mut source).unwrap();

    let approach = [
        (40.7300, -73.9900),
        (40.7400, -73.9880),
        (40.7470, -73.9870),
        (EMPIRE_STATE.0, EMPIRE_STATE.1),
        (40.7485, -73.9856),
    ];
    for (lat, lon) in approach {
        monitor.on_location_update(UserLocationSample {
            coordinate: Coordinate::new(lat, lon).unwrap(),
            timestamp: Utc::now(),
        });
    }

    let entries: Vec<_> = events
        .try_iter()
        .filter(|e| {
            matches!(
                e,
                MonitorEvent::ActivePoiChanged {
                    current: Some(_),
                    ..
                }
            )
        })
        .collect();
    assert_eq!(entries.len(), 1);
    assert_eq!(monitor.active_poi().unwrap().id, "empire-state-building");
}

/// Full proximity flow: monitoring, zone entry, tour, narration ticks to the
/// narration length, auto-stop without auto-advance, then tour end.
#[test]
fn test_proximity_tour_runs_to_completion() {
    let mut controller = TourController::new(
        PoiCatalog::builtin_nyc(),
        Box::new(FixedSource::at(EMPIRE_STATE.0, EMPIRE_STATE.1)),
        Box::new(SilentNarrator::default()),
    );
    let completed = std::sync::Arc::new(std::sync::Mutex::new(Vec::new()));
    let sink = completed.clone();
    controller.set_on_tour_ended(Box::new(move |summary| {
        sink.lock().unwrap().push(summary.clone());
    }));

    controller.enqueue(SessionEvent::Command(TourCommand::StartMonitoring));
    controller.pump();
    assert_eq!(
        controller.session().active_poi().unwrap().id,
        "empire-state-building"
    );

    controller.enqueue(SessionEvent::Command(TourCommand::BeginActiveTour));
    controller.enqueue(SessionEvent::Command(TourCommand::Play));
    controller.pump();
    assert_eq!(controller.session().state(), SessionState::ActiveTour);
    assert!(controller.session().playback().is_playing);
    let total = controller.session().playback().total_secs;

    for _ in 0..(total as usize) {
        controller.enqueue(SessionEvent::Tick);
    }
    controller.pump();

    let playback = controller.session().playback();
    assert!(!playback.is_playing);
    assert_eq!(playback.elapsed_secs, total);
    assert_eq!(
        controller.session().current_title(),
        "Empire State Building"
    );

    controller.enqueue(SessionEvent::Command(TourCommand::EndTour));
    controller.pump();
    assert_eq!(controller.session().state(), SessionState::Idle);

    let summaries = completed.lock().unwrap();
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].poi_name, "Empire State Building");
    assert_eq!(summaries[0].duration_secs, total);
    assert_eq!(summaries[0].location, "New York, NY");
}

/// Leaving the trigger zone mid-narration must not interrupt playback.
#[test]
fn test_walking_away_keeps_narration_playing() {
    let mut controller = TourController::new(
        PoiCatalog::builtin_nyc(),
        Box::new(FixedSource::at(EMPIRE_STATE.0, EMPIRE_STATE.1)),
        Box::new(SilentNarrator::default()),
    );
    controller.enqueue(SessionEvent::Command(TourCommand::StartMonitoring));
    controller.enqueue(SessionEvent::Command(TourCommand::BeginActiveTour));
    controller.enqueue(SessionEvent::Command(TourCommand::Play));
    controller.pump();
    assert!(controller.session().playback().is_playing);

    // Well outside all three zones.
    controller.enqueue(fix(40.7000, -74.0100));
    controller.enqueue(SessionEvent::Tick);
    controller.pump();

    assert!(controller.session().active_poi().is_none());
    assert_eq!(controller.session().state(), SessionState::ActiveTour);
    assert!(controller.session().playback().is_playing);
    assert_eq!(controller.session().playback().elapsed_secs, 1.0);
}

/// Commands queued behind an end-tour command are stale and must be dropped.
#[test]
fn test_events_after_end_tour_are_dropped() {
    let mut controller = TourController::new(
        PoiCatalog::builtin_nyc(),
        Box::new(FixedSource::at(EMPIRE_STATE.0, EMPIRE_STATE.1)),
        Box::new(SilentNarrator::default()),
    );
    controller.enqueue(SessionEvent::Command(TourCommand::StartMonitoring));
    controller.enqueue(SessionEvent::Command(TourCommand::BeginActiveTour));
    controller.enqueue(SessionEvent::Command(TourCommand::Play));
    controller.pump();

    controller.enqueue(SessionEvent::Command(TourCommand::EndTour));
    controller.enqueue(SessionEvent::Tick);
    controller.enqueue(SessionEvent::Command(TourCommand::Play));
    controller.enqueue(fix(EMPIRE_STATE.0, EMPIRE_STATE.1));
    controller.pump();

    let session = controller.session();
    assert_eq!(session.state(), SessionState::Idle);
    assert!(!session.monitoring());
    assert!(!session.playback().is_playing);
    assert_eq!(session.playback().elapsed_secs, 0.0);
}

/// Browsing with an empty catalog lands on the explicit no-POI state.
#[test]
fn test_browse_tour_with_empty_catalog() {
    let mut controller = TourController::new(
        PoiCatalog::new(),
        Box::new(FixedSource::at(40.7300, -73.9900)),
        Box::new(SilentNarrator::default()),
    );
    controller.enqueue(SessionEvent::Command(TourCommand::BeginBrowseTour));
    controller.enqueue(SessionEvent::Command(TourCommand::Play));
    controller.pump();

    let session = controller.session();
    assert_eq!(session.state(), SessionState::ActiveTour);
    assert!(session.current_poi().is_none());
    assert_eq!(session.current_title(), "Nearby Tour");
    assert!(!session.playback().is_playing);
}

/// Browsing the catalog with next/previous clamps at both ends and resets
/// playback per stop.
#[test]
fn test_browse_navigation_through_catalog() {
    let mut controller = TourController::new(
        PoiCatalog::builtin_nyc(),
        Box::new(FixedSource::at(40.7300, -73.9900)),
        Box::new(SilentNarrator::default()),
    );
    controller.enqueue(SessionEvent::Command(TourCommand::BeginBrowseTour));
    controller.pump();
    assert_eq!(
        controller.session().current_title(),
        "Empire State Building"
    );

    controller.enqueue(SessionEvent::Command(TourCommand::Previous));
    controller.pump();
    assert_eq!(controller.session().current_index(), 0);

    controller.enqueue(SessionEvent::Command(TourCommand::Next));
    controller.enqueue(SessionEvent::Command(TourCommand::Next));
    controller.enqueue(SessionEvent::Command(TourCommand::Next));
    controller.pump();
    assert_eq!(controller.session().current_index(), 2);
    assert_eq!(controller.session().current_title(), "Times Square");
    assert_eq!(controller.session().playback().elapsed_secs, 0.0);
}
