//! Event-driven coordinator for the tour session.
//!
//! All inputs (location fixes, user commands, playback ticks, narration
//! callbacks) arrive on a single queue and are applied one at a time by
//! [`TourController::pump`]. The session state machine never sees concurrent
//! mutation, and side effects (narration, monitoring) happen only at this
//! edge.

use crate::catalog::PoiCatalog;
use crate::monitor::{LocationMonitor, LocationSource, MonitorEvent};
use crate::narration::Narrator;
use crate::proximity::UserLocationSample;
use crate::session::ticker::TickOutcome;
use crate::session::TourSession;
use crossbeam::channel::{Receiver, Sender};

/// User-originated commands.
#[derive(Debug, Clone, PartialEq)]
pub enum TourCommand {
    StartMonitoring,
    StopMonitoring,
    BeginActiveTour,
    BeginBrowseTour,
    Play,
    Pause,
    Next,
    Previous,
    Seek(f64),
    EndTour,
}

/// Everything the controller reacts to.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// A new location fix. Bursts coalesce to the latest fix per pump.
    LocationUpdated(UserLocationSample),
    /// A user command.
    Command(TourCommand),
    /// One playback tick elapsed.
    Tick,
    /// The narration engine finished or failed on its own.
    NarrationFinished,
}

/// Coordinates the monitor, narrator, and session over one event queue.
pub struct TourController {
    session: TourSession,
    monitor: LocationMonitor,
    monitor_rx: Receiver<MonitorEvent>,
    source: Box<dyn LocationSource>,
    narrator: Box<dyn Narrator>,
    event_tx: Sender<SessionEvent>,
    event_rx: Receiver<SessionEvent>,
}

impl TourController {
    pub fn new(
        catalog: PoiCatalog,
        source: Box<dyn LocationSource>,
        narrator: Box<dyn Narrator>,
    ) -> Self {
        let mut monitor = LocationMonitor::new(catalog.clone());
        let monitor_rx = monitor.event_receiver();
        let (event_tx, event_rx) = crossbeam::channel::unbounded();

        Self {
            session: TourSession::new(catalog),
            monitor,
            monitor_rx,
            source,
            narrator,
            event_tx,
            event_rx,
        }
    }

    /// The session, read-only. Mutation goes through events.
    pub fn session(&self) -> &TourSession {
        &self.session
    }

    /// Subscribe to completed-tour summaries.
    pub fn set_on_tour_ended(&mut self, hook: crate::history::TourEndedHook) {
        self.session.set_on_tour_ended(hook);
    }

    /// A sender for producers on other threads.
    pub fn sender(&self) -> Sender<SessionEvent> {
        self.event_tx.clone()
    }

    /// Enqueue an event without dispatching it.
    pub fn enqueue(&self, event: SessionEvent) {
        // The channel is unbounded; send only fails if the controller is gone.
        let _ = self.event_tx.send(event);
    }

    /// Replace the catalog everywhere it is held.
    pub fn set_catalog(&mut self, catalog: PoiCatalog) {
        self.monitor.set_catalog(catalog.clone());
        self.session.set_catalog(catalog);
    }

    /// Poll the location source and enqueue a fix, if monitoring.
    pub fn poll_location(&mut self) {
        if !self.monitor.is_watching() {
            return;
        }
        match self.source.current_position() {
            Ok(sample) => self.enqueue(SessionEvent::LocationUpdated(sample)),
            Err(err) => tracing::warn!("Location fix unavailable: {err}"),
        }
    }

    /// Drain the queue, applying events in arrival order.
    ///
    /// Consecutive location fixes collapse to the latest one. Once an end-tour
    /// command is applied, the rest of the batch is stale and dropped.
    pub fn pump(&mut self) {
        let mut batch = Vec::new();
        while let Ok(event) = self.event_rx.try_recv() {
            batch.push(event);
        }

        let mut events = batch.into_iter().peekable();
        while let Some(event) = events.next() {
            let event = if matches!(event, SessionEvent::LocationUpdated(_)) {
                let mut latest = event;
                while let Some(newer) =
                    events.next_if(|e| matches!(e, SessionEvent::LocationUpdated(_)))
                {
                    latest = newer;
                }
                latest
            } else {
                event
            };

            if self.dispatch(event) {
                let dropped = events.count();
                if dropped > 0 {
                    tracing::debug!("Dropped {dropped} stale events after tour end");
                }
                break;
            }
        }
    }

    /// Apply one event. Returns true when the tour ended.
    fn dispatch(&mut self, event: SessionEvent) -> bool {
        match event {
            SessionEvent::LocationUpdated(sample) => {
                self.monitor.on_location_update(sample);
                self.apply_monitor_events();
            }
            SessionEvent::Command(command) => return self.run_command(command),
            SessionEvent::Tick => {
                if self.session.tick() == TickOutcome::Completed {
                    self.narrator.cancel();
                    tracing::info!("Narration for {} complete", self.session.current_title());
                }
            }
            SessionEvent::NarrationFinished => self.session.narration_finished(),
        }
        false
    }

    fn run_command(&mut self, command: TourCommand) -> bool {
        match command {
            TourCommand::StartMonitoring => match self.monitor.start(self.source.as_mut()) {
                Ok(()) => {
                    self.session.monitoring_started();
                    self.apply_monitor_events();
                }
                Err(err) => tracing::warn!("Could not start monitoring: {err}"),
            },
            TourCommand::StopMonitoring => {
                self.monitor.stop();
                self.session.monitoring_stopped();
                self.apply_monitor_events();
            }
            TourCommand::BeginActiveTour => {
                if let Err(err) = self.session.begin_active_tour() {
                    tracing::warn!("{err}");
                }
            }
            TourCommand::BeginBrowseTour => {
                if let Err(err) = self.session.begin_browse_tour() {
                    tracing::warn!("{err}");
                }
            }
            TourCommand::Play => match self.session.play() {
                Ok(script) => {
                    if let Err(err) = self.narrator.speak(&script) {
                        tracing::error!("Narration failed: {err}");
                        self.session.narration_finished();
                    }
                }
                Err(err) => tracing::warn!("{err}"),
            },
            TourCommand::Pause => {
                if self.session.pause().is_ok() {
                    self.narrator.cancel();
                }
            }
            TourCommand::Next => {
                if let Ok(true) = self.session.next() {
                    self.narrator.cancel();
                }
            }
            TourCommand::Previous => {
                if let Ok(true) = self.session.previous() {
                    self.narrator.cancel();
                }
            }
            TourCommand::Seek(secs) => {
                if let Err(err) = self.session.seek(secs) {
                    tracing::warn!("{err}");
                }
            }
            TourCommand::EndTour => match self.session.end_tour() {
                Ok(_summary) => {
                    self.narrator.cancel();
                    self.monitor.stop();
                    self.session.monitoring_stopped();
                    return true;
                }
                Err(err) => tracing::warn!("{err}"),
            },
        }
        false
    }

    /// Feed monitor events back into the session synchronously.
    fn apply_monitor_events(&mut self) {
        while let Ok(event) = self.monitor_rx.try_recv() {
            match event {
                MonitorEvent::ActivePoiChanged { current, .. } => {
                    if let Some(nearby) = &current {
                        tracing::info!("Entered range of {}: {}", nearby.poi.title, nearby.guidance());
                    }
                    self.session.set_active_poi(current.map(|n| n.poi));
                }
                MonitorEvent::ClosestPoiChanged { current, .. } => {
                    if let Some(nearby) = &current {
                        tracing::debug!("Nearest stop is {} ({})", nearby.poi.title, nearby.guidance());
                    }
                }
                MonitorEvent::Started | MonitorEvent::Stopped => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{PoiCatalog, PointOfInterest};
    use crate::geo::Coordinate;
    use crate::monitor::{LocationError, PermissionState};
    use crate::narration::SilentNarrator;
    use crate::session::SessionState;
    use chrono::Utc;

    struct ScriptedSource {
        fixes: Vec<Coordinate>,
        cursor: usize,
    }

    impl ScriptedSource {
        fn new(fixes: Vec<Coordinate>) -> Self {
            Self { fixes, cursor: 0 }
        }
    }

    impl LocationSource for ScriptedSource {
        fn permission(&self) -> PermissionState {
            PermissionState::Granted
        }

        fn request_permission(&mut self) -> PermissionState {
            PermissionState::Granted
        }

        fn current_position(&mut self) -> Result<UserLocationSample, LocationError> {
            let coordinate = self
                .fixes
                .get(self.cursor.min(self.fixes.len().saturating_sub(1)))
                .copied()
                .ok_or(LocationError::PositionUnavailable)?;
            self.cursor += 1;
            Ok(UserLocationSample {
                coordinate,
                timestamp: Utc::now(),
            })
        }
    }

    fn coord(lat: f64, lon: f64) -> Coordinate {
        Coordinate::new(lat, lon).unwrap()
    }

    fn catalog() -> PoiCatalog {
        PoiCatalog::from_pois(vec![
            PointOfInterest::new("a", "Stop A", "Script A")
                .at(coord(40.7484, -73.9857))
                .with_radius(50.0)
                .with_audio_length(5.0),
            PointOfInterest::new("b", "Stop B", "Script B")
                .at(coord(40.7580, -73.9855))
                .with_radius(75.0)
                .with_audio_length(4.0),
        ])
    }

    fn controller(fixes: Vec<Coordinate>) -> TourController {
        TourController::new(
            catalog(),
            Box::new(ScriptedSource::new(fixes)),
            Box::new(SilentNarrator::default()),
        )
    }

    fn sample(lat: f64, lon: f64) -> SessionEvent {
        SessionEvent::LocationUpdated(UserLocationSample {
            coordinate: coord(lat, lon),
            timestamp: Utc::now(),
        })
    }

    #[test]
    fn test_proximity_entry_sets_active_poi() {
        // Initial fix is far from both stops.
        let mut controller = controller(vec![coord(40.70, -73.95)]);
        controller.enqueue(SessionEvent::Command(TourCommand::StartMonitoring));
        controller.pump();
        assert_eq!(controller.session().state(), SessionState::Monitoring);
        assert!(controller.session().active_poi().is_none());

        controller.enqueue(sample(40.7484, -73.9857));
        controller.pump();
        assert_eq!(controller.session().active_poi().unwrap().id, "a");
    }

    #[test]
    fn test_location_bursts_coalesce_to_latest() {
        let mut controller = controller(vec![coord(40.70, -73.95)]);
        controller.enqueue(SessionEvent::Command(TourCommand::StartMonitoring));
        controller.pump();

        // Burst: inside A, then inside B. Only the last fix should apply.
        controller.enqueue(sample(40.7484, -73.9857));
        controller.enqueue(sample(40.7580, -73.9855));
        controller.pump();

        assert_eq!(controller.session().active_poi().unwrap().id, "b");
    }

    #[test]
    fn test_end_tour_drops_stale_events() {
        let mut controller = controller(vec![coord(40.7484, -73.9857)]);
        controller.enqueue(SessionEvent::Command(TourCommand::StartMonitoring));
        controller.pump();
        controller.enqueue(SessionEvent::Command(TourCommand::BeginActiveTour));
        controller.enqueue(SessionEvent::Command(TourCommand::Play));
        controller.pump();
        assert!(controller.session().playback().is_playing);

        // Events queued behind the end command must not resurrect the tour.
        controller.enqueue(SessionEvent::Command(TourCommand::EndTour));
        controller.enqueue(SessionEvent::Command(TourCommand::Play));
        controller.enqueue(SessionEvent::Tick);
        controller.pump();

        assert_eq!(controller.session().state(), SessionState::Idle);
        assert!(!controller.session().playback().is_playing);
        assert_eq!(controller.session().playback().elapsed_secs, 0.0);
    }

    #[test]
    fn test_full_flow_with_auto_stop() {
        let mut controller = controller(vec![coord(40.7484, -73.9857)]);
        controller.enqueue(SessionEvent::Command(TourCommand::StartMonitoring));
        controller.enqueue(SessionEvent::Command(TourCommand::BeginActiveTour));
        controller.enqueue(SessionEvent::Command(TourCommand::Play));
        controller.pump();
        assert_eq!(controller.session().state(), SessionState::ActiveTour);

        for _ in 0..5 {
            controller.enqueue(SessionEvent::Tick);
        }
        controller.pump();

        let playback = controller.session().playback();
        assert!(!playback.is_playing);
        assert_eq!(playback.elapsed_secs, 5.0);
        assert_eq!(controller.session().state(), SessionState::ActiveTour);
    }

    #[test]
    fn test_pause_cancels_narration() {
        let mut controller = controller(vec![coord(40.7484, -73.9857)]);
        controller.enqueue(SessionEvent::Command(TourCommand::StartMonitoring));
        controller.enqueue(SessionEvent::Command(TourCommand::BeginActiveTour));
        controller.enqueue(SessionEvent::Command(TourCommand::Play));
        controller.enqueue(SessionEvent::Command(TourCommand::Pause));
        controller.pump();

        assert!(!controller.session().playback().is_playing);
    }

    #[test]
    fn test_poll_location_only_while_watching() {
        let mut controller = controller(vec![coord(40.7484, -73.9857)]);
        controller.poll_location();
        controller.pump();
        assert!(controller.session().active_poi().is_none());
    }
}
