//! Location monitor: consumes the platform location stream and raises
//! proximity events as the user moves.

use crate::catalog::{PoiCatalog, PointOfInterest};
use crate::proximity::{self, NearbyPoi, ProximityResult, UserLocationSample};
use crossbeam::channel::{Receiver, Sender};
use thiserror::Error;

/// Errors from the platform location source.
#[derive(Debug, Error)]
pub enum LocationError {
    #[error("Location permission denied")]
    PermissionDenied,

    #[error("Position unavailable")]
    PositionUnavailable,

    #[error("Location request timed out")]
    Timeout,
}

/// Permission state reported by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PermissionState {
    #[default]
    NotDetermined,
    Granted,
    Denied,
}

/// Seam over the platform location API.
///
/// The monitor only pulls one-shot fixes from here; continuous updates are
/// pushed in by the platform adapter via [`LocationMonitor::on_location_update`].
pub trait LocationSource: Send {
    /// Current permission state.
    fn permission(&self) -> PermissionState;

    /// Prompt for permission if not yet determined, returning the outcome.
    fn request_permission(&mut self) -> PermissionState;

    /// One-shot position fix.
    fn current_position(&mut self) -> Result<UserLocationSample, LocationError>;
}

/// Monitor lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MonitorState {
    #[default]
    Idle,
    Watching,
}

/// Events from the location monitor.
#[derive(Debug, Clone)]
pub enum MonitorEvent {
    /// Monitoring started
    Started,
    /// Monitoring stopped
    Stopped,
    /// The active (in-range) POI changed
    ActivePoiChanged {
        previous: Option<PointOfInterest>,
        current: Option<NearbyPoi>,
    },
    /// The nearest POI overall changed
    ClosestPoiChanged {
        previous: Option<PointOfInterest>,
        current: Option<NearbyPoi>,
    },
}

/// Watches the user's position against a POI catalog.
///
/// Each update is resolved in full; only id changes are reported. Processing
/// a sample is bounded by the catalog size, and bursts should be coalesced
/// with [`drain_latest`] so only the newest fix is applied.
pub struct LocationMonitor {
    catalog: PoiCatalog,
    state: MonitorState,
    event_tx: Option<Sender<MonitorEvent>>,
    active: Option<PointOfInterest>,
    closest: Option<PointOfInterest>,
    last_result: ProximityResult,
}

impl LocationMonitor {
    /// Create a monitor over a catalog.
    pub fn new(catalog: PoiCatalog) -> Self {
        Self {
            catalog,
            state: MonitorState::Idle,
            event_tx: None,
            active: None,
            closest: None,
            last_result: ProximityResult::default(),
        }
    }

    /// Get an event receiver for monitor events.
    pub fn event_receiver(&mut self) -> Receiver<MonitorEvent> {
        let (tx, rx) = crossbeam::channel::unbounded();
        self.event_tx = Some(tx);
        rx
    }

    fn send_event(&self, event: MonitorEvent) {
        if let Some(tx) = &self.event_tx {
            let _ = tx.send(event);
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> MonitorState {
        self.state
    }

    /// Whether the monitor is watching the location stream.
    pub fn is_watching(&self) -> bool {
        self.state == MonitorState::Watching
    }

    /// The POI the user is currently inside, if any.
    pub fn active_poi(&self) -> Option<&PointOfInterest> {
        self.active.as_ref()
    }

    /// Result of the most recent resolution.
    pub fn last_result(&self) -> &ProximityResult {
        &self.last_result
    }

    /// Replace the catalog (wholesale refresh).
    pub fn set_catalog(&mut self, catalog: PoiCatalog) {
        self.catalog = catalog;
    }

    /// Number of POIs being monitored.
    pub fn monitored_count(&self) -> usize {
        self.catalog.len()
    }

    /// Start watching the location stream.
    ///
    /// Requests permission if it has not been determined yet. On denial the
    /// monitor stays `Idle` and the call fails with `PermissionDenied`;
    /// starting is retryable.
    pub fn start(&mut self, source: &mut dyn LocationSource) -> Result<(), LocationError> {
        if self.state == MonitorState::Watching {
            return Ok(());
        }

        let permission = match source.permission() {
            PermissionState::NotDetermined => source.request_permission(),
            state => state,
        };

        if permission != PermissionState::Granted {
            tracing::warn!("Location permission denied, monitor stays idle");
            return Err(LocationError::PermissionDenied);
        }

        self.state = MonitorState::Watching;
        tracing::info!("Monitoring {} locations", self.catalog.len());
        self.send_event(MonitorEvent::Started);

        // Seed with an immediate fix so the UI has guidance right away.
        if let Ok(sample) = source.current_position() {
            self.on_location_update(sample);
        }

        Ok(())
    }

    /// Stop watching. Idempotent.
    ///
    /// The active POI is cleared immediately, regardless of the last known
    /// distance.
    pub fn stop(&mut self) {
        if self.state == MonitorState::Idle {
            return;
        }

        self.state = MonitorState::Idle;

        if self.active.is_some() {
            let previous = self.active.take();
            self.send_event(MonitorEvent::ActivePoiChanged {
                previous,
                current: None,
            });
        }
        self.closest = None;
        self.last_result = ProximityResult::default();

        tracing::info!("Location monitoring stopped");
        self.send_event(MonitorEvent::Stopped);
    }

    /// Process one location sample. Ignored unless watching.
    pub fn on_location_update(&mut self, sample: UserLocationSample) {
        if self.state != MonitorState::Watching {
            return;
        }

        let result = proximity::resolve(&self.catalog, sample.coordinate);

        let new_active_id = result.active.as_ref().map(|n| n.poi.id.as_str());
        if self.active.as_ref().map(|p| p.id.as_str()) != new_active_id {
            let previous = self.active.take();
            self.active = result.active.as_ref().map(|n| n.poi.clone());
            tracing::debug!(
                "Active POI changed: {:?} -> {:?}",
                previous.as_ref().map(|p| &p.title),
                self.active.as_ref().map(|p| &p.title)
            );
            self.send_event(MonitorEvent::ActivePoiChanged {
                previous,
                current: result.active.clone(),
            });
        }

        let new_closest_id = result.closest.as_ref().map(|n| n.poi.id.as_str());
        if self.closest.as_ref().map(|p| p.id.as_str()) != new_closest_id {
            let previous = self.closest.take();
            self.closest = result.closest.as_ref().map(|n| n.poi.clone());
            self.send_event(MonitorEvent::ClosestPoiChanged {
                previous,
                current: result.closest.clone(),
            });
        }

        self.last_result = result;
    }
}

/// Collapse a burst of pending samples to the newest one (last-wins).
///
/// Only the current position matters, so stale fixes are discarded rather
/// than queued behind processing.
pub fn drain_latest<I>(samples: I) -> Option<UserLocationSample>
where
    I: IntoIterator<Item = UserLocationSample>,
{
    samples.into_iter().last()
}
