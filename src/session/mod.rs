//! Tour session state machine.
//!
//! Owns the session lifecycle (Idle, Monitoring, ActiveTour, Ended), the
//! playlist playhead for multi-POI browsing, and the playback sub-state. All
//! mutation funnels through these methods; external callbacks never touch the
//! session directly (see [`controller`]).

pub mod controller;
pub mod ticker;

use crate::catalog::{PoiCatalog, PointOfInterest};
use crate::history::{TourEndedHook, TourSummary};
use thiserror::Error;
use ticker::{PlaybackTicker, TickOutcome};

/// Fallback display title when a tour has no current POI.
const FALLBACK_TITLE: &str = "Nearby Tour";

/// Session lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// No tour, no monitoring
    #[default]
    Idle,
    /// Watching the location stream for nearby POIs
    Monitoring,
    /// Playback screen, entered by proximity or by browsing
    ActiveTour,
    /// Terminal; the session resets to Idle immediately after
    Ended,
}

/// Narration playback sub-state.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Playback {
    pub is_playing: bool,
    pub elapsed_secs: f64,
    pub total_secs: f64,
}

impl Playback {
    /// Fresh playback for a narration of the given length.
    pub fn for_total(total_secs: f64) -> Self {
        Self {
            is_playing: false,
            elapsed_secs: 0.0,
            total_secs,
        }
    }

    /// Progress fraction in `[0, 1]`.
    pub fn progress(&self) -> f64 {
        if self.total_secs <= 0.0 {
            0.0
        } else {
            (self.elapsed_secs / self.total_secs).clamp(0.0, 1.0)
        }
    }
}

/// Session transition errors. A failed transition leaves the session in its
/// prior state.
#[derive(Debug, Error, PartialEq)]
pub enum SessionError {
    #[error("No POI is active; move into a trigger zone or browse the catalog")]
    NoActivePoi,

    #[error("The POI catalog is empty")]
    EmptyCatalog,

    #[error("Cannot {action} while {state:?}")]
    InvalidState {
        action: &'static str,
        state: SessionState,
    },
}

/// The tour session.
pub struct TourSession {
    state: SessionState,
    monitoring: bool,
    active_poi: Option<PointOfInterest>,
    catalog: PoiCatalog,
    current_index: usize,
    playback: Playback,
    ticker: PlaybackTicker,
    on_tour_ended: Option<TourEndedHook>,
}

impl TourSession {
    /// Create a session over a catalog.
    pub fn new(catalog: PoiCatalog) -> Self {
        Self {
            state: SessionState::Idle,
            monitoring: false,
            active_poi: None,
            catalog,
            current_index: 0,
            playback: Playback::default(),
            ticker: PlaybackTicker::default(),
            on_tour_ended: None,
        }
    }

    /// Create a session with a custom tick interval.
    pub fn with_tick_interval(catalog: PoiCatalog, interval_secs: f64) -> Self {
        Self {
            ticker: PlaybackTicker::new(interval_secs),
            ..Self::new(catalog)
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Whether the location monitor is subscribed.
    pub fn monitoring(&self) -> bool {
        self.monitoring
    }

    /// The POI the user is currently inside, if any.
    pub fn active_poi(&self) -> Option<&PointOfInterest> {
        self.active_poi.as_ref()
    }

    /// Playback sub-state.
    pub fn playback(&self) -> Playback {
        self.playback
    }

    /// Playhead into the playlist during an active tour.
    pub fn current_index(&self) -> usize {
        self.current_index
    }

    /// The catalog backing this session.
    pub fn catalog(&self) -> &PoiCatalog {
        &self.catalog
    }

    /// Replace the catalog wholesale, clamping the playhead.
    pub fn set_catalog(&mut self, catalog: PoiCatalog) {
        self.catalog = catalog;
        self.current_index = self
            .current_index
            .min(self.catalog.len().saturating_sub(1));
    }

    /// The POI the playback screen shows: the playlist entry during an
    /// active tour, otherwise the proximity-active POI.
    pub fn current_poi(&self) -> Option<&PointOfInterest> {
        match self.state {
            SessionState::ActiveTour => self.catalog.get(self.current_index),
            _ => self.active_poi.as_ref(),
        }
    }

    /// Display title for the playback screen.
    pub fn current_title(&self) -> &str {
        self.current_poi()
            .map(|p| p.title.as_str())
            .unwrap_or(FALLBACK_TITLE)
    }

    /// Subscribe to completed-tour summaries.
    pub fn set_on_tour_ended(&mut self, hook: TourEndedHook) {
        self.on_tour_ended = Some(hook);
    }

    /// Record that the location monitor started.
    pub fn monitoring_started(&mut self) {
        self.monitoring = true;
        if self.state == SessionState::Idle {
            self.state = SessionState::Monitoring;
            tracing::info!("Session monitoring");
        }
    }

    /// Record that the location monitor stopped. The active POI is cleared
    /// immediately.
    pub fn monitoring_stopped(&mut self) {
        self.monitoring = false;
        self.active_poi = None;
        if self.state == SessionState::Monitoring {
            self.state = SessionState::Idle;
        }
    }

    /// Record an active-POI change from the monitor.
    ///
    /// During an active tour this only updates the stored reference:
    /// proximity loss does not interrupt playback that has already started.
    pub fn set_active_poi(&mut self, poi: Option<PointOfInterest>) {
        if self.monitoring {
            self.active_poi = poi;
        } else {
            self.active_poi = None;
        }
    }

    /// Enter the playback screen from a proximity trigger.
    ///
    /// The playlist is the full catalog with the playhead at the active POI,
    /// so next/previous browse the neighboring stops.
    pub fn begin_active_tour(&mut self) -> Result<(), SessionError> {
        if self.state != SessionState::Monitoring {
            return Err(SessionError::InvalidState {
                action: "begin a tour",
                state: self.state,
            });
        }
        let active = self.active_poi.as_ref().ok_or(SessionError::NoActivePoi)?;

        self.current_index = self.catalog.index_of(&active.id).unwrap_or(0);
        self.playback = Playback::for_total(active.audio_length_secs);
        self.ticker.stop();
        self.state = SessionState::ActiveTour;

        tracing::info!("Tour started at {}", self.current_title());
        Ok(())
    }

    /// Enter the playback screen by browsing, independent of geofencing.
    ///
    /// Valid with no active POI and without monitoring. An empty catalog is
    /// allowed: the session exposes an explicit no-POI state and `play`
    /// rejects until a catalog arrives.
    pub fn begin_browse_tour(&mut self) -> Result<(), SessionError> {
        match self.state {
            SessionState::Idle | SessionState::Monitoring => {}
            state => {
                return Err(SessionError::InvalidState {
                    action: "browse tours",
                    state,
                })
            }
        }

        self.current_index = 0;
        self.playback = Playback::for_total(
            self.catalog
                .get(0)
                .map(|p| p.audio_length_secs)
                .unwrap_or(0.0),
        );
        self.ticker.stop();
        self.state = SessionState::ActiveTour;
        Ok(())
    }

    /// Start playback, returning the script to narrate.
    pub fn play(&mut self) -> Result<String, SessionError> {
        if self.state != SessionState::ActiveTour {
            return Err(SessionError::InvalidState {
                action: "play",
                state: self.state,
            });
        }
        let poi = self
            .catalog
            .get(self.current_index)
            .ok_or(SessionError::EmptyCatalog)?;
        let script = poi.script.clone();

        self.playback.is_playing = true;
        self.ticker.start();
        Ok(script)
    }

    /// Pause playback. The controller cancels narration alongside.
    pub fn pause(&mut self) -> Result<(), SessionError> {
        if self.state != SessionState::ActiveTour {
            return Err(SessionError::InvalidState {
                action: "pause",
                state: self.state,
            });
        }
        self.playback.is_playing = false;
        self.ticker.stop();
        Ok(())
    }

    /// Advance the playhead. Clamped at the last POI (no wraparound); a
    /// boundary call is a no-op returning `false`.
    pub fn next(&mut self) -> Result<bool, SessionError> {
        self.step(1)
    }

    /// Retreat the playhead. Clamped at the first POI.
    pub fn previous(&mut self) -> Result<bool, SessionError> {
        self.step(-1)
    }

    fn step(&mut self, delta: isize) -> Result<bool, SessionError> {
        if self.state != SessionState::ActiveTour {
            return Err(SessionError::InvalidState {
                action: "change POI",
                state: self.state,
            });
        }

        let last = self.catalog.len().saturating_sub(1);
        let target = self.current_index.saturating_add_signed(delta).min(last);
        if self.catalog.is_empty() || target == self.current_index {
            return Ok(false);
        }

        self.current_index = target;
        let total = self
            .catalog
            .get(target)
            .map(|p| p.audio_length_secs)
            .unwrap_or(0.0);
        self.playback = Playback::for_total(total);
        self.ticker.stop();

        tracing::debug!("Playhead moved to {}", self.current_title());
        Ok(true)
    }

    /// Seek within the current narration, clamped to `[0, total]`.
    pub fn seek(&mut self, secs: f64) -> Result<(), SessionError> {
        if self.state != SessionState::ActiveTour {
            return Err(SessionError::InvalidState {
                action: "seek",
                state: self.state,
            });
        }
        self.playback.elapsed_secs = secs.clamp(0.0, self.playback.total_secs);
        Ok(())
    }

    /// Apply one playback tick.
    pub fn tick(&mut self) -> TickOutcome {
        self.ticker.tick(&mut self.playback)
    }

    /// Record that the narration engine finished or errored on its own.
    pub fn narration_finished(&mut self) {
        self.playback.is_playing = false;
        self.ticker.stop();
    }

    /// End the tour: Ended, hook fired, then reset to Idle.
    pub fn end_tour(&mut self) -> Result<TourSummary, SessionError> {
        if self.state != SessionState::ActiveTour {
            return Err(SessionError::InvalidState {
                action: "end the tour",
                state: self.state,
            });
        }

        let summary = TourSummary {
            poi_name: self.current_title().to_string(),
            location: self
                .current_poi()
                .and_then(|p| p.locality.clone())
                .unwrap_or_default(),
            duration_secs: self.playback.elapsed_secs,
            transcript: self
                .current_poi()
                .map(|p| p.script.clone())
                .unwrap_or_default(),
            completed_at: chrono::Utc::now(),
        };

        self.state = SessionState::Ended;
        self.ticker.stop();
        self.playback.is_playing = false;

        if let Some(hook) = &self.on_tour_ended {
            hook(&summary);
        }
        tracing::info!("Tour ended after {:.0}s", summary.duration_secs);

        // Ended is terminal; the session is immediately reusable from Idle.
        self.state = SessionState::Idle;
        self.monitoring = false;
        self.active_poi = None;
        self.current_index = 0;
        self.playback = Playback::default();

        Ok(summary)
    }
}

/// Format elapsed seconds as "m:ss" for the progress display.
pub fn format_clock(secs: f64) -> String {
    let total = secs.max(0.0).floor() as u64;
    format!("{}:{:02}", total / 60, total % 60)
}
