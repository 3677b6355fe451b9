//! Playback ticker: advances elapsed narration time at a fixed interval.

use super::Playback;

/// Default tick interval in seconds.
pub const DEFAULT_TICK_INTERVAL_SECS: f64 = 1.0;

/// Outcome of applying one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Ticker not running; nothing applied.
    Idle,
    /// Elapsed time advanced.
    Advanced,
    /// Elapsed time reached the total; the ticker stopped itself.
    Completed,
}

/// Repeating timer abstraction for playback progress.
///
/// The ticker itself is deterministic: wall-clock scheduling lives with the
/// caller, which applies `tick` once per interval while playing. Ticks clamp
/// at the total duration and the ticker auto-stops on completion.
#[derive(Debug, Clone)]
pub struct PlaybackTicker {
    interval_secs: f64,
    running: bool,
}

impl PlaybackTicker {
    /// Create a ticker with the given interval.
    pub fn new(interval_secs: f64) -> Self {
        Self {
            interval_secs,
            running: false,
        }
    }

    /// Tick interval in seconds.
    pub fn interval_secs(&self) -> f64 {
        self.interval_secs
    }

    /// Whether the ticker is running.
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Begin ticking.
    pub fn start(&mut self) {
        self.running = true;
    }

    /// Cancel pending ticks. Idempotent.
    pub fn stop(&mut self) {
        self.running = false;
    }

    /// Apply one tick to the playback state.
    pub fn tick(&mut self, playback: &mut Playback) -> TickOutcome {
        if !self.running {
            return TickOutcome::Idle;
        }

        playback.elapsed_secs = (playback.elapsed_secs + self.interval_secs).min(playback.total_secs);

        if playback.elapsed_secs >= playback.total_secs {
            playback.is_playing = false;
            self.running = false;
            tracing::debug!("Playback completed at {}s", playback.total_secs);
            return TickOutcome::Completed;
        }

        TickOutcome::Advanced
    }
}

impl Default for PlaybackTicker {
    fn default() -> Self {
        Self::new(DEFAULT_TICK_INTERVAL_SECS)
    }
}
