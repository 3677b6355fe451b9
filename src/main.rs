//! WorldTour - Location-Triggered Audio Walking Tours
//!
//! Main entry point. Runs a simulated walk through the built-in New York
//! catalog, approaching the Empire State Building until its trigger zone
//! starts a narrated tour.

use std::time::Duration;

use chrono::Utc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use worldtour::catalog::source::RestPoiSource;
use worldtour::catalog::{CatalogWarning, PoiCatalog};
use worldtour::geo::Coordinate;
use worldtour::monitor::{LocationError, LocationSource, PermissionState};
use worldtour::narration::{Narrator, SilentNarrator, SystemNarrator};
use worldtour::proximity::UserLocationSample;
use worldtour::session::controller::{SessionEvent, TourCommand, TourController};
use worldtour::session::SessionState;

/// Location source that walks a straight line between two coordinates.
struct SimulatedWalk {
    from: Coordinate,
    to: Coordinate,
    steps: u32,
    taken: u32,
}

impl SimulatedWalk {
    fn new(from: Coordinate, to: Coordinate, steps: u32) -> Self {
        Self {
            from,
            to,
            steps,
            taken: 0,
        }
    }
}

impl LocationSource for SimulatedWalk {
    fn permission(&self) -> PermissionState {
        PermissionState::Granted
    }

    fn request_permission(&mut self) -> PermissionState {
        PermissionState::Granted
    }

    fn current_position(&mut self) -> Result<UserLocationSample, LocationError> {
        let t = f64::from(self.taken.min(self.steps)) / f64::from(self.steps.max(1));
        self.taken = self.taken.saturating_add(1);

        let coordinate = Coordinate::new(
            self.from.latitude + (self.to.latitude - self.from.latitude) * t,
            self.from.longitude + (self.to.longitude - self.from.longitude) * t,
        )
        .map_err(|_| LocationError::PositionUnavailable)?;

        Ok(UserLocationSample {
            coordinate,
            timestamp: Utc::now(),
        })
    }
}

async fn load_catalog(config: &worldtour::config::AppConfig) -> PoiCatalog {
    if !config.tour.offline_mode && config.backend.is_configured() {
        match RestPoiSource::new(&config.backend.base_url, &config.backend.api_key) {
            Ok(source) => match source.fetch_pois().await {
                Ok(records) => {
                    let mut warnings: Vec<CatalogWarning> = Vec::new();
                    let catalog = PoiCatalog::from_records(records, &mut warnings);
                    for warning in &warnings {
                        tracing::warn!("{warning:?}");
                    }
                    if !catalog.is_empty() {
                        tracing::info!("Loaded {} POIs from backend", catalog.len());
                        return catalog;
                    }
                    tracing::warn!("Backend returned no POIs; using built-in catalog");
                }
                Err(err) => tracing::warn!("Backend fetch failed: {err}; using built-in catalog"),
            },
            Err(err) => tracing::warn!("Backend client error: {err}; using built-in catalog"),
        }
    }
    PoiCatalog::builtin_nyc()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting WorldTour v{}", env!("CARGO_PKG_VERSION"));

    let config = worldtour::config::load_config()?;
    let catalog = load_catalog(&config).await;

    let narrator: Box<dyn Narrator> = match SystemNarrator::new(&config.voice) {
        Ok(narrator) => Box::new(narrator),
        Err(err) => {
            tracing::warn!("No speech engine available ({err}); narration is silent");
            Box::new(SilentNarrator::default())
        }
    };

    // Walk from Madison Square Park up to the Empire State Building.
    let walk = SimulatedWalk::new(
        Coordinate::new(40.7411, -73.9880)?,
        Coordinate::new(40.7484, -73.9857)?,
        30,
    );

    let mut controller = TourController::new(catalog, Box::new(walk), narrator);
    controller.set_on_tour_ended(Box::new(|summary| {
        tracing::info!(
            "Completed {} after {:.0}s",
            summary.poi_name,
            summary.duration_secs
        );
    }));

    controller.enqueue(SessionEvent::Command(TourCommand::StartMonitoring));
    controller.pump();

    let tick = Duration::from_secs_f64(config.tour.tick_interval_secs.max(0.1));
    let mut tour_started = false;

    loop {
        tokio::time::sleep(tick).await;

        controller.poll_location();
        controller.enqueue(SessionEvent::Tick);
        controller.pump();

        let session = controller.session();
        if !tour_started && session.active_poi().is_some() {
            tour_started = true;
            controller.enqueue(SessionEvent::Command(TourCommand::BeginActiveTour));
            controller.enqueue(SessionEvent::Command(TourCommand::Play));
            controller.pump();
            tracing::info!("Now touring: {}", controller.session().current_title());
            continue;
        }

        if tour_started && session.state() == SessionState::ActiveTour {
            let playback = session.playback();
            if !playback.is_playing && playback.elapsed_secs >= playback.total_secs {
                controller.enqueue(SessionEvent::Command(TourCommand::EndTour));
                controller.pump();
                break;
            }
        }
    }

    tracing::info!("Shutting down");
    Ok(())
}
