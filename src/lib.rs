//! WorldTour - Location-Triggered Audio Walking Tours
//!
//! A walking tour engine built in Rust. Watches the user's position against a
//! catalog of points of interest, starts narrated tours when the user enters a
//! trigger zone, and drives text-to-speech playback with a deterministic
//! progress ticker.

pub mod catalog;
pub mod config;
pub mod geo;
pub mod history;
pub mod monitor;
pub mod narration;
pub mod proximity;
pub mod session;

// Re-export commonly used types
pub use catalog::{PoiCatalog, PointOfInterest};
pub use geo::Coordinate;
pub use monitor::LocationMonitor;
pub use session::controller::TourController;
pub use session::TourSession;
