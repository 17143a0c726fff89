//! Session state machine, sensor state and proximity tracking.

mod reading;
mod state;
mod tracker;

pub use reading::SensorReading;
pub use state::{Phase, SessionSnapshot, SharedState};
pub use tracker::{Proximity, ProximityTracker};
