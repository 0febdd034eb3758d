pub mod atmosphere;
pub mod constants;
pub mod earth_orientation;
pub mod elements;
pub mod ephemeris;
pub mod observers;
pub mod propagator;
pub mod satvis_errors;
pub mod search;
pub mod sun_moon;
pub mod time;
pub mod tracker;

pub use ephemeris::{observe, EphemerisConfig, SatelliteEphemeris};
pub use propagator::{propagate, PositionVelocity, Propagator};
pub use search::flare::{next_flares, FlareEvent};
pub use search::pass::{next_pass, rise_set_transit, RiseSetTransit};
pub use search::SearchParams;
