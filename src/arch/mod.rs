pub mod activations;
mod params;
pub mod units;

pub use params::Params;
pub use units::{UnitKind, VisibleUnits};
