//! Restricted Boltzmann Machines over Bernoulli, multinomial and Gaussian visible units,
//! trained with contrastive divergence and exactly resumable from a checkpoint.

pub mod arch;
mod config;
pub mod data;
mod error;
pub mod initialization;
mod model;
pub mod optimization;
pub mod storage;
pub mod training;

pub use arch::{Params, UnitKind, VisibleUnits};
pub use config::{Param, RbmConfig};
pub use error::{RbmErr, Result};
pub use model::Rbm;
pub use training::{EpochStats, FreeEnergyReport};
