mod monitor;
mod sampler;
mod trainer;

pub use monitor::{EpochStats, FreeEnergyReport};
pub use sampler::{Chain, GibbsSampler};
pub use trainer::{TrainState, Trainer};
