use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::{RbmConfig, arch::UnitKind};

/// The version of the checkpoint layout written by this crate.
pub const FORMAT_VERSION: u32 = 1;

/// The metadata key holding the serialized `Header`.
pub const HEADER_KEY: &str = "header";

/// The non tensor part of a checkpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Header {
    pub format_version: u32,
    pub units: UnitKind,
    pub config: RbmConfig,
    pub epochs_trained: usize,
    pub rng: ChaCha8Rng,
}
