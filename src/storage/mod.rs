//! Persistence of the complete training state.
//!
//! A checkpoint is a single safetensors file inside the model directory. The parameters
//! and the optimizer velocities are stored as `F32` tensors, the rest of the state lives
//! as JSON in the file's metadata.

mod checkpoint;
mod header;

pub use checkpoint::{CHECKPOINT_FILE, Checkpoint, load, save};
