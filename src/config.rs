use std::{num::NonZeroUsize, path::PathBuf};

use serde::{Deserialize, Serialize};

use crate::{RbmErr, Result};

const DEFAULT_BATCH_SIZE: NonZeroUsize = NonZeroUsize::new(10).unwrap();
const DEFAULT_DFE_EVERY_EPOCH: NonZeroUsize = NonZeroUsize::new(2).unwrap();

/// The hyperparameters and bookkeeping options of a model.
///
/// `n_visible`, `n_hidden`, `random_seed` and `w_init_std` are fixed once a model is built
/// from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RbmConfig {
    pub n_visible: usize,
    pub n_hidden: usize,
    /// The total amount of epochs the model should have trained for once `fit` returns.
    pub max_epoch: usize,
    pub random_seed: u64,
    pub learning_rate: f32,
    pub momentum: f32,
    /// The weight decay coefficient, only applied to `W`.
    pub l2: f32,
    pub batch_size: NonZeroUsize,
    /// The `k` in CD-k.
    pub n_gibbs_steps: NonZeroUsize,
    /// Whether the negative phase samples visible states. `None` follows the convention of
    /// the visible units.
    pub sample_v_states: Option<bool>,
    /// The standard deviation of the normal distribution the initial weights are drawn from.
    pub w_init_std: f32,
    pub compute_dfe_every_epoch: NonZeroUsize,
    /// The checkpoint directory. `None` disables persistence.
    pub model_path: Option<PathBuf>,
    pub save_after_each_epoch: bool,
    pub verbose: bool,
}

impl RbmConfig {
    /// Creates a new configuration with the default hyperparameters.
    ///
    /// # Arguments
    /// * `n_visible` - The amount of visible units.
    /// * `n_hidden` - The amount of hidden units.
    pub fn new(n_visible: usize, n_hidden: usize) -> Self {
        Self {
            n_visible,
            n_hidden,
            max_epoch: 10,
            random_seed: 0,
            learning_rate: 0.01,
            momentum: 0.,
            l2: 1e-4,
            batch_size: DEFAULT_BATCH_SIZE,
            n_gibbs_steps: NonZeroUsize::MIN,
            sample_v_states: None,
            w_init_std: 0.01,
            compute_dfe_every_epoch: DEFAULT_DFE_EVERY_EPOCH,
            model_path: None,
            save_after_each_epoch: false,
            verbose: false,
        }
    }

    /// Checks every field against its constraints.
    ///
    /// # Returns
    /// An `InvalidConfig` error describing the first violated constraint.
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(RbmErr::InvalidConfig(msg));

        if self.n_visible == 0 || self.n_hidden == 0 {
            return invalid(format!(
                "layer sizes must be positive, got {}x{}",
                self.n_visible, self.n_hidden
            ));
        }

        if !(self.learning_rate.is_finite() && self.learning_rate > 0.) {
            return invalid(format!(
                "learning_rate must be positive, got {}",
                self.learning_rate
            ));
        }

        if !(0. ..1.).contains(&self.momentum) {
            return invalid(format!("momentum must be in [0, 1), got {}", self.momentum));
        }

        if !(self.l2.is_finite() && self.l2 >= 0.) {
            return invalid(format!("l2 must be non negative, got {}", self.l2));
        }

        if !(self.w_init_std.is_finite() && self.w_init_std > 0.) {
            return invalid(format!(
                "w_init_std must be positive, got {}",
                self.w_init_std
            ));
        }

        Ok(())
    }

    /// Overrides a single field.
    ///
    /// Structural fields can only be "set" to the value they already hold.
    ///
    /// # Returns
    /// An `ImmutableField` error when trying to change a structural field.
    pub fn apply(&mut self, param: Param) -> Result<()> {
        let immutable = |field| Err(RbmErr::ImmutableField { field });

        match param {
            Param::NVisible(n) if n != self.n_visible => return immutable("n_visible"),
            Param::NHidden(n) if n != self.n_hidden => return immutable("n_hidden"),
            Param::RandomSeed(s) if s != self.random_seed => return immutable("random_seed"),
            Param::WInitStd(std) if std.to_bits() != self.w_init_std.to_bits() => {
                return immutable("w_init_std");
            }
            Param::NVisible(_) | Param::NHidden(_) | Param::RandomSeed(_) | Param::WInitStd(_) => {}
            Param::MaxEpoch(n) => self.max_epoch = n,
            Param::LearningRate(lr) => self.learning_rate = lr,
            Param::Momentum(mu) => self.momentum = mu,
            Param::L2(l2) => self.l2 = l2,
            Param::BatchSize(n) => self.batch_size = n,
            Param::NGibbsSteps(n) => self.n_gibbs_steps = n,
            Param::SampleVStates(s) => self.sample_v_states = s,
            Param::ComputeDfeEveryEpoch(n) => self.compute_dfe_every_epoch = n,
            Param::ModelPath(path) => self.model_path = path,
            Param::SaveAfterEachEpoch(b) => self.save_after_each_epoch = b,
            Param::Verbose(b) => self.verbose = b,
        }

        Ok(())
    }
}

/// A single configuration override, as accepted by `Rbm::set_params`.
#[derive(Debug, Clone, PartialEq)]
pub enum Param {
    NVisible(usize),
    NHidden(usize),
    RandomSeed(u64),
    MaxEpoch(usize),
    LearningRate(f32),
    Momentum(f32),
    L2(f32),
    BatchSize(NonZeroUsize),
    NGibbsSteps(NonZeroUsize),
    SampleVStates(Option<bool>),
    WInitStd(f32),
    ComputeDfeEveryEpoch(NonZeroUsize),
    ModelPath(Option<PathBuf>),
    SaveAfterEachEpoch(bool),
    Verbose(bool),
}
