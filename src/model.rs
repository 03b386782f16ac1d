use std::path::Path;

use log::info;
use ndarray::{Array1, Array2, ArrayView2};

use crate::{
    Param, RbmConfig, RbmErr, Result,
    arch::{Params, UnitKind, VisibleUnits},
    storage::{self, Checkpoint},
    training::{EpochStats, TrainState, Trainer},
};

/// A Restricted Boltzmann Machine with Bernoulli hidden units.
///
/// The model owns its random number generator, so two instances never share a stream.
/// Together with the parameters, the optimizer state and the epoch counter, it is
/// everything a checkpoint persists.
#[derive(Debug)]
pub struct Rbm {
    units: UnitKind,
    config: RbmConfig,
    state: TrainState,
    history: Vec<EpochStats>,
}

impl Rbm {
    /// Creates a new model with freshly initialized parameters.
    ///
    /// # Arguments
    /// * `units` - The distribution of the visible layer.
    /// * `config` - The model's configuration.
    ///
    /// # Returns
    /// An `InvalidConfig` error if `config` violates any of its constraints.
    pub fn new(units: UnitKind, config: RbmConfig) -> Result<Self> {
        config.validate()?;
        let state = TrainState::init(&config)?;

        Ok(Self {
            units,
            config,
            state,
            history: Vec::new(),
        })
    }

    pub fn bernoulli(config: RbmConfig) -> Result<Self> {
        Self::new(UnitKind::Bernoulli, config)
    }

    pub fn multinomial(config: RbmConfig) -> Result<Self> {
        Self::new(UnitKind::Multinomial, config)
    }

    pub fn gaussian(config: RbmConfig) -> Result<Self> {
        Self::new(UnitKind::Gaussian, config)
    }

    /// Rebuilds the model saved in `path`, ready to keep training where it left off.
    ///
    /// # Returns
    /// A `NotFound` error if there's no checkpoint in `path`, or a `CorruptState` error if
    /// it can't be read back.
    pub fn load_model<P: AsRef<Path>>(path: P) -> Result<Self> {
        let Checkpoint {
            units,
            config,
            state,
        } = storage::load(path.as_ref())?;

        Ok(Self {
            units,
            config,
            state,
            history: Vec::new(),
        })
    }

    /// Writes a checkpoint of the model to `path`.
    ///
    /// Non finite parameters are never written; the previous checkpoint is kept instead.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        storage::save(path.as_ref(), self.units, &self.config, &self.state)
    }

    /// Trains the model until it reaches `max_epoch` epochs in total.
    ///
    /// Calling it again with the same target does nothing. When `model_path` is set, the
    /// model is saved before returning, and after every epoch if `save_after_each_epoch`
    /// is enabled. A failed call never writes a checkpoint, and a diverged epoch is rolled
    /// back so the model stays at its last good state.
    ///
    /// # Arguments
    /// * `x` - The training data, one sample per row.
    /// * `x_val` - Optional held out data, only used to monitor the free energy.
    ///
    /// # Returns
    /// A `ShapeMismatch` error if the data doesn't have `n_visible` columns, or a
    /// `Divergence` error if training blows up.
    pub fn fit(&mut self, x: ArrayView2<f32>, x_val: Option<ArrayView2<f32>>) -> Result<&mut Self> {
        self.check_columns("X", x)?;
        if x.nrows() == 0 {
            return Err(RbmErr::ShapeMismatch {
                what: "X rows",
                got: 0,
                expected: 1,
            });
        }

        if let Some(x_val) = x_val {
            self.check_columns("X_val", x_val)?;
        }

        let Self {
            units,
            config,
            state,
            history,
        } = &mut *self;
        let (units, config) = (*units, &*config);

        let start = state.epochs_trained;
        let checkpoint_dir = config.model_path.as_deref();
        let save_each_epoch = config.save_after_each_epoch;

        Trainer::new(units, config).train(state, x, x_val, history, |state| {
            match checkpoint_dir {
                Some(dir) if save_each_epoch => storage::save(dir, units, config, state),
                _ => Ok(()),
            }
        })?;

        if let Some(dir) = checkpoint_dir {
            if !save_each_epoch || state.epochs_trained == start {
                storage::save(dir, units, config, state)?;
            }
        }

        if state.epochs_trained > start {
            info!(
                "trained from epoch {start} to {} ({} units)",
                state.epochs_trained,
                units.name()
            );
        }

        Ok(self)
    }

    /// Overrides configuration fields, either all of them or none.
    ///
    /// # Returns
    /// An `ImmutableField` error when trying to change `n_visible`, `n_hidden`,
    /// `random_seed` or `w_init_std`, or an `InvalidConfig` error if the resulting
    /// configuration is invalid.
    pub fn set_params<I>(&mut self, params: I) -> Result<&mut Self>
    where
        I: IntoIterator<Item = Param>,
    {
        let mut config = self.config.clone();

        for param in params {
            config.apply(param)?;
        }

        config.validate()?;
        self.config = config;
        Ok(self)
    }

    /// Computes the hidden activation probabilities `σ(xW + hb)`.
    ///
    /// # Returns
    /// A `(rows, n_hidden)` array, or a `ShapeMismatch` error.
    pub fn transform(&self, x: ArrayView2<f32>) -> Result<Array2<f32>> {
        self.check_columns("X", x)?;
        Ok(self.state.params.hidden_probs(x))
    }

    /// Mean field reconstruction of `x`: the expected visible values given `σ(xW + hb)`.
    pub fn reconstruct(&self, x: ArrayView2<f32>) -> Result<Array2<f32>> {
        let h = self.transform(x)?;
        let params = &self.state.params;
        Ok(self.units.activation(params.visible_pre(h.view())))
    }

    /// Computes the free energy of every row of `x`.
    pub fn free_energy(&self, x: ArrayView2<f32>) -> Result<Array1<f32>> {
        self.check_columns("X", x)?;
        Ok(self.units.free_energy(&self.state.params, x))
    }

    /// Returns an owned copy of the parameters.
    pub fn get_weights(&self) -> Params {
        self.state.params.clone()
    }

    pub fn units(&self) -> UnitKind {
        self.units
    }

    pub fn config(&self) -> &RbmConfig {
        &self.config
    }

    pub fn epochs_trained(&self) -> usize {
        self.state.epochs_trained
    }

    /// The statistics of every epoch trained by this instance. Not persisted.
    pub fn history(&self) -> &[EpochStats] {
        &self.history
    }

    fn check_columns(&self, what: &'static str, x: ArrayView2<f32>) -> Result<()> {
        if x.ncols() != self.config.n_visible {
            return Err(RbmErr::ShapeMismatch {
                what,
                got: x.ncols(),
                expected: self.config.n_visible,
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn rbm() -> Rbm {
        Rbm::bernoulli(RbmConfig::new(3, 2)).unwrap()
    }

    #[test]
    fn set_params_is_all_or_nothing() {
        let mut rbm = rbm();

        let err = rbm
            .set_params([Param::MaxEpoch(50), Param::NVisible(7)])
            .unwrap_err();

        assert!(matches!(err, RbmErr::ImmutableField { field: "n_visible" }));
        assert_eq!(rbm.config(), &RbmConfig::new(3, 2));

        let err = rbm
            .set_params([Param::MaxEpoch(50), Param::Momentum(2.)])
            .unwrap_err();

        assert!(matches!(err, RbmErr::InvalidConfig(_)));
        assert_eq!(rbm.config().max_epoch, 10);
    }

    #[test]
    fn weights_are_copies() {
        let mut rbm = rbm();
        let before = rbm.get_weights();

        rbm.fit(array![[1., 0., 1.], [0., 1., 0.]].view(), None)
            .unwrap();

        assert_ne!(rbm.get_weights(), before);
    }

    #[test]
    fn rejects_wrong_column_counts() {
        let mut rbm = rbm();
        let x = Array2::zeros((4, 5));

        assert!(matches!(
            rbm.transform(x.view()),
            Err(RbmErr::ShapeMismatch { got: 5, expected: 3, .. })
        ));
        assert!(matches!(
            rbm.fit(array![[1., 0., 1.]].view(), Some(x.view())),
            Err(RbmErr::ShapeMismatch { what: "X_val", .. })
        ));
        assert_eq!(rbm.epochs_trained(), 0);
    }

    #[test]
    fn reconstruction_has_the_input_shape() {
        let rbm = Rbm::multinomial(RbmConfig::new(3, 2)).unwrap();
        let r = rbm.reconstruct(array![[1., 0., 0.]].view()).unwrap();

        assert_eq!(r.dim(), (1, 3));
        assert!((r.sum() - 1.).abs() < 1e-6);
    }
}
