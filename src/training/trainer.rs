use log::{Level, debug, log, warn};
use ndarray::ArrayView2;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use super::{EpochStats, FreeEnergyReport, GibbsSampler};
use crate::{
    RbmErr, RbmConfig, Result,
    arch::{Params, UnitKind, VisibleUnits},
    data::DataLoader,
    optimization::{GradientAscentWithMomentum, Optimizer},
};

/// Everything that evolves while a model trains. Restoring all of it is what makes a
/// resumed run indistinguishable from an uninterrupted one.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainState {
    pub params: Params,
    pub optimizer: GradientAscentWithMomentum,
    pub rng: ChaCha8Rng,
    pub epochs_trained: usize,
}

impl TrainState {
    /// Seeds the generator and draws the initial parameters.
    ///
    /// # Arguments
    /// * `config` - An already validated configuration.
    pub fn init(config: &RbmConfig) -> Result<Self> {
        let mut rng = ChaCha8Rng::seed_from_u64(config.random_seed);
        let params = Params::init(
            config.n_visible,
            config.n_hidden,
            config.w_init_std,
            &mut rng,
        )?;

        let velocity = Params::zeros(config.n_visible, config.n_hidden);
        let optimizer = GradientAscentWithMomentum::new(
            velocity,
            config.learning_rate,
            config.momentum,
            config.l2,
        );

        Ok(Self {
            params,
            optimizer,
            rng,
            epochs_trained: 0,
        })
    }
}

/// Drives the epoch loop of contrastive divergence training.
pub struct Trainer<'a> {
    units: UnitKind,
    config: &'a RbmConfig,
}

impl<'a> Trainer<'a> {
    /// Creates a new `Trainer`.
    ///
    /// # Arguments
    /// * `units` - The visible units of the model being trained.
    /// * `config` - The hyperparameters to train with.
    pub fn new(units: UnitKind, config: &'a RbmConfig) -> Self {
        Self { units, config }
    }

    /// Trains until `state` reaches `max_epoch` epochs.
    ///
    /// # Arguments
    /// * `state` - The training state, advanced in place.
    /// * `x` - The training data, one sample per row.
    /// * `x_val` - Optional held out data, only used for free energy diagnostics.
    /// * `history` - Where the statistics of every finished epoch are pushed.
    /// * `on_epoch_end` - Called with the state after each finished epoch.
    ///
    /// # Returns
    /// A `Divergence` error as soon as an update produces non finite parameters, with
    /// `state` rolled back to where the failing epoch started, or the first error returned
    /// by `on_epoch_end`.
    pub fn train<F>(
        &self,
        state: &mut TrainState,
        x: ArrayView2<f32>,
        x_val: Option<ArrayView2<f32>>,
        history: &mut Vec<EpochStats>,
        mut on_epoch_end: F,
    ) -> Result<()>
    where
        F: FnMut(&TrainState) -> Result<()>,
    {
        let config = self.config;
        let target = config.max_epoch;

        if state.epochs_trained >= target {
            debug!(
                "already trained for {} epochs, target is {target}",
                state.epochs_trained
            );
            return Ok(());
        }

        state
            .optimizer
            .set_hyperparams(config.learning_rate, config.momentum, config.l2);

        let level = if config.verbose {
            Level::Info
        } else {
            Level::Debug
        };
        let sample_v_states = config
            .sample_v_states
            .unwrap_or_else(|| self.units.samples_states());
        let dfe_every = config.compute_dfe_every_epoch.get();
        let n_values = x.len() as f32;

        let mut loader = DataLoader::new(x, config.batch_size);

        while state.epochs_trained < target {
            let epoch = state.epochs_trained + 1;
            let mut squared_error = 0.;
            let last_good = state.clone();

            loader.shuffle(&mut state.rng);

            while let Some(batch) = loader.next_batch() {
                let sampler = GibbsSampler::new(
                    self.units,
                    &state.params,
                    config.n_gibbs_steps,
                    sample_v_states,
                );

                let chain = sampler.run(batch, &mut state.rng);
                let grad = chain.gradient()?;
                squared_error += chain.squared_error();

                state.optimizer.update_params(&grad, &mut state.params)?;

                if let Some(param) = state.params.first_non_finite() {
                    warn!("`{param}` became non finite during epoch {epoch}, rolling back");
                    *state = last_good;
                    return Err(RbmErr::Divergence { epoch, param });
                }
            }

            state.epochs_trained = epoch;

            let free_energy = (epoch % dfe_every == 0 || epoch == target)
                .then(|| FreeEnergyReport::compute(self.units, &state.params, x, x_val));

            let stats = EpochStats::new(epoch, squared_error / n_values, free_energy);
            log!(level, "{stats}");
            history.push(stats);

            on_epoch_end(&*state)?;
        }

        Ok(())
    }
}
