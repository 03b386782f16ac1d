use std::num::NonZeroUsize;

use ndarray::{Array2, Axis, linalg};
use rand::Rng;

use crate::{
    Result,
    arch::{Params, UnitKind, VisibleUnits, units::sample_bernoulli},
};

/// Runs the contrastive divergence Gibbs chain between the visible and hidden layers.
#[derive(Debug, Clone, Copy)]
pub struct GibbsSampler<'a> {
    units: UnitKind,
    params: &'a Params,
    n_steps: NonZeroUsize,
    sample_v_states: bool,
}

/// The two ends of a Gibbs chain.
#[derive(Debug, Clone)]
pub struct Chain {
    /// The data the chain started from.
    pub v0: Array2<f32>,
    /// The hidden probabilities given `v0`.
    pub h0: Array2<f32>,
    /// The visible states of the last step.
    pub vk: Array2<f32>,
    /// The hidden probabilities given `vk`.
    pub hk: Array2<f32>,
    /// The expected visible values of the last step.
    pub vk_mean: Array2<f32>,
}

impl<'a> GibbsSampler<'a> {
    /// Creates a new `GibbsSampler`.
    ///
    /// # Arguments
    /// * `units` - The visible units of the model.
    /// * `params` - The current parameters.
    /// * `n_steps` - The amount of Gibbs steps per chain.
    /// * `sample_v_states` - Whether to sample the visible layer instead of using its means.
    pub fn new(
        units: UnitKind,
        params: &'a Params,
        n_steps: NonZeroUsize,
        sample_v_states: bool,
    ) -> Self {
        Self {
            units,
            params,
            n_steps,
            sample_v_states,
        }
    }

    /// Runs a chain starting at `v0`.
    ///
    /// The hidden layer is sampled before every downward pass. The last hidden
    /// probabilities are kept as they are, since they only feed the gradient.
    pub fn run<R: Rng + ?Sized>(&self, v0: Array2<f32>, rng: &mut R) -> Chain {
        let h0 = self.params.hidden_probs(v0.view());
        let mut h_states = sample_bernoulli(h0.view(), rng);
        let mut step = 1;

        loop {
            let pre = self.params.visible_pre(h_states.view());
            let vk_mean = self.units.activation(pre);
            let vk = if self.sample_v_states {
                self.units.sample(vk_mean.view(), rng)
            } else {
                vk_mean.clone()
            };
            let hk = self.params.hidden_probs(vk.view());

            if step == self.n_steps.get() {
                return Chain {
                    v0,
                    h0,
                    vk,
                    hk,
                    vk_mean,
                };
            }

            h_states = sample_bernoulli(hk.view(), rng);
            step += 1;
        }
    }
}

impl Chain {
    /// Estimates the log likelihood gradient from the positive and negative phases.
    ///
    /// # Returns
    /// `(v0ᵀh0 - vkᵀhk) / n`, `mean(h0 - hk)` and `mean(v0 - vk)` as `Params`.
    pub fn gradient(&self) -> Result<Params> {
        let n = self.v0.nrows() as f32;

        let mut dw = Array2::zeros((self.v0.ncols(), self.h0.ncols()));
        linalg::general_mat_mul(1. / n, &self.v0.t(), &self.h0, 0., &mut dw);
        linalg::general_mat_mul(-1. / n, &self.vk.t(), &self.hk, 1., &mut dw);

        let dhb = (&self.h0 - &self.hk).sum_axis(Axis(0)) / n;
        let dvb = (&self.v0 - &self.vk).sum_axis(Axis(0)) / n;

        Params::from_parts(dw, dhb, dvb)
    }

    /// The sum of squared differences between the data and its reconstruction.
    pub fn squared_error(&self) -> f32 {
        (&self.v0 - &self.vk_mean).mapv_into(|d| d * d).sum()
    }
}
